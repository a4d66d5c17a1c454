//! Stochastic rewrites of network genomes.
//!
//! Every operator takes an [Individual] and the run [Context] and returns `false` only when
//! the individual can't be worked on (the genome isn't a network) or, for filters, when the
//! individual should be rejected. A mutation that happens to change nothing is still `true`.

pub mod bias;
pub mod chain;
pub mod classes;
pub mod neuron;
pub mod parent;
pub mod strength;
pub mod synapse;

pub use bias::ChangeBias;
pub use chain::ManipulationChain;
pub use classes::ConnectNeuronClasses;
pub use neuron::{InsertNeuron, RemoveNeuron};
pub use parent::CloneFromParent;
pub use strength::ChangeSynapseStrength;
pub use synapse::{DisableSynapse, EnableSynapse, InsertSynapse, RemoveSynapse};

use crate::{
    constants::{NC_OPERATOR_INDEX, NC_OPERATOR_MAX_APPLICATIONS},
    context::Context,
    expr,
    individual::{Genome, Individual},
    network::{Network, Param, Tags},
};
use core::{fmt, time::Duration};
use serde::{Deserialize, Serialize};

pub trait Operator: fmt::Debug {
    fn name(&self) -> &'static str;

    fn apply(&self, individual: &mut Individual, ctx: &mut Context) -> bool;
}

/// How a chain schedules an operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorSettings {
    pub enabled: bool,
    /// Whether an outer controller may switch the operator off
    pub can_be_disabled: bool,
    /// Lower indices run first
    pub index: i32,
    /// The operator is skipped from this chain attempt on
    pub max_applications: usize,
}

impl Default for OperatorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            can_be_disabled: true,
            index: NC_OPERATOR_INDEX,
            max_applications: NC_OPERATOR_MAX_APPLICATIONS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OperatorStats {
    pub applications: usize,
    pub rejections: usize,
    pub elapsed: Duration,
}

/// The value of `param` for one element: its local override evaluated against the network
/// properties, or `default`. Malformed overrides are logged and ignored.
pub fn resolve(tags: &Tags, param: Param, default: f64, network: &Tags) -> f64 {
    let Some(text) = tags.override_of(param) else {
        return default;
    };
    match expr::evaluate(text, network) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(%param, expr = text, "ignoring malformed override: {e}");
            default
        }
    }
}

/// `v` clamped to the range spanned by `a` and `b`, in either order.
pub fn bounded(v: f64, a: f64, b: f64) -> f64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    v.max(lo).min(hi)
}

/// The network inside `genome`, logging when there is none.
pub(crate) fn network_of<'a>(
    genome: &'a mut Option<Genome>,
    operator: &'static str,
    individual: u64,
) -> Option<&'a mut Network> {
    match genome {
        Some(Genome::Network(net)) => Some(net),
        _ => {
            tracing::debug!(operator, individual, "genome is not a network");
            None
        }
    }
}
