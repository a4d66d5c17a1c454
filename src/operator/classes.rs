use super::{network_of, Operator};
use crate::{
    constants::{NC_PROP_CONNECTION_SOURCE_CLASS, NC_PROP_CONNECTION_TARGET_CLASS},
    context::Context,
    individual::Individual,
    network::{ElementId, Network, SynapseTarget},
};
use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rejects individuals whose classed neurons aren't connected.
///
/// Neurons name a class in their `ConnectionSourceClass` or `ConnectionTargetClass`
/// property. With `source_to_target`, every source neuron of a class needs a synapse path to
/// some target neuron of the same class; otherwise every target neuron needs a path from some
/// source neuron. Only direct neuron-to-neuron synapses count as path steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectNeuronClasses {
    pub source_to_target: bool,
}

impl Default for ConnectNeuronClasses {
    fn default() -> Self {
        Self {
            source_to_target: true,
        }
    }
}

#[derive(Clone, Copy)]
enum Direction {
    /// Follow synapses from their target back to their source
    Upstream,
    /// Follow synapses from their source to their target
    Downstream,
}

/// Neurons one direct synapse away from `id`.
fn neighbours(net: &Network, id: ElementId, direction: Direction) -> Vec<ElementId> {
    let Some(n) = net.neuron(id) else {
        return vec![];
    };
    match direction {
        Direction::Upstream => n
            .incoming()
            .iter()
            .filter_map(|s| net.synapse(*s)?.source())
            .collect(),
        Direction::Downstream => n
            .outgoing()
            .iter()
            .filter_map(|s| match net.synapse(*s)?.target() {
                SynapseTarget::Neuron(t) => Some(t),
                SynapseTarget::Synapse(_) => None,
            })
            .collect(),
    }
}

/// Whether `goal` can be reached from any of `starts` walking in `direction`.
fn reachable(net: &Network, starts: &[ElementId], goal: ElementId, direction: Direction) -> bool {
    let mut visited = FxHashSet::default();
    let mut frontier = starts.to_vec();
    while !frontier.is_empty() {
        let mut next = Vec::new();
        for id in frontier {
            if id == goal {
                return true;
            }
            if visited.insert(id) {
                next.extend(
                    neighbours(net, id, direction)
                        .into_iter()
                        .filter(|n| !visited.contains(n)),
                );
            }
        }
        frontier = next;
    }
    false
}

impl Operator for ConnectNeuronClasses {
    fn name(&self) -> &'static str {
        "ConnectNeuronClasses"
    }

    fn apply(&self, individual: &mut Individual, _ctx: &mut Context) -> bool {
        let Some(net) = network_of(&mut individual.genome, self.name(), individual.id) else {
            return false;
        };

        let mut sources: BTreeMap<&str, Vec<ElementId>> = BTreeMap::new();
        let mut targets: BTreeMap<&str, Vec<ElementId>> = BTreeMap::new();
        for n in net.neurons() {
            if let Some(class) = n.tags.property(NC_PROP_CONNECTION_SOURCE_CLASS) {
                sources.entry(class).or_default().push(n.id());
            }
            if let Some(class) = n.tags.property(NC_PROP_CONNECTION_TARGET_CLASS) {
                targets.entry(class).or_default().push(n.id());
            }
        }

        for (class, from) in &sources {
            let Some(to) = targets.get(class) else {
                continue;
            };
            let connected = if self.source_to_target {
                from.iter()
                    .all(|s| reachable(net, to, *s, Direction::Upstream))
            } else {
                to.iter()
                    .all(|t| reachable(net, from, *t, Direction::Downstream))
            };
            if !connected {
                tracing::debug!(
                    individual = individual.id,
                    class = *class,
                    "neuron class is not connected"
                );
                return false;
            }
        }
        true
    }
}
