use super::{bounded, network_of, resolve, Operator};
use crate::{
    constants::*,
    context::Context,
    individual::Individual,
    network::{ElementId, Marker, Neuron, Param, Stash},
};
use serde::{Deserialize, Serialize};

/// Perturbs, disables and re-enables neuron biases.
///
/// A bias can be toggled off, which parks it in the neuron's stash and sets it to zero, and
/// later toggled back on from there. Only neurons with a bias (or a parked one) are touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeBias {
    pub change_probability: f64,
    pub toggle_disable_probability: f64,
    pub min_bias: f64,
    pub max_bias: f64,
    pub deviation: f64,
    pub use_gauss: bool,
    pub reinit_probability: f64,
}

impl Default for ChangeBias {
    fn default() -> Self {
        Self {
            change_probability: NC_BIAS_CHANGE_PROB,
            toggle_disable_probability: NC_BIAS_TOGGLE_DISABLE_PROB,
            min_bias: NC_BIAS_MIN,
            max_bias: NC_BIAS_MAX,
            deviation: NC_BIAS_DEVIATION,
            use_gauss: NC_BIAS_USE_GAUSS,
            reinit_probability: NC_BIAS_REINIT_PROB,
        }
    }
}

impl Operator for ChangeBias {
    fn name(&self) -> &'static str {
        "ChangeBias"
    }

    fn apply(&self, individual: &mut Individual, ctx: &mut Context) -> bool {
        let Some(net) = network_of(&mut individual.genome, self.name(), individual.id) else {
            return false;
        };

        let candidates: Vec<ElementId> = net
            .neurons()
            .filter(|n| {
                !n.tags
                    .has_any(&[Marker::Protected, Marker::ProtectBias, Marker::Input])
                    && (n.bias != 0. || n.tags.stashed(Stash::PreviousBias).is_some())
            })
            .map(Neuron::id)
            .collect();

        for id in candidates {
            let Some(n) = net.neuron(id) else {
                continue;
            };
            let probability = resolve(
                &n.tags,
                Param::ChangeProbability,
                self.change_probability,
                &net.tags,
            );
            if !ctx.rng.happens(probability) {
                continue;
            }
            let deviation = resolve(&n.tags, Param::ChangeDeviation, self.deviation, &net.tags);
            let min = resolve(&n.tags, Param::MinBias, self.min_bias, &net.tags);
            let max = resolve(&n.tags, Param::MaxBias, self.max_bias, &net.tags);
            let may_disable = !n.tags.has(Marker::ProtectBiasExistence);

            let Some(mut n) = net.neuron_mut(id) else {
                continue;
            };
            let toggle = ctx.rng.happens(self.toggle_disable_probability);
            let mut bias = n.bias;
            if bias == 0. {
                // parked, only a toggle brings it back
                if !toggle {
                    continue;
                }
                match n.tags.take_stash(Stash::PreviousBias) {
                    Some(previous) => bias = previous,
                    None => continue,
                }
            } else if toggle && may_disable {
                n.tags.stash(Stash::PreviousBias, bias);
                n.bias = 0.;
                n.tags.mark(Marker::Modified);
                continue;
            } else if self.use_gauss {
                bias += ctx.rng.gaussian(deviation);
            } else {
                bias += ctx.rng.uniform(deviation);
            }

            if ctx.rng.happens(self.reinit_probability) {
                n.tags.mark(Marker::ReinitBias);
            }
            n.bias = bounded(bias, min, max);
            n.tags.take_stash(Stash::PreviousBias);
            n.tags.mark(Marker::Modified);
        }
        true
    }
}
