use super::{network_of, Operator};
use crate::{
    constants::*,
    context::Context,
    individual::{ChangeRecord, Individual},
    network::{Element, ElementId, Marker, Network, Neuron, Synapse, SynapseTarget},
};
use serde::{Deserialize, Serialize};

/// Adds zero-strength synapses between unprotected neurons, and optionally into synapses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsertSynapse {
    pub insertion_probability: f64,
    pub max_new_synapses: usize,
    pub allow_synapses_as_targets: bool,
}

impl Default for InsertSynapse {
    fn default() -> Self {
        Self {
            insertion_probability: NC_INSERT_SYNAPSE_PROB,
            max_new_synapses: NC_INSERT_SYNAPSE_MAX_NEW,
            allow_synapses_as_targets: NC_INSERT_SYNAPSE_ALLOW_HIGHER_ORDER,
        }
    }
}

impl InsertSynapse {
    /// Where a synapse from `source` may go: non-input neurons among `considered` and, if
    /// allowed, existing synapses, minus those already fed by `source` or closed to new input.
    fn targets(
        &self,
        net: &Network,
        source: ElementId,
        considered: &[ElementId],
    ) -> Vec<SynapseTarget> {
        let neurons = considered
            .iter()
            .filter(|n| net.neuron(**n).is_some_and(|n| !n.is_input()))
            .map(|n| SynapseTarget::Neuron(*n));
        let synapses = self
            .allow_synapses_as_targets
            .then(|| net.synapses())
            .unwrap_or_default()
            .into_iter()
            .map(SynapseTarget::Synapse);

        neurons
            .chain(synapses)
            .filter(|t| {
                let closed = match t {
                    SynapseTarget::Neuron(n) => net
                        .neuron(*n)
                        .map_or(true, |n| n.tags.has(Marker::NoSynapseTarget)),
                    SynapseTarget::Synapse(s) => net
                        .synapse(*s)
                        .map_or(true, |s| s.tags.has(Marker::NoSynapseTarget)),
                };
                !closed && net.synapse_between(source, *t).is_none()
            })
            .collect()
    }
}

impl Operator for InsertSynapse {
    fn name(&self) -> &'static str {
        "InsertSynapse"
    }

    fn apply(&self, individual: &mut Individual, ctx: &mut Context) -> bool {
        let Some(net) = network_of(&mut individual.genome, self.name(), individual.id) else {
            return false;
        };
        if self.max_new_synapses == 0 {
            return true;
        }

        let considered: Vec<ElementId> = net
            .neurons()
            .filter(|n| !n.tags.has(Marker::Protected))
            .map(Neuron::id)
            .collect();
        if considered.is_empty() {
            return true;
        }
        let sources: Vec<ElementId> = considered
            .iter()
            .filter(|n| {
                net.neuron(**n)
                    .is_some_and(|n| !n.tags.has(Marker::NoSynapseSource))
            })
            .copied()
            .collect();

        net.adjust_id_counter(&mut ctx.ids);
        let generation = ctx.generation.to_string();
        let mut inserted = false;

        for _ in 0..self.max_new_synapses {
            if !ctx.rng.happens(self.insertion_probability) || sources.is_empty() {
                continue;
            }
            let source = sources[ctx.rng.next_int(sources.len())];
            let targets = self.targets(net, source, &considered);
            if targets.is_empty() {
                continue;
            }
            let target = targets[ctx.rng.next_int(targets.len())];

            let mut synapse = Synapse::new(ctx.ids.next(), source, target, 0.);
            synapse
                .tags
                .set_property(NC_PROP_CREATION_DATE, generation.as_str());
            synapse.tags.mark(Marker::Modified);
            synapse.tags.mark(Marker::NewElement);
            let id = synapse.id();
            if net.add_synapse(synapse) {
                tracing::debug!(
                    synapse = %id,
                    source = %source,
                    target = %target.id(),
                    "inserted synapse"
                );
                inserted = true;
            }
        }

        if inserted {
            individual.mark_significant_change(ctx.generation);
        }
        true
    }
}

/// Removes synapses along with the higher-order synapses attached to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoveSynapse {
    pub remove_probability: f64,
    pub max_removed_synapses: usize,
}

impl Default for RemoveSynapse {
    fn default() -> Self {
        Self {
            remove_probability: NC_REMOVE_SYNAPSE_PROB,
            max_removed_synapses: NC_REMOVE_SYNAPSE_MAX,
        }
    }
}

impl Operator for RemoveSynapse {
    fn name(&self) -> &'static str {
        "RemoveSynapse"
    }

    fn apply(&self, individual: &mut Individual, ctx: &mut Context) -> bool {
        let Some(net) = network_of(&mut individual.genome, self.name(), individual.id) else {
            return false;
        };

        let mut candidates = unprotected(net, &[Marker::Protected, Marker::ProtectExistence]);
        let mut removed_any = false;
        for _ in 0..self.max_removed_synapses {
            // earlier removals may have taken candidates with them
            candidates.retain(|s| net.contains_synapse(*s));
            if !ctx.rng.happens(self.remove_probability) || candidates.is_empty() {
                continue;
            }
            let id = candidates.remove(ctx.rng.next_int(candidates.len()));
            let removed = net.safely_remove_element(id);
            individual
                .changes
                .extend(removed.iter().filter_map(|e| match e {
                    Element::Synapse(s) => Some(ChangeRecord::RemovedSynapse(s.id())),
                    Element::Neuron(_) => None,
                }));
            removed_any |= !removed.is_empty();
        }

        if removed_any {
            individual.mark_significant_change(ctx.generation);
        }
        true
    }
}

/// Switches disabled synapses back on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnableSynapse {
    pub enable_probability: f64,
}

impl Default for EnableSynapse {
    fn default() -> Self {
        Self {
            enable_probability: NC_ENABLE_SYNAPSE_PROB,
        }
    }
}

impl Operator for EnableSynapse {
    fn name(&self) -> &'static str {
        "EnableSynapse"
    }

    fn apply(&self, individual: &mut Individual, ctx: &mut Context) -> bool {
        let Some(net) = network_of(&mut individual.genome, self.name(), individual.id) else {
            return false;
        };
        toggle(net, ctx, false, self.enable_probability, &[Marker::Protected]);
        true
    }
}

/// Switches synapses off without removing them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisableSynapse {
    pub disable_probability: f64,
}

impl Default for DisableSynapse {
    fn default() -> Self {
        Self {
            disable_probability: NC_DISABLE_SYNAPSE_PROB,
        }
    }
}

impl Operator for DisableSynapse {
    fn name(&self) -> &'static str {
        "DisableSynapse"
    }

    fn apply(&self, individual: &mut Individual, ctx: &mut Context) -> bool {
        let Some(net) = network_of(&mut individual.genome, self.name(), individual.id) else {
            return false;
        };
        toggle(
            net,
            ctx,
            true,
            self.disable_probability,
            &[Marker::Protected, Marker::ProtectExistence],
        );
        true
    }
}

fn unprotected(net: &Network, protection: &[Marker]) -> Vec<ElementId> {
    net.synapses()
        .into_iter()
        .filter(|s| net.synapse(*s).is_some_and(|s| !s.tags.has_any(protection)))
        .collect()
}

/// Flip synapses currently `enabled == from` with probability `p`.
fn toggle(net: &mut Network, ctx: &mut Context, from: bool, p: f64, protection: &[Marker]) {
    for id in unprotected(net, protection) {
        let Some(s) = net.synapse_mut(id) else {
            continue;
        };
        if s.enabled == from && ctx.rng.happens(p) {
            s.enabled = !from;
            s.tags.mark(Marker::Modified);
        }
    }
}
