use super::{network_of, resolve, Operator};
use crate::{
    constants::*,
    context::Context,
    individual::{ChangeRecord, Individual},
    network::{Element, ElementId, Marker, Neuron, Param, Position},
};
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

/// Adds unconnected hidden neurons, optionally placing them into modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsertNeuron {
    pub max_hidden_neurons: usize,
    pub max_new_neurons: usize,
    pub insertion_probability: f64,
    pub add_to_module_probability: f64,
    /// Recorded on new neurons for connection initializers, not used here
    pub init_connection_proportion: f64,
}

impl Default for InsertNeuron {
    fn default() -> Self {
        Self {
            max_hidden_neurons: NC_INSERT_NEURON_MAX_HIDDEN,
            max_new_neurons: NC_INSERT_NEURON_MAX_NEW,
            insertion_probability: NC_INSERT_NEURON_PROB,
            add_to_module_probability: NC_INSERT_NEURON_MODULE_PROB,
            init_connection_proportion: NC_INSERT_NEURON_INIT_CONNECTION_PROPORTION,
        }
    }
}

impl Operator for InsertNeuron {
    fn name(&self) -> &'static str {
        "InsertNeuron"
    }

    fn apply(&self, individual: &mut Individual, ctx: &mut Context) -> bool {
        let Some(net) = network_of(&mut individual.genome, self.name(), individual.id) else {
            return false;
        };
        if self.max_hidden_neurons == 0 || self.max_new_neurons == 0 {
            return true;
        }
        net.adjust_id_counter(&mut ctx.ids);

        let interface = net.input_neurons().len() + net.output_neurons().len();
        let generation = ctx.generation.to_string();
        let mut inserted = false;

        for _ in 0..self.max_new_neurons {
            if net.neuron_count().saturating_sub(interface) >= self.max_hidden_neurons {
                break;
            }
            if !ctx.rng.happens(self.insertion_probability) {
                continue;
            }

            let mut owner = None;
            if !net.modules().is_empty() && ctx.rng.happens(self.add_to_module_probability) {
                let eligible: Vec<ElementId> = net
                    .modules()
                    .iter()
                    .filter(|m| {
                        let cap = resolve(&m.tags, Param::MaxNeurons, f64::INFINITY, &net.tags);
                        !m.tags.has_any(&[Marker::Protected, Marker::ProtectNeurons])
                            && (m.neurons().len() as f64) < cap
                    })
                    .map(|m| m.id())
                    .collect();
                match eligible.choose(&mut ctx.rng) {
                    Some(m) => owner = Some(*m),
                    None if self.add_to_module_probability >= 1. => {
                        tracing::debug!(individual = individual.id, "no module has room left");
                        break;
                    }
                    None => {}
                }
            }

            let mut neuron = Neuron::new(ctx.ids.next(), "");
            neuron
                .tags
                .set_property(NC_PROP_CREATION_DATE, generation.as_str());
            if self.init_connection_proportion > 0. {
                neuron.tags.set_property(
                    NC_PROP_INIT_CONNECTION_PROPORTION,
                    self.init_connection_proportion.to_string(),
                );
            }
            neuron.tags.mark(Marker::Modified);
            neuron.tags.mark(Marker::NewElement);
            if let Some(m) = owner.and_then(|m| net.module(m)) {
                let mut free = |extent: f64| {
                    NC_MODULE_LAYOUT_MARGIN
                        + ctx.rng.next_double() * (extent - 2. * NC_MODULE_LAYOUT_MARGIN)
                };
                neuron.position = Position::new(
                    m.position.x + free(m.width),
                    m.position.y + free(m.height),
                    0.,
                );
            }

            let id = neuron.id();
            if !net.add_neuron(neuron) {
                continue;
            }
            if let Some(m) = owner {
                net.add_neuron_to_module(m, id);
            }
            tracing::debug!(neuron = %id, module = ?owner, "inserted neuron");
            inserted = true;
        }

        if inserted {
            individual.mark_significant_change(ctx.generation);
        }
        true
    }
}

/// Removes hidden neurons together with every synapse attached to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoveNeuron {
    pub remove_probability: f64,
    pub max_removed_neurons: usize,
}

impl Default for RemoveNeuron {
    fn default() -> Self {
        Self {
            remove_probability: NC_REMOVE_NEURON_PROB,
            max_removed_neurons: NC_REMOVE_NEURON_MAX,
        }
    }
}

impl Operator for RemoveNeuron {
    fn name(&self) -> &'static str {
        "RemoveNeuron"
    }

    fn apply(&self, individual: &mut Individual, ctx: &mut Context) -> bool {
        let Some(net) = network_of(&mut individual.genome, self.name(), individual.id) else {
            return false;
        };

        let mut candidates: Vec<ElementId> = net
            .neurons()
            .filter(|n| {
                !n.is_input()
                    && !n.is_output()
                    && !n
                        .tags
                        .has_any(&[Marker::Protected, Marker::ProtectExistence])
                    && !net
                        .modules()
                        .iter()
                        .any(|m| m.contains(n.id()) && m.tags.has(Marker::ProtectNeurons))
            })
            .map(Neuron::id)
            .collect();

        let mut removed_any = false;
        for _ in 0..self.max_removed_neurons {
            if !ctx.rng.happens(self.remove_probability) || candidates.is_empty() {
                continue;
            }
            let id = candidates.remove(ctx.rng.next_int(candidates.len()));
            let removed = net.safely_remove_element(id);
            individual.changes.extend(removed.iter().map(|e| match e {
                Element::Neuron(n) => ChangeRecord::RemovedNeuron(n.id()),
                Element::Synapse(s) => ChangeRecord::RemovedSynapse(s.id()),
            }));
            removed_any |= !removed.is_empty();
        }

        if removed_any {
            individual.mark_significant_change(ctx.generation);
        }
        true
    }
}
