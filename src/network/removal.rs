//! Cascading removal and connection validation.

use super::{Element, ElementId, Marker, Network, SynapseTarget};

impl Network {
    /// Removes a neuron or synapse together with every synapse that would dangle without it,
    /// and hands them all back. Input and output neurons are refused.
    pub fn safely_remove_element(&mut self, id: ElementId) -> Vec<Element> {
        let mut removed = Vec::new();
        if self.contains_neuron(id) {
            self.safely_remove_neuron(id, &mut removed);
        } else {
            self.safely_remove_synapse(id, &mut removed);
        }
        removed
    }

    fn safely_remove_neuron(&mut self, id: ElementId, removed: &mut Vec<Element>) {
        let Some(neuron) = self.neuron(id) else {
            return;
        };
        if neuron.tags.has_any(&[Marker::Input, Marker::Output]) {
            tracing::debug!(neuron = %id, "refusing to remove an interface neuron");
            return;
        }
        let attached: Vec<ElementId> = neuron
            .incoming()
            .iter()
            .chain(neuron.outgoing())
            .copied()
            .collect();

        let at = removed.len();
        for sid in attached {
            self.safely_remove_synapse(sid, removed);
        }
        if let Some(neuron) = self.remove_neuron(id) {
            removed.insert(at, Element::Neuron(neuron));
        }
    }

    fn safely_remove_synapse(&mut self, id: ElementId, removed: &mut Vec<Element>) {
        let Some(synapse) = self.synapse(id) else {
            return;
        };
        for sid in synapse.incoming().to_vec() {
            self.safely_remove_synapse(sid, removed);
        }
        let Some(mut synapse) = self.synapses.remove(&id) else {
            return;
        };

        match synapse.target {
            SynapseTarget::Neuron(n) => {
                if let Some(n) = self.neurons.get_mut(&n) {
                    n.incoming.retain(|s| *s != id);
                }
            }
            SynapseTarget::Synapse(s) => {
                if let Some(s) = self.synapses.get_mut(&s) {
                    s.incoming.retain(|s| *s != id);
                }
            }
        }
        if let Some(n) = synapse.source.take().and_then(|s| self.neurons.get_mut(&s)) {
            n.outgoing.retain(|s| *s != id);
        }
        if !synapse.window.is_default() {
            self.refresh_min_start();
        }
        removed.push(Element::Synapse(synapse));
    }

    fn is_valid_synapse(&self, id: ElementId) -> bool {
        let Some(synapse) = self.synapse(id) else {
            return false;
        };
        let sourced = synapse.source.is_some_and(|s| self.contains_neuron(s));
        let targeted = match synapse.target {
            SynapseTarget::Neuron(n) => self
                .neuron(n)
                .is_some_and(|n| n.incoming().contains(&id)),
            SynapseTarget::Synapse(s) => self
                .synapse(s)
                .is_some_and(|s| s.incoming().contains(&id)),
        };
        sourced && targeted
    }

    /// Prunes synapses whose source or target has left the network, repeating until a full
    /// pass finds nothing, so chains of higher-order synapses collapse completely. Returns the
    /// number of elements pruned.
    pub fn validate_connections(&mut self) -> usize {
        let mut pruned = 0;

        for id in self.synapse_ids_unreachable() {
            if let Some(s) = self.synapses.remove(&id) {
                tracing::warn!(synapse = %id, "pruning unreachable synapse");
                if let Some(n) = s.source.and_then(|src| self.neurons.get_mut(&src)) {
                    n.outgoing.retain(|o| *o != id);
                }
                pruned += 1;
            }
        }

        loop {
            let Some(dangling) = self
                .synapses()
                .into_iter()
                .find(|s| !self.is_valid_synapse(*s))
            else {
                break;
            };
            tracing::warn!(synapse = %dangling, "pruning dangling synapse");
            pruned += self.safely_remove_element(dangling).len();
        }

        let synapses = &self.synapses;
        for (id, n) in self.neurons.iter_mut() {
            n.outgoing.retain(|s| synapses.get(s).is_some_and(|s| s.source == Some(*id)));
        }
        self.refresh_min_start();
        pruned
    }
}
