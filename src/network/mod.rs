//! The neural network graph. Neurons and synapses live in id-keyed arenas; every link between
//! them is a plain [ElementId], so removal never leaves a dangling reference, only ids that
//! [Network::validate_connections] prunes.

pub mod element;
pub mod engine;
pub mod function;
pub mod interface;
pub mod module;
pub mod neuron;
pub mod removal;
pub mod synapse;

pub use element::{
    ElementId, IdGen, Marker, Markers, Param, Position, Stash, SynapseTarget, Tags, Window,
};
pub use engine::StepObserver;
pub use function::{ActivationFunction, SynapseFunction, TransferFunction};
pub use interface::{bind_all, Controller, InterfaceValue, ValueInterface};
pub use module::NeuroModule;
pub use neuron::Neuron;
pub use synapse::Synapse;

use core::ops::{Deref, DerefMut};
use fxhash::{FxHashMap, FxHashSet};
use std::mem;

/// An element handed back to the caller by removal or teardown.
#[derive(Debug, Clone)]
pub enum Element {
    Neuron(Neuron),
    Synapse(Synapse),
}

impl Element {
    pub fn id(&self) -> ElementId {
        match self {
            Element::Neuron(n) => n.id(),
            Element::Synapse(s) => s.id(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Network {
    neurons: FxHashMap<ElementId, Neuron>,
    order: Vec<ElementId>,
    inputs: Vec<ElementId>,
    outputs: Vec<ElementId>,
    processible: Vec<ElementId>,
    synapses: FxHashMap<ElementId, Synapse>,
    modules: Vec<NeuroModule>,
    /// Network-wide properties, also the variables of local override expressions
    pub tags: Tags,
    default_transfer: TransferFunction,
    default_activation: ActivationFunction,
    default_synapse: SynapseFunction,
    input_pairs: Vec<(ElementId, usize)>,
    output_pairs: Vec<(ElementId, usize)>,
    bypass: bool,
    min_start: i32,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(
        transfer: TransferFunction,
        activation: ActivationFunction,
        synapse: SynapseFunction,
    ) -> Self {
        Self {
            default_transfer: transfer,
            default_activation: activation,
            default_synapse: synapse,
            ..Self::default()
        }
    }

    pub fn default_transfer_function(&self) -> &TransferFunction {
        &self.default_transfer
    }

    pub fn set_default_transfer_function(&mut self, f: TransferFunction) {
        self.default_transfer = f;
    }

    pub fn default_activation_function(&self) -> &ActivationFunction {
        &self.default_activation
    }

    pub fn set_default_activation_function(&mut self, f: ActivationFunction) {
        self.default_activation = f;
    }

    pub fn default_synapse_function(&self) -> &SynapseFunction {
        &self.default_synapse
    }

    pub fn set_default_synapse_function(&mut self, f: SynapseFunction) {
        self.default_synapse = f;
    }

    /// Output extraction is skipped while bypassed.
    pub fn is_bypassed(&self) -> bool {
        self.bypass
    }

    pub fn set_bypass(&mut self, bypass: bool) {
        self.bypass = bypass;
    }

    // ------------------------------------------------------------------------
    // Neurons
    // ------------------------------------------------------------------------

    /// Adds an unconnected neuron, filling in missing functions from the defaults. Fails if
    /// the id is already present. Connections are made with [Network::add_synapse].
    pub fn add_neuron(&mut self, mut neuron: Neuron) -> bool {
        let id = neuron.id();
        if self.neurons.contains_key(&id) {
            return false;
        }
        if neuron.transfer_function.is_none() {
            neuron.transfer_function = Some(self.default_transfer.clone());
        }
        if neuron.activation_function.is_none() {
            neuron.activation_function = Some(self.default_activation.clone());
        }
        neuron.incoming.clear();
        neuron.outgoing.clear();
        self.neurons.insert(id, neuron);
        self.order.push(id);
        self.sync_views();
        self.refresh_min_start();
        true
    }

    /// Takes a neuron out of the network. Its incoming synapses go with it; synapses it was
    /// the source of stay behind until validated away.
    pub fn remove_neuron(&mut self, id: ElementId) -> Option<Neuron> {
        let mut neuron = self.neurons.remove(&id)?;
        self.order.retain(|n| *n != id);
        self.input_pairs.retain(|(n, _)| *n != id);
        self.output_pairs.retain(|(n, _)| *n != id);
        for module in &mut self.modules {
            module.neurons.retain(|n| *n != id);
        }
        for sid in mem::take(&mut neuron.incoming) {
            self.drop_synapse_tree(sid);
        }
        neuron.outgoing.clear();
        self.sync_views();
        self.refresh_min_start();
        Some(neuron)
    }

    fn drop_synapse_tree(&mut self, id: ElementId) {
        let Some(synapse) = self.synapses.remove(&id) else {
            return;
        };
        for sid in synapse.incoming {
            self.drop_synapse_tree(sid);
        }
        if let Some(n) = synapse.source.and_then(|s| self.neurons.get_mut(&s)) {
            n.outgoing.retain(|s| *s != id);
        }
    }

    pub fn contains_neuron(&self, id: ElementId) -> bool {
        self.neurons.contains_key(&id)
    }

    pub fn neuron(&self, id: ElementId) -> Option<&Neuron> {
        self.neurons.get(&id)
    }

    /// Mutable access to a neuron. Role markers changed through the guard are reflected in
    /// the input/output views once it drops.
    pub fn neuron_mut(&mut self, id: ElementId) -> Option<NeuronMut<'_>> {
        let neuron = self.neurons.remove(&id)?;
        let roles = (neuron.is_input(), neuron.is_output());
        Some(NeuronMut {
            network: self,
            neuron,
            roles,
        })
    }

    pub fn neuron_by_name(&self, name: &str) -> Option<&Neuron> {
        self.neurons().find(|n| n.name == name)
    }

    /// All neurons in insertion order.
    pub fn neurons(&self) -> impl Iterator<Item = &Neuron> + '_ {
        self.order.iter().filter_map(|id| self.neurons.get(id))
    }

    pub fn neuron_ids(&self) -> &[ElementId] {
        &self.order
    }

    pub fn neuron_count(&self) -> usize {
        self.order.len()
    }

    pub fn input_neurons(&self) -> &[ElementId] {
        &self.inputs
    }

    pub fn output_neurons(&self) -> &[ElementId] {
        &self.outputs
    }

    /// Every neuron that isn't an input.
    pub fn processible_neurons(&self) -> &[ElementId] {
        &self.processible
    }

    fn sync_views(&mut self) {
        self.inputs.clear();
        self.outputs.clear();
        self.processible.clear();
        for id in &self.order {
            let Some(n) = self.neurons.get(id) else {
                continue;
            };
            if n.is_input() {
                self.inputs.push(*id);
            } else {
                self.processible.push(*id);
            }
            if n.is_output() {
                self.outputs.push(*id);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Synapses
    // ------------------------------------------------------------------------

    /// Attaches a synapse to its target. Rejects unknown sources or targets, a synapse
    /// targeting itself, a second synapse between the same source and target, or an id
    /// already in use. Every target chain then ends in a neuron, as a fresh id can't appear
    /// among the existing synapses it runs through.
    pub fn add_synapse(&mut self, mut synapse: Synapse) -> bool {
        let id = synapse.id();
        if self.synapses.contains_key(&id) || self.neurons.contains_key(&id) {
            return false;
        }
        let Some(source) = synapse.source.filter(|s| self.neurons.contains_key(s)) else {
            return false;
        };
        let target = synapse.target;
        let Some(siblings) = self.incoming_of(target) else {
            return false;
        };
        if target.id() == id
            || siblings
                .iter()
                .any(|s| self.synapses.get(s).and_then(|s| s.source) == Some(source))
        {
            return false;
        }

        if synapse.function.is_none() {
            synapse.function = Some(self.default_synapse.clone());
        }
        synapse.incoming.clear();
        synapse.activation = 0.;
        let windowed = !synapse.window.is_default();

        match target {
            SynapseTarget::Neuron(n) => match self.neurons.get_mut(&n) {
                Some(n) => n.incoming.push(id),
                None => return false,
            },
            SynapseTarget::Synapse(s) => match self.synapses.get_mut(&s) {
                Some(s) => s.incoming.push(id),
                None => return false,
            },
        }
        if let Some(n) = self.neurons.get_mut(&source) {
            n.outgoing.push(id);
        }
        self.synapses.insert(id, synapse);
        if windowed {
            self.refresh_min_start();
        }
        true
    }

    /// Incoming synapses of a neuron or synapse, `None` if the target isn't in the network.
    pub fn incoming_of(&self, target: SynapseTarget) -> Option<&[ElementId]> {
        match target {
            SynapseTarget::Neuron(n) => self.neurons.get(&n).map(|n| n.incoming()),
            SynapseTarget::Synapse(s) => self.synapses.get(&s).map(|s| s.incoming()),
        }
    }

    /// The synapse from `source` into `target`, if there is one.
    pub fn synapse_between(&self, source: ElementId, target: SynapseTarget) -> Option<&Synapse> {
        self.incoming_of(target)?
            .iter()
            .filter_map(|s| self.synapses.get(s))
            .find(|s| s.source == Some(source))
    }

    pub fn contains_synapse(&self, id: ElementId) -> bool {
        self.synapses.contains_key(&id)
    }

    pub fn synapse(&self, id: ElementId) -> Option<&Synapse> {
        self.synapses.get(&id)
    }

    /// Mutable access to strength, state, function and tags. Windows go through
    /// [Network::set_window].
    pub fn synapse_mut(&mut self, id: ElementId) -> Option<&mut Synapse> {
        self.synapses.get_mut(&id)
    }

    /// Every synapse reachable from the network's neurons, level by level through
    /// higher-order synapses. Recomputed on each call.
    pub fn synapses(&self) -> Vec<ElementId> {
        let mut all = Vec::with_capacity(self.synapses.len());
        for id in &self.order {
            let Some(n) = self.neurons.get(id) else {
                continue;
            };
            let mut cursor = all.len();
            all.extend_from_slice(&n.incoming);
            while cursor < all.len() {
                if let Some(s) = self.synapses.get(&all[cursor]) {
                    all.extend_from_slice(&s.incoming);
                }
                cursor += 1;
            }
        }
        all
    }

    pub fn synapse_count(&self) -> usize {
        self.synapses.len()
    }

    /// Sets the scheduling window of a neuron or synapse.
    pub fn set_window(&mut self, id: ElementId, window: Window) -> bool {
        if let Some(n) = self.neurons.get_mut(&id) {
            n.window = window;
        } else if let Some(s) = self.synapses.get_mut(&id) {
            s.window = window;
        } else {
            return false;
        }
        self.refresh_min_start();
        true
    }

    // ------------------------------------------------------------------------
    // Modules
    // ------------------------------------------------------------------------

    /// Adds a module; members that aren't neurons of this network are dropped.
    pub fn add_module(&mut self, mut module: NeuroModule) -> bool {
        if self.modules.iter().any(|m| m.id() == module.id()) {
            return false;
        }
        module.neurons.retain(|n| self.neurons.contains_key(n));
        self.modules.push(module);
        true
    }

    pub fn modules(&self) -> &[NeuroModule] {
        &self.modules
    }

    pub fn module(&self, id: ElementId) -> Option<&NeuroModule> {
        self.modules.iter().find(|m| m.id() == id)
    }

    pub fn module_mut(&mut self, id: ElementId) -> Option<&mut NeuroModule> {
        self.modules.iter_mut().find(|m| m.id() == id)
    }

    pub fn module_of(&self, neuron: ElementId) -> Option<&NeuroModule> {
        self.modules.iter().find(|m| m.contains(neuron))
    }

    /// Moves a neuron into a module, out of any module it was in before.
    pub fn add_neuron_to_module(&mut self, module: ElementId, neuron: ElementId) -> bool {
        if !self.neurons.contains_key(&neuron) || self.module(module).is_none() {
            return false;
        }
        for m in &mut self.modules {
            if m.id() == module {
                if !m.contains(neuron) {
                    m.neurons.push(neuron);
                }
            } else {
                m.neurons.retain(|n| *n != neuron);
            }
        }
        true
    }

    // ------------------------------------------------------------------------
    // Whole network
    // ------------------------------------------------------------------------

    /// A deep, validated copy without an interface binding.
    pub fn create_copy(&self) -> Network {
        let mut copy = self.clone();
        copy.input_pairs.clear();
        copy.output_pairs.clear();
        copy.bypass = false;
        copy.validate_connections();
        copy
    }

    /// Structural equality: properties, default functions, modules, and every neuron with its
    /// incoming synapse tree. Runtime state is ignored.
    pub fn equals(&self, other: &Network) -> bool {
        if self.tags != other.tags
            || self.default_transfer != other.default_transfer
            || self.default_activation != other.default_activation
            || self.default_synapse != other.default_synapse
            || self.modules != other.modules
            || self.neurons.len() != other.neurons.len()
        {
            return false;
        }
        self.neurons().all(|a| match other.neuron(a.id()) {
            Some(b) => self.neuron_equals(a, other, b),
            None => false,
        })
    }

    fn neuron_equals(&self, a: &Neuron, other: &Network, b: &Neuron) -> bool {
        a.name == b.name
            && a.bias == b.bias
            && a.transfer_function == b.transfer_function
            && a.activation_function == b.activation_function
            && a.tags == b.tags
            && a.window == b.window
            && self.incoming_equal(&a.incoming, other, &b.incoming)
    }

    fn synapse_equals(&self, a: &Synapse, other: &Network, b: &Synapse) -> bool {
        a.id() == b.id()
            && a.strength == b.strength
            && a.enabled == b.enabled
            && a.function == b.function
            && a.target == b.target
            && a.source == b.source
            && a.tags == b.tags
            && a.window == b.window
            && self.incoming_equal(&a.incoming, other, &b.incoming)
    }

    fn incoming_equal(&self, a: &[ElementId], other: &Network, b: &[ElementId]) -> bool {
        a.len() == b.len()
            && a.iter().all(|id| {
                match (self.synapses.get(id), b.contains(id).then(|| other.synapses.get(id))) {
                    (Some(x), Some(Some(y))) => self.synapse_equals(x, other, y),
                    _ => false,
                }
            })
    }

    /// Hands every neuron and synapse over to the caller and leaves the network empty.
    pub fn free_elements(&mut self) -> Vec<Element> {
        self.input_pairs.clear();
        self.output_pairs.clear();
        self.modules.clear();
        let closure = self.synapses();
        let mut freed = Vec::with_capacity(self.neurons.len() + self.synapses.len());
        for id in mem::take(&mut self.order) {
            if let Some(n) = self.neurons.remove(&id) {
                freed.push(Element::Neuron(n));
            }
        }
        for id in closure {
            if let Some(s) = self.synapses.remove(&id) {
                freed.push(Element::Synapse(s));
            }
        }
        freed.extend(self.synapses.drain().map(|(_, s)| Element::Synapse(s)));
        self.neurons.clear();
        self.sync_views();
        self.min_start = 0;
        freed
    }

    /// Advance `ids` past every id used in this network.
    pub fn adjust_id_counter(&self, ids: &mut IdGen) {
        let highest = self
            .neurons
            .keys()
            .chain(self.synapses.keys())
            .copied()
            .chain(self.modules.iter().map(|m| m.id()))
            .max();
        if let Some(id) = highest {
            ids.skip_past(id);
        }
    }

    pub fn minimal_start_iteration(&self) -> i32 {
        self.min_start
    }

    /// Last iteration any element needs within one step.
    pub fn highest_required_iteration(&self) -> i64 {
        self.neurons
            .values()
            .map(|n| n.window)
            .chain(self.synapses.values().map(|s| s.window))
            .map(|w| w.end() - 1)
            .max()
            .unwrap_or(0)
    }

    /// Neurons and synapses with a non-default scheduling window.
    pub fn elements_with_iteration_requirement(&self) -> Vec<ElementId> {
        let mut ids: Vec<ElementId> = self
            .neurons()
            .filter(|n| !n.window.is_default())
            .map(Neuron::id)
            .collect();
        ids.extend(self.synapses().into_iter().filter(|s| {
            self.synapses
                .get(s)
                .is_some_and(|s| !s.window.is_default())
        }));
        ids
    }

    /// Recompute the earliest iteration any neuron or non-default synapse window opens at.
    pub(crate) fn refresh_min_start(&mut self) {
        self.min_start = self
            .neurons
            .values()
            .map(|n| n.window.start())
            .chain(
                self.synapses
                    .values()
                    .filter(|s| !s.window.is_default())
                    .map(|s| s.window.start()),
            )
            .min()
            .unwrap_or(0);
    }

    /// Remove `Modified`, `NewElement` and other chain-scoped markers from every element.
    pub fn clear_transient_markers(&mut self) {
        for n in self.neurons.values_mut() {
            n.tags.clear_transient();
        }
        for s in self.synapses.values_mut() {
            s.tags.clear_transient();
        }
        for m in &mut self.modules {
            m.tags.clear_transient();
        }
    }

    pub(crate) fn synapse_ids_unreachable(&self) -> Vec<ElementId> {
        let reachable: FxHashSet<ElementId> = self.synapses().into_iter().collect();
        self.synapses
            .keys()
            .filter(|s| !reachable.contains(s))
            .copied()
            .collect()
    }
}

impl PartialEq for Network {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

/// Exclusive access to one neuron; re-synchronizes the role views on drop.
pub struct NeuronMut<'a> {
    network: &'a mut Network,
    neuron: Neuron,
    roles: (bool, bool),
}

impl Deref for NeuronMut<'_> {
    type Target = Neuron;

    fn deref(&self) -> &Neuron {
        &self.neuron
    }
}

impl DerefMut for NeuronMut<'_> {
    fn deref_mut(&mut self) -> &mut Neuron {
        &mut self.neuron
    }
}

impl Drop for NeuronMut<'_> {
    fn drop(&mut self) {
        let neuron = mem::take(&mut self.neuron);
        let roles = (neuron.is_input(), neuron.is_output());
        self.network.neurons.insert(neuron.id(), neuron);
        if roles != self.roles {
            self.network.sync_views();
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// `inputs` input neurons, `outputs` output neurons, and synapses from every input to
    /// every output with strength 0.5.
    pub(crate) fn layered(ids: &mut IdGen, inputs: usize, outputs: usize) -> Network {
        let mut net = Network::new();
        let mut ins = vec![];
        for i in 0..inputs {
            let mut n = Neuron::new(ids.next(), format!("in{i}"));
            n.tags.mark(Marker::Input);
            ins.push(n.id());
            assert!(net.add_neuron(n));
        }
        for o in 0..outputs {
            let mut n = Neuron::new(ids.next(), format!("out{o}"));
            n.tags.mark(Marker::Output);
            let out = n.id();
            assert!(net.add_neuron(n));
            for i in &ins {
                assert!(net.add_synapse(Synapse::new(
                    ids.next(),
                    *i,
                    SynapseTarget::Neuron(out),
                    0.5
                )));
            }
        }
        net
    }

    fn hidden(net: &mut Network, ids: &mut IdGen) -> ElementId {
        let id = ids.next();
        assert!(net.add_neuron(Neuron::new(id, "")));
        id
    }

    #[test]
    fn test_views() {
        let mut ids = IdGen::default();
        let mut net = layered(&mut ids, 2, 1);
        let h = hidden(&mut net, &mut ids);
        assert_eq!(net.input_neurons().len(), 2);
        assert_eq!(net.output_neurons().len(), 1);
        assert_eq!(net.processible_neurons().len(), 2);

        net.neuron_mut(h).unwrap().tags.mark(Marker::Input);
        assert_eq!(net.input_neurons().len(), 3);
        assert_eq!(net.processible_neurons().len(), 1);
        assert_eq!(net.neuron_ids().len(), 4);
    }

    #[test]
    fn test_add_neuron_twice() {
        let mut ids = IdGen::default();
        let mut net = Network::new();
        let n = Neuron::new(ids.next(), "a");
        assert!(net.add_neuron(n.clone()));
        assert!(!net.add_neuron(n));
        assert_eq!(net.neuron_count(), 1);
        assert_eq!(
            net.neuron(ElementId(1)).unwrap().transfer_function,
            Some(TransferFunction::Tanh)
        );
    }

    #[test]
    fn test_add_synapse_rejects() {
        let mut ids = IdGen::default();
        let mut net = layered(&mut ids, 1, 1);
        let (i, o) = (net.input_neurons()[0], net.output_neurons()[0]);
        let s = net.synapses()[0];

        // duplicate source and target
        assert!(!net.add_synapse(Synapse::new(ids.next(), i, SynapseTarget::Neuron(o), 1.)));
        // unknown source
        assert!(!net.add_synapse(Synapse::new(
            ids.next(),
            ElementId(999),
            SynapseTarget::Neuron(o),
            1.
        )));
        // unknown target
        assert!(!net.add_synapse(Synapse::new(
            ids.next(),
            i,
            SynapseTarget::Synapse(ElementId(999)),
            1.
        )));
        // self target
        let own = ids.next();
        assert!(!net.add_synapse(Synapse::new(own, o, SynapseTarget::Synapse(own), 1.)));
        // id in use
        assert!(!net.add_synapse(Synapse::new(s, o, SynapseTarget::Neuron(i), 1.)));

        assert!(net.add_synapse(Synapse::new(ids.next(), o, SynapseTarget::Synapse(s), 1.)));
        assert_eq!(net.synapses().len(), 2);
    }

    #[test]
    fn test_stacked_targets_end_in_neurons() {
        let mut ids = IdGen::default();
        let mut net = layered(&mut ids, 1, 1);
        let out = net.output_neurons()[0];
        let mut stack = vec![net.synapses()[0]];
        for _ in 0..6 {
            let top = stack[stack.len() - 1];
            let id = ids.next();
            assert!(net.add_synapse(Synapse::new(id, out, SynapseTarget::Synapse(top), 1.)));
            stack.push(id);
        }
        // reusing any id of the stack to close a loop is refused
        for &taken in &stack {
            let top = stack[stack.len() - 1];
            assert!(!net.add_synapse(Synapse::new(taken, out, SynapseTarget::Synapse(top), 1.)));
        }

        for &start in &stack {
            let mut cursor = net.synapse(start).unwrap().target();
            let mut hops = 0;
            while let SynapseTarget::Synapse(s) = cursor {
                cursor = net.synapse(s).unwrap().target();
                hops += 1;
                assert!(hops <= stack.len());
            }
            assert_eq!(cursor, SynapseTarget::Neuron(out));
        }
    }

    #[test]
    fn test_synapse_closure() {
        let mut ids = IdGen::default();
        let mut net = layered(&mut ids, 2, 1);
        let out = net.output_neurons()[0];
        let first = net.synapses()[0];
        let h = hidden(&mut net, &mut ids);
        let ho = ids.next();
        assert!(net.add_synapse(Synapse::new(ho, h, SynapseTarget::Synapse(first), 1.)));
        let hoo = ids.next();
        assert!(net.add_synapse(Synapse::new(hoo, out, SynapseTarget::Synapse(ho), 1.)));

        let all = net.synapses();
        assert_eq!(all.len(), 4);
        assert!(all.contains(&ho) && all.contains(&hoo));
        let unique: FxHashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len());

        net.remove_neuron(out);
        let all = net.synapses();
        assert!(all.is_empty());
        assert_eq!(net.synapse_count(), 0);
    }

    #[test]
    fn test_remove_then_validate() {
        let mut ids = IdGen::default();
        let mut net = layered(&mut ids, 2, 2);
        let victim = net.input_neurons()[0];
        let first = net.synapses()[0];
        let h = hidden(&mut net, &mut ids);
        assert!(net.add_synapse(Synapse::new(ids.next(), victim, SynapseTarget::Synapse(first), 1.)));
        assert!(net.add_synapse(Synapse::new(ids.next(), victim, SynapseTarget::Neuron(h), 1.)));

        assert!(net.remove_neuron(victim).is_some());
        net.validate_connections();
        for sid in net.synapses() {
            let s = net.synapse(sid).unwrap();
            assert_ne!(s.source(), Some(victim));
            assert_ne!(s.target().id(), victim);
        }
        assert_eq!(net.synapses().len(), 2);
        assert!(net.synapse_ids_unreachable().is_empty());
    }

    #[test]
    fn test_copy_equals_and_isolation() {
        let mut ids = IdGen::default();
        let mut net = layered(&mut ids, 2, 1);
        let first = net.synapses()[0];
        let h = hidden(&mut net, &mut ids);
        assert!(net.add_synapse(Synapse::new(ids.next(), h, SynapseTarget::Synapse(first), 0.2)));
        net.tags.set_property("Gain", "2");

        let mut copy = net.create_copy();
        assert!(net.equals(&copy));
        assert_eq!(net, copy);

        copy.neuron_mut(h).unwrap().bias = 1.;
        assert!(!net.equals(&copy));
        copy.neuron_mut(h).unwrap().bias = 0.;
        assert!(net.equals(&copy));

        copy.synapse_mut(first).unwrap().strength = -1.;
        assert!(!net.equals(&copy));
        net.synapse_mut(first).unwrap().strength = -1.;
        assert!(net.equals(&copy));

        copy.set_default_synapse_function(SynapseFunction::Modulated);
        assert!(!net.equals(&copy));
        net.set_default_synapse_function(SynapseFunction::Modulated);
        assert!(net.equals(&copy));

        copy.neuron_mut(h).unwrap().tags.mark(Marker::Protected);
        assert!(!net.equals(&copy));
        assert!(!net.neuron(h).unwrap().tags.has(Marker::Protected));
    }

    #[test]
    fn test_copy_rewired_not_equal() {
        let mut ids = IdGen::default();
        let net = layered(&mut ids, 2, 1);
        let mut copy = net.create_copy();
        let s = copy.synapses()[0];
        let removed = copy.safely_remove_element(s);
        assert_eq!(removed.len(), 1);
        let Element::Synapse(mut s) = removed.into_iter().next().unwrap() else {
            panic!("expected synapse");
        };
        let other_in = copy.input_neurons()[1];
        s.source = Some(other_in);
        s.target = SynapseTarget::Neuron(copy.input_neurons()[0]);
        assert!(copy.add_synapse(s));
        assert!(!net.equals(&copy));
    }

    #[test]
    fn test_free_elements() {
        let mut ids = IdGen::default();
        let mut net = layered(&mut ids, 2, 1);
        let freed = net.free_elements();
        assert_eq!(freed.len(), 5);
        assert!(matches!(freed[0], Element::Neuron(_)));
        assert_eq!(net.neuron_count(), 0);
        assert!(net.synapses().is_empty());
        assert!(net.input_neurons().is_empty());
    }

    #[test]
    fn test_adjust_id_counter() {
        let mut ids = IdGen::default();
        let net = layered(&mut ids, 3, 2);
        let mut fresh = IdGen::default();
        net.adjust_id_counter(&mut fresh);
        assert_eq!(fresh.head(), ids.head());
    }

    #[test]
    fn test_windows() {
        let mut ids = IdGen::default();
        let mut net = layered(&mut ids, 1, 1);
        let out = net.output_neurons()[0];
        assert_eq!(net.minimal_start_iteration(), 0);
        assert_eq!(net.highest_required_iteration(), 0);
        assert!(net.set_window(out, Window::new(-2, 5)));
        assert_eq!(net.minimal_start_iteration(), -2);
        assert_eq!(net.highest_required_iteration(), 2);
        assert_eq!(net.elements_with_iteration_requirement(), vec![out]);
        assert!(!net.set_window(ElementId(999), Window::default()));
    }

    #[test]
    fn test_modules() {
        let mut ids = IdGen::default();
        let mut net = layered(&mut ids, 1, 1);
        let h = hidden(&mut net, &mut ids);
        let a = NeuroModule::new(ids.next(), "a");
        let b = NeuroModule::new(ids.next(), "b");
        let (a_id, b_id) = (a.id(), b.id());
        assert!(net.add_module(a));
        assert!(net.add_module(b));
        assert!(net.add_neuron_to_module(a_id, h));
        assert_eq!(net.module_of(h).map(NeuroModule::id), Some(a_id));
        assert!(net.add_neuron_to_module(b_id, h));
        assert!(net.module(a_id).unwrap().neurons().is_empty());
        net.remove_neuron(h);
        assert!(net.module(b_id).unwrap().neurons().is_empty());
    }
}
