//! Activation propagation. One call to [Network::execute_step] injects the interface inputs,
//! runs the windowed iteration loop and writes the outputs back.
//!
//! Within an iteration every synapse reads the *snapshot* of its source's output, so the
//! order neurons are updated in never matters.

use super::{interface::Controller, ElementId, Network};

/// Hooks into the propagation loop. Every method defaults to doing nothing.
pub trait StepObserver {
    /// A neuron snapshotted its state
    fn neuron_prepared(&mut self, _neuron: ElementId) {}

    /// A neuron computed a new activation
    fn neuron_updated(&mut self, _neuron: ElementId) {}

    /// One inner scheduling iteration finished
    fn iteration_completed(&mut self, _iteration: i32) {}

    /// A batch of networks was rebound to their controllers
    fn networks_replaced(&mut self) {}
}

struct Silent;

impl StepObserver for Silent {}

impl Network {
    /// Zero all runtime state, reset every function and pick up `FlipActivity` markers.
    pub fn reset(&mut self) {
        for n in self.neurons.values_mut() {
            n.reset();
        }
        for s in self.synapses.values_mut() {
            s.reset();
        }
        self.refresh_min_start();
    }

    /// Whether a neuron computes at `iteration`: its own window is open, or the window of an
    /// incoming synapse that isn't the default one is.
    pub fn requires_update(&self, neuron: ElementId, iteration: i32) -> bool {
        let Some(n) = self.neurons.get(&neuron) else {
            return false;
        };
        n.window.is_open(iteration)
            || n.incoming.iter().any(|s| {
                self.synapses
                    .get(s)
                    .is_some_and(|s| !s.window.is_default() && s.window.is_open(iteration))
            })
    }

    pub fn execute_step(&mut self, controller: &mut dyn Controller) {
        self.execute_step_with(controller, &mut Silent);
    }

    pub fn execute_step_with(
        &mut self,
        controller: &mut dyn Controller,
        observer: &mut dyn StepObserver,
    ) {
        self.inject_inputs(controller);

        for i in 0..self.order.len() {
            let id = self.order[i];
            self.prepare(id, observer);
        }

        let mut remaining = self.processible.clone();
        let mut active: Vec<ElementId> = Vec::with_capacity(remaining.len());
        let mut iteration = self.min_start;

        while !active.is_empty() || !remaining.is_empty() {
            let mut waiting = Vec::with_capacity(remaining.len());
            for id in remaining.drain(..) {
                if self.requires_update(id, iteration) {
                    active.push(id);
                } else if self
                    .neurons
                    .get(&id)
                    .is_some_and(|n| n.window.start() >= iteration)
                {
                    waiting.push(id);
                }
            }
            remaining = waiting;

            for &id in &active {
                self.update_neuron(id);
                observer.neuron_updated(id);
            }
            for &id in &active {
                self.prepare(id, observer);
            }

            tracing::trace!(iteration, active = active.len(), "iteration completed");
            observer.iteration_completed(iteration);
            iteration += 1;
            active.retain(|id| self.requires_update(*id, iteration));
        }

        if !self.bypass {
            self.extract_outputs(controller);
        }
    }

    fn prepare(&mut self, id: ElementId, observer: &mut dyn StepObserver) {
        if let Some(n) = self.neurons.get_mut(&id) {
            n.prepare();
            observer.neuron_prepared(id);
        }
    }

    fn inject_inputs(&mut self, controller: &dyn Controller) {
        let values = controller.output_values();
        for &(id, slot) in &self.input_pairs {
            let (Some(value), Some(n)) = (values.get(slot), self.neurons.get_mut(&id)) else {
                continue;
            };
            let Some(tf) = n.transfer_function.as_ref() else {
                continue;
            };
            let (lower, upper) = (tf.lower_bound(), tf.upper_bound());
            let mut activation = value.normalized(lower, upper) + n.bias;
            if n.flip {
                activation = upper + (lower - activation);
            }
            n.activation = activation;
            n.output = activation;
        }
    }

    fn extract_outputs(&self, controller: &mut dyn Controller) {
        let values = controller.input_values_mut();
        for &(id, slot) in &self.output_pairs {
            let (Some(value), Some(n)) = (values.get_mut(slot), self.neurons.get(&id)) else {
                continue;
            };
            let Some(tf) = n.transfer_function.as_ref() else {
                continue;
            };
            let (lower, upper) = (tf.lower_bound(), tf.upper_bound());
            let mut output = n.output;
            if n.flip {
                output = upper + (lower - output);
            }
            value.set_normalized(output, lower, upper);
        }
    }

    fn update_neuron(&mut self, id: ElementId) {
        let Some(n) = self.neurons.get(&id) else {
            return;
        };
        if n.computed {
            return;
        }
        let mut input = 0.;
        for i in 0..n.incoming.len() {
            let sid = self.neurons[&id].incoming[i];
            input += self.synapse_activation(sid);
        }

        let Some(n) = self.neurons.get_mut(&id) else {
            return;
        };
        let (Some(af), Some(tf)) = (n.activation_function.as_mut(), n.transfer_function.as_ref())
        else {
            tracing::warn!(neuron = %id, "neuron without functions skipped");
            return;
        };
        let activation = af.calculate(n.bias, n.last_activation, input);
        let output = tf.transfer(activation);
        n.activation = activation;
        n.output = output;
        n.computed = true;
    }

    fn synapse_activation(&mut self, id: ElementId) -> f64 {
        let Some(s) = self.synapses.get(&id) else {
            return 0.;
        };
        let mut modulation = 0.;
        for i in 0..s.incoming.len() {
            let sid = self.synapses[&id].incoming[i];
            modulation += self.synapse_activation(sid);
        }

        let source_output = self.synapses[&id]
            .source
            .and_then(|n| self.neurons.get(&n))
            .map(|n| n.last_output);
        let Some(s) = self.synapses.get_mut(&id) else {
            return 0.;
        };
        match source_output {
            Some(out) => s.calculate(out, modulation),
            None => 0.,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        assert_f64_approx,
        network::{
            test::layered, ActivationFunction, IdGen, InterfaceValue, Marker, Neuron, Synapse,
            SynapseFunction, SynapseTarget, TransferFunction, ValueInterface, Window,
        },
    };
    use fxhash::FxHashMap;

    #[derive(Default)]
    struct Counting {
        prepared: FxHashMap<ElementId, usize>,
        updated: FxHashMap<ElementId, usize>,
        iterations: Vec<i32>,
    }

    impl StepObserver for Counting {
        fn neuron_prepared(&mut self, neuron: ElementId) {
            *self.prepared.entry(neuron).or_default() += 1;
        }

        fn neuron_updated(&mut self, neuron: ElementId) {
            *self.updated.entry(neuron).or_default() += 1;
        }

        fn iteration_completed(&mut self, iteration: i32) {
            self.iterations.push(iteration);
        }
    }

    fn controller(inputs: &[f64], outputs: usize) -> ValueInterface {
        let mut c = ValueInterface::new("test");
        for (i, v) in inputs.iter().enumerate() {
            c.push_output(InterfaceValue::new(format!("in{i}"), *v, -1., 1.));
        }
        for o in 0..outputs {
            c.push_input(InterfaceValue::new(format!("out{o}"), 0., -1., 1.));
        }
        c
    }

    #[test]
    fn test_single_iteration_counts() {
        let mut ids = IdGen::default();
        let mut net = layered(&mut ids, 2, 1);
        let mut c = controller(&[0.5, -0.5], 1);
        net.set_control_interface(Some(&c));
        net.reset();

        let mut counts = Counting::default();
        net.execute_step_with(&mut c, &mut counts);

        assert_eq!(counts.iterations, vec![0]);
        for id in net.processible_neurons() {
            assert_eq!(counts.updated[id], 1);
            assert_eq!(counts.prepared[id], 2);
        }
        for id in net.input_neurons() {
            assert!(!counts.updated.contains_key(id));
            assert_eq!(counts.prepared[id], 1);
        }
    }

    #[test]
    fn test_propagation() {
        let mut ids = IdGen::default();
        let mut net = layered(&mut ids, 2, 1);
        let mut c = controller(&[0.5, 0.25], 1);
        net.set_control_interface(Some(&c));
        net.reset();
        net.execute_step(&mut c);

        let expected = (0.5 * 0.5 + 0.25 * 0.5f64).tanh();
        let out = net.neuron(net.output_neurons()[0]).unwrap();
        assert_f64_approx!(out.output(), expected);
        assert_f64_approx!(c.input_values()[0].value, expected);
    }

    #[test]
    fn test_flip_and_bias() {
        let mut ids = IdGen::default();
        let mut net = layered(&mut ids, 1, 1);
        let input = net.input_neurons()[0];
        {
            let mut n = net.neuron_mut(input).unwrap();
            n.tags.mark(Marker::FlipActivity);
            n.bias = 0.25;
        }
        let mut c = controller(&[0.5], 1);
        net.set_control_interface(Some(&c));
        net.reset();
        net.execute_step(&mut c);

        // 0.5 + 0.25 flipped through [-1, 1]
        assert_f64_approx!(net.neuron(input).unwrap().output(), -0.75);
    }

    #[test]
    fn test_bypass_keeps_outputs() {
        let mut ids = IdGen::default();
        let mut net = layered(&mut ids, 1, 1);
        let mut c = controller(&[1.], 1);
        c.input_values_mut()[0].value = 0.3;
        net.set_control_interface(Some(&c));
        net.set_bypass(true);
        net.reset();
        net.execute_step(&mut c);
        assert_f64_approx!(c.input_values()[0].value, 0.3);
    }

    #[test]
    fn test_synchronous_update() {
        // in -> a -> b: b only sees a's output one step later
        let mut ids = IdGen::default();
        let mut net = layered(&mut ids, 1, 0);
        let input = net.input_neurons()[0];
        let a = ids.next();
        let b = ids.next();
        let ramp = TransferFunction::Ramp { lower: -1., upper: 1. };
        for id in [a, b] {
            assert!(net.add_neuron(Neuron::with_functions(
                id,
                "",
                ramp.clone(),
                ActivationFunction::Additive
            )));
        }
        assert!(net.add_synapse(Synapse::new(ids.next(), input, SynapseTarget::Neuron(a), 1.)));
        assert!(net.add_synapse(Synapse::new(ids.next(), a, SynapseTarget::Neuron(b), 1.)));

        let mut c = controller(&[0.5], 0);
        net.set_control_interface(Some(&c));
        net.reset();
        net.execute_step(&mut c);
        assert_f64_approx!(net.neuron(a).unwrap().output(), 0.5);
        assert_f64_approx!(net.neuron(b).unwrap().output(), 0.);
        net.execute_step(&mut c);
        assert_f64_approx!(net.neuron(b).unwrap().output(), 0.5);
    }

    #[test]
    fn test_deterministic_after_reset() {
        let mut ids = IdGen::default();
        let mut net = layered(&mut ids, 3, 2);
        let out = net.output_neurons()[0];
        let h = ids.next();
        assert!(net.add_neuron(Neuron::new(h, "h")));
        assert!(net.add_synapse(Synapse::new(ids.next(), out, SynapseTarget::Neuron(h), -0.7)));
        assert!(net.add_synapse(Synapse::new(ids.next(), h, SynapseTarget::Neuron(out), 0.9)));
        let mut c = controller(&[0.1, 0.9, -0.4], 2);
        net.set_control_interface(Some(&c));

        net.reset();
        net.execute_step(&mut c);
        let first: Vec<u64> = net.neurons().map(|n| n.output().to_bits()).collect();
        net.reset();
        net.execute_step(&mut c);
        let second: Vec<u64> = net.neurons().map(|n| n.output().to_bits()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_requires_update() {
        let mut ids = IdGen::default();
        let mut net = layered(&mut ids, 1, 1);
        let out = net.output_neurons()[0];
        let s = net.synapses()[0];
        assert!(net.set_window(out, Window::new(2, 2)));
        assert!(!net.requires_update(out, 0));
        assert!(net.requires_update(out, 2));
        assert!(net.requires_update(out, 3));
        assert!(!net.requires_update(out, 4));

        // default synapse windows never force an update
        assert!(!net.requires_update(out, 0));
        assert!(net.set_window(s, Window::new(0, 1)));
        assert!(!net.requires_update(out, 0));
        assert!(net.set_window(s, Window::new(5, 1)));
        assert!(net.requires_update(out, 5));
        assert!(!net.requires_update(out, 6));
    }

    #[test]
    fn test_windowed_loop() {
        let mut ids = IdGen::default();
        let mut net = layered(&mut ids, 1, 1);
        let out = net.output_neurons()[0];
        let h = ids.next();
        assert!(net.add_neuron(Neuron::new(h, "late")));
        assert!(net.set_window(out, Window::new(0, 3)));
        assert!(net.set_window(h, Window::new(4, 1)));

        let mut c = controller(&[0.2], 1);
        net.set_control_interface(Some(&c));
        net.reset();
        let mut counts = Counting::default();
        net.execute_step_with(&mut c, &mut counts);

        assert_eq!(counts.updated[&out], 3);
        assert_eq!(counts.updated[&h], 1);
        assert_eq!(counts.iterations, vec![0, 1, 2, 3, 4]);
        assert!(counts.iterations.len() as i64 <= net.highest_required_iteration() + 1);
    }

    #[test]
    fn test_disabled_synapse_contributes_nothing() {
        let mut ids = IdGen::default();
        let mut net = layered(&mut ids, 1, 1);
        let s = net.synapses()[0];
        net.synapse_mut(s).unwrap().enabled = false;
        let mut c = controller(&[1.], 1);
        net.set_control_interface(Some(&c));
        net.reset();
        net.execute_step(&mut c);
        assert_f64_approx!(net.neuron(net.output_neurons()[0]).unwrap().output(), 0.);
        assert_f64_approx!(net.synapse(s).unwrap().activation(), 0.);
    }

    #[test]
    fn test_higher_order_modulation() {
        let mut ids = IdGen::default();
        let mut net = layered(&mut ids, 2, 1);
        net.set_default_synapse_function(SynapseFunction::Modulated);
        let first = net.synapses()[0];
        net.synapse_mut(first).unwrap().function = Some(SynapseFunction::Modulated);
        let second_in = net.input_neurons()[1];
        assert!(net.add_synapse(Synapse::new(
            ids.next(),
            second_in,
            SynapseTarget::Synapse(first),
            1.
        )));

        let mut c = controller(&[1., 0.5], 1);
        net.set_control_interface(Some(&c));
        net.reset();
        net.execute_step(&mut c);

        // first: 1.0 * (0.5 + 0.5 * 1.0), second: 0.5 * 0.5
        let out = net.neuron(net.output_neurons()[0]).unwrap();
        assert_f64_approx!(out.activation(), 1.25);
    }
}
