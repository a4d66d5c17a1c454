//! Binding a network to the named value slots of a controller.

use super::{ElementId, Network, StepObserver};

/// A named numeric slot with its own range.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceValue {
    pub name: String,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl InterfaceValue {
    pub fn new(name: impl Into<String>, value: f64, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            value,
            min: min.min(max),
            max: max.max(min),
        }
    }

    /// The value mapped from `[min, max]` onto `[lower, upper]`.
    pub fn normalized(&self, lower: f64, upper: f64) -> f64 {
        let span = self.max - self.min;
        if span == 0. {
            return lower;
        }
        lower + (self.value - self.min) / span * (upper - lower)
    }

    /// Store `v` taken from `[lower, upper]`, mapped onto `[min, max]` and clamped there.
    pub fn set_normalized(&mut self, v: f64, lower: f64, upper: f64) {
        let span = upper - lower;
        let mapped = if span == 0. {
            self.min
        } else {
            self.min + (v - lower) / span * (self.max - self.min)
        };
        self.value = mapped.clamp(self.min, self.max);
    }
}

/// Something a network can drive. Its *output* values feed the input neurons, its *input*
/// values receive the output neurons.
pub trait Controller {
    /// Slots written by the network
    fn input_values(&self) -> &[InterfaceValue];

    fn input_values_mut(&mut self) -> &mut [InterfaceValue];

    /// Slots read by the network
    fn output_values(&self) -> &[InterfaceValue];
}

/// A plain [Controller] holding its slots in vectors.
#[derive(Debug, Clone, Default)]
pub struct ValueInterface {
    pub name: String,
    inputs: Vec<InterfaceValue>,
    outputs: Vec<InterfaceValue>,
}

impl ValueInterface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn push_input(&mut self, value: InterfaceValue) {
        self.inputs.push(value);
    }

    pub fn push_output(&mut self, value: InterfaceValue) {
        self.outputs.push(value);
    }

    pub fn output_values_mut(&mut self) -> &mut [InterfaceValue] {
        &mut self.outputs
    }
}

impl Controller for ValueInterface {
    fn input_values(&self) -> &[InterfaceValue] {
        &self.inputs
    }

    fn input_values_mut(&mut self) -> &mut [InterfaceValue] {
        &mut self.inputs
    }

    fn output_values(&self) -> &[InterfaceValue] {
        &self.outputs
    }
}

impl Network {
    /// Pair input neurons with the controller's output values and output neurons with its
    /// input values: first by name, then the leftovers by position. Positionally paired
    /// neurons take the name of their value. `None` clears all pairs.
    ///
    /// [Network::execute_step] must be handed the same controller afterwards.
    pub fn set_control_interface(&mut self, controller: Option<&dyn Controller>) {
        self.input_pairs.clear();
        self.output_pairs.clear();
        let Some(controller) = controller else {
            return;
        };
        let inputs = self.inputs.clone();
        let outputs = self.outputs.clone();
        self.input_pairs = self.pair(inputs, controller.output_values());
        self.output_pairs = self.pair(outputs, controller.input_values());
    }

    fn pair(
        &mut self,
        neurons: Vec<ElementId>,
        values: &[InterfaceValue],
    ) -> Vec<(ElementId, usize)> {
        let mut pairs = Vec::with_capacity(neurons.len().min(values.len()));
        let mut free_values: Vec<usize> = (0..values.len()).collect();
        let mut free_neurons = Vec::with_capacity(neurons.len());

        for id in neurons {
            let name = self.neurons.get(&id).map(|n| n.name.as_str());
            match free_values
                .iter()
                .position(|v| Some(values[*v].name.as_str()) == name)
            {
                Some(at) => pairs.push((id, free_values.remove(at))),
                None => free_neurons.push(id),
            }
        }

        if !pairs.is_empty() && (!free_neurons.is_empty() || !free_values.is_empty()) {
            tracing::debug!(
                neurons = ?free_neurons,
                values = ?free_values.iter().map(|v| &values[*v].name).collect::<Vec<_>>(),
                "pairing leftovers by position"
            );
        }
        if free_neurons.len() != free_values.len() {
            tracing::debug!(
                neurons = free_neurons.len(),
                values = free_values.len(),
                "interface size mismatch, some slots stay unpaired"
            );
        }

        for (id, slot) in free_neurons.into_iter().zip(free_values) {
            if let Some(n) = self.neurons.get_mut(&id) {
                n.name.clone_from(&values[slot].name);
            }
            pairs.push((id, slot));
        }
        pairs
    }

    /// (input neuron, controller output slot) pairs
    pub fn input_pairs(&self) -> &[(ElementId, usize)] {
        &self.input_pairs
    }

    /// (output neuron, controller input slot) pairs
    pub fn output_pairs(&self) -> &[(ElementId, usize)] {
        &self.output_pairs
    }
}

/// Rebind a batch of networks, then tell `observer` once.
pub fn bind_all<'a>(
    bindings: impl IntoIterator<Item = (&'a mut Network, Option<&'a dyn Controller>)>,
    observer: &mut dyn StepObserver,
) {
    for (network, controller) in bindings {
        network.set_control_interface(controller);
    }
    observer.networks_replaced();
}
