use super::{
    element::{ElementId, Marker, Position, Tags, Window},
    function::{ActivationFunction, TransferFunction},
};

/// A processing node. Incoming synapses belong to the neuron; the outgoing list only records
/// which synapses read from it.
#[derive(Debug, Clone, Default)]
pub struct Neuron {
    id: ElementId,
    pub name: String,
    pub bias: f64,
    pub transfer_function: Option<TransferFunction>,
    pub activation_function: Option<ActivationFunction>,
    pub tags: Tags,
    pub position: Position,
    pub(crate) activation: f64,
    pub(crate) output: f64,
    pub(crate) last_activation: f64,
    pub(crate) last_output: f64,
    pub(crate) computed: bool,
    pub(crate) flip: bool,
    pub(crate) window: Window,
    pub(crate) incoming: Vec<ElementId>,
    pub(crate) outgoing: Vec<ElementId>,
}

impl Neuron {
    /// A neuron without functions of its own; it takes the network's defaults when added.
    pub fn new(id: ElementId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_functions(
        id: ElementId,
        name: impl Into<String>,
        transfer: TransferFunction,
        activation: ActivationFunction,
    ) -> Self {
        Self {
            transfer_function: Some(transfer),
            activation_function: Some(activation),
            ..Self::new(id, name)
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn activation(&self) -> f64 {
        self.activation
    }

    pub fn output(&self) -> f64 {
        self.output
    }

    pub fn last_activation(&self) -> f64 {
        self.last_activation
    }

    /// Output as of the last snapshot, which is what synapses read.
    pub fn last_output(&self) -> f64 {
        self.last_output
    }

    /// Overwrite the current state, as input injection does.
    pub fn set_state(&mut self, activation: f64, output: f64) {
        self.activation = activation;
        self.output = output;
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn is_flipped(&self) -> bool {
        self.flip
    }

    pub fn is_input(&self) -> bool {
        self.tags.has(Marker::Input)
    }

    pub fn is_output(&self) -> bool {
        self.tags.has(Marker::Output)
    }

    pub fn incoming(&self) -> &[ElementId] {
        &self.incoming
    }

    pub fn outgoing(&self) -> &[ElementId] {
        &self.outgoing
    }

    /// Snapshot the current state for the next iteration.
    pub(crate) fn prepare(&mut self) {
        self.last_activation = self.activation;
        self.last_output = self.output;
        self.computed = false;
    }

    pub(crate) fn reset(&mut self) {
        self.flip = self.tags.has(Marker::FlipActivity);
        self.activation = 0.;
        self.output = 0.;
        self.last_activation = 0.;
        self.last_output = 0.;
        self.computed = false;
        if let Some(f) = self.transfer_function.as_mut() {
            f.reset();
        }
        if let Some(f) = self.activation_function.as_mut() {
            f.reset();
        }
    }
}
