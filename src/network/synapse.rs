use super::{
    element::{ElementId, SynapseTarget, Tags, Window},
    function::SynapseFunction,
};

/// A weighted connection from one neuron into a neuron or into another synapse.
#[derive(Debug, Clone)]
pub struct Synapse {
    id: ElementId,
    pub strength: f64,
    pub enabled: bool,
    pub function: Option<SynapseFunction>,
    pub tags: Tags,
    pub(crate) source: Option<ElementId>,
    pub(crate) target: SynapseTarget,
    pub(crate) activation: f64,
    pub(crate) window: Window,
    pub(crate) incoming: Vec<ElementId>,
}

impl Synapse {
    pub fn new(id: ElementId, source: ElementId, target: SynapseTarget, strength: f64) -> Self {
        Self {
            id,
            strength,
            enabled: true,
            function: None,
            tags: Tags::default(),
            source: Some(source),
            target,
            activation: 0.,
            window: Window::default(),
            incoming: Vec::new(),
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    /// `None` once the synapse has been detached by removal.
    pub fn source(&self) -> Option<ElementId> {
        self.source
    }

    pub fn target(&self) -> SynapseTarget {
        self.target
    }

    /// Contribution computed during the last update.
    pub fn activation(&self) -> f64 {
        self.activation
    }

    pub fn window(&self) -> Window {
        self.window
    }

    /// Higher-order synapses targeting this one.
    pub fn incoming(&self) -> &[ElementId] {
        &self.incoming
    }

    /// `source_output × function(strength, modulation)`; a disabled synapse still runs its
    /// function but contributes nothing.
    pub(crate) fn calculate(&mut self, source_output: f64, modulation: f64) -> f64 {
        let weight = match self.function.as_mut() {
            Some(f) => f.calculate(self.strength, modulation),
            None => 0.,
        };
        self.activation = if self.enabled {
            source_output * weight
        } else {
            0.
        };
        self.activation
    }

    pub(crate) fn reset(&mut self) {
        self.activation = 0.;
        if let Some(f) = self.function.as_mut() {
            f.reset();
        }
    }
}
