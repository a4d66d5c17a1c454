use super::element::{ElementId, Position, Tags};

/// A named group of neurons with a layout area.
#[derive(Debug, Clone, PartialEq)]
pub struct NeuroModule {
    id: ElementId,
    pub name: String,
    pub tags: Tags,
    pub position: Position,
    pub width: f64,
    pub height: f64,
    pub(crate) neurons: Vec<ElementId>,
}

impl NeuroModule {
    pub fn new(id: ElementId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            tags: Tags::default(),
            position: Position::default(),
            width: 0.,
            height: 0.,
            neurons: Vec::new(),
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn neurons(&self) -> &[ElementId] {
        &self.neurons
    }

    pub fn contains(&self, neuron: ElementId) -> bool {
        self.neurons.contains(&neuron)
    }
}
