use crate::network::{ElementId, Network};
use core::fmt;
use std::{collections::BTreeMap, mem, rc::Rc};

/// What an individual is made of.
#[derive(Debug, Clone)]
pub enum Genome {
    Network(Box<Network>),
    /// A plain parameter vector, for experiments that don't evolve topologies
    Parameters(Vec<f64>),
}

/// A structural change recorded for lineage bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeRecord {
    RemovedNeuron(ElementId),
    RemovedSynapse(ElementId),
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeRecord::RemovedNeuron(id) => write!(f, "N:{id}:rN"),
            ChangeRecord::RemovedSynapse(id) => write!(f, "S:{id}:rS"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Individual {
    pub id: u64,
    pub genome: Option<Genome>,
    pub parents: Vec<Rc<Individual>>,
    /// Protected genomes are never mutated
    pub genome_protected: bool,
    /// Generation of the last structural change
    pub significant_change: Option<u64>,
    pub changes: Vec<ChangeRecord>,
    pub properties: BTreeMap<String, String>,
}

impl Individual {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn with_network(id: u64, network: Network) -> Self {
        Self {
            genome: Some(Genome::Network(Box::new(network))),
            ..Self::new(id)
        }
    }

    pub fn network(&self) -> Option<&Network> {
        match &self.genome {
            Some(Genome::Network(n)) => Some(n),
            _ => None,
        }
    }

    pub fn network_mut(&mut self) -> Option<&mut Network> {
        match &mut self.genome {
            Some(Genome::Network(n)) => Some(n),
            _ => None,
        }
    }

    pub fn mark_significant_change(&mut self, generation: u64) {
        self.significant_change = Some(generation);
    }

    /// Comma separated summary of the recorded changes, which are cleared.
    pub fn take_change_summary(&mut self) -> String {
        mem::take(&mut self.changes)
            .iter()
            .map(ChangeRecord::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}
