use super::Operator;
use crate::{
    context::Context,
    individual::{Genome, Individual},
};
use serde::{Deserialize, Serialize};

/// Gives a genome-less offspring a copy of its first parent's network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloneFromParent {}

impl Operator for CloneFromParent {
    fn name(&self) -> &'static str {
        "CloneFromParent"
    }

    fn apply(&self, individual: &mut Individual, _ctx: &mut Context) -> bool {
        if individual.genome.is_some() {
            return true;
        }
        let Some(parent) = individual.parents.first() else {
            return true;
        };
        let copy = match &parent.genome {
            Some(Genome::Network(net)) => net.create_copy(),
            Some(Genome::Parameters(_)) => {
                tracing::debug!(
                    individual = individual.id,
                    parent = parent.id,
                    "parent genome is not a network"
                );
                return false;
            }
            None => return true,
        };
        individual.genome = Some(Genome::Network(Box::new(copy)));
        true
    }
}
