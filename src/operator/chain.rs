use super::{Operator, OperatorSettings, OperatorStats};
use crate::{
    constants::{NC_CHAIN_MAX_RETRIES, NC_PROP_MUTATION_HISTORY},
    context::Context,
    individual::{Genome, Individual},
};
use std::time::Instant;

#[derive(Debug)]
pub struct ChainEntry {
    pub settings: OperatorSettings,
    pub stats: OperatorStats,
    operator: Box<dyn Operator>,
}

impl ChainEntry {
    pub fn operator(&self) -> &dyn Operator {
        self.operator.as_ref()
    }
}

/// Runs a sequence of operators over individuals, retrying while any of them rejects.
#[derive(Debug)]
pub struct ManipulationChain {
    entries: Vec<ChainEntry>,
    pub max_retries: usize,
    /// Append each successful change summary to the network's mutation history
    pub record_history: bool,
}

impl Default for ManipulationChain {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            max_retries: NC_CHAIN_MAX_RETRIES,
            record_history: false,
        }
    }
}

impl ManipulationChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an operator, keeping the chain ordered by index. Equal indices keep insertion
    /// order.
    pub fn push(&mut self, operator: impl Operator + 'static, settings: OperatorSettings) {
        self.push_boxed(Box::new(operator), settings);
    }

    pub fn push_boxed(&mut self, operator: Box<dyn Operator>, settings: OperatorSettings) {
        let at = self
            .entries
            .partition_point(|e| e.settings.index <= settings.index);
        self.entries.insert(
            at,
            ChainEntry {
                settings,
                stats: OperatorStats::default(),
                operator,
            },
        );
    }

    pub fn entries(&self) -> &[ChainEntry] {
        &self.entries
    }

    /// Settings of the operator called `name`, for switching it on or off between generations.
    pub fn settings_mut(&mut self, name: &str) -> Option<&mut OperatorSettings> {
        self.entries
            .iter_mut()
            .find(|e| e.operator.name() == name)
            .map(|e| &mut e.settings)
    }

    pub fn reset_stats(&mut self) {
        for e in &mut self.entries {
            e.stats = OperatorStats::default();
        }
    }

    /// Mutates one individual. `false` means no attempt got through the chain without a
    /// rejection and the individual should be discarded; protected genomes are left alone and
    /// count as success.
    pub fn apply(&mut self, individual: &mut Individual, ctx: &mut Context) -> bool {
        if individual.genome_protected {
            return true;
        }
        if matches!(individual.genome, Some(Genome::Parameters(_))) {
            tracing::warn!(individual = individual.id, "chain can only handle network genomes");
            return false;
        }

        let mut valid = false;
        for attempt in 0..self.max_retries {
            let mut applicable = false;
            valid = true;
            for entry in &mut self.entries {
                if !entry.settings.enabled || entry.settings.max_applications <= attempt {
                    continue;
                }
                applicable = true;
                let started = Instant::now();
                let accepted = entry.operator.apply(individual, ctx);
                entry.stats.applications += 1;
                entry.stats.elapsed += started.elapsed();
                if !accepted {
                    entry.stats.rejections += 1;
                    valid = false;
                    tracing::debug!(
                        individual = individual.id,
                        attempt,
                        operator = entry.operator.name(),
                        "operator rejected"
                    );
                }
            }
            if !applicable {
                valid = false;
                break;
            }
            if valid {
                break;
            }
        }

        let summary = individual.take_change_summary();
        if !valid {
            tracing::debug!(individual = individual.id, "no valid mutation found");
            return false;
        }

        let record = self.record_history && !summary.is_empty();
        if let Some(net) = individual.network_mut() {
            if record {
                let mut history = net
                    .tags
                    .property(NC_PROP_MUTATION_HISTORY)
                    .unwrap_or_default()
                    .trim()
                    .to_owned();
                history.push_str(&format!("|{}:{summary}", ctx.generation));
                net.tags.set_property(NC_PROP_MUTATION_HISTORY, history);
            }
            net.clear_transient_markers();
        }
        true
    }

    /// Mutates every individual and takes the ones that failed out of `individuals`.
    pub fn apply_all(
        &mut self,
        individuals: &mut Vec<Individual>,
        ctx: &mut Context,
    ) -> Vec<Individual> {
        let mut rejected = Vec::new();
        let mut kept = Vec::with_capacity(individuals.len());
        for mut individual in individuals.drain(..) {
            if self.apply(&mut individual, ctx) {
                kept.push(individual);
            } else {
                rejected.push(individual);
            }
        }
        *individuals = kept;
        rejected
    }
}
