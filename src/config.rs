//! JSON configuration of a manipulation chain.
//!
//! ```json
//! {
//!   "max_retries": 10,
//!   "record_history": true,
//!   "operators": [
//!     { "kind": "InsertNeuron", "insertion_probability": 0.2, "settings": { "index": 1 } },
//!     { "kind": "ChangeBias", "deviation": 0.5 }
//!   ]
//! }
//! ```
//!
//! Missing fields take the defaults from [crate::constants].

use crate::{
    constants::NC_CHAIN_MAX_RETRIES,
    error::{ConfigError, ConfigResult},
    operator::*,
};
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum OperatorConfig {
    ChangeBias(ChangeBias),
    ChangeSynapseStrength(ChangeSynapseStrength),
    InsertNeuron(InsertNeuron),
    RemoveNeuron(RemoveNeuron),
    InsertSynapse(InsertSynapse),
    RemoveSynapse(RemoveSynapse),
    EnableSynapse(EnableSynapse),
    DisableSynapse(DisableSynapse),
    CloneFromParent(CloneFromParent),
    ConnectNeuronClasses(ConnectNeuronClasses),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorEntry {
    #[serde(flatten)]
    pub operator: OperatorConfig,
    #[serde(default)]
    pub settings: OperatorSettings,
}

impl OperatorEntry {
    pub fn new(operator: OperatorConfig) -> Self {
        Self {
            operator,
            settings: OperatorSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub max_retries: usize,
    pub record_history: bool,
    pub operators: Vec<OperatorEntry>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            max_retries: NC_CHAIN_MAX_RETRIES,
            record_history: false,
            operators: Vec::new(),
        }
    }
}

fn probability(name: &'static str, p: f64) -> ConfigResult<()> {
    if (0. ..=1.).contains(&p) {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("{p} is not a probability"),
        })
    }
}

fn range(name: &'static str, min: f64, max: f64) -> ConfigResult<()> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("minimum {min} exceeds maximum {max}"),
        })
    }
}

fn deviation(name: &'static str, d: f64) -> ConfigResult<()> {
    if d >= 0. && d.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("{d} is not a usable deviation"),
        })
    }
}

impl OperatorConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        match self {
            OperatorConfig::ChangeBias(op) => {
                probability("change_probability", op.change_probability)?;
                probability("toggle_disable_probability", op.toggle_disable_probability)?;
                probability("reinit_probability", op.reinit_probability)?;
                range("min_bias", op.min_bias, op.max_bias)?;
                deviation("deviation", op.deviation)
            }
            OperatorConfig::ChangeSynapseStrength(op) => {
                probability("change_probability", op.change_probability)?;
                probability(
                    "direction_toggle_probability",
                    op.direction_toggle_probability,
                )?;
                probability("sign_change_probability", op.sign_change_probability)?;
                probability("reinit_probability", op.reinit_probability)?;
                range("min_strength", op.min_strength, op.max_strength)?;
                deviation("deviation", op.deviation)
            }
            OperatorConfig::InsertNeuron(op) => {
                probability("insertion_probability", op.insertion_probability)?;
                probability("add_to_module_probability", op.add_to_module_probability)?;
                probability(
                    "init_connection_proportion",
                    op.init_connection_proportion,
                )
            }
            OperatorConfig::RemoveNeuron(op) => {
                probability("remove_probability", op.remove_probability)
            }
            OperatorConfig::InsertSynapse(op) => {
                probability("insertion_probability", op.insertion_probability)
            }
            OperatorConfig::RemoveSynapse(op) => {
                probability("remove_probability", op.remove_probability)
            }
            OperatorConfig::EnableSynapse(op) => {
                probability("enable_probability", op.enable_probability)
            }
            OperatorConfig::DisableSynapse(op) => {
                probability("disable_probability", op.disable_probability)
            }
            OperatorConfig::CloneFromParent(_) | OperatorConfig::ConnectNeuronClasses(_) => Ok(()),
        }
    }

    pub fn into_operator(self) -> Box<dyn Operator> {
        match self {
            OperatorConfig::ChangeBias(op) => Box::new(op),
            OperatorConfig::ChangeSynapseStrength(op) => Box::new(op),
            OperatorConfig::InsertNeuron(op) => Box::new(op),
            OperatorConfig::RemoveNeuron(op) => Box::new(op),
            OperatorConfig::InsertSynapse(op) => Box::new(op),
            OperatorConfig::RemoveSynapse(op) => Box::new(op),
            OperatorConfig::EnableSynapse(op) => Box::new(op),
            OperatorConfig::DisableSynapse(op) => Box::new(op),
            OperatorConfig::CloneFromParent(op) => Box::new(op),
            OperatorConfig::ConnectNeuronClasses(op) => Box::new(op),
        }
    }
}

impl ChainConfig {
    /// Parameter and structure mutations at their default settings, structural ones first.
    pub fn standard() -> Self {
        let entry = |operator, index| OperatorEntry {
            operator,
            settings: OperatorSettings {
                index,
                ..Default::default()
            },
        };
        Self {
            operators: vec![
                entry(OperatorConfig::CloneFromParent(CloneFromParent::default()), 0),
                entry(OperatorConfig::RemoveNeuron(RemoveNeuron::default()), 1),
                entry(OperatorConfig::RemoveSynapse(RemoveSynapse::default()), 2),
                entry(OperatorConfig::InsertNeuron(InsertNeuron::default()), 3),
                entry(OperatorConfig::InsertSynapse(InsertSynapse::default()), 4),
                entry(OperatorConfig::DisableSynapse(DisableSynapse::default()), 5),
                entry(OperatorConfig::EnableSynapse(EnableSynapse::default()), 6),
                entry(OperatorConfig::ChangeBias(ChangeBias::default()), 7),
                entry(
                    OperatorConfig::ChangeSynapseStrength(ChangeSynapseStrength::default()),
                    8,
                ),
            ],
            ..Default::default()
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        fs::read_to_string(path)?.parse()
    }

    pub fn to_string_pretty(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_retries == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_retries",
                reason: "a chain needs at least one attempt".into(),
            });
        }
        self.operators
            .iter()
            .try_for_each(|entry| entry.operator.validate())
    }

    /// A validated chain with every configured operator.
    pub fn build(&self) -> ConfigResult<ManipulationChain> {
        self.validate()?;
        let mut chain = ManipulationChain::new();
        chain.max_retries = self.max_retries;
        chain.record_history = self.record_history;
        for entry in &self.operators {
            chain.push_boxed(entry.operator.clone().into_operator(), entry.settings);
        }
        Ok(chain)
    }
}

impl FromStr for ChainConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::assert_f64_approx;

    #[test]
    fn test_parse_with_defaults() {
        let config: ChainConfig = r#"{
            "record_history": true,
            "operators": [
                { "kind": "InsertNeuron", "insertion_probability": 0.2, "settings": { "index": 1 } },
                { "kind": "ChangeBias", "deviation": 0.5 },
                { "kind": "CloneFromParent" }
            ]
        }"#
        .parse()
        .unwrap();

        assert_eq!(config.max_retries, NC_CHAIN_MAX_RETRIES);
        assert!(config.record_history);
        let OperatorConfig::InsertNeuron(insert) = &config.operators[0].operator else {
            panic!("expected InsertNeuron")
        };
        assert_f64_approx!(insert.insertion_probability, 0.2);
        assert_eq!(insert.max_new_neurons, InsertNeuron::default().max_new_neurons);
        assert_eq!(config.operators[0].settings.index, 1);
        let OperatorConfig::ChangeBias(bias) = &config.operators[1].operator else {
            panic!("expected ChangeBias")
        };
        assert_f64_approx!(bias.deviation, 0.5);
        assert_eq!(config.operators[1].settings, OperatorSettings::default());

        let chain = config.build().unwrap();
        let names: Vec<_> = chain.entries().iter().map(|e| e.operator().name()).collect();
        assert_eq!(names, ["InsertNeuron", "ChangeBias", "CloneFromParent"]);
        assert!(chain.record_history);
    }

    #[test]
    fn test_invalid_parameters() {
        let config: ChainConfig = r#"{"operators": [{ "kind": "RemoveNeuron", "remove_probability": 1.5 }]}"#
            .parse()
            .unwrap();
        assert!(matches!(
            config.build(),
            Err(ConfigError::InvalidParameter {
                name: "remove_probability",
                ..
            })
        ));

        let config: ChainConfig =
            r#"{"operators": [{ "kind": "ChangeBias", "min_bias": 2, "max_bias": 1 }]}"#
                .parse()
                .unwrap();
        assert!(matches!(
            config.build(),
            Err(ConfigError::InvalidParameter {
                name: "min_bias",
                ..
            })
        ));

        let config: ChainConfig = r#"{"max_retries": 0}"#.parse().unwrap();
        assert!(config.build().is_err());
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            r#"{"operators": [{ "kind": "Teleport" }]}"#.parse::<ChainConfig>(),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            ChainConfig::from_file("/nonexistent/chain.json"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_standard_round_trip() {
        let standard = ChainConfig::standard();
        let text = standard.to_string_pretty().unwrap();
        assert_eq!(text.parse::<ChainConfig>().unwrap(), standard);
        assert_eq!(standard.build().unwrap().entries().len(), 9);
    }
}
