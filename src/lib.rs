#[macro_use]
mod macros;

pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod expr;
pub mod individual;
pub mod network;
pub mod operator;
pub mod random;

pub use config::{ChainConfig, OperatorConfig, OperatorEntry};
pub use context::Context;
pub use error::{ConfigError, ExprError};
pub use individual::{ChangeRecord, Genome, Individual};
pub use network::{Controller, ElementId, Marker, Network, Neuron, Synapse, SynapseTarget};
pub use operator::{ManipulationChain, Operator, OperatorSettings};
pub use random::Random;
