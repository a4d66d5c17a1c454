//! Numeric strategies of neurons and synapses. Each kind is a closed set of variants; a
//! network holds one default of each kind and hands out clones of it.

use crate::constants::NC_STEEP_SIGMOID_SLOPE;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maps an activation onto the output range of a neuron.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum TransferFunction {
    #[default]
    Tanh,
    Sigmoid,
    SteepSigmoid,
    Ramp { lower: f64, upper: f64 },
}

impl TransferFunction {
    pub fn lower_bound(&self) -> f64 {
        match self {
            TransferFunction::Tanh => -1.,
            TransferFunction::Sigmoid | TransferFunction::SteepSigmoid => 0.,
            TransferFunction::Ramp { lower, upper } => lower.min(*upper),
        }
    }

    pub fn upper_bound(&self) -> f64 {
        match self {
            TransferFunction::Tanh | TransferFunction::Sigmoid | TransferFunction::SteepSigmoid => {
                1.
            }
            TransferFunction::Ramp { lower, upper } => upper.max(*lower),
        }
    }

    pub fn transfer(&self, activation: f64) -> f64 {
        match self {
            TransferFunction::Tanh => activation.tanh(),
            TransferFunction::Sigmoid => 1. / (1. + (-activation).exp()),
            TransferFunction::SteepSigmoid => 1. / (1. + (-NC_STEEP_SIGMOID_SLOPE * activation).exp()),
            TransferFunction::Ramp { .. } => {
                activation.clamp(self.lower_bound(), self.upper_bound())
            }
        }
    }

    /// Transfer functions are stateless, resetting only exists for symmetry with the other kinds.
    pub fn reset(&mut self) {}
}

/// Combines bias, net input and history into a neuron's activation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum ActivationFunction {
    /// `bias + input`
    #[default]
    Additive,
    /// Leaky integration towards `bias + input` with time constant `tau`
    Leaky { tau: f64 },
    /// Additive, but the result surfaces `delay` calls later
    Delayed {
        delay: usize,
        #[serde(skip)]
        history: VecDeque<f64>,
    },
}

impl ActivationFunction {
    pub fn delayed(delay: usize) -> Self {
        ActivationFunction::Delayed {
            delay,
            history: VecDeque::with_capacity(delay + 1),
        }
    }

    pub fn calculate(&mut self, bias: f64, last_activation: f64, input: f64) -> f64 {
        match self {
            ActivationFunction::Additive => bias + input,
            ActivationFunction::Leaky { tau } => {
                last_activation + (bias + input - last_activation) / tau.max(1.)
            }
            ActivationFunction::Delayed { delay, history } => {
                history.push_back(bias + input);
                if history.len() > *delay {
                    history.pop_front().unwrap_or_default()
                } else {
                    0.
                }
            }
        }
    }

    pub fn reset(&mut self) {
        if let ActivationFunction::Delayed { history, .. } = self {
            history.clear();
        }
    }
}

/// Compares parameters only, never the runtime history.
impl PartialEq for ActivationFunction {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ActivationFunction::Additive, ActivationFunction::Additive) => true,
            (ActivationFunction::Leaky { tau: l }, ActivationFunction::Leaky { tau: r }) => l == r,
            (
                ActivationFunction::Delayed { delay: l, .. },
                ActivationFunction::Delayed { delay: r, .. },
            ) => l == r,
            _ => false,
        }
    }
}

/// Computes the effective weight of a synapse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum SynapseFunction {
    /// The strength, as is
    #[default]
    Simple,
    /// The strength shifted by the summed activation of higher-order synapses
    Modulated,
}

impl SynapseFunction {
    pub fn calculate(&mut self, strength: f64, modulation: f64) -> f64 {
        match self {
            SynapseFunction::Simple => strength,
            SynapseFunction::Modulated => strength + modulation,
        }
    }

    pub fn reset(&mut self) {}
}
