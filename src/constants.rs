//! Centralized defaults for the network engine and the mutation operators.
//!
//! Every configurable parameter is defined here with the `NC_` prefix; configuration
//! documents fall back to these when a field is missing.

// ============================================================================
// Scheduling
// ============================================================================

/// First iteration of a default scheduling window
pub const NC_WINDOW_START: i32 = 0;

/// Iterations a default scheduling window stays open
pub const NC_WINDOW_REQUIRED: u32 = 1;

/// Slope of the steep sigmoid transfer function
pub const NC_STEEP_SIGMOID_SLOPE: f64 = 4.9;

// ============================================================================
// Operator Settings
// ============================================================================

/// Position of an operator within a manipulation chain, lower runs first
pub const NC_OPERATOR_INDEX: i32 = 10;

/// Chain attempt after which an operator is no longer applied
pub const NC_OPERATOR_MAX_APPLICATIONS: usize = 15;

/// Attempts a chain makes before giving up on an individual
pub const NC_CHAIN_MAX_RETRIES: usize = 15;

// ============================================================================
// Bias Mutation
// ============================================================================

/// Probability of mutating the bias of an eligible neuron
pub const NC_BIAS_CHANGE_PROB: f64 = 0.5;

/// Probability of toggling a bias off (stashing it) or back on
pub const NC_BIAS_TOGGLE_DISABLE_PROB: f64 = 0.0;

/// Probability of flagging a neuron for bias re-initialization
pub const NC_BIAS_REINIT_PROB: f64 = 0.0;

/// Lower clamp for mutated biases
pub const NC_BIAS_MIN: f64 = -10.0;

/// Upper clamp for mutated biases
pub const NC_BIAS_MAX: f64 = 10.0;

/// Deviation of bias perturbations
pub const NC_BIAS_DEVIATION: f64 = 1.0;

/// Whether bias perturbations are gaussian rather than uniform
pub const NC_BIAS_USE_GAUSS: bool = true;

// ============================================================================
// Synapse Strength Mutation
// ============================================================================

/// Probability of mutating the strength of an eligible synapse
pub const NC_STRENGTH_CHANGE_PROB: f64 = 0.5;

/// Probability of reversing the momentum of a strength perturbation
pub const NC_STRENGTH_DIRECTION_TOGGLE_PROB: f64 = 0.5;

/// Probability of flipping a synapse between excitatory and inhibitory
pub const NC_STRENGTH_SIGN_CHANGE_PROB: f64 = 0.01;

/// Probability of resetting a strength to zero
pub const NC_STRENGTH_REINIT_PROB: f64 = 0.0;

/// Lower clamp for mutated strengths
pub const NC_STRENGTH_MIN: f64 = -10.0;

/// Upper clamp for mutated strengths
pub const NC_STRENGTH_MAX: f64 = 10.0;

/// Deviation of strength perturbations
pub const NC_STRENGTH_DEVIATION: f64 = 1.0;

/// Whether strength perturbations are gaussian rather than uniform
pub const NC_STRENGTH_USE_GAUSS: bool = true;

/// Whether a perturbation may push a strength across zero
pub const NC_STRENGTH_ALLOW_DYNAMIC_SIGN_CHANGES: bool = true;

/// Halvings tried before a sign-locked perturbation is abandoned
pub const NC_STRENGTH_SIGN_LOCK_ATTEMPTS: usize = 64;

// ============================================================================
// Neuron Insertion / Removal
// ============================================================================

/// Hidden neurons a network may hold before insertion stops
pub const NC_INSERT_NEURON_MAX_HIDDEN: usize = 50;

/// Insertion attempts per application
pub const NC_INSERT_NEURON_MAX_NEW: usize = 5;

/// Probability of each insertion attempt succeeding
pub const NC_INSERT_NEURON_PROB: f64 = 0.5;

/// Probability of placing a new neuron into a module
pub const NC_INSERT_NEURON_MODULE_PROB: f64 = 1.0;

/// Share of possible connections an initializer should give a new neuron
pub const NC_INSERT_NEURON_INIT_CONNECTION_PROPORTION: f64 = 0.3;

/// Margin kept between a new neuron and the border of its module
pub const NC_MODULE_LAYOUT_MARGIN: f64 = 10.0;

/// Probability of each removal attempt succeeding
pub const NC_REMOVE_NEURON_PROB: f64 = 0.5;

/// Removal attempts per application
pub const NC_REMOVE_NEURON_MAX: usize = 5;

// ============================================================================
// Synapse Insertion / Removal / Toggling
// ============================================================================

/// Probability of each synapse insertion attempt succeeding
pub const NC_INSERT_SYNAPSE_PROB: f64 = 0.5;

/// Synapse insertion attempts per application
pub const NC_INSERT_SYNAPSE_MAX_NEW: usize = 10;

/// Whether new synapses may target other synapses
pub const NC_INSERT_SYNAPSE_ALLOW_HIGHER_ORDER: bool = false;

/// Probability of each synapse removal attempt succeeding
pub const NC_REMOVE_SYNAPSE_PROB: f64 = 0.5;

/// Synapse removal attempts per application
pub const NC_REMOVE_SYNAPSE_MAX: usize = 5;

/// Probability of re-enabling a disabled synapse
pub const NC_ENABLE_SYNAPSE_PROB: f64 = 0.1;

/// Probability of disabling an enabled synapse
pub const NC_DISABLE_SYNAPSE_PROB: f64 = 0.05;

// ============================================================================
// Local Override Expressions
// ============================================================================

/// Nesting levels (unary signs, parentheses, variables) an expression may use
pub const NC_EXPR_MAX_DEPTH: usize = 64;

/// Variable expansions a single evaluation may perform
pub const NC_EXPR_MAX_EXPANSIONS: usize = 256;

// ============================================================================
// Property Names
// ============================================================================

/// Property naming the class a neuron must connect *from* in connectivity filters
pub const NC_PROP_CONNECTION_SOURCE_CLASS: &str = "ConnectionSourceClass";

/// Property naming the class a neuron must be connected *to* in connectivity filters
pub const NC_PROP_CONNECTION_TARGET_CLASS: &str = "ConnectionTargetClass";

/// Property holding the generation an element was created in
pub const NC_PROP_CREATION_DATE: &str = "CreationDate";

/// Property holding the initial connection proportion of an inserted neuron
pub const NC_PROP_INIT_CONNECTION_PROPORTION: &str = "InitialConnectionProportion";

/// Network property accumulating change summaries of successful chains
pub const NC_PROP_MUTATION_HISTORY: &str = "MutationHistory";
