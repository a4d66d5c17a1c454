use crate::{network::IdGen, random::Random};

/// Run-wide mutable state: id generation, randomness and the generation counter. One context
/// per independent run; two runs from the same seed mutate identically.
#[derive(Debug, Clone)]
pub struct Context {
    pub ids: IdGen,
    pub rng: Random,
    pub generation: u64,
}

impl Context {
    pub fn seeded(seed: u64) -> Self {
        Self {
            ids: IdGen::default(),
            rng: Random::seeded(seed),
            generation: 0,
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            ids: IdGen::default(),
            rng: Random::from_entropy(),
            generation: 0,
        }
    }

    /// Back to the state of a fresh context with `seed`.
    pub fn reset(&mut self, seed: u64) {
        *self = Self::seeded(seed);
    }
}
