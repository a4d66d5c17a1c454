//! The run-wide random source. Every stochastic decision in the crate draws from one
//! [Random], so a whole run is reproducible from its seed.

use core::cmp::min;
use rand::{Rng, RngCore};
use rand_distr::{Distribution, Normal};
use std::{
    fs::File,
    io::{self, Read},
};

#[derive(Debug, Clone)]
pub struct WyRng {
    state: u64,
}

impl WyRng {
    pub fn seeded(state: u64) -> Self {
        Self { state }
    }
}

impl RngCore for WyRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    fn next_u64(&mut self) -> u64 {
        const WY_CONST_0: u64 = 0x2d35_8dcc_aa6c_78a5;
        const WY_CONST_1: u64 = 0x8bb8_4b93_962e_acc9;
        self.state = self.state.wrapping_add(WY_CONST_0);
        let t = u128::from(self.state) * u128::from(self.state ^ WY_CONST_1);
        (t as u64) ^ (t >> 64) as u64
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        let mut idx = 0;
        while idx < dst.len() {
            let lim = min(8, dst.len() - idx);
            dst[idx..idx + lim].copy_from_slice(&self.next_u64().to_ne_bytes()[..lim]);
            idx += lim;
        }
    }
}

pub fn seed_urandom() -> io::Result<u64> {
    let mut file = File::open("/dev/urandom")?;
    let mut buffer = [0u8; 8];
    file.read_exact(&mut buffer)?;
    Ok(u64::from_le_bytes(buffer))
}

/// Uniform, gaussian, sign and index draws over a seeded [WyRng].
#[derive(Debug, Clone)]
pub struct Random {
    seed: u64,
    rng: WyRng,
}

impl Random {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed,
            rng: WyRng::seeded(seed),
        }
    }

    /// Seeded from the OS entropy pool, falling back to the clock if it can't be read.
    pub fn from_entropy() -> Self {
        let seed = seed_urandom().unwrap_or_else(|e| {
            tracing::warn!("could not read /dev/urandom ({e}), seeding from the clock");
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default()
        });
        Self::seeded(seed)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restart the sequence from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        *self = Self::seeded(seed);
    }

    /// Uniform in `[0, 1)`.
    pub fn next_double(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Uniform in `[0, n)`, or 0 when `n` is 0.
    pub fn next_int(&mut self, n: usize) -> usize {
        if n == 0 {
            0
        } else {
            self.rng.random_range(0..n)
        }
    }

    /// Either `1.0` or `-1.0`.
    pub fn next_sign(&mut self) -> f64 {
        if self.rng.random::<bool>() {
            1.
        } else {
            -1.
        }
    }

    /// Normally distributed around 0 with standard deviation `deviation`.
    pub fn gaussian(&mut self, deviation: f64) -> f64 {
        match Normal::new(0., deviation) {
            Ok(normal) if deviation > 0. => normal.sample(&mut self.rng),
            _ => 0.,
        }
    }

    /// Uniform in `[-deviation, deviation)`.
    pub fn uniform(&mut self, deviation: f64) -> f64 {
        if deviation > 0. && deviation.is_finite() {
            self.rng.random_range(-deviation..deviation)
        } else {
            0.
        }
    }

    /// `true` with probability `p`.
    pub fn happens(&mut self, p: f64) -> bool {
        self.next_double() < p
    }
}

impl RngCore for Random {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        self.rng.fill_bytes(dst)
    }
}
