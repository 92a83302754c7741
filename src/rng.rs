//! Randomness source for game outcomes
//!
//! Outcomes are drawn from a SHA-256 hash chain seeded with OS entropy.
//! The stream is never exposed to clients, only the outcomes derived from
//! it, and a fixed-seed constructor gives tests reproducible draws.

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Uniform draws consumed by the game models.
pub trait Dice {
    /// Uniform float in [0, 1).
    fn uniform(&mut self) -> f64;

    /// Uniform integer in [0, n). Returns 0 when n <= 1.
    fn uniform_int(&mut self, n: u32) -> u32;

    /// Fisher-Yates shuffle, every permutation equally likely.
    fn shuffle<T>(&mut self, items: &mut [T])
    where
        Self: Sized,
    {
        for i in (1..items.len()).rev() {
            let j = self.uniform_int(i as u32 + 1) as usize;
            items.swap(i, j);
        }
    }
}

/// Hash-chain generator: each block of output is the SHA-256 of the
/// previous block, starting from the seed.
pub struct HashDice {
    seed: [u8; 32],
    block: [u8; 32],
    cursor: usize,
}

impl HashDice {
    /// Seed a new generator from OS entropy.
    pub fn from_entropy() -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        Self::from_seed(seed)
    }

    /// Deterministic generator for tests.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        // cursor at the end forces a hash before the first draw, so raw
        // seed bytes never appear in the output stream
        Self {
            seed,
            block: seed,
            cursor: 32,
        }
    }

    /// Short hex prefix of the seed, for debug logs.
    pub fn seed_prefix(&self) -> String {
        hex::encode(&self.seed[..4])
    }

    fn next_u64(&mut self) -> u64 {
        if self.cursor + 8 > self.block.len() {
            self.block = Sha256::digest(self.block).into();
            self.cursor = 0;
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.block[self.cursor..self.cursor + 8]);
        self.cursor += 8;
        u64::from_le_bytes(bytes)
    }
}

impl Dice for HashDice {
    fn uniform(&mut self) -> f64 {
        // top 53 bits, the full precision of an f64 mantissa
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    fn uniform_int(&mut self, n: u32) -> u32 {
        if n <= 1 {
            return 0;
        }
        // rejection sampling to avoid modulo bias
        let n = n as u64;
        let zone = u64::MAX - (u64::MAX % n);
        loop {
            let draw = self.next_u64();
            if draw < zone {
                return (draw % n) as u32;
            }
        }
    }
}
