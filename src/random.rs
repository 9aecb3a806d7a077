//! Deterministic pseudo-random source
//!
//! Every scheduling decision draws from a [`SeededRandom`]. For a fixed seed
//! the sequence is bit-for-bit identical on every platform, which is what
//! lets a preview and the executed run agree exactly.
//!
//! The generator is mulberry32: a 32-bit state advanced by a Weyl increment
//! and mixed with two multiply-xorshift rounds. Its period is 2^32 draws.

use rand::Rng;

const WEYL_INCREMENT: u32 = 0x6D2B_79F5;
const TWO_POW_32: f64 = 4_294_967_296.0;

/// Seed used when a configuration does not carry one
pub const DEFAULT_SEED: u64 = 12345;

/// Seeded random stream producing values in `[0, 1)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRandom {
    state: u32,
}

impl SeededRandom {
    /// Create a stream from a seed. Seeds wider than 32 bits are folded.
    pub fn new(seed: u64) -> Self {
        let folded = (seed as u32) ^ ((seed >> 32) as u32);
        Self { state: folded }
    }

    /// Next raw 32-bit output
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(WEYL_INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Next value in the half-open interval `[0, 1)`
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / TWO_POW_32
    }

    /// Uniform integer in `[0, n)` consuming exactly one draw.
    ///
    /// Returns 0 when `n` is 0 (the draw is still consumed).
    pub fn next_below(&mut self, n: u32) -> u32 {
        let value = (self.next_f64() * f64::from(n)).floor() as u32;
        value.min(n.saturating_sub(1))
    }

    /// Uniform integer in `[low, high)` consuming exactly one draw
    pub fn next_in_range(&mut self, low: u32, high: u32) -> u32 {
        low + self.next_below(high.saturating_sub(low))
    }

    /// True with probability `p`, consuming exactly one draw
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Derive an independent stream for a secondary purpose.
    ///
    /// The derived stream never shares draws with `seed`'s own stream.
    pub fn derived(seed: u64, salt: u32) -> Self {
        let mut mixer = Self::new(seed ^ u64::from(salt).rotate_left(17));
        let state = mixer.next_u32();
        Self { state }
    }
}

/// Produce a new seed for display and reuse.
///
/// Only called when the user explicitly asks for re-randomization.
pub fn fresh_seed() -> u64 {
    rand::rng().random_range(1..1_000_000)
}
