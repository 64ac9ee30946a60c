//! Seeded random number helper for the search loops.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;

/// A small, fast RNG with memoized integer distributions.
///
/// The annealer draws bounded indices with a handful of distinct bounds
/// (library size, name-group sizes, circuit length) millions of times per
/// run, so the uniform distributions are cached per upper bound.
#[derive(Debug, Clone)]
pub struct RngHelper {
    rng: SmallRng,
    uniforms: FxHashMap<usize, Uniform<usize>>,
}

impl RngHelper {
    /// Helper with an explicit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            uniforms: FxHashMap::default(),
        }
    }

    /// Deterministic per-worker seeding: distinct across workers of one run
    /// and across successive runs.
    pub fn for_worker(worker: usize, run: usize, threads: usize) -> Self {
        Self::new((worker + run * threads) as u64)
    }

    /// Uniform draw from `[0, 1)`.
    pub fn random01(&mut self) -> f64 {
        self.rng.r#gen()
    }

    /// Uniform index in `0..n`. `n` must be positive.
    pub fn random_index(&mut self, n: usize) -> usize {
        let dist = self
            .uniforms
            .entry(n)
            .or_insert_with(|| Uniform::new(0, n));
        dist.sample(&mut self.rng)
    }
}
