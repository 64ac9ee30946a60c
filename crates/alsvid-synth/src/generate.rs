//! Start-circuit generation for the outer search loop.

use alsvid_ir::{Circuit, GateLibrary, MaintainerKind};
use std::sync::Arc;
use tracing::debug;

use crate::mutate::Mutator;
use crate::rng::RngHelper;

/// Adaptive bounds on the length of freshly started circuits.
///
/// Every found solution pulls both bounds toward a small multiple of the
/// best gate count seen so far. Bounds that sit below their pull target
/// creep up by a `beta` fraction of the gap per solution, so one lucky
/// short find does not trap the search in a window it cannot match again.
#[derive(Debug, Clone)]
pub struct GateWindowScheme {
    min_start: usize,
    max_start: usize,
    min_len: usize,
    max_len: usize,
    best: usize,
    beta: f64,
    factor_min: f64,
    factor_max: f64,
}

impl Default for GateWindowScheme {
    fn default() -> Self {
        Self::new(30, 120, 0.05, 2.5, 3.5)
    }
}

impl GateWindowScheme {
    pub fn new(
        min_start: usize,
        max_start: usize,
        beta: f64,
        factor_min: f64,
        factor_max: f64,
    ) -> Self {
        Self {
            min_start,
            max_start,
            min_len: min_start,
            max_len: max_start,
            best: max_start,
            beta,
            factor_min,
            factor_max,
        }
    }

    /// Restores the starting bounds.
    pub fn reset(&mut self) {
        self.min_len = self.min_start;
        self.max_len = self.max_start;
        self.best = self.max_start;
    }

    /// Folds the gate count of a found solution into the bounds.
    pub fn update(&mut self, gate_count: usize) {
        self.best = self.best.min(gate_count);
        self.max_len = Self::pull(self.max_len, self.factor_max * self.best as f64, self.beta);
        self.min_len = Self::pull(self.min_len, self.factor_min * self.best as f64, self.beta);
        debug!(
            best = self.best,
            min = self.min_len,
            max = self.max_len,
            "start-length window updated"
        );
    }

    fn pull(bound: usize, target: f64, beta: f64) -> usize {
        let target_trunc = target as usize;
        if target_trunc > bound {
            bound + 1.max((beta * (target - bound as f64)) as usize)
        } else {
            target_trunc
        }
    }

    /// Draws a start length from the current window.
    pub fn sample(&self, rng: &mut RngHelper) -> usize {
        if self.max_len <= self.min_len {
            return self.max_len.max(1);
        }
        rng.random_index(self.max_len - self.min_len) + self.min_len + 1
    }

    /// Current lower bound.
    pub fn min_len(&self) -> usize {
        self.min_len
    }

    /// Current upper bound.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Best gate count folded in so far.
    pub fn best(&self) -> usize {
        self.best
    }
}

/// Random start circuits with a controlled identity density.
#[derive(Debug, Clone, Copy)]
pub struct RandomCircuitGen {
    /// Fraction of positions left as identity, on average.
    pub p_identity: f64,
}

impl RandomCircuitGen {
    pub fn new(p_identity: f64) -> Self {
        Self { p_identity }
    }

    /// Fresh circuit of length `len` filled by the proposal sampler.
    ///
    /// Matrix upkeep is off while filling; the unitary is computed once at
    /// the end.
    pub fn generate(
        &self,
        lib: &Arc<GateLibrary>,
        len: usize,
        kind: MaintainerKind,
        rng: &mut RngHelper,
    ) -> Circuit {
        let mutator = Mutator {
            p_identity: self.p_identity,
            p_composite: 1.0,
            p_name: 0.5,
        };
        let mut circuit = Circuit::identity(Arc::clone(lib), len, kind);
        circuit.suspend_tracking();
        for position in 0..len {
            mutator.propose_at(&mut circuit, position, rng);
        }
        circuit.resume_tracking();
        circuit
    }
}
