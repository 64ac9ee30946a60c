//! Multithreaded outer loop: restart, anneal, clean up, collect.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use alsvid_ir::{Circuit, GateLibrary, MaintainerKind};
use tracing::{debug, info};

use crate::anneal::SearchEngine;
use crate::cost::{EqualityCost, ExactEquality};
use crate::error::SynthResult;
use crate::generate::{GateWindowScheme, RandomCircuitGen};
use crate::mutate::Mutator;
use crate::resynth::Resynthesizer;
use crate::rng::RngHelper;
use crate::target::{PartialMatrix, SymmetryClass};

/// Knobs of the synthesis loop. The defaults match the values the search
/// was tuned with; most uses only touch `threads`, `time_limit` and
/// `max_solutions`.
#[derive(Debug, Clone)]
pub struct SynthConfig {
    /// Worker threads running independent chains.
    pub threads: usize,
    /// Wall-clock budget for the whole run.
    pub time_limit: Duration,
    /// Stop after this many solutions have been collected.
    pub max_solutions: usize,
    /// Identity probability of proposals and start circuits.
    pub p_identity: f64,
    /// Weight of composite gates relative to basic ones in proposals.
    pub p_composite: f64,
    /// Name-first draw region of the proposal sampler.
    pub p_name: f64,
    /// Start temperature before scaling by the register dimension.
    pub start_temp_base: f64,
    /// Cooling denominator per circuit position.
    pub temp_normalizer: f64,
    /// Annealing trials per circuit position and register qubit.
    pub iterations_factor: f64,
    /// Exact-equality tolerance.
    pub tolerance: f64,
    /// Use the cheaper overlap-only distance instead of the Frobenius one.
    pub simple_cost: bool,
    /// Also accept relabeled and inverted renderings of the target.
    pub use_symmetry: bool,
    /// Strategy for keeping the circuit unitary current during annealing.
    pub maintainer: MaintainerKind,
    /// Clean up found circuits with the peephole pass.
    pub resynthesize: bool,
    /// Replace composite gates by their decompositions before reporting.
    pub expand_composites: bool,
    /// Adapt the start-length window to found solutions.
    pub update_scheme: bool,
    /// Initial lower bound on start-circuit length.
    pub min_start_len: usize,
    /// Initial upper bound on start-circuit length.
    pub max_start_len: usize,
    /// Protect the depth over `depth_gates` during cleanup.
    pub watch_depth: bool,
    /// Largest fusion window of the cleanup pass.
    pub max_window: usize,
    /// Names counted for the t-count and t-depth metrics.
    pub depth_gates: Vec<String>,
    /// Keep only solutions with at most this many gates.
    pub max_gates: Option<usize>,
    /// Keep only solutions with at most this t-count.
    pub max_t_count: Option<usize>,
    /// Keep only solutions with at most this t-depth.
    pub max_t_depth: Option<usize>,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            time_limit: Duration::from_secs(100),
            max_solutions: 10,
            p_identity: 0.3,
            p_composite: 0.2,
            p_name: 0.5,
            start_temp_base: 0.1,
            temp_normalizer: 80.0,
            iterations_factor: 40.0,
            tolerance: 1e-6,
            simple_cost: false,
            use_symmetry: true,
            maintainer: MaintainerKind::Binary,
            resynthesize: true,
            expand_composites: false,
            update_scheme: true,
            min_start_len: 30,
            max_start_len: 120,
            watch_depth: true,
            max_window: 12,
            depth_gates: vec!["t".to_string(), "tdg".to_string()],
            max_gates: None,
            max_t_count: None,
            max_t_depth: None,
        }
    }
}

impl SynthConfig {
    fn has_thresholds(&self) -> bool {
        self.max_gates.is_some() || self.max_t_count.is_some() || self.max_t_depth.is_some()
    }

    fn meets_thresholds(&self, solution: &Solution) -> bool {
        self.max_gates.is_none_or(|limit| solution.gate_count <= limit)
            && self.max_t_count.is_none_or(|limit| solution.t_count <= limit)
            && self.max_t_depth.is_none_or(|limit| solution.t_depth <= limit)
    }
}

/// A circuit implementing the target, with its reporting metrics.
#[derive(Debug, Clone)]
pub struct Solution {
    /// The corrected, cleaned-up circuit.
    pub circuit: Circuit,
    /// Total gate cost.
    pub cost: f64,
    /// Non-identity gates.
    pub gate_count: usize,
    /// Gates matching the configured depth names.
    pub t_count: usize,
    /// Depth over the configured depth names.
    pub t_depth: usize,
    /// Worker that found it.
    pub worker: usize,
}

/// Aggregate outcome of one synthesis run.
#[derive(Debug)]
pub struct SynthReport {
    /// Collected solutions, in discovery order.
    pub solutions: Vec<Solution>,
    /// Annealing restarts across all workers.
    pub attempts: u64,
    /// Restarts that matched the target, kept or not.
    pub successes: u64,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

struct Shared<'a> {
    class: Arc<SymmetryClass>,
    lib: Arc<GateLibrary>,
    config: &'a SynthConfig,
    deadline: Instant,
    stop: AtomicBool,
    attempts: AtomicU64,
    successes: AtomicU64,
    scheme: Mutex<GateWindowScheme>,
    solutions: Mutex<Vec<Solution>>,
}

/// Searches for circuits implementing `target` over `lib`.
///
/// Workers run independent annealing chains from random start circuits
/// until the time budget expires or enough solutions are in. Shared state
/// is limited to coarse counters, the adaptive start-length window and the
/// solution list, so chains never wait on each other inside the hot loop.
pub fn synthesize(
    lib: Arc<GateLibrary>,
    target: PartialMatrix,
    config: &SynthConfig,
) -> SynthResult<SynthReport> {
    let started = Instant::now();
    // Inverted renderings are only usable when every match can be inverted
    // back into library gates.
    let use_inverse = config.use_symmetry && lib.dagger_closed();
    let class = Arc::new(SymmetryClass::build(
        target,
        config.use_symmetry,
        use_inverse,
    )?);
    info!(
        qubits = lib.num_qubits(),
        gates = lib.len(),
        members = class.members.len(),
        threads = config.threads,
        "starting synthesis"
    );

    let shared = Shared {
        class,
        lib,
        config,
        deadline: started + config.time_limit,
        stop: AtomicBool::new(false),
        attempts: AtomicU64::new(0),
        successes: AtomicU64::new(0),
        scheme: Mutex::new(GateWindowScheme::new(
            config.min_start_len,
            config.max_start_len,
            0.05,
            2.5,
            3.5,
        )),
        solutions: Mutex::new(Vec::new()),
    };

    std::thread::scope(|scope| -> SynthResult<()> {
        let threads = config.threads.max(1);
        let mut handles = Vec::with_capacity(threads);
        for worker in 0..threads {
            let shared = &shared;
            handles.push(scope.spawn(move || worker_loop(worker, threads, shared)));
        }
        for handle in handles {
            match handle.join() {
                Ok(result) => result?,
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        Ok(())
    })?;

    let solutions = shared
        .solutions
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner);
    let report = SynthReport {
        solutions,
        attempts: shared.attempts.into_inner(),
        successes: shared.successes.into_inner(),
        elapsed: started.elapsed(),
    };
    info!(
        solutions = report.solutions.len(),
        attempts = report.attempts,
        successes = report.successes,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "synthesis finished"
    );
    Ok(report)
}

fn worker_loop(worker: usize, threads: usize, shared: &Shared<'_>) -> SynthResult<()> {
    let config = shared.config;
    let mut rng = RngHelper::for_worker(worker, 0, threads);
    let engine = SearchEngine {
        class: Arc::clone(&shared.class),
        cost: if config.simple_cost {
            EqualityCost::Simplified
        } else {
            EqualityCost::Frobenius
        },
        exact: ExactEquality::new(config.tolerance),
        mutator: Mutator {
            p_identity: config.p_identity,
            p_composite: config.p_composite,
            p_name: config.p_name,
        },
        start_temp: SearchEngine::start_temp_for(config.start_temp_base, shared.lib.num_qubits()),
        temp_normalizer: config.temp_normalizer,
        iterations_factor: config.iterations_factor,
    };
    let generator = RandomCircuitGen::new(config.p_identity);
    let resynth = Resynthesizer {
        max_window: config.max_window,
        watch_depth: config.watch_depth,
        depth_gates: config.depth_gates.clone(),
    };

    while !shared.stop.load(Ordering::Relaxed) && Instant::now() < shared.deadline {
        shared.attempts.fetch_add(1, Ordering::Relaxed);
        let len = shared
            .scheme
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sample(&mut rng);
        let mut circuit = generator.generate(&shared.lib, len, config.maintainer, &mut rng);

        let result = engine.run(&mut circuit, &mut rng)?;
        if !result.found {
            continue;
        }
        shared.successes.fetch_add(1, Ordering::Relaxed);
        debug!(
            worker,
            len,
            gates = circuit.non_identity_count(),
            trials = result.trials,
            "raw match"
        );

        if config.resynthesize {
            resynth.run(&mut circuit)?;
        }
        if config.update_scheme {
            shared
                .scheme
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .update(circuit.non_identity_count());
        }
        if config.expand_composites {
            circuit.expand_composites();
            if config.resynthesize {
                resynth.run(&mut circuit)?;
            }
        }

        let solution = Solution {
            cost: circuit.cost(),
            gate_count: circuit.non_identity_count(),
            t_count: circuit.count_by_names(&config.depth_gates),
            t_depth: circuit.depth_by_names(&config.depth_gates),
            worker,
            circuit,
        };
        if config.has_thresholds() && !config.meets_thresholds(&solution) {
            continue;
        }
        info!(
            worker,
            cost = solution.cost,
            gates = solution.gate_count,
            t_count = solution.t_count,
            t_depth = solution.t_depth,
            "solution found"
        );

        let mut solutions = shared
            .solutions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        solutions.push(solution);
        if solutions.len() >= config.max_solutions || config.has_thresholds() {
            shared.stop.store(true, Ordering::Relaxed);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::ExactEquality;
    use alsvid_ir::stdgates;

    fn quick_config() -> SynthConfig {
        SynthConfig {
            time_limit: Duration::from_secs(20),
            max_solutions: 1,
            ..SynthConfig::default()
        }
    }

    #[test]
    fn synthesizes_a_library_gate() {
        let lib = Arc::new(GateLibrary::build(1, &stdgates::clifford_t(), &[]).unwrap());
        let target = PartialMatrix::fully_covered(stdgates::h().matrix).unwrap();
        let report = synthesize(Arc::clone(&lib), target.clone(), &quick_config()).unwrap();

        assert_eq!(report.solutions.len(), 1);
        let solution = &report.solutions[0];
        let mut circuit = solution.circuit.clone();
        assert!(ExactEquality::new(1e-6).matches(&target, circuit.matrix()));
        assert!(report.successes >= 1);
        assert!(report.attempts >= report.successes);
    }

    #[test]
    fn threshold_filtering_keeps_only_small_solutions() {
        let lib = Arc::new(GateLibrary::build(1, &stdgates::clifford_t(), &[]).unwrap());
        let target = PartialMatrix::fully_covered(stdgates::s().matrix).unwrap();
        let config = SynthConfig {
            max_gates: Some(1),
            ..quick_config()
        };
        let report = synthesize(Arc::clone(&lib), target, &config).unwrap();
        for solution in &report.solutions {
            assert!(solution.gate_count <= 1);
        }
    }

    #[test]
    fn multiple_workers_share_the_solution_list() {
        let lib = Arc::new(GateLibrary::build(1, &stdgates::clifford_t(), &[]).unwrap());
        let target = PartialMatrix::fully_covered(stdgates::t().matrix).unwrap();
        let config = SynthConfig {
            threads: 2,
            max_solutions: 2,
            ..quick_config()
        };
        let report = synthesize(Arc::clone(&lib), target.clone(), &config).unwrap();
        assert!(!report.solutions.is_empty());
        for solution in &report.solutions {
            let mut circuit = solution.circuit.clone();
            assert!(ExactEquality::new(1e-6).matches(&target, circuit.matrix()));
        }
    }
}
