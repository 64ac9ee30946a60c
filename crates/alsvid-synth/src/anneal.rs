//! Metropolis simulated-annealing search over fixed-length circuits.

use std::sync::Arc;

use alsvid_ir::Circuit;
use tracing::debug;

use crate::cost::{self, EqualityCost, ExactEquality};
use crate::error::SynthResult;
use crate::mutate::Mutator;
use crate::rng::RngHelper;
use crate::schedule::ExponentialSchedule;
use crate::target::SymmetryClass;

/// Outcome of one annealing run.
#[derive(Debug, Clone, Copy)]
pub struct McmcResult {
    /// True when the circuit implements a member of the target class. The
    /// circuit has already been corrected back to the original frame; on a
    /// miss it holds the best-energy snapshot instead.
    pub found: bool,
    /// Index of the matched member before correction.
    pub member: Option<usize>,
    /// Proposals that changed the circuit. Draws equal to the incumbent gate
    /// are free and do not count against the budget.
    pub trials: u64,
    /// Accepted moves.
    pub accepted: u64,
    /// Best objective value seen.
    pub best_cost: f64,
}

/// One simulated-annealing chain against a fixed target class.
///
/// The objective is the best equality distance over the class members;
/// implementation cost is not part of the energy, it is reported on the
/// finished circuit instead. Exact equality is only tested when the
/// objective strictly improves on the best seen, keeping the hot phase
/// cheap.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    pub class: Arc<SymmetryClass>,
    pub cost: EqualityCost,
    pub exact: ExactEquality,
    pub mutator: Mutator,
    /// Initial temperature, already scaled for the register size.
    pub start_temp: f64,
    pub temp_normalizer: f64,
    /// Trials per circuit position and register qubit.
    pub iterations_factor: f64,
}

impl SearchEngine {
    /// Start temperature for a register: the configured base shrinks with the
    /// square root of the state dimension, since the equality distance does
    /// too.
    pub fn start_temp_for(base: f64, num_qubits: u32) -> f64 {
        base / ((1u64 << num_qubits) as f64).sqrt()
    }

    fn objective(&self, circuit: &mut Circuit) -> f64 {
        self.cost.evaluate(&self.class, circuit.matrix())
    }

    /// Runs one chain over `circuit` until a member is matched or the trial
    /// budget runs out.
    ///
    /// On a match the circuit is corrected in place: inverted if the matched
    /// member was an adjoint, then relabeled back to the original qubit
    /// order, so the caller always receives a circuit for the original
    /// target. On budget exhaustion the circuit is restored to the
    /// best-energy snapshot, so what the caller holds is the circuit
    /// `best_cost` describes.
    pub fn run(&self, circuit: &mut Circuit, rng: &mut RngHelper) -> SynthResult<McmcResult> {
        let len = circuit.len();
        let budget = (self.iterations_factor * circuit.num_qubits() as f64 * len as f64).ceil() as u64;
        let mut schedule = ExponentialSchedule::new(self.start_temp, self.temp_normalizer);

        let mut current = self.objective(circuit);
        let mut best = current;
        let mut best_gates = circuit.gates().to_vec();
        let mut trials = 0u64;
        let mut accepted = 0u64;
        let mut member = self.exact.matching_member(&self.class, circuit.matrix());

        while member.is_none() && trials < budget {
            let temperature = schedule.temperature(len);
            let proposal = self.mutator.propose(circuit, rng);
            if proposal.unchanged {
                continue;
            }
            trials += 1;

            let candidate = self.objective(circuit);
            let delta = candidate - current;
            if delta <= 0.0 || rng.random01() <= (-delta / temperature).exp() {
                accepted += 1;
                schedule.record_acceptance();
                current = candidate;
                if candidate < best {
                    best = candidate;
                    best_gates.clear();
                    best_gates.extend_from_slice(circuit.gates());
                    member = self.exact.matching_member(&self.class, circuit.matrix());
                }
            } else {
                circuit.undo();
            }
        }

        let found = member.is_some();
        if found {
            let matched = cost::closest_member(&self.class, circuit.matrix());
            let correction = &self.class.members[matched];
            if correction.inverted {
                circuit.invert()?;
            }
            circuit.permute_qubits(&correction.permutation)?;
            debug!(member = matched, trials, accepted, "match found");
            member = Some(matched);
        } else {
            circuit.suspend_tracking();
            for (position, &gate) in best_gates.iter().enumerate() {
                if circuit.gate_at(position) != gate {
                    circuit.replace(position, gate);
                }
            }
            circuit.resume_tracking();
        }

        Ok(McmcResult {
            found,
            member,
            trials,
            accepted,
            best_cost: best,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::PartialMatrix;
    use alsvid_ir::matrix::{EPSILON, approx_eq};
    use alsvid_ir::{GateLibrary, MaintainerKind, stdgates};

    fn engine(class: SymmetryClass) -> SearchEngine {
        SearchEngine {
            class: Arc::new(class),
            cost: EqualityCost::Frobenius,
            exact: ExactEquality::new(1e-6),
            mutator: Mutator::default(),
            start_temp: SearchEngine::start_temp_for(0.1, 1),
            temp_normalizer: 80.0,
            iterations_factor: 40.0,
        }
    }

    fn h_only_lib() -> Arc<GateLibrary> {
        Arc::new(GateLibrary::build(1, &[stdgates::h()], &[]).unwrap())
    }

    #[test]
    fn matching_start_is_found_without_trials() {
        let lib = h_only_lib();
        let pm = PartialMatrix::fully_covered(stdgates::h().matrix).unwrap();
        let class = SymmetryClass::build(pm, false, false).unwrap();
        let h = lib.find("h", &[0]).unwrap();
        let mut circ = Circuit::from_gates(Arc::clone(&lib), vec![h], MaintainerKind::Linear);

        let result = engine(class)
            .run(&mut circ, &mut RngHelper::new(0))
            .unwrap();
        assert!(result.found);
        assert_eq!(result.trials, 0);
    }

    #[test]
    fn finds_a_reachable_target() {
        // With only h in the library the first accepted h lands the match.
        let lib = h_only_lib();
        let pm = PartialMatrix::fully_covered(stdgates::h().matrix).unwrap();
        let class = SymmetryClass::build(pm, false, false).unwrap();
        let mut circ = Circuit::identity(Arc::clone(&lib), 2, MaintainerKind::Binary);

        let result = engine(class)
            .run(&mut circ, &mut RngHelper::new(42))
            .unwrap();
        assert!(result.found);
        assert!(approx_eq(circ.matrix(), &stdgates::h().matrix, EPSILON));
    }

    #[test]
    fn unreachable_target_exhausts_the_budget() {
        // Products of h gates never produce x.
        let lib = h_only_lib();
        let pm = PartialMatrix::fully_covered(stdgates::x().matrix).unwrap();
        let class = SymmetryClass::build(pm, false, false).unwrap();
        let mut circ = Circuit::identity(Arc::clone(&lib), 2, MaintainerKind::Linear);

        let result = engine(class)
            .run(&mut circ, &mut RngHelper::new(7))
            .unwrap();
        assert!(!result.found);
        assert_eq!(result.trials, 40 * 2);
        assert!(result.best_cost > 0.0);
    }

    #[test]
    fn expensive_gates_do_not_mask_an_exact_match() {
        // The energy is the equality distance alone; a circuit that nails
        // the target terminates even when its gate cost is steep.
        let t_def = alsvid_ir::GateDef {
            cost: 8.0,
            ..stdgates::t()
        };
        let lib = Arc::new(GateLibrary::build(1, &[t_def], &[]).unwrap());
        let pm = PartialMatrix::fully_covered(stdgates::t().matrix).unwrap();
        let class = SymmetryClass::build(pm, false, false).unwrap();
        let mut circ = Circuit::identity(Arc::clone(&lib), 2, MaintainerKind::Linear);

        let result = engine(class)
            .run(&mut circ, &mut RngHelper::new(3))
            .unwrap();
        assert!(result.found);
        assert!(approx_eq(circ.matrix(), &stdgates::t().matrix, EPSILON));
    }

    #[test]
    fn budget_exhaustion_hands_back_the_best_snapshot() {
        let lib = h_only_lib();
        let pm = PartialMatrix::fully_covered(stdgates::x().matrix).unwrap();
        let class = SymmetryClass::build(pm, false, false).unwrap();
        let mut circ = Circuit::identity(Arc::clone(&lib), 2, MaintainerKind::Binary);

        let eng = engine(class);
        let result = eng.run(&mut circ, &mut RngHelper::new(7)).unwrap();
        assert!(!result.found);
        // The returned circuit is the one best_cost describes.
        let energy = EqualityCost::Frobenius.evaluate(&eng.class, circ.matrix());
        assert!((energy - result.best_cost).abs() < 1e-12);
    }

    #[test]
    fn inverse_match_is_corrected_to_the_original_frame() {
        let lib = Arc::new(GateLibrary::build(1, &stdgates::clifford_t(), &[]).unwrap());
        let pm = PartialMatrix::fully_covered(stdgates::t().matrix).unwrap();
        let class = SymmetryClass::build(pm, false, true).unwrap();
        // A circuit already implementing tdg matches the inverse member and
        // must come back inverted into a t implementation.
        let tdg = lib.find("tdg", &[0]).unwrap();
        let mut circ = Circuit::from_gates(Arc::clone(&lib), vec![tdg], MaintainerKind::Linear);

        let result = engine(class)
            .run(&mut circ, &mut RngHelper::new(0))
            .unwrap();
        assert!(result.found);
        assert_eq!(result.member, Some(1));
        assert!(approx_eq(circ.matrix(), &stdgates::t().matrix, EPSILON));
    }
}
