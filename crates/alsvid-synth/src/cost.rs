//! Masked distance functions between a circuit and a partial target.
//!
//! Two continuous measures drive the annealer and one exact 0/1 indicator
//! decides when a candidate actually implements the target. All of them sum
//! only over covered entries and are invariant under global phase.

use alsvid_ir::matrix::Unitary;
use num_complex::Complex64;

use crate::target::{PartialMatrix, SymmetryClass};

/// Continuous objective guiding the annealer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EqualityCost {
    /// Phase-corrected Frobenius distance, normalized by the fourth root of
    /// the covered entry count.
    #[default]
    Frobenius,
    /// Cheaper overlap-only variant. Assumes target and circuit columns are
    /// unit norm on the cover, which holds for fully covered unitaries.
    Simplified,
}

impl EqualityCost {
    /// Distance between `circuit` and one constraint.
    pub fn against(self, target: &PartialMatrix, circuit: &Unitary) -> f64 {
        let (overlap, circ_size) = masked_sums(target, circuit);
        let k = target.covered_count() as f64;
        match self {
            Self::Frobenius => {
                let sq = target.squared_norm + circ_size - 2.0 * overlap.norm();
                sq.max(0.0).sqrt() / k.powf(0.25)
            }
            Self::Simplified => {
                let sq = 1.0 - overlap.norm() / k.sqrt();
                sq.max(0.0).sqrt() * std::f64::consts::SQRT_2
            }
        }
    }

    /// Smallest distance over all members of a symmetry class.
    pub fn evaluate(self, class: &SymmetryClass, circuit: &Unitary) -> f64 {
        class
            .members
            .iter()
            .map(|member| self.against(&member.target, circuit))
            .fold(f64::INFINITY, f64::min)
    }
}

/// Exact acceptance test: 0 when the circuit matches a constraint up to
/// global phase within `tolerance`, 1 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct ExactEquality {
    /// Admissible phase-corrected distance per covered entry block.
    pub tolerance: f64,
}

impl ExactEquality {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// 0/1 indicator against one constraint.
    pub fn against(self, target: &PartialMatrix, circuit: &Unitary) -> f64 {
        if self.matches(target, circuit) { 0.0 } else { 1.0 }
    }

    /// True when `circuit` implements `target` on the cover.
    pub fn matches(self, target: &PartialMatrix, circuit: &Unitary) -> bool {
        let (overlap, circ_size) = masked_sums(target, circuit);
        let k = target.covered_count() as f64;
        let sq = target.squared_norm + circ_size - 2.0 * overlap.norm();
        sq.max(0.0).sqrt() * std::f64::consts::FRAC_1_SQRT_2 / k.powf(0.25) <= self.tolerance
    }

    /// Index of the first member the circuit implements exactly, if any.
    pub fn matching_member(self, class: &SymmetryClass, circuit: &Unitary) -> Option<usize> {
        class
            .members
            .iter()
            .position(|member| self.matches(&member.target, circuit))
    }
}

/// Member with the smallest continuous distance to `circuit`.
///
/// Used after the search stops to pick which correction to apply; the
/// Frobenius measure breaks ties the same way the search ranked candidates.
pub fn closest_member(class: &SymmetryClass, circuit: &Unitary) -> usize {
    let mut best = 0;
    let mut best_cost = f64::INFINITY;
    for (idx, member) in class.members.iter().enumerate() {
        let cost = EqualityCost::Frobenius.against(&member.target, circuit);
        if cost < best_cost {
            best = idx;
            best_cost = cost;
        }
    }
    best
}

/// Normalized implementation cost of a circuit, in `[0, 1]` for circuits of
/// basic gates. Used as the secondary objective once equality is reachable.
pub fn performance_cost(cost: f64, len: usize, max_basic_cost: f64) -> f64 {
    if len == 0 || max_basic_cost == 0.0 {
        return 0.0;
    }
    cost / (len as f64 * max_basic_cost)
}

// Sum of conj(T) * C and of |C|^2 over covered entries.
fn masked_sums(target: &PartialMatrix, circuit: &Unitary) -> (Complex64, f64) {
    let mut overlap = Complex64::new(0.0, 0.0);
    let mut circ_size = 0.0;
    for ((&t, &covered), &c) in target
        .matrix
        .iter()
        .zip(target.cover.iter())
        .zip(circuit.iter())
    {
        if covered {
            overlap += t.conj() * c;
            circ_size += c.norm_sqr();
        }
    }
    (overlap, circ_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::PartialMatrix;
    use alsvid_ir::matrix::{self, EPSILON};
    use alsvid_ir::stdgates;
    use num_complex::Complex64;

    fn target_h() -> PartialMatrix {
        PartialMatrix::fully_covered(stdgates::h().matrix).unwrap()
    }

    #[test]
    fn zero_distance_at_the_target() {
        let target = target_h();
        let circuit = stdgates::h().matrix;
        assert!(EqualityCost::Frobenius.against(&target, &circuit) < EPSILON);
        assert!(EqualityCost::Simplified.against(&target, &circuit) < EPSILON);
    }

    #[test]
    fn global_phase_is_ignored() {
        let target = target_h();
        let phase = Complex64::from_polar(1.0, 0.7);
        let circuit = stdgates::h().matrix.mapv(|v| v * phase);
        assert!(EqualityCost::Frobenius.against(&target, &circuit) < EPSILON);
        assert!(ExactEquality::new(1e-6).matches(&target, &circuit));
    }

    #[test]
    fn mismatch_has_positive_distance() {
        let target = target_h();
        let circuit = stdgates::x().matrix;
        assert!(EqualityCost::Frobenius.against(&target, &circuit) > 0.1);
        assert!(EqualityCost::Simplified.against(&target, &circuit) > 0.1);
        assert_eq!(ExactEquality::new(1e-6).against(&target, &circuit), 1.0);
    }

    #[test]
    fn measures_agree_on_fully_covered_unitaries() {
        let target = target_h();
        for gate in [stdgates::x(), stdgates::t(), stdgates::s()] {
            let f = EqualityCost::Frobenius.against(&target, &gate.matrix);
            let s = EqualityCost::Simplified.against(&target, &gate.matrix);
            assert!((f - s).abs() < 1e-9, "frobenius {f} vs simplified {s}");
        }
    }

    #[test]
    fn class_evaluation_takes_the_best_member() {
        let pm = PartialMatrix::fully_covered(stdgates::t().matrix).unwrap();
        let class = crate::target::SymmetryClass::build(pm, false, true).unwrap();
        // tdg only matches the inverse member.
        let circuit = stdgates::tdg().matrix;
        assert!(EqualityCost::Frobenius.evaluate(&class, &circuit) < EPSILON);
        assert_eq!(closest_member(&class, &circuit), 1);
        assert_eq!(
            ExactEquality::new(1e-6).matching_member(&class, &circuit),
            Some(1)
        );
    }

    #[test]
    fn partial_cover_ignores_free_entries() {
        // Constrain only the first column of cx.
        let mut cover = ndarray::Array2::from_elem((4, 4), false);
        for i in 0..4 {
            cover[[i, 0]] = true;
        }
        let target = PartialMatrix::new(stdgates::cx().matrix, cover).unwrap();
        // The identity agrees with cx on column zero.
        let circuit = matrix::identity(4);
        assert!(ExactEquality::new(1e-6).matches(&target, &circuit));
        assert!(EqualityCost::Frobenius.against(&target, &circuit) < EPSILON);
    }

    #[test]
    fn masked_block_leaves_the_circuit_unconstrained() {
        // cx with the bottom-left 2x2 block masked out: a circuit matching
        // everywhere else scores zero whatever sits in that block.
        let mut cover = ndarray::Array2::from_elem((4, 4), true);
        for i in 2..4 {
            for j in 0..2 {
                cover[[i, j]] = false;
            }
        }
        let target = PartialMatrix::new(stdgates::cx().matrix, cover).unwrap();

        let mut circuit = stdgates::cx().matrix;
        circuit[[2, 0]] = Complex64::new(0.3, -0.1);
        circuit[[3, 1]] = Complex64::new(-0.7, 0.2);
        assert!(ExactEquality::new(1e-6).matches(&target, &circuit));
        assert!(EqualityCost::Frobenius.against(&target, &circuit) < EPSILON);
    }

    #[test]
    fn performance_cost_normalizes_by_capacity() {
        assert_eq!(performance_cost(3.0, 6, 1.0), 0.5);
        assert_eq!(performance_cost(0.0, 6, 1.0), 0.0);
        assert_eq!(performance_cost(1.0, 0, 1.0), 0.0);
    }
}
