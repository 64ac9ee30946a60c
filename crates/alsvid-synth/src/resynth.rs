//! Deterministic peephole cleanup of found circuits.
//!
//! A sweep walks adjacent pairs, pushing identities toward the end, fusing
//! gate windows into cheaper library gates, and canonically ordering
//! commuting neighbors. The sweep runs twice: once as-is and once on the
//! inverted circuit, so patterns split across the sequence get a second
//! chance from the other side.

use std::sync::Arc;

use alsvid_ir::matrix::{self, EPSILON, Unitary};
use alsvid_ir::Circuit;
use tracing::debug;

use crate::error::SynthResult;

/// Pair-at-a-time circuit rewriter.
#[derive(Debug, Clone)]
pub struct Resynthesizer {
    /// Largest number of positions a fusion window may span.
    pub max_window: usize,
    /// Break commutation ties on the second pass by the depth over
    /// [`depth_gates`](Self::depth_gates).
    pub watch_depth: bool,
    /// Gate names whose depth the second pass protects.
    pub depth_gates: Vec<String>,
}

impl Default for Resynthesizer {
    fn default() -> Self {
        Self {
            max_window: 12,
            watch_depth: true,
            depth_gates: vec!["t".to_string(), "tdg".to_string()],
        }
    }
}

impl Resynthesizer {
    /// Rewrites `circuit` in place without changing its unitary.
    ///
    /// The second pass runs on the inverted circuit when the library is
    /// closed under adjoints, keeping fusion sound there. Otherwise the
    /// gate order is merely reversed and fusion is skipped, since window
    /// products in a reversed frame do not correspond to library gates.
    pub fn run(&self, circuit: &mut Circuit) -> SynthResult<()> {
        circuit.suspend_tracking();
        self.sweep(circuit, false, true);
        if circuit.library().dagger_closed() {
            circuit.invert()?;
            self.sweep(circuit, true, true);
            circuit.invert()?;
        } else {
            circuit.reverse();
            self.sweep(circuit, true, false);
            circuit.reverse();
        }
        circuit.resume_tracking();
        debug!(
            len = circuit.len(),
            gates = circuit.non_identity_count(),
            cost = circuit.cost(),
            "resynthesis done"
        );
        Ok(())
    }

    fn sweep(&self, circuit: &mut Circuit, second_pass: bool, allow_fusion: bool) {
        let mut i = 0usize;
        while i + 1 < circuit.len() {
            let step = self.step(circuit, i, second_pass, allow_fusion);
            i = i.saturating_add_signed(step);
        }
    }

    // Examines the pair (i, i+1) and returns how far to move the cursor;
    // negative steps retrace over freshly rewritten positions.
    fn step(&self, circuit: &mut Circuit, i: usize, second_pass: bool, allow_fusion: bool) -> isize {
        if circuit.is_identity_at(i + 1) {
            return 1;
        }

        if allow_fusion {
            if let Some(step) = self.try_fuse(circuit, i) {
                return step;
            }
        }

        if circuit.is_identity_at(i) {
            circuit.swap(i, i + 1);
            return -1;
        }

        let lib = Arc::clone(circuit.library());
        let a = &lib.gate(circuit.gate_at(i)).matrix;
        let b = &lib.gate(circuit.gate_at(i + 1)).matrix;
        if commutes(a, b) && self.should_swap(circuit, i, second_pass) {
            circuit.swap(i, i + 1);
            return -1;
        }
        1
    }

    // Grows a window leftward from i+1 and replaces it by a strictly
    // cheaper library gate on the first match. Identity positions inside
    // the window are skipped but still count against its span.
    fn try_fuse(&self, circuit: &mut Circuit, i: usize) -> Option<isize> {
        let lib = Arc::clone(circuit.library());
        let top = circuit.gate_at(i + 1);
        let mut acc = lib.gate(top).matrix.clone();
        let mut window_cost = lib.gate(top).cost;

        for n_extra in 0..self.max_window - 1 {
            let idx = i.checked_sub(n_extra)?;
            if circuit.is_identity_at(idx) {
                continue;
            }
            let gate = lib.gate(circuit.gate_at(idx));
            acc = acc.dot(&gate.matrix);
            window_cost += gate.cost;
            if let Some(replacement) = lib.match_matrix(&acc, window_cost) {
                circuit.replace(idx, replacement);
                for p in idx + 1..=i + 1 {
                    circuit.replace(p, lib.identity());
                }
                return Some(-1 - n_extra as isize);
            }
        }
        None
    }

    // True when the gate at i+1 should come first. Commuting neighbors are
    // ordered by how far they could drift left, then by arity, name, and
    // acting qubits, giving every commuting run one canonical layout.
    fn should_swap(&self, circuit: &mut Circuit, i: usize, second_pass: bool) -> bool {
        if self.watch_depth && second_pass {
            let original = circuit.depth_by_names(&self.depth_gates);
            circuit.swap(i, i + 1);
            let swapped = circuit.depth_by_names(&self.depth_gates);
            circuit.swap(i, i + 1);
            if swapped > original {
                return false;
            }
            if swapped < original {
                return true;
            }
        }

        let reach1 = commuting_predecessors(circuit, i);
        let reach2 = commuting_predecessors(circuit, i + 1);
        if reach1 + 1 < reach2 {
            return true;
        }
        if reach1 + 1 > reach2 {
            return false;
        }

        let lib = Arc::clone(circuit.library());
        let g1 = lib.gate(circuit.gate_at(i));
        let g2 = lib.gate(circuit.gate_at(i + 1));
        if g1.qubits.len() != g2.qubits.len() {
            return g1.qubits.len() > g2.qubits.len();
        }
        if g1.name != g2.name {
            return g1.name > g2.name;
        }
        g1.qubits > g2.qubits
    }
}

// Number of consecutive earlier gates commuting with the gate at `index`.
fn commuting_predecessors(circuit: &Circuit, index: usize) -> usize {
    let lib = circuit.library();
    let m = &lib.gate(circuit.gate_at(index)).matrix;
    (0..index)
        .rev()
        .take_while(|&i| commutes(m, &lib.gate(circuit.gate_at(i)).matrix))
        .count()
}

fn commutes(a: &Unitary, b: &Unitary) -> bool {
    matrix::approx_eq(&a.dot(b), &b.dot(a), EPSILON)
}
