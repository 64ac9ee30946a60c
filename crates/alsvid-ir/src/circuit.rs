//! Fixed-length gate sequences with incremental bookkeeping.

use std::sync::Arc;

use crate::error::{IrError, IrResult};
use crate::gate::GateId;
use crate::library::GateLibrary;
use crate::maintainer::{MaintainerKind, MatrixMaintainer};
use crate::matrix::Unitary;

/// The last edit, kept for undo.
#[derive(Debug, Clone, Copy)]
enum Edit {
    Replace { position: usize, previous: GateId },
    Swap { a: usize, b: usize },
}

/// A fixed-length sequence of library gates.
///
/// Replacing a gate keeps the running cost, the non-identity count, and the
/// circuit unitary up to date; the previous gate is remembered so one edit
/// can be undone. Matrix upkeep can be suspended during bulk rewrites and is
/// recomputed on resume.
#[derive(Debug, Clone)]
pub struct Circuit {
    lib: Arc<GateLibrary>,
    gates: Vec<GateId>,
    maintainer: MatrixMaintainer,
    cost: f64,
    non_identity: usize,
    edit: Option<Edit>,
    tracking: bool,
}

impl Circuit {
    /// Identity circuit of the given length.
    pub fn identity(lib: Arc<GateLibrary>, len: usize, kind: MaintainerKind) -> Self {
        let gates = vec![lib.identity(); len];
        Self::from_gates(lib, gates, kind)
    }

    /// Circuit over an explicit gate list.
    pub fn from_gates(lib: Arc<GateLibrary>, gates: Vec<GateId>, kind: MaintainerKind) -> Self {
        let maintainer = MatrixMaintainer::new(kind, &lib, &gates);
        let mut circuit = Self {
            lib,
            gates,
            maintainer,
            cost: 0.0,
            non_identity: 0,
            edit: None,
            tracking: true,
        };
        circuit.recompute_cost();
        circuit
    }

    fn recompute_cost(&mut self) {
        self.cost = 0.0;
        self.non_identity = 0;
        for &id in &self.gates {
            self.cost += self.lib.gate(id).cost;
            if !self.lib.is_identity(id) {
                self.non_identity += 1;
            }
        }
    }

    /// Number of positions, identities included.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// True for a zero-length circuit.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Qubit count of the underlying library.
    pub fn num_qubits(&self) -> u32 {
        self.lib.num_qubits()
    }

    /// The gate library this circuit draws from.
    pub fn library(&self) -> &Arc<GateLibrary> {
        &self.lib
    }

    /// Gate handles in application order.
    pub fn gates(&self) -> &[GateId] {
        &self.gates
    }

    /// Handle at a position.
    pub fn gate_at(&self, position: usize) -> GateId {
        self.gates[position]
    }

    /// True if the position holds the identity gate.
    pub fn is_identity_at(&self, position: usize) -> bool {
        self.lib.is_identity(self.gates[position])
    }

    /// Sum of gate costs.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Number of non-identity gates.
    pub fn non_identity_count(&self) -> usize {
        self.non_identity
    }

    /// Current circuit unitary.
    pub fn matrix(&mut self) -> &Unitary {
        self.maintainer.matrix()
    }

    /// Replaces the gate at `position`, recording the edit for [`undo`](Self::undo).
    pub fn replace(&mut self, position: usize, id: GateId) {
        let previous = self.gates[position];
        self.cost += self.lib.gate(id).cost - self.lib.gate(previous).cost;
        if self.lib.is_identity(previous) && !self.lib.is_identity(id) {
            self.non_identity += 1;
        } else if !self.lib.is_identity(previous) && self.lib.is_identity(id) {
            self.non_identity -= 1;
        }
        self.gates[position] = id;
        self.edit = Some(Edit::Replace { position, previous });
        if self.tracking {
            self.maintainer.update(position, &self.lib, &self.gates);
        }
    }

    /// Swaps two positions. Cost and counts are unaffected.
    pub fn swap(&mut self, a: usize, b: usize) {
        let ga = self.gates[a];
        let gb = self.gates[b];
        self.replace(a, gb);
        self.replace(b, ga);
        self.edit = Some(Edit::Swap { a, b });
    }

    /// Replays the last recorded edit: a replacement restores the previous
    /// gate, a swap swaps back.
    pub fn undo(&mut self) {
        match self.edit {
            Some(Edit::Replace { position, previous }) => self.replace(position, previous),
            Some(Edit::Swap { a, b }) => self.swap(a, b),
            None => {}
        }
    }

    /// Turns matrix upkeep off for a bulk rewrite.
    pub fn suspend_tracking(&mut self) {
        self.tracking = false;
    }

    /// Turns matrix upkeep back on and recomputes the unitary.
    pub fn resume_tracking(&mut self) {
        self.tracking = true;
        self.maintainer.calculate(&self.lib, &self.gates);
    }

    /// Reverses the gate order in place.
    pub fn reverse(&mut self) {
        self.gates.reverse();
        if self.tracking {
            self.maintainer.calculate(&self.lib, &self.gates);
        }
    }

    /// Inverts the circuit: order reversed, each gate replaced by its library
    /// adjoint. Fails without changing anything if some gate has no adjoint
    /// counterpart in the library.
    pub fn invert(&mut self) -> IrResult<()> {
        let mut inverted = Vec::with_capacity(self.gates.len());
        for &id in self.gates.iter().rev() {
            let dagger = self.lib.dagger_of(id).ok_or_else(|| IrError::NoInverse {
                name: self.lib.gate(id).name.clone(),
            })?;
            inverted.push(dagger);
        }
        self.gates = inverted;
        self.recompute_cost();
        if self.tracking {
            self.maintainer.calculate(&self.lib, &self.gates);
        }
        Ok(())
    }

    /// Relabels acting qubits through `perm` (qubit `q` becomes `perm[q]`).
    ///
    /// Identity gates keep their slot unchanged. The library is closed under
    /// qubit permutations, so lookups only fail for an invalid `perm`.
    pub fn permute_qubits(&mut self, perm: &[u32]) -> IrResult<()> {
        if perm.len() != self.num_qubits() as usize {
            return Err(IrError::InvalidPermutation {
                permutation: perm.to_vec(),
                num_qubits: self.num_qubits(),
            });
        }
        let mut relabeled = Vec::with_capacity(self.gates.len());
        for &id in &self.gates {
            if self.lib.is_identity(id) {
                relabeled.push(id);
                continue;
            }
            let gate = self.lib.gate(id);
            let qubits: Vec<u32> = gate.qubits.iter().map(|&q| perm[q as usize]).collect();
            relabeled.push(self.lib.resolve(&gate.name, &qubits)?);
        }
        self.gates = relabeled;
        if self.tracking {
            self.maintainer.calculate(&self.lib, &self.gates);
        }
        Ok(())
    }

    /// Replaces every composite gate by its decomposition.
    ///
    /// The length may change, so all cached state is rebuilt.
    pub fn expand_composites(&mut self) {
        let mut expanded = Vec::with_capacity(self.gates.len());
        for &id in &self.gates {
            let gate = self.lib.gate(id);
            if gate.is_basic() {
                expanded.push(id);
            } else {
                expanded.extend_from_slice(gate.decomposition());
            }
        }
        self.gates = expanded;
        self.edit = None;
        self.recompute_cost();
        if self.tracking {
            self.maintainer.calculate(&self.lib, &self.gates);
        }
    }

    /// Number of gates whose name is in `names`.
    pub fn count_by_names(&self, names: &[String]) -> usize {
        self.gates
            .iter()
            .filter(|&&id| names.iter().any(|n| n == &self.lib.gate(id).name))
            .count()
    }

    /// Longest chain of matched-name gates over any qubit.
    ///
    /// Unmatched gates synchronize the depths of their acting qubits without
    /// adding a layer.
    pub fn depth_by_names(&self, names: &[String]) -> usize {
        let mut depths = vec![0usize; self.num_qubits() as usize];
        for &id in &self.gates {
            let gate = self.lib.gate(id);
            let matched = names.iter().any(|n| n == &gate.name);
            let max_acting = gate
                .qubits
                .iter()
                .map(|&q| depths[q as usize])
                .max()
                .unwrap_or(0);
            for &q in &gate.qubits {
                depths[q as usize] = if matched { max_acting + 1 } else { max_acting };
            }
        }
        depths.into_iter().max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{self, EPSILON, approx_eq, dagger};
    use crate::stdgates;

    fn lib2() -> Arc<GateLibrary> {
        Arc::new(GateLibrary::build(2, &stdgates::clifford_t(), &[]).unwrap())
    }

    #[test]
    fn replace_and_undo_restore_state() {
        let lib = lib2();
        let mut circ = Circuit::identity(Arc::clone(&lib), 4, MaintainerKind::Binary);
        assert_eq!(circ.non_identity_count(), 0);
        assert_eq!(circ.cost(), 0.0);

        let h = lib.find("h", &[0]).unwrap();
        circ.replace(1, h);
        assert_eq!(circ.non_identity_count(), 1);
        assert_eq!(circ.cost(), 1.0);
        assert!(approx_eq(circ.matrix(), &lib.gate(h).matrix, EPSILON));

        circ.undo();
        assert_eq!(circ.non_identity_count(), 0);
        assert_eq!(circ.cost(), 0.0);
        assert!(approx_eq(circ.matrix(), &matrix::identity(4), EPSILON));
    }

    #[test]
    fn swap_then_undo_restores_the_order() {
        let lib = lib2();
        let h = lib.find("h", &[0]).unwrap();
        let t = lib.find("t", &[1]).unwrap();
        let mut circ = Circuit::from_gates(Arc::clone(&lib), vec![h, t], MaintainerKind::Binary);
        let before = circ.matrix().clone();

        circ.swap(0, 1);
        assert_eq!(circ.gates().to_vec(), vec![t, h]);
        circ.undo();
        assert_eq!(circ.gates().to_vec(), vec![h, t]);
        assert!(approx_eq(circ.matrix(), &before, EPSILON));
    }

    #[test]
    fn invert_produces_the_adjoint() {
        let lib = lib2();
        let gates = vec![
            lib.find("h", &[0]).unwrap(),
            lib.find("t", &[1]).unwrap(),
            lib.find("cx", &[0, 1]).unwrap(),
        ];
        let mut circ = Circuit::from_gates(Arc::clone(&lib), gates, MaintainerKind::Linear);
        let original = circ.matrix().clone();
        circ.invert().unwrap();
        assert!(approx_eq(circ.matrix(), &dagger(&original), EPSILON));
    }

    #[test]
    fn permute_qubits_relabels_the_unitary() {
        let lib = lib2();
        let gates = vec![lib.find("cx", &[0, 1]).unwrap(), lib.find("s", &[0]).unwrap()];
        let mut circ = Circuit::from_gates(Arc::clone(&lib), gates, MaintainerKind::Chunked);
        let original = circ.matrix().clone();
        circ.permute_qubits(&[1, 0]).unwrap();
        let expected = matrix::permute_qubits(&original, &[1, 0]);
        assert!(approx_eq(circ.matrix(), &expected, EPSILON));
    }

    #[test]
    fn expand_composites_preserves_the_matrix() {
        let basic = stdgates::clifford_t();
        let composite = crate::gate::CompositeDef {
            name: "th".to_string(),
            num_qubits: 1,
            qubits: vec![0],
            lines: vec![("t".to_string(), vec![0]), ("h".to_string(), vec![0])],
        };
        let lib = Arc::new(GateLibrary::build(2, &basic, &[composite]).unwrap());
        let th = lib.find("th", &[1]).unwrap();
        let mut circ = Circuit::from_gates(Arc::clone(&lib), vec![th], MaintainerKind::Linear);
        let before = circ.matrix().clone();
        circ.expand_composites();
        assert_eq!(circ.len(), 2);
        assert!(circ.gates().iter().all(|&id| lib.gate(id).is_basic()));
        assert!(approx_eq(circ.matrix(), &before, EPSILON));
    }

    #[test]
    fn counts_and_depth_follow_names() {
        let lib = lib2();
        let t_names = vec!["t".to_string(), "tdg".to_string()];
        let gates = vec![
            lib.find("t", &[0]).unwrap(),
            lib.find("t", &[1]).unwrap(),
            lib.find("cx", &[0, 1]).unwrap(),
            lib.find("tdg", &[1]).unwrap(),
            lib.find("h", &[0]).unwrap(),
        ];
        let circ = Circuit::from_gates(Arc::clone(&lib), gates, MaintainerKind::Linear);
        assert_eq!(circ.count_by_names(&t_names), 3);
        // t(0) and t(1) share a layer; cx synchronizes; tdg(1) adds one.
        assert_eq!(circ.depth_by_names(&t_names), 2);
    }

    #[test]
    fn suspended_tracking_defers_matrix_work() {
        let lib = lib2();
        let mut circ = Circuit::identity(Arc::clone(&lib), 3, MaintainerKind::Binary);
        circ.suspend_tracking();
        let h = lib.find("h", &[1]).unwrap();
        let z = lib.find("z", &[0]).unwrap();
        circ.replace(0, h);
        circ.replace(2, z);
        circ.resume_tracking();
        let expected = lib.gate(z).matrix.dot(&lib.gate(h).matrix);
        assert!(approx_eq(circ.matrix(), &expected, EPSILON));
    }
}
