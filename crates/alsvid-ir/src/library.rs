//! Permutation-closed gate tables.
//!
//! A [`GateLibrary`] is built once per qubit count from basic and composite
//! definitions. Every definition is embedded to register size and expanded
//! over all qubit permutations, deduplicated by name and acting qubits, so a
//! circuit can use any instance of an operation without further matrix work.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{IrError, IrResult};
use crate::gate::{CompositeDef, Gate, GateDef, GateId, GateKind};
use crate::matrix::{self, EPSILON, Unitary};

/// Name of the distinguished identity gate.
pub const IDENTITY_NAME: &str = "id";

/// Gate table for a fixed qubit count.
#[derive(Debug, Clone)]
pub struct GateLibrary {
    num_qubits: u32,
    gates: Vec<Gate>,
    identity: GateId,
    basic: Vec<GateId>,
    composite: Vec<GateId>,
    basic_by_name: Vec<Vec<GateId>>,
    composite_by_name: Vec<Vec<GateId>>,
    by_key: FxHashMap<(String, Vec<u32>), GateId>,
    daggers: Vec<Option<GateId>>,
    max_basic_cost: f64,
    max_cost: f64,
}

impl GateLibrary {
    /// Builds a library from basic and composite definitions.
    ///
    /// Definitions on more qubits than the register are skipped. Fails if no
    /// non-identity basic gate survives the filtering, or if a composite line
    /// cannot be resolved against the basic set.
    pub fn build(
        num_qubits: u32,
        basic_defs: &[GateDef],
        composite_defs: &[CompositeDef],
    ) -> IrResult<Self> {
        let dim = matrix::dim(num_qubits);
        let mut lib = Self {
            num_qubits,
            gates: Vec::new(),
            identity: GateId(0),
            basic: Vec::new(),
            composite: Vec::new(),
            basic_by_name: Vec::new(),
            composite_by_name: Vec::new(),
            by_key: FxHashMap::default(),
            daggers: Vec::new(),
            max_basic_cost: 0.0,
            max_cost: 0.0,
        };

        lib.push_gate(Gate {
            name: IDENTITY_NAME.to_string(),
            matrix: matrix::identity(dim),
            qubits: vec![0],
            cost: 0.0,
            kind: GateKind::Basic,
        });

        let perms = matrix::permutations(num_qubits);
        for def in basic_defs {
            if def.num_qubits > num_qubits {
                debug!(gate = %def.name, "skipping definition larger than register");
                continue;
            }
            lib.max_basic_cost = lib.max_basic_cost.max(def.cost);
            let embedded = matrix::embed(&def.matrix, num_qubits);
            let mut group = Vec::new();
            for perm in &perms {
                let qubits: Vec<u32> = def.qubits.iter().map(|&q| perm[q as usize]).collect();
                let key = (def.name.clone(), qubits.clone());
                if lib.by_key.contains_key(&key) {
                    continue;
                }
                let id = lib.push_gate(Gate {
                    name: def.name.clone(),
                    matrix: matrix::permute_qubits(&embedded, perm),
                    qubits,
                    cost: def.cost,
                    kind: GateKind::Basic,
                });
                lib.basic.push(id);
                group.push(id);
            }
            if !group.is_empty() {
                lib.basic_by_name.push(group);
            }
        }

        if lib.basic.is_empty() {
            return Err(IrError::EmptyLibrary { num_qubits });
        }

        for def in composite_defs {
            if def.num_qubits > num_qubits {
                debug!(gate = %def.name, "skipping definition larger than register");
                continue;
            }
            let mut group = Vec::new();
            for perm in &perms {
                let qubits: Vec<u32> = def.qubits.iter().map(|&q| perm[q as usize]).collect();
                let key = (def.name.clone(), qubits.clone());
                if lib.by_key.contains_key(&key) {
                    continue;
                }
                let (decomposition, matrix, cost) = lib.resolve_decomposition(def, perm)?;
                let id = lib.push_gate(Gate {
                    name: def.name.clone(),
                    matrix,
                    qubits,
                    cost,
                    kind: GateKind::Composite { decomposition },
                });
                lib.composite.push(id);
                group.push(id);
            }
            if !group.is_empty() {
                lib.composite_by_name.push(group);
            }
        }

        lib.max_cost = lib.gates.iter().fold(0.0, |acc, g| acc.max(g.cost));
        lib.daggers = lib
            .gates
            .iter()
            .map(|gate| {
                let adjoint = matrix::dagger(&gate.matrix);
                lib.gates
                    .iter()
                    .position(|other| matrix::approx_eq(&other.matrix, &adjoint, EPSILON))
                    .map(|idx| GateId(idx as u32))
            })
            .collect();
        Ok(lib)
    }

    fn push_gate(&mut self, gate: Gate) -> GateId {
        let id = GateId(self.gates.len() as u32);
        self.by_key
            .insert((gate.name.clone(), gate.qubits.clone()), id);
        self.gates.push(gate);
        id
    }

    // Resolves a composite definition's lines under a qubit relabeling.
    // The derived matrix multiplies later lines on the left; the cost is the
    // sum of the resolved gates' costs.
    fn resolve_decomposition(
        &self,
        def: &CompositeDef,
        perm: &[u32],
    ) -> IrResult<(Vec<GateId>, Unitary, f64)> {
        let mut decomposition = Vec::with_capacity(def.lines.len());
        let mut acc = matrix::identity(matrix::dim(self.num_qubits));
        let mut cost = 0.0;
        for (name, qubits) in &def.lines {
            let relabeled: Vec<u32> = qubits.iter().map(|&q| perm[q as usize]).collect();
            let id = self
                .find(name, &relabeled)
                .filter(|id| self.gate(*id).is_basic())
                .ok_or_else(|| IrError::UnresolvableDecomposition {
                    composite: def.name.clone(),
                    name: name.clone(),
                    qubits: relabeled.clone(),
                })?;
            let gate = self.gate(id);
            acc = gate.matrix.dot(&acc);
            cost += gate.cost;
            decomposition.push(id);
        }
        Ok((decomposition, acc, cost))
    }

    /// Qubit count the library was built for.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Number of gate instances, identity included.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// True when only the identity is present. Construction rejects this.
    pub fn is_empty(&self) -> bool {
        self.gates.len() <= 1
    }

    /// Gate data for a handle.
    pub fn gate(&self, id: GateId) -> &Gate {
        &self.gates[id.index()]
    }

    /// Handle of the identity gate.
    pub fn identity(&self) -> GateId {
        self.identity
    }

    /// True if the handle refers to the identity gate.
    pub fn is_identity(&self, id: GateId) -> bool {
        id == self.identity
    }

    /// Looks up a gate instance by name and acting qubits.
    pub fn find(&self, name: &str, qubits: &[u32]) -> Option<GateId> {
        self.by_key.get(&(name.to_string(), qubits.to_vec())).copied()
    }

    /// Like [`find`](Self::find) but failing with [`IrError::UnknownGate`].
    pub fn resolve(&self, name: &str, qubits: &[u32]) -> IrResult<GateId> {
        self.find(name, qubits).ok_or_else(|| IrError::UnknownGate {
            name: name.to_string(),
            qubits: qubits.to_vec(),
        })
    }

    /// Library gate whose matrix is the adjoint of `id`, if present.
    pub fn dagger_of(&self, id: GateId) -> Option<GateId> {
        self.daggers[id.index()]
    }

    /// True when every gate has an adjoint counterpart in the library, so
    /// [`Circuit::invert`](crate::Circuit::invert) cannot fail.
    pub fn dagger_closed(&self) -> bool {
        self.daggers.iter().all(Option::is_some)
    }

    /// Cheapest-first fusion lookup: any gate with the given matrix and cost
    /// strictly below `cost_bound`.
    pub fn match_matrix(&self, m: &Unitary, cost_bound: f64) -> Option<GateId> {
        self.gates
            .iter()
            .enumerate()
            .find(|(_, g)| g.cost < cost_bound && matrix::approx_eq(&g.matrix, m, EPSILON))
            .map(|(idx, _)| GateId(idx as u32))
    }

    /// All basic gate instances, identity excluded.
    pub fn basic(&self) -> &[GateId] {
        &self.basic
    }

    /// All composite gate instances.
    pub fn composite(&self) -> &[GateId] {
        &self.composite
    }

    /// Basic instances grouped by operation name.
    pub fn basic_by_name(&self) -> &[Vec<GateId>] {
        &self.basic_by_name
    }

    /// Composite instances grouped by operation name.
    pub fn composite_by_name(&self) -> &[Vec<GateId>] {
        &self.composite_by_name
    }

    /// Largest cost among basic definitions.
    pub fn max_basic_cost(&self) -> f64 {
        self.max_basic_cost
    }

    /// Largest cost among all gates.
    pub fn max_cost(&self) -> f64 {
        self.max_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{approx_eq, dagger};
    use crate::stdgates;

    fn lib2() -> GateLibrary {
        GateLibrary::build(2, &stdgates::clifford_t(), &[]).unwrap()
    }

    #[test]
    fn expands_instances_over_qubit_permutations() {
        let lib = lib2();
        // Single-qubit gates appear once per qubit, cx once per ordered pair.
        assert!(lib.find("h", &[0]).is_some());
        assert!(lib.find("h", &[1]).is_some());
        assert!(lib.find("cx", &[0, 1]).is_some());
        assert!(lib.find("cx", &[1, 0]).is_some());
        assert!(lib.find("cx", &[0, 0]).is_none());
        // 8 single-qubit names * 2 qubits + cx * 2 orders
        assert_eq!(lib.basic().len(), 18);
    }

    #[test]
    fn identity_is_distinguished_and_free() {
        let lib = lib2();
        let id = lib.identity();
        assert_eq!(lib.gate(id).name, IDENTITY_NAME);
        assert_eq!(lib.gate(id).cost, 0.0);
        assert!(lib.is_identity(id));
    }

    #[test]
    fn dagger_lookup_pairs_t_with_tdg() {
        let lib = lib2();
        let t = lib.find("t", &[0]).unwrap();
        let tdg = lib.find("tdg", &[0]).unwrap();
        assert_eq!(lib.dagger_of(t), Some(tdg));
        assert_eq!(lib.dagger_of(tdg), Some(t));
        // Self-inverse gates map to themselves.
        let h = lib.find("h", &[1]).unwrap();
        assert_eq!(lib.dagger_of(h), Some(h));
    }

    #[test]
    fn oversized_definitions_are_skipped() {
        let lib = GateLibrary::build(1, &stdgates::clifford_t(), &[]).unwrap();
        assert!(lib.find("cx", &[0, 1]).is_none());
        assert!(lib.find("h", &[0]).is_some());
    }

    #[test]
    fn empty_library_is_rejected() {
        let only_cx = vec![stdgates::cx()];
        let err = GateLibrary::build(1, &only_cx, &[]).unwrap_err();
        assert!(matches!(err, IrError::EmptyLibrary { num_qubits: 1 }));
    }

    #[test]
    fn composite_matrix_and_cost_follow_decomposition() {
        let defs = stdgates::clifford_t();
        let composite = CompositeDef {
            name: "s2".to_string(),
            num_qubits: 1,
            qubits: vec![0],
            lines: vec![("t".to_string(), vec![0]), ("t".to_string(), vec![0])],
        };
        let lib = GateLibrary::build(2, &defs, &[composite]).unwrap();
        let s2 = lib.find("s2", &[1]).unwrap();
        let s = lib.find("s", &[1]).unwrap();
        assert!(approx_eq(&lib.gate(s2).matrix, &lib.gate(s).matrix, EPSILON));
        assert_eq!(lib.gate(s2).cost, 2.0);
        assert_eq!(lib.gate(s2).decomposition().len(), 2);
    }

    #[test]
    fn match_matrix_requires_strict_improvement() {
        let lib = lib2();
        let s = lib.find("s", &[0]).unwrap();
        let matrix = lib.gate(s).matrix.clone();
        // Equal cost does not match, higher bound does.
        assert!(lib.match_matrix(&matrix, 1.0).is_none());
        assert_eq!(lib.match_matrix(&matrix, 1.5), Some(s));
        // An identity-valued window fuses to the free identity gate.
        let id_matrix = lib.gate(s).matrix.dot(&dagger(&lib.gate(s).matrix));
        assert_eq!(lib.match_matrix(&id_matrix, 0.5), Some(lib.identity()));
    }
}
