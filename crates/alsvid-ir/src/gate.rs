//! Gates and the handles circuits use to refer to them.

use crate::matrix::Unitary;

/// Handle into a [`GateLibrary`](crate::GateLibrary) table.
///
/// Circuits store these instead of owned gates; all gate data lives in the
/// library, built once per qubit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GateId(pub u32);

impl GateId {
    /// Index into the library's gate table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Whether a gate is elementary or defined by a decomposition.
#[derive(Debug, Clone, PartialEq)]
pub enum GateKind {
    /// Elementary gate given directly by its matrix.
    Basic,
    /// Gate built from a sequence of basic library gates.
    Composite {
        /// Basic gates realizing this gate, in application order.
        decomposition: Vec<GateId>,
    },
}

/// A gate instance stored in a library.
///
/// The matrix is always register sized (embedded and relabeled for the
/// library's qubit count), so circuit products never need re-embedding.
#[derive(Debug, Clone)]
pub struct Gate {
    /// Gate name as it appears in QASM output.
    pub name: String,
    /// Register-sized unitary.
    pub matrix: Unitary,
    /// Qubits the gate acts on, in operand order.
    pub qubits: Vec<u32>,
    /// Cost contribution in the performance metric.
    pub cost: f64,
    /// Basic or composite.
    pub kind: GateKind,
}

impl Gate {
    /// Decomposition into basic gates; empty for basic gates.
    pub fn decomposition(&self) -> &[GateId] {
        match &self.kind {
            GateKind::Basic => &[],
            GateKind::Composite { decomposition } => decomposition,
        }
    }

    /// True if this is a basic (non-decomposed) gate.
    pub fn is_basic(&self) -> bool {
        matches!(self.kind, GateKind::Basic)
    }
}

/// A basic gate definition as supplied to the library builder.
///
/// The matrix is given at the gate's own size (`2^num_qubits`); the library
/// embeds it and closes over qubit permutations.
#[derive(Debug, Clone)]
pub struct GateDef {
    /// Gate name.
    pub name: String,
    /// Number of qubits the matrix is given for.
    pub num_qubits: u32,
    /// Cost of one application.
    pub cost: f64,
    /// Acting qubits in the definition's own frame.
    pub qubits: Vec<u32>,
    /// Unitary of size `2^num_qubits`.
    pub matrix: Unitary,
}

/// A composite gate definition: a name plus a sequence of basic gate lines.
///
/// Cost and matrix are derived from the decomposition when the library is
/// built.
#[derive(Debug, Clone)]
pub struct CompositeDef {
    /// Gate name.
    pub name: String,
    /// Number of qubits the decomposition is written for.
    pub num_qubits: u32,
    /// Acting qubits in the definition's own frame.
    pub qubits: Vec<u32>,
    /// Decomposition lines as (gate name, acting qubits), in order.
    pub lines: Vec<(String, Vec<u32>)>,
}
