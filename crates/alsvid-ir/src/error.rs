//! Error types for the IR crate.

use thiserror::Error;

/// Errors that can occur while building libraries or editing circuits.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Library construction left no non-identity gate to sample.
    #[error("gate library contains no usable gate for {num_qubits} qubit(s)")]
    EmptyLibrary {
        /// Qubit count the library was built for.
        num_qubits: u32,
    },

    /// A named gate instance does not exist in the library.
    #[error("unknown gate '{name}' on qubits {qubits:?}")]
    UnknownGate {
        /// Requested gate name.
        name: String,
        /// Requested acting qubits.
        qubits: Vec<u32>,
    },

    /// A composite definition references a gate the basic set cannot resolve.
    #[error("composite gate '{composite}' references unresolvable gate '{name}' on qubits {qubits:?}")]
    UnresolvableDecomposition {
        /// Name of the composite being built.
        composite: String,
        /// Referenced gate name.
        name: String,
        /// Referenced acting qubits.
        qubits: Vec<u32>,
    },

    /// The library holds no gate whose matrix is the adjoint of this one.
    #[error("gate '{name}' has no inverse in the library")]
    NoInverse {
        /// Name of the gate without an adjoint counterpart.
        name: String,
    },

    /// Circuit and library disagree on the qubit count.
    #[error("expected {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Qubit count of the library.
        expected: u32,
        /// Qubit count that was supplied.
        got: u32,
    },

    /// A QASM line could not be resolved against the library.
    #[error("cannot construct gate from line {line_no}: '{line}'")]
    QasmParse {
        /// One-based line number in the input.
        line_no: usize,
        /// The offending line text.
        line: String,
    },

    /// A qubit permutation has the wrong length or is not a permutation.
    #[error("invalid qubit permutation {permutation:?} for {num_qubits} qubit(s)")]
    InvalidPermutation {
        /// The rejected permutation.
        permutation: Vec<u32>,
        /// Qubit count it was applied to.
        num_qubits: u32,
    },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
