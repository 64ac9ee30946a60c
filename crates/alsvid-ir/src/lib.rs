//! Alsvid Circuit Representation
//!
//! This crate provides the data model for the Alsvid synthesizer: gates and
//! gate libraries, fixed-length circuits over those libraries, and the
//! incremental matrix maintainers that keep a circuit's unitary up to date
//! while single positions are rewritten.
//!
//! # Core Components
//!
//! - **Matrices**: [`Unitary`] (`ndarray` complex matrices) plus the embedding
//!   and qubit-relabeling helpers in [`matrix`]
//! - **Gates**: [`Gate`], [`GateKind`], and the [`GateId`] handles circuits
//!   store; [`stdgates`] supplies a built-in Clifford+T set
//! - **Library**: [`GateLibrary`], the permutation-closed gate table a circuit
//!   draws from
//! - **Maintainers**: [`MatrixMaintainer`] with linear, chunked, and
//!   segment-tree strategies
//! - **Circuit**: [`Circuit`], a fixed-length gate sequence with incremental
//!   cost and matrix upkeep and single-edit undo
//! - **Codec**: [`qasm`] for the OPENQASM 2.0 subset used for interchange
//!
//! Convention: gates apply left to right, so the circuit unitary is the
//! product of gate matrices with the later gates on the left.

pub mod circuit;
pub mod error;
pub mod gate;
pub mod library;
pub mod maintainer;
pub mod matrix;
pub mod qasm;
pub mod stdgates;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::{CompositeDef, Gate, GateDef, GateId, GateKind};
pub use library::GateLibrary;
pub use maintainer::{MaintainerKind, MatrixMaintainer};
pub use matrix::Unitary;
