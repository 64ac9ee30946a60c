//! Built-in gate definitions for the Clifford+T set.
//!
//! Each constructor returns a [`GateDef`] at the gate's own size with unit
//! cost (identity excepted). Matrices follow the qubit-0-is-LSB convention
//! used throughout the crate.

use std::f64::consts::FRAC_1_SQRT_2;

use ndarray::array;
use num_complex::Complex64;

use crate::gate::GateDef;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

fn single(name: &str, matrix: crate::Unitary) -> GateDef {
    GateDef {
        name: name.to_string(),
        num_qubits: 1,
        cost: 1.0,
        qubits: vec![0],
        matrix,
    }
}

/// Hadamard.
pub fn h() -> GateDef {
    let c = Complex64::new(FRAC_1_SQRT_2, 0.0);
    single("h", array![[c, c], [c, -c]])
}

/// Pauli X.
pub fn x() -> GateDef {
    single("x", array![[ZERO, ONE], [ONE, ZERO]])
}

/// Pauli Y.
pub fn y() -> GateDef {
    single("y", array![[ZERO, -I], [I, ZERO]])
}

/// Pauli Z.
pub fn z() -> GateDef {
    single("z", array![[ONE, ZERO], [ZERO, -ONE]])
}

/// Phase gate, `diag(1, i)`.
pub fn s() -> GateDef {
    single("s", array![[ONE, ZERO], [ZERO, I]])
}

/// Inverse phase gate.
pub fn sdg() -> GateDef {
    single("sdg", array![[ONE, ZERO], [ZERO, -I]])
}

/// T gate, `diag(1, e^{i pi/4})`.
pub fn t() -> GateDef {
    let phase = Complex64::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2);
    single("t", array![[ONE, ZERO], [ZERO, phase]])
}

/// Inverse T gate.
pub fn tdg() -> GateDef {
    let phase = Complex64::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2);
    single("tdg", array![[ONE, ZERO], [ZERO, phase]])
}

/// Controlled-NOT with control on qubit 0 and target on qubit 1.
pub fn cx() -> GateDef {
    GateDef {
        name: "cx".to_string(),
        num_qubits: 2,
        cost: 1.0,
        qubits: vec![0, 1],
        matrix: array![
            [ONE, ZERO, ZERO, ZERO],
            [ZERO, ZERO, ZERO, ONE],
            [ZERO, ZERO, ONE, ZERO],
            [ZERO, ONE, ZERO, ZERO],
        ],
    }
}

/// The default synthesis set: H, T, T-dagger, CX.
pub fn default_set() -> Vec<GateDef> {
    vec![h(), t(), tdg(), cx()]
}

/// The full built-in set, useful for tests and resynthesis fusion.
pub fn clifford_t() -> Vec<GateDef> {
    vec![h(), x(), y(), z(), s(), sdg(), t(), tdg(), cx()]
}
