//! Complex matrix helpers shared across the workspace.
//!
//! Unitaries are dense `ndarray` matrices over `Complex64`. Qubit 0 is the
//! least significant bit of a basis-state index, so embedding a small gate
//! into a larger register places it on the low-order qubits.

use ndarray::Array2;
use ndarray::linalg::kron;
use num_complex::Complex64;

/// Dense complex matrix used for gate and circuit unitaries.
pub type Unitary = Array2<Complex64>;

/// Tolerance for entrywise matrix comparison.
pub const EPSILON: f64 = 1e-9;

/// Identity matrix of the given dimension.
pub fn identity(dim: usize) -> Unitary {
    Array2::eye(dim)
}

/// Dimension of the unitary acting on `num_qubits` qubits.
pub fn dim(num_qubits: u32) -> usize {
    1 << num_qubits
}

/// Conjugate transpose.
pub fn dagger(m: &Unitary) -> Unitary {
    m.t().mapv(|v| v.conj())
}

/// Entrywise comparison within `tol`.
pub fn approx_eq(a: &Unitary, b: &Unitary, tol: f64) -> bool {
    if a.dim() != b.dim() {
        return false;
    }
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).norm() <= tol)
}

/// Sum of `conj(a[i][j]) * b[i][j]` over all entries, `tr(a† b)`.
pub fn trace_conj_product(a: &Unitary, b: &Unitary) -> Complex64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.conj() * y)
        .sum()
}

/// Embeds a gate matrix into a register of `num_qubits` qubits.
///
/// The gate keeps acting on the low-order qubits; the identity is placed on
/// the high-order factor.
pub fn embed(m: &Unitary, num_qubits: u32) -> Unitary {
    let extra = dim(num_qubits) / m.nrows();
    if extra == 1 {
        return m.clone();
    }
    kron(&identity(extra), m)
}

/// Basis-state index map for a qubit relabeling.
///
/// Entry `i` of the result is the index obtained by moving bit `q` of `i`
/// to bit position `perm[q]`, for every qubit `q`.
pub fn index_permutation(perm: &[u32]) -> Vec<usize> {
    let n = perm.len();
    (0..1usize << n)
        .map(|i| {
            let mut out = 0usize;
            for (q, &target) in perm.iter().enumerate() {
                out |= ((i >> q) & 1) << target;
            }
            out
        })
        .collect()
}

/// Relabels the qubits of a register-sized matrix.
///
/// Row and column indices are both mapped through [`index_permutation`], so
/// the result is the same operator expressed with qubit `q` renamed to
/// `perm[q]`.
pub fn permute_qubits(m: &Unitary, perm: &[u32]) -> Unitary {
    let map = index_permutation(perm);
    let mut out = Unitary::zeros(m.raw_dim());
    for i in 0..m.nrows() {
        for j in 0..m.ncols() {
            out[[map[i], map[j]]] = m[[i, j]];
        }
    }
    out
}

/// All permutations of `0..n` in lexicographic order.
pub fn permutations(n: u32) -> Vec<Vec<u32>> {
    let mut current: Vec<u32> = (0..n).collect();
    let mut out = vec![current.clone()];
    while next_permutation(&mut current) {
        out.push(current.clone());
    }
    out
}

// Lexicographic successor, false once the sequence wraps around.
fn next_permutation(seq: &mut [u32]) -> bool {
    if seq.len() < 2 {
        return false;
    }
    let mut i = seq.len() - 1;
    while i > 0 && seq[i - 1] >= seq[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }
    let mut j = seq.len() - 1;
    while seq[j] <= seq[i - 1] {
        j -= 1;
    }
    seq.swap(i - 1, j);
    seq[i..].reverse();
    true
}
