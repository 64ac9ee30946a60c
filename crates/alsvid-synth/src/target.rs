//! Partially specified target unitaries and their symmetry closure.

use alsvid_ir::matrix::{self, Unitary};
use ndarray::Array2;

use crate::error::{SynthError, SynthResult};

// Members whose matrices differ by less than this are considered duplicates.
const DEDUP_TOLERANCE: f64 = 1e-6;

/// A target unitary constrained only on covered entries.
///
/// Entries outside the cover are zeroed at construction so the masked cost
/// sums can iterate the matrix directly; the covered squared norm is cached.
#[derive(Debug, Clone)]
pub struct PartialMatrix {
    /// Target matrix, zero outside the cover.
    pub matrix: Unitary,
    /// True where the target constrains the circuit.
    pub cover: Array2<bool>,
    /// Sum of `|matrix[i][j]|^2` over covered entries.
    pub squared_norm: f64,
}

impl PartialMatrix {
    /// Builds a constraint, zeroing uncovered entries.
    ///
    /// Fails if shapes disagree, the dimension is not a power of two, or the
    /// cover is entirely false.
    pub fn new(mut matrix: Unitary, cover: Array2<bool>) -> SynthResult<Self> {
        if cover.dim() != matrix.dim() {
            return Err(SynthError::CoverShapeMismatch {
                cover: cover.dim(),
                matrix: matrix.dim(),
            });
        }
        let dim = matrix.nrows();
        if matrix.ncols() != dim || !dim.is_power_of_two() {
            return Err(SynthError::InvalidDimension { dim });
        }
        if !cover.iter().any(|&c| c) {
            return Err(SynthError::EmptyCover);
        }
        for (m, &c) in matrix.iter_mut().zip(cover.iter()) {
            if !c {
                *m = num_complex::Complex64::new(0.0, 0.0);
            }
        }
        let squared_norm = matrix.iter().map(|v| v.norm_sqr()).sum();
        Ok(Self {
            matrix,
            cover,
            squared_norm,
        })
    }

    /// Fully specified constraint: every entry covered.
    pub fn fully_covered(matrix: Unitary) -> SynthResult<Self> {
        let cover = Array2::from_elem(matrix.dim(), true);
        Self::new(matrix, cover)
    }

    /// Number of qubits of the target.
    pub fn num_qubits(&self) -> u32 {
        self.matrix.nrows().trailing_zeros()
    }

    /// Number of covered entries.
    pub fn covered_count(&self) -> usize {
        self.cover.iter().filter(|&&c| c).count()
    }
}

/// One equivalent rendering of the original target.
#[derive(Debug, Clone)]
pub struct SymmetryMember {
    /// The constraint a circuit may match instead of the original.
    pub target: PartialMatrix,
    /// Qubit relabeling that maps a circuit matching this member back to the
    /// original frame.
    pub permutation: Vec<u32>,
    /// True if the member is the adjoint of a relabeled target; a matching
    /// circuit must be inverted before relabeling.
    pub inverted: bool,
}

/// All renderings of a target that a circuit may legitimately match.
///
/// Built from qubit relabelings of the original and, optionally, their
/// adjoints. Matching any member speeds discovery; the member's correction
/// data turns the found circuit back into one implementing the original.
#[derive(Debug, Clone)]
pub struct SymmetryClass {
    /// The target as given.
    pub original: PartialMatrix,
    /// Deduplicated equivalent renderings; the original is member 0.
    pub members: Vec<SymmetryMember>,
}

impl SymmetryClass {
    /// Builds the closure of `original`.
    ///
    /// With `use_permutations` every qubit relabeling contributes a member;
    /// with `use_inverse` each relabeling also contributes its adjoint (cover
    /// transposed). Members duplicating an earlier matrix and cover are
    /// dropped.
    pub fn build(
        original: PartialMatrix,
        use_permutations: bool,
        use_inverse: bool,
    ) -> SynthResult<Self> {
        let n = original.num_qubits();
        let perms = if use_permutations {
            matrix::permutations(n)
        } else {
            vec![(0..n).collect()]
        };

        let mut members: Vec<SymmetryMember> = Vec::new();
        for perm in &perms {
            let relabeled = matrix::permute_qubits(&original.matrix, perm);
            let cover = permute_cover(&original.cover, perm);
            let back = invert_permutation(perm);

            let direct = PartialMatrix::new(relabeled.clone(), cover.clone())?;
            if !is_duplicate(&members, &direct) {
                members.push(SymmetryMember {
                    target: direct,
                    permutation: back.clone(),
                    inverted: false,
                });
            }

            if use_inverse {
                let adjoint = PartialMatrix::new(matrix::dagger(&relabeled), cover.t().to_owned())?;
                if !is_duplicate(&members, &adjoint) {
                    members.push(SymmetryMember {
                        target: adjoint,
                        permutation: back,
                        inverted: true,
                    });
                }
            }
        }
        Ok(Self { original, members })
    }

    /// Number of qubits of the target.
    pub fn num_qubits(&self) -> u32 {
        self.original.num_qubits()
    }
}

fn is_duplicate(members: &[SymmetryMember], candidate: &PartialMatrix) -> bool {
    members.iter().any(|member| {
        member.target.cover == candidate.cover
            && frobenius_distance(&member.target.matrix, &candidate.matrix) < DEDUP_TOLERANCE
    })
}

fn frobenius_distance(a: &Unitary, b: &Unitary) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).norm_sqr())
        .sum::<f64>()
        .sqrt()
}

fn permute_cover(cover: &Array2<bool>, perm: &[u32]) -> Array2<bool> {
    let map = matrix::index_permutation(perm);
    let mut out = Array2::from_elem(cover.dim(), false);
    for i in 0..cover.nrows() {
        for j in 0..cover.ncols() {
            out[[map[i], map[j]]] = cover[[i, j]];
        }
    }
    out
}

fn invert_permutation(perm: &[u32]) -> Vec<u32> {
    let mut out = vec![0u32; perm.len()];
    for (q, &target) in perm.iter().enumerate() {
        out[target as usize] = q as u32;
    }
    out
}
