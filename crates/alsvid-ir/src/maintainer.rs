//! Incremental upkeep of a circuit's unitary.
//!
//! All strategies expose the same contract: `calculate` rebuilds from the
//! whole gate list, `update` refreshes after a single-position edit, and
//! `matrix` returns the current product. Gates apply left to right, so the
//! product has the later gates on the left.
//!
//! - [`Linear`](MaintainerKind::Linear) recomputes the full product on every
//!   edit.
//! - [`Chunked`](MaintainerKind::Chunked) caches one partial product per
//!   `sqrt(L)`-sized chunk and rebuilds only the edited chunk, deferring the
//!   final cross-chunk product to the next read.
//! - [`Binary`](MaintainerKind::Binary) keeps a segment tree of pairwise
//!   products and refreshes the leaf-to-root chain of the edited position.
//!
//! Length changes invalidate cached layouts; callers go through `calculate`
//! after any edit that is not a same-length replacement.

use crate::gate::GateId;
use crate::library::GateLibrary;
use crate::matrix::{self, Unitary};

/// Strategy selector for [`MatrixMaintainer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintainerKind {
    /// Full recompute per edit.
    Linear,
    /// Square-root chunking with a lazily rebuilt total.
    Chunked,
    /// Segment tree with logarithmic updates.
    Binary,
}

/// Incremental matrix maintainer over a gate list.
#[derive(Debug, Clone)]
pub enum MatrixMaintainer {
    /// See [`MaintainerKind::Linear`].
    Linear {
        /// Current full product.
        matrix: Unitary,
    },
    /// See [`MaintainerKind::Chunked`].
    Chunked {
        /// Cached per-chunk products, earlier chunks first.
        chunks: Vec<Unitary>,
        /// Gates per chunk.
        chunk_len: usize,
        /// Gate count the layout was built for.
        len: usize,
        /// Memoized total, rebuilt when `dirty`.
        matrix: Unitary,
        /// Set by `update`, cleared on read.
        dirty: bool,
    },
    /// See [`MaintainerKind::Binary`].
    Binary {
        /// Levels of pairwise products; `tree[0]` pairs the gates, the last
        /// level holds the root.
        tree: Vec<Vec<Unitary>>,
        /// Gate count the tree was built for.
        len: usize,
    },
}

impl MatrixMaintainer {
    /// Creates a maintainer of the given kind and computes the initial product.
    pub fn new(kind: MaintainerKind, lib: &GateLibrary, gates: &[GateId]) -> Self {
        let dim = matrix::dim(lib.num_qubits());
        let mut maintainer = match kind {
            MaintainerKind::Linear => Self::Linear {
                matrix: matrix::identity(dim),
            },
            MaintainerKind::Chunked => Self::Chunked {
                chunks: Vec::new(),
                chunk_len: 1,
                len: usize::MAX,
                matrix: matrix::identity(dim),
                dirty: false,
            },
            MaintainerKind::Binary => Self::Binary {
                tree: Vec::new(),
                len: usize::MAX,
            },
        };
        maintainer.calculate(lib, gates);
        maintainer
    }

    /// Kind of this maintainer.
    pub fn kind(&self) -> MaintainerKind {
        match self {
            Self::Linear { .. } => MaintainerKind::Linear,
            Self::Chunked { .. } => MaintainerKind::Chunked,
            Self::Binary { .. } => MaintainerKind::Binary,
        }
    }

    /// Rebuilds all cached state from the full gate list.
    pub fn calculate(&mut self, lib: &GateLibrary, gates: &[GateId]) {
        let dim = matrix::dim(lib.num_qubits());
        match self {
            Self::Linear { matrix } => {
                *matrix = product(lib, gates, dim);
            }
            Self::Chunked {
                chunks,
                chunk_len,
                len,
                matrix,
                dirty,
            } => {
                if *len != gates.len() {
                    let n_chunks = (gates.len() as f64).sqrt().ceil().max(1.0) as usize;
                    *chunk_len = gates.len().div_ceil(n_chunks).max(1);
                    *chunks = vec![matrix::identity(dim); n_chunks];
                    *len = gates.len();
                }
                let chunk_len = *chunk_len;
                for c in 0..chunks.len() {
                    let lo = c * chunk_len;
                    let hi = ((c + 1) * chunk_len).min(gates.len());
                    chunks[c] = product(lib, &gates[lo..hi], dim);
                }
                *matrix = matrix::identity(dim);
                *dirty = true;
            }
            Self::Binary { tree, len } => {
                if *len != gates.len() {
                    *tree = build_tree_layout(gates.len(), dim);
                    *len = gates.len();
                }
                for leaf in 0..tree[0].len() {
                    tree[0][leaf] = leaf_product(lib, gates, leaf, dim);
                }
                for level in 1..tree.len() {
                    for node in 0..tree[level].len() {
                        tree[level][node] = pair_product(&tree[level - 1], node, dim);
                    }
                }
            }
        }
    }

    /// Refreshes cached state after the gate at `position` was replaced.
    ///
    /// The gate list must have the same length as at the last `calculate`.
    pub fn update(&mut self, position: usize, lib: &GateLibrary, gates: &[GateId]) {
        let dim = matrix::dim(lib.num_qubits());
        match self {
            Self::Linear { matrix } => {
                *matrix = product(lib, gates, dim);
            }
            Self::Chunked {
                chunks,
                chunk_len,
                dirty,
                ..
            } => {
                let c = position / *chunk_len;
                let lo = c * *chunk_len;
                let hi = ((c + 1) * *chunk_len).min(gates.len());
                chunks[c] = product(lib, &gates[lo..hi], dim);
                *dirty = true;
            }
            Self::Binary { tree, .. } => {
                let mut node = position / 2;
                tree[0][node] = leaf_product(lib, gates, node, dim);
                for level in 1..tree.len() {
                    node /= 2;
                    tree[level][node] = pair_product(&tree[level - 1], node, dim);
                }
            }
        }
    }

    /// Current circuit unitary.
    pub fn matrix(&mut self) -> &Unitary {
        match self {
            Self::Linear { matrix } => matrix,
            Self::Chunked {
                chunks,
                matrix,
                dirty,
                ..
            } => {
                if *dirty {
                    let dim = matrix.nrows();
                    let mut acc = matrix::identity(dim);
                    for chunk in chunks.iter() {
                        acc = chunk.dot(&acc);
                    }
                    *matrix = acc;
                    *dirty = false;
                }
                matrix
            }
            Self::Binary { tree, .. } => {
                let last = tree.len() - 1;
                &tree[last][0]
            }
        }
    }
}

// Product of a gate slice in application order: later gates on the left.
fn product(lib: &GateLibrary, gates: &[GateId], dim: usize) -> Unitary {
    let mut acc = matrix::identity(dim);
    for &id in gates {
        acc = lib.gate(id).matrix.dot(&acc);
    }
    acc
}

// Leaf `j` covers gates `2j` and `2j + 1`; an unpaired last gate is copied.
fn leaf_product(lib: &GateLibrary, gates: &[GateId], leaf: usize, dim: usize) -> Unitary {
    let lo = 2 * leaf;
    if lo + 1 < gates.len() {
        lib.gate(gates[lo + 1]).matrix.dot(&lib.gate(gates[lo]).matrix)
    } else if lo < gates.len() {
        lib.gate(gates[lo]).matrix.clone()
    } else {
        matrix::identity(dim)
    }
}

// Inner node `p` pairs children `2p` and `2p + 1`; an odd node is copied up.
fn pair_product(below: &[Unitary], node: usize, dim: usize) -> Unitary {
    let lo = 2 * node;
    if lo + 1 < below.len() {
        below[lo + 1].dot(&below[lo])
    } else if lo < below.len() {
        below[lo].clone()
    } else {
        matrix::identity(dim)
    }
}

fn build_tree_layout(n_gates: usize, dim: usize) -> Vec<Vec<Unitary>> {
    let mut sizes = Vec::new();
    let mut size = n_gates.div_ceil(2).max(1);
    sizes.push(size);
    while size > 1 {
        size = size.div_ceil(2);
        sizes.push(size);
    }
    sizes
        .into_iter()
        .map(|s| vec![matrix::identity(dim); s])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{EPSILON, approx_eq};
    use crate::stdgates;

    fn lib2() -> GateLibrary {
        GateLibrary::build(2, &stdgates::clifford_t(), &[]).unwrap()
    }

    fn sequence(lib: &GateLibrary) -> Vec<GateId> {
        vec![
            lib.find("h", &[0]).unwrap(),
            lib.find("cx", &[0, 1]).unwrap(),
            lib.find("t", &[1]).unwrap(),
            lib.identity(),
            lib.find("cx", &[1, 0]).unwrap(),
            lib.find("tdg", &[0]).unwrap(),
            lib.find("h", &[1]).unwrap(),
        ]
    }

    fn reference(lib: &GateLibrary, gates: &[GateId]) -> Unitary {
        product(lib, gates, 4)
    }

    #[test]
    fn all_kinds_agree_after_construction() {
        let lib = lib2();
        let gates = sequence(&lib);
        let expected = reference(&lib, &gates);
        for kind in [
            MaintainerKind::Linear,
            MaintainerKind::Chunked,
            MaintainerKind::Binary,
        ] {
            let mut m = MatrixMaintainer::new(kind, &lib, &gates);
            assert!(
                approx_eq(m.matrix(), &expected, EPSILON),
                "{kind:?} diverges from the full product"
            );
        }
    }

    #[test]
    fn update_tracks_single_position_edits() {
        let lib = lib2();
        let mut gates = sequence(&lib);
        let mut maintainers: Vec<MatrixMaintainer> = [
            MaintainerKind::Linear,
            MaintainerKind::Chunked,
            MaintainerKind::Binary,
        ]
        .into_iter()
        .map(|kind| MatrixMaintainer::new(kind, &lib, &gates))
        .collect();

        let edits = [
            (0, lib.find("z", &[1]).unwrap()),
            (6, lib.find("s", &[0]).unwrap()),
            (3, lib.find("cx", &[0, 1]).unwrap()),
            (3, lib.identity()),
        ];
        for (pos, id) in edits {
            gates[pos] = id;
            let expected = reference(&lib, &gates);
            for m in &mut maintainers {
                m.update(pos, &lib, &gates);
                assert!(
                    approx_eq(m.matrix(), &expected, EPSILON),
                    "{:?} diverges after edit at {pos}",
                    m.kind()
                );
            }
        }
    }

    #[test]
    fn calculate_handles_length_changes() {
        let lib = lib2();
        let long = sequence(&lib);
        let short = &long[..3];
        for kind in [
            MaintainerKind::Linear,
            MaintainerKind::Chunked,
            MaintainerKind::Binary,
        ] {
            let mut m = MatrixMaintainer::new(kind, &lib, &long);
            m.calculate(&lib, short);
            assert!(approx_eq(m.matrix(), &reference(&lib, short), EPSILON));
        }
    }

    #[test]
    fn empty_circuit_is_identity() {
        let lib = lib2();
        for kind in [
            MaintainerKind::Linear,
            MaintainerKind::Chunked,
            MaintainerKind::Binary,
        ] {
            let mut m = MatrixMaintainer::new(kind, &lib, &[]);
            assert!(approx_eq(m.matrix(), &matrix::identity(4), EPSILON));
        }
    }

    #[test]
    fn single_gate_circuit() {
        let lib = lib2();
        let gates = vec![lib.find("h", &[0]).unwrap()];
        for kind in [
            MaintainerKind::Linear,
            MaintainerKind::Chunked,
            MaintainerKind::Binary,
        ] {
            let mut m = MatrixMaintainer::new(kind, &lib, &gates);
            assert!(approx_eq(m.matrix(), &lib.gate(gates[0]).matrix, EPSILON));
        }
    }
}
