//! Property test: all matrix maintainers agree with a fresh full product
//! through arbitrary sequences of single-position edits.

use std::sync::Arc;

use alsvid_ir::matrix::{self, EPSILON, Unitary, approx_eq};
use alsvid_ir::{Circuit, GateLibrary, MaintainerKind, stdgates};
use proptest::prelude::*;

fn library() -> Arc<GateLibrary> {
    Arc::new(GateLibrary::build(2, &stdgates::clifford_t(), &[]).unwrap())
}

fn full_product(circuit: &Circuit) -> Unitary {
    let lib = circuit.library();
    let mut acc = matrix::identity(1 << circuit.num_qubits());
    for &id in circuit.gates() {
        acc = lib.gate(id).matrix.dot(&acc);
    }
    acc
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn maintainers_agree_under_random_edits(
        len in 0usize..50,
        picks in prop::collection::vec((any::<u32>(), any::<u32>()), 0..40),
    ) {
        let lib = library();
        let n_gates = lib.len() as u32;

        let mut circuits: Vec<Circuit> = [
            MaintainerKind::Linear,
            MaintainerKind::Chunked,
            MaintainerKind::Binary,
        ]
        .into_iter()
        .map(|kind| Circuit::identity(Arc::clone(&lib), len, kind))
        .collect();

        for (pos_seed, gate_seed) in picks {
            if len == 0 {
                break;
            }
            let position = pos_seed as usize % len;
            let id = alsvid_ir::GateId(gate_seed % n_gates);
            for circuit in &mut circuits {
                circuit.replace(position, id);
            }
            let expected = full_product(&circuits[0]);
            for circuit in &mut circuits {
                prop_assert!(
                    approx_eq(circuit.matrix(), &expected, EPSILON),
                    "maintainer diverged after edit at {}",
                    position
                );
            }
        }
    }
}
