//! Single-gate update throughput of the three matrix maintainers.

use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use alsvid_ir::{Circuit, GateLibrary, MaintainerKind, stdgates};

const CIRCUIT_LEN: usize = 64;

fn random_circuit(lib: &Arc<GateLibrary>, kind: MaintainerKind, rng: &mut SmallRng) -> Circuit {
    let gates = (0..CIRCUIT_LEN)
        .map(|_| alsvid_ir::GateId(rng.gen_range(0..lib.len()) as u32))
        .collect();
    Circuit::from_gates(Arc::clone(lib), gates, kind)
}

fn bench_updates(c: &mut Criterion) {
    let lib = Arc::new(GateLibrary::build(3, &stdgates::clifford_t(), &[]).unwrap());
    let mut group = c.benchmark_group("maintainer_update");

    for (name, kind) in [
        ("linear", MaintainerKind::Linear),
        ("chunked", MaintainerKind::Chunked),
        ("binary", MaintainerKind::Binary),
    ] {
        group.bench_function(name, |b| {
            let mut rng = SmallRng::seed_from_u64(17);
            let mut circuit = random_circuit(&lib, kind, &mut rng);
            b.iter(|| {
                let position = rng.gen_range(0..circuit.len());
                let gate = alsvid_ir::GateId(rng.gen_range(0..lib.len()) as u32);
                circuit.replace(position, gate);
                circuit.matrix()[[0, 0]]
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_updates);
criterion_main!(benches);
