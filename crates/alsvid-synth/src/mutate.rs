//! Random single-gate replacement proposals.

use alsvid_ir::{Circuit, GateId, GateLibrary};

use crate::rng::RngHelper;

/// Outcome of one proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proposal {
    /// Position the draw landed on.
    pub position: usize,
    /// The drawn gate.
    pub gate: GateId,
    /// True when the draw equals the incumbent gate and nothing was edited.
    pub unchanged: bool,
}

/// Gate sampler for the annealer.
///
/// A draw is the identity with probability `p_identity`. Otherwise it is a
/// name-first draw with probability `p_name - p_identity` (pick an operation
/// name, then one of its instances), or a flat draw over all instances. In
/// both branches composite gates are downweighted by `p_composite` relative
/// to basic ones, so large composite tables do not crowd out the basic set.
#[derive(Debug, Clone, Copy)]
pub struct Mutator {
    /// Probability of proposing the identity gate.
    pub p_identity: f64,
    /// Relative weight of composite gates against basic ones.
    pub p_composite: f64,
    /// Upper bound of the name-first draw region in `[p_identity, 1]`.
    pub p_name: f64,
}

impl Default for Mutator {
    fn default() -> Self {
        Self {
            p_identity: 0.3,
            p_composite: 0.2,
            p_name: 0.5,
        }
    }
}

impl Mutator {
    /// Draws one gate from the library.
    pub fn draw(&self, lib: &GateLibrary, rng: &mut RngHelper) -> GateId {
        let r = rng.random01();
        if r < self.p_identity {
            return lib.identity();
        }
        if r < self.p_name {
            let groups_b = lib.basic_by_name();
            let groups_c = lib.composite_by_name();
            let nb = groups_b.len() as f64;
            let nc = groups_c.len() as f64;
            let p_basic = nb / (nb + self.p_composite * nc);
            let group = if rng.random01() < p_basic {
                &groups_b[rng.random_index(groups_b.len())]
            } else {
                &groups_c[rng.random_index(groups_c.len())]
            };
            return group[rng.random_index(group.len())];
        }
        let nb = lib.basic().len() as f64;
        let nc = lib.composite().len() as f64;
        let p_basic = nb / (nb + self.p_composite * nc);
        if rng.random01() < p_basic {
            lib.basic()[rng.random_index(lib.basic().len())]
        } else {
            lib.composite()[rng.random_index(lib.composite().len())]
        }
    }

    /// Proposes a replacement at a uniformly random position.
    pub fn propose(&self, circuit: &mut Circuit, rng: &mut RngHelper) -> Proposal {
        let position = rng.random_index(circuit.len());
        self.propose_at(circuit, position, rng)
    }

    /// Proposes a replacement at `position`.
    ///
    /// Draws that equal the incumbent leave the circuit untouched and come
    /// back flagged `unchanged`; anything else is applied through
    /// [`Circuit::replace`] and can be reverted with [`Circuit::undo`].
    pub fn propose_at(
        &self,
        circuit: &mut Circuit,
        position: usize,
        rng: &mut RngHelper,
    ) -> Proposal {
        let gate = self.draw(circuit.library().as_ref(), rng);
        if gate == circuit.gate_at(position) {
            return Proposal {
                position,
                gate,
                unchanged: true,
            };
        }
        circuit.replace(position, gate);
        Proposal {
            position,
            gate,
            unchanged: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvid_ir::{GateLibrary, MaintainerKind, stdgates};
    use std::sync::Arc;

    fn lib2() -> Arc<GateLibrary> {
        Arc::new(GateLibrary::build(2, &stdgates::clifford_t(), &[]).unwrap())
    }

    #[test]
    fn draw_respects_identity_probability() {
        let lib = lib2();
        let mutator = Mutator {
            p_identity: 0.4,
            ..Mutator::default()
        };
        let mut rng = RngHelper::new(11);
        let trials = 20_000;
        let identities = (0..trials)
            .filter(|_| lib.is_identity(mutator.draw(&lib, &mut rng)))
            .count();
        let fraction = identities as f64 / trials as f64;
        assert!((fraction - 0.4).abs() < 0.02, "identity fraction {fraction}");
    }

    #[test]
    fn draw_reaches_every_basic_name() {
        let lib = lib2();
        let mutator = Mutator::default();
        let mut rng = RngHelper::new(5);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..10_000 {
            let id = mutator.draw(&lib, &mut rng);
            seen.insert(lib.gate(id).name.clone());
        }
        for def in stdgates::clifford_t() {
            assert!(seen.contains(&def.name), "never drew {}", def.name);
        }
    }

    #[test]
    fn unchanged_proposals_do_not_edit() {
        let lib = lib2();
        let mut circ = Circuit::identity(Arc::clone(&lib), 3, MaintainerKind::Linear);
        let mutator = Mutator {
            p_identity: 1.0,
            ..Mutator::default()
        };
        let mut rng = RngHelper::new(1);
        let proposal = mutator.propose(&mut circ, &mut rng);
        assert!(proposal.unchanged);
        assert_eq!(circ.non_identity_count(), 0);
    }

    #[test]
    fn changed_proposals_undo_cleanly() {
        let lib = lib2();
        let mut circ = Circuit::identity(Arc::clone(&lib), 3, MaintainerKind::Binary);
        let mutator = Mutator {
            p_identity: 0.0,
            ..Mutator::default()
        };
        let mut rng = RngHelper::new(2);
        let proposal = mutator.propose_at(&mut circ, 1, &mut rng);
        assert!(!proposal.unchanged);
        assert_eq!(circ.gate_at(1), proposal.gate);
        circ.undo();
        assert!(circ.is_identity_at(1));
        assert_eq!(circ.cost(), 0.0);
    }
}
