//! Alsvid Synthesis Engine
//!
//! Stochastic superoptimization of quantum circuits: given a partially
//! specified target unitary and a cost-annotated gate library, find a gate
//! sequence whose unitary matches the target on all covered entries while
//! minimizing total gate cost.
//!
//! # Pipeline
//!
//! 1. [`target`]: the [`PartialMatrix`] constraint and its
//!    [`SymmetryClass`] closure over qubit relabelings and inversion
//! 2. [`cost`]: masked distance functions driving the search and the exact
//!    0/1 stop indicator
//! 3. [`anneal`]: the Metropolis simulated-annealing [`SearchEngine`] with
//!    [`mutate`] proposals and the [`schedule`] cooling law
//! 4. [`resynth`]: deterministic peephole cleanup of found circuits
//! 5. [`driver`]: the multithreaded outer loop tying it all together

pub mod anneal;
pub mod cost;
pub mod driver;
pub mod error;
pub mod generate;
pub mod mutate;
pub mod resynth;
pub mod rng;
pub mod schedule;
pub mod target;

pub use anneal::{McmcResult, SearchEngine};
pub use cost::{EqualityCost, ExactEquality};
pub use driver::{Solution, SynthConfig, SynthReport, synthesize};
pub use error::{SynthError, SynthResult};
pub use generate::{GateWindowScheme, RandomCircuitGen};
pub use mutate::{Mutator, Proposal};
pub use resynth::Resynthesizer;
pub use rng::RngHelper;
pub use schedule::ExponentialSchedule;
pub use target::{PartialMatrix, SymmetryClass, SymmetryMember};
