//! Polytope Samplers
//!
//! A sampler draws coefficient vectors approximately uniformly from
//! `{x : E·x = F0, G·x >= H}`. Any implementation may be plugged in as long as
//! it returns exactly the requested number of feasible rows, or an error and
//! no rows at all.

pub mod hit_and_run;

pub use hit_and_run::HitAndRunSampler;

use crate::constraints::ConstraintSystem;
use crate::error::Result;

/// Sampled coefficient vectors, one row per plausible network
pub type SampleSet = Vec<Vec<f64>>;

pub trait PolytopeSampler {
    /// Draw `iterations` feasible coefficient vectors
    ///
    /// Returns `UncertaintyError::Infeasible` when the region is empty.
    fn sample(&self, system: &ConstraintSystem, iterations: usize) -> Result<SampleSet>;
}

impl<S: PolytopeSampler + ?Sized> PolytopeSampler for Box<S> {
    fn sample(&self, system: &ConstraintSystem, iterations: usize) -> Result<SampleSet> {
        (**self).sample(system, iterations)
    }
}
