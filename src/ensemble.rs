//! Uncertainty Analysis Orchestration
//!
//! Pipeline for one call:
//! 1. Validate the baseline network and the uncertainty parameters
//! 2. Fix the variable layout and derive bound ratios
//! 3. Build the conservation and box constraints
//! 4. Sample the feasible region in a single sampler call
//! 5. Rebuild one network per sampled row
//!
//! Any failure returns an error and no networks; a partial ensemble is never
//! produced.

use tracing::info;

use crate::advisory::Advisory;
use crate::config::{BoundsConfig, Config};
use crate::constraints::ConstraintBuilder;
use crate::error::{Result, UncertaintyError};
use crate::network::{FlowNetwork, VariableLayout};
use crate::reconstruct::ModelReconstructor;
use crate::sampler::{HitAndRunSampler, PolytopeSampler, SampleSet};
use crate::uncertainty::{BoundRatios, UncertaintySpec};

/// Plausible networks drawn around a baseline
#[derive(Debug, Clone)]
pub struct Ensemble {
    /// One network per sample, in sampler order
    pub models: Vec<FlowNetwork>,
    /// Raw coefficient rows behind `models`
    pub coefficients: SampleSet,
    /// Ratios the samples were bounded by
    pub bounds: BoundRatios,
    /// Column layout of `coefficients` and `bounds`
    pub layout: VariableLayout,
    /// Non-fatal repairs made along the way
    pub advisories: Vec<Advisory>,
}

impl Ensemble {
    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

pub struct UncertaintyAnalysis<S = HitAndRunSampler> {
    sampler: S,
    bounds: BoundsConfig,
}

impl UncertaintyAnalysis<HitAndRunSampler> {
    /// Analysis using the hit-and-run sampler configured by `config`
    pub fn new(config: &Config) -> Self {
        Self {
            sampler: HitAndRunSampler::new(config.sampler.clone()),
            bounds: config.bounds.clone(),
        }
    }
}

impl Default for UncertaintyAnalysis<HitAndRunSampler> {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl<S: PolytopeSampler> UncertaintyAnalysis<S> {
    /// Analysis with a caller-supplied sampler
    pub fn with_sampler(sampler: S, bounds: BoundsConfig) -> Self {
        Self { sampler, bounds }
    }

    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    /// Draw `iterations` plausible networks around `network`
    pub fn run(
        &self,
        network: &FlowNetwork,
        spec: &UncertaintySpec,
        iterations: usize,
    ) -> Result<Ensemble> {
        network.validate()?;
        if iterations == 0 {
            return Err(UncertaintyError::InvalidParameter(
                "iteration count must be at least 1".to_string(),
            ));
        }

        let strategy = spec.strategy();

        let layout = VariableLayout::new(network);
        let outcome = strategy.compute_bounds(network, &layout, &self.bounds)?;
        for advisory in &outcome.advisories {
            advisory.log();
        }

        info!(
            mode = %strategy.mode(),
            nodes = layout.node_count(),
            fluxes = layout.fluxes().len(),
            variables = layout.len(),
            iterations,
            "sampling plausible networks"
        );

        let system = ConstraintBuilder::new(network, &layout).build(&outcome.ratios)?;
        let coefficients = self.sampler.sample(&system, iterations)?;
        if coefficients.len() != iterations {
            return Err(UncertaintyError::Sampler(format!(
                "sampler returned {} rows, {} requested",
                coefficients.len(),
                iterations
            )));
        }

        let models = ModelReconstructor::new(network, &layout).reconstruct_all(&coefficients)?;

        info!(
            models = models.len(),
            advisories = outcome.advisories.len(),
            "uncertainty analysis complete"
        );

        Ok(Ensemble {
            models,
            coefficients,
            bounds: outcome.ratios,
            layout,
            advisories: outcome.advisories,
        })
    }
}

/// Run an analysis with default configuration
pub fn plausible_networks(
    network: &FlowNetwork,
    spec: &UncertaintySpec,
    iterations: usize,
) -> Result<Ensemble> {
    UncertaintyAnalysis::default().run(network, spec, iterations)
}
