use crate::advisory::Advisory;
use crate::config::BoundsConfig;
use crate::error::{Result, UncertaintyError};
use crate::network::{FlowNetwork, VariableLayout};
use crate::uncertainty::{BoundRatios, UncertaintyMode};

use super::{BoundOutcome, BoundStrategy};

/// Uniform percentage error on every variable
#[derive(Debug, Clone, Copy)]
pub struct PercentBounds {
    percent: f64,
}

impl PercentBounds {
    pub fn new(percent: f64) -> Self {
        Self { percent }
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }
}

impl BoundStrategy for PercentBounds {
    fn mode(&self) -> UncertaintyMode {
        UncertaintyMode::Percent
    }

    fn validate(&self, _network: &FlowNetwork) -> Result<()> {
        if !self.percent.is_finite() || self.percent < 0.0 {
            return Err(UncertaintyError::InvalidParameter(format!(
                "percent error must be a finite value >= 0, got {}",
                self.percent
            )));
        }
        Ok(())
    }

    fn compute_bounds(
        &self,
        network: &FlowNetwork,
        layout: &VariableLayout,
        config: &BoundsConfig,
    ) -> Result<BoundOutcome> {
        self.validate(network)?;

        let m = layout.len();
        let fraction = self.percent / 100.0;

        // A zero-width window collapses the region to a point, which the
        // random walk cannot move in
        if self.percent == 0.0 {
            let window = config.zero_percent_window;
            return Ok(BoundOutcome {
                ratios: BoundRatios::uniform(m, 1.0 - window, 1.0 + window),
                advisories: vec![Advisory::ZeroPercentWindow { window }],
            });
        }

        let lower = if fraction >= 1.0 {
            config.ratio_floor
        } else {
            1.0 - fraction
        };

        Ok(BoundOutcome {
            ratios: BoundRatios::uniform(m, lower, 1.0 + fraction),
            advisories: Vec::new(),
        })
    }
}
