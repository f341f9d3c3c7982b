use crate::config::BoundsConfig;
use crate::error::Result;
use crate::network::{FlowNetwork, VariableLayout};
use crate::uncertainty::{BoundRatios, DeviationTables, UncertaintyMode};

use super::{BoundOutcome, BoundStrategy};

/// Absolute lower and upper bounds, in flow units
///
/// A variable missing from a table takes its baseline value for that side.
#[derive(Debug, Clone, Copy)]
pub struct AsymmetricBounds<'a> {
    lower: &'a DeviationTables,
    upper: &'a DeviationTables,
}

impl<'a> AsymmetricBounds<'a> {
    pub fn new(lower: &'a DeviationTables, upper: &'a DeviationTables) -> Self {
        Self { lower, upper }
    }
}

impl BoundStrategy for AsymmetricBounds<'_> {
    fn mode(&self) -> UncertaintyMode {
        UncertaintyMode::Asymmetric
    }

    fn validate(&self, network: &FlowNetwork) -> Result<()> {
        let mode = self.mode().to_string();
        self.lower.validate(network, &mode, "lower ")?;
        self.upper.validate(network, &mode, "upper ")?;
        Ok(())
    }

    fn compute_bounds(
        &self,
        network: &FlowNetwork,
        layout: &VariableLayout,
        config: &BoundsConfig,
    ) -> Result<BoundOutcome> {
        self.validate(network)?;

        let baseline = layout.baseline(network);
        let (lower, mut advisories) = self.lower.densify(layout);
        let (upper, upper_advisories) = self.upper.densify(layout);
        advisories.extend(upper_advisories);

        let fill = |dense: Vec<Option<f64>>| -> Vec<f64> {
            dense
                .into_iter()
                .zip(baseline.iter())
                .map(|(bound, base)| bound.unwrap_or(*base))
                .collect()
        };
        let lower = fill(lower);
        let upper = fill(upper);

        let (ratios, repairs) = BoundRatios::from_absolute(
            layout,
            network.loss_form(),
            &baseline,
            &lower,
            &upper,
            config.ratio_floor,
        )?;
        advisories.extend(repairs);

        let contradictions = ratios.contradictions();
        if !contradictions.is_empty() {
            tracing::warn!(
                count = contradictions.len(),
                first = %layout.variable(contradictions[0]),
                "lower bound exceeds upper bound; the feasible region will be empty"
            );
        }

        Ok(BoundOutcome { ratios, advisories })
    }
}
