use crate::config::BoundsConfig;
use crate::error::{Result, UncertaintyError};
use crate::network::{FlowNetwork, VariableLayout};
use crate::uncertainty::{BoundRatios, DeviationTables, UncertaintyMode};

use super::{BoundOutcome, BoundStrategy};

/// Half-ranges around the baseline, in flow units
///
/// Variables without an entry get a zero half-range and stay at the baseline.
#[derive(Debug, Clone, Copy)]
pub struct SymmetricBounds<'a> {
    tables: &'a DeviationTables,
}

impl<'a> SymmetricBounds<'a> {
    pub fn new(tables: &'a DeviationTables) -> Self {
        Self { tables }
    }
}

impl BoundStrategy for SymmetricBounds<'_> {
    fn mode(&self) -> UncertaintyMode {
        UncertaintyMode::Symmetric
    }

    fn validate(&self, network: &FlowNetwork) -> Result<()> {
        let mode = self.mode().to_string();
        self.tables.validate(network, &mode, "")?;

        let negative = self
            .tables
            .flows
            .iter()
            .flat_map(|t| t.values())
            .chain(
                [
                    &self.tables.inputs,
                    &self.tables.exports,
                    &self.tables.respirations,
                    &self.tables.outputs,
                ]
                .into_iter()
                .flatten()
                .flat_map(|t| t.values()),
            )
            .find(|v| **v < 0.0);
        if let Some(value) = negative {
            return Err(UncertaintyError::InvalidParameter(format!(
                "half-ranges must be non-negative, got {}",
                value
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

        let baseline = layout.baseline(network);
        let (half_ranges, mut advisories) = self.tables.densify(layout);

        let (lower, upper): (Vec<f64>, Vec<f64>) = baseline
            .iter()
            .zip(half_ranges.iter())
            .map(|(base, half)| {
                let half = half.unwrap_or(0.0);
                (base - half, base + half)
            })
            .unzip();

        let (ratios, repairs) = BoundRatios::from_absolute(
            layout,
            network.loss_form(),
            &baseline,
            &lower,
            &upper,
            config.ratio_floor,
        )?;
        advisories.extend(repairs);

        Ok(BoundOutcome { ratios, advisories })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::Advisory;
    use crate::network::model::fixtures::{chain, chain_output_only};

    fn tables() -> DeviationTables {
        DeviationTables::new()
            .with_flow(0, 1, 15.0)
            .with_flow(2, 0, 20.0)
            .with_input(0, 10.0)
            .with_export(0, 1.0)
            .with_respiration(1, 3.0)
    }

    #[test]
    fn test_half_range_ratios() {
        let network = chain();
        let layout = VariableLayout::new(&network);
        let outcome = SymmetricBounds::new(&tables())
            .compute_bounds(&network, &layout, &BoundsConfig::default())
            .unwrap();
        let r = &outcome.ratios;

        // flow 0->1 = 60 +/- 15
        assert!((r.lower[layout.flux(0)] - 0.75).abs() < 1e-12);
        assert!((r.upper[layout.flux(0)] - 1.25).abs() < 1e-12);
        // input 0 = 100 +/- 10
        assert!((r.lower[layout.input(0)] - 0.9).abs() < 1e-12);
        assert!((r.upper[layout.input(0)] - 1.1).abs() < 1e-12);
        // respiration 1 = 30 +/- 3
        assert!((r.lower[layout.respiration(1)] - 0.9).abs() < 1e-12);
        // unlisted flow 1->2 stays at the baseline
        assert_eq!(r.lower[layout.flux(2)], 1.0);
        assert_eq!(r.upper[layout.flux(2)], 1.0);
    }

    #[test]
    fn test_half_range_beyond_baseline_clamps_lower() {
        let network = chain();
        let layout = VariableLayout::new(&network);
        let outcome = SymmetricBounds::new(&tables())
            .compute_bounds(&network, &layout, &BoundsConfig::default())
            .unwrap();

        // flow 2->0 = 10 +/- 20 would give a ratio of -1
        assert_eq!(outcome.ratios.lower[layout.flux(3)], 0.0001);
        assert!((outcome.ratios.upper[layout.flux(3)] - 3.0).abs() < 1e-12);
        assert!(outcome
            .advisories
            .iter()
            .any(|a| matches!(a, Advisory::NegativeRatioClamped { .. })));
    }

    #[test]
    fn test_zero_baseline_ratio_is_zero() {
        let network = chain();
        let layout = VariableLayout::new(&network);
        let outcome = SymmetricBounds::new(&tables().with_input(1, 5.0))
            .compute_bounds(&network, &layout, &BoundsConfig::default())
            .unwrap();
        assert_eq!(outcome.ratios.lower[layout.input(1)], 0.0);
        assert_eq!(outcome.ratios.upper[layout.input(1)], 0.0);
    }

    #[test]
    fn test_output_only_model_uses_output_table() {
        let network = chain_output_only();
        let layout = VariableLayout::new(&network);
        let tables = DeviationTables::new()
            .with_flow(0, 1, 6.0)
            .with_input(0, 10.0)
            .with_output(2, 3.5);
        let outcome = SymmetricBounds::new(&tables)
            .compute_bounds(&network, &layout, &BoundsConfig::default())
            .unwrap();
        // output 2 = 35 +/- 3.5
        assert!((outcome.ratios.lower[layout.export(2)] - 0.9).abs() < 1e-12);
        assert!((outcome.ratios.upper[layout.export(2)] - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_negative_half_range_rejected() {
        let network = chain();
        let layout = VariableLayout::new(&network);
        let result = SymmetricBounds::new(&tables().with_flow(0, 2, -1.0)).compute_bounds(
            &network,
            &layout,
            &BoundsConfig::default(),
        );
        assert!(matches!(result, Err(UncertaintyError::InvalidParameter(_))));
    }

    #[test]
    fn test_category_mismatch_propagates() {
        let network = chain_output_only();
        let layout = VariableLayout::new(&network);
        let result = SymmetricBounds::new(&tables()).compute_bounds(
            &network,
            &layout,
            &BoundsConfig::default(),
        );
        assert!(matches!(result, Err(UncertaintyError::CategoryMismatch { .. })));
    }
}
