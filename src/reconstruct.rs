//! Rebuild full networks from sampled coefficient vectors.

use crate::error::{Result, UncertaintyError};
use crate::network::{FlowNetwork, LossForm, VariableLayout};

/// Maps coefficient rows back onto the baseline network
pub struct ModelReconstructor<'a> {
    baseline: &'a FlowNetwork,
    layout: &'a VariableLayout,
}

impl<'a> ModelReconstructor<'a> {
    pub fn new(baseline: &'a FlowNetwork, layout: &'a VariableLayout) -> Self {
        Self { baseline, layout }
    }

    /// Scale every baseline flow quantity by its coefficient
    ///
    /// Names, living flags and storage are copied unchanged. Outputs are
    /// exports + respirations; output-only baselines stay output-only.
    pub fn reconstruct(&self, coefficients: &[f64]) -> Result<FlowNetwork> {
        let layout = self.layout;
        if coefficients.len() != layout.len() {
            return Err(UncertaintyError::InvalidParameter(format!(
                "coefficient vector has {} entries, layout has {}",
                coefficients.len(),
                layout.len()
            )));
        }

        let n = layout.node_count();
        let base = self.baseline;

        let inputs: Vec<f64> = (0..n)
            .map(|i| base.inputs[i] * coefficients[layout.input(i)])
            .collect();
        let exports: Vec<f64> = base
            .export_baseline()
            .iter()
            .enumerate()
            .map(|(i, e)| e * coefficients[layout.export(i)])
            .collect();
        let respirations: Vec<f64> = base
            .respiration_baseline()
            .iter()
            .enumerate()
            .map(|(i, r)| r * coefficients[layout.respiration(i)])
            .collect();

        let mut flows = vec![vec![0.0; n]; n];
        for (k, &(from, to)) in layout.fluxes().pairs().iter().enumerate() {
            flows[from][to] = base.flows[from][to] * coefficients[layout.flux(k)];
        }

        let outputs: Vec<f64> = exports
            .iter()
            .zip(respirations.iter())
            .map(|(e, r)| e + r)
            .collect();

        let (exports, respirations) = match base.loss_form() {
            LossForm::Split => (Some(exports), Some(respirations)),
            LossForm::Output => (None, None),
        };

        Ok(FlowNetwork {
            flows,
            inputs,
            exports,
            respirations,
            outputs,
            storage: base.storage.clone(),
            living: base.living.clone(),
            names: base.names.clone(),
        })
    }

    /// One network per row, in row order
    pub fn reconstruct_all(&self, rows: &[Vec<f64>]) -> Result<Vec<FlowNetwork>> {
        rows.iter().map(|row| self.reconstruct(row)).collect()
    }
}
