use serde::{Deserialize, Serialize};

use crate::advisory::Advisory;
use crate::error::{Result, UncertaintyError};
use crate::network::{LossForm, VariableId, VariableLayout};

/// Per-variable lower and upper multipliers of the baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundRatios {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl BoundRatios {
    /// Same window for every variable
    pub fn uniform(len: usize, lower: f64, upper: f64) -> Self {
        Self {
            lower: vec![lower; len],
            upper: vec![upper; len],
        }
    }

    /// Convert absolute bounds to ratios of the baseline
    ///
    /// A zero baseline forces both ratios to 0. A negative ratio is raised to
    /// `floor` so bounds never flip sign. Respiration slots of an output-only
    /// network are unused and produce no advisory.
    pub fn from_absolute(
        layout: &VariableLayout,
        loss_form: LossForm,
        baseline: &[f64],
        lower: &[f64],
        upper: &[f64],
        floor: f64,
    ) -> Result<(Self, Vec<Advisory>)> {
        let m = layout.len();
        for (name, len) in [
            ("baseline", baseline.len()),
            ("lower", lower.len()),
            ("upper", upper.len()),
        ] {
            if len != m {
                return Err(UncertaintyError::InvalidParameter(format!(
                    "{} bounds have length {}, layout has {} variables",
                    name, len, m
                )));
            }
        }

        let mut advisories = Vec::new();
        let mut ratios = Self::uniform(m, 0.0, 0.0);

        for (j, &base) in baseline.iter().enumerate() {
            let variable = layout.variable(j);
            if base == 0.0 {
                let unused = loss_form == LossForm::Output
                    && matches!(variable, VariableId::Respiration(_));
                if !unused {
                    advisories.push(Advisory::ZeroBaseline { variable });
                }
                continue;
            }

            let mut clamp = |ratio: f64| {
                if ratio < 0.0 {
                    advisories.push(Advisory::NegativeRatioClamped { variable, ratio, floor });
                    floor
                } else {
                    ratio
                }
            };
            ratios.lower[j] = clamp(lower[j] / base);
            ratios.upper[j] = clamp(upper[j] / base);
        }

        Ok((ratios, advisories))
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Columns whose lower ratio exceeds the upper ratio
    pub fn contradictions(&self) -> Vec<usize> {
        self.lower
            .iter()
            .zip(self.upper.iter())
            .enumerate()
            .filter(|(_, (lo, hi))| lo > hi)
            .map(|(j, _)| j)
            .collect()
    }
}
