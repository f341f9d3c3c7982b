use serde::{Deserialize, Serialize};
use std::fmt;

use crate::network::VariableId;

/// Non-fatal diagnostic produced while deriving bounds
///
/// Advisories never stop an analysis. They are returned with the result and
/// logged through `tracing` so batch callers can audit what was repaired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Advisory {
    /// Percent error of zero replaced by a small window around the baseline
    ZeroPercentWindow { window: f64 },

    /// Baseline value is zero so the ratio was forced to zero
    ZeroBaseline { variable: VariableId },

    /// Derived ratio fell below zero and was raised to the floor
    NegativeRatioClamped { variable: VariableId, ratio: f64, floor: f64 },

    /// Flow table entry names a flux that does not exist in the baseline
    UnmappedFlow { from: usize, to: usize },
}

impl Advisory {
    /// Emit the advisory as a tracing event
    pub(crate) fn log(&self) {
        match self {
            Advisory::ZeroPercentWindow { .. } | Advisory::UnmappedFlow { .. } => {
                tracing::warn!(advisory = %self, "uncertainty advisory");
            }
            Advisory::ZeroBaseline { .. } | Advisory::NegativeRatioClamped { .. } => {
                tracing::debug!(advisory = %self, "bound ratio repaired");
            }
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::ZeroPercentWindow { window } => write!(
                f,
                "percent error of 0 gives a single-point region; using [{}, {}]",
                1.0 - window,
                1.0 + window
            ),
            Advisory::ZeroBaseline { variable } => {
                write!(f, "{} has a zero baseline; ratio forced to 0", variable)
            }
            Advisory::NegativeRatioClamped { variable, ratio, floor } => write!(
                f,
                "{} ratio {:.6} is negative; clamped to {}",
                variable, ratio, floor
            ),
            Advisory::UnmappedFlow { from, to } => {
                write!(f, "flow {}->{} is zero in the baseline; entry ignored", from, to)
            }
        }
    }
}
