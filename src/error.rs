use thiserror::Error;

/// Failures surfaced by the uncertainty analysis
///
/// Every variant is returned as a value; nothing in the crate aborts the process
/// on bad input so callers can inspect the reason and retry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UncertaintyError {
    #[error("Invalid flow network: {0}")]
    InvalidNetwork(String),

    #[error("Unknown uncertainty mode '{0}' (expected percent, sym or asym)")]
    UnknownMode(String),

    #[error("Mode '{mode}' requires the '{table}' table")]
    MissingTable { mode: String, table: String },

    #[error("Model expresses losses as {expected}, but {supplied} tables were supplied")]
    CategoryMismatch { expected: String, supplied: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Feasible region is empty: {0}")]
    Infeasible(String),

    #[error("Sampler error: {0}")]
    Sampler(String),
}

pub type Result<T> = std::result::Result<T, UncertaintyError>;

impl UncertaintyError {
    pub(crate) fn missing(mode: &str, table: &str) -> Self {
        Self::MissingTable {
            mode: mode.to_string(),
            table: table.to_string(),
        }
    }

    /// True for errors the caller can fix by changing parameters
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Infeasible(_) | Self::Sampler(_))
    }
}
