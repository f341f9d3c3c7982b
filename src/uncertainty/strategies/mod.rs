//! Bound Strategies
//!
//! Each strategy turns a baseline network plus its own deviation data into
//! per-variable lower/upper ratios over the fixed variable layout:
//! - Percent: one uniform percentage for every variable
//! - Symmetric: caller-supplied half-ranges in flow units
//! - Asymmetric: caller-supplied absolute lower and upper bounds

pub mod asymmetric;
pub mod percent;
pub mod symmetric;

pub use asymmetric::AsymmetricBounds;
pub use percent::PercentBounds;
pub use symmetric::SymmetricBounds;

use crate::advisory::Advisory;
use crate::config::BoundsConfig;
use crate::error::Result;
use crate::network::{FlowNetwork, VariableLayout};

use super::{BoundRatios, UncertaintyMode};

/// Ratios plus the repairs made while deriving them
#[derive(Debug, Clone, PartialEq)]
pub struct BoundOutcome {
    pub ratios: BoundRatios,
    pub advisories: Vec<Advisory>,
}

pub trait BoundStrategy {
    fn mode(&self) -> UncertaintyMode;

    /// Reject parameters that cannot apply to `network`
    fn validate(&self, network: &FlowNetwork) -> Result<()>;

    /// Lower and upper ratio vectors, each `layout.len()` long
    ///
    /// Implementations run `validate` first.
    fn compute_bounds(
        &self,
        network: &FlowNetwork,
        layout: &VariableLayout,
        config: &BoundsConfig,
    ) -> Result<BoundOutcome>;
}
