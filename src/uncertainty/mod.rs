//! Uncertainty specifications and the bound strategies behind them.

pub mod ratios;
pub mod strategies;
pub mod tables;

pub use ratios::BoundRatios;
pub use strategies::{
    AsymmetricBounds, BoundOutcome, BoundStrategy, PercentBounds, SymmetricBounds,
};
pub use tables::{DeviationTables, FlowTable, NodeTable};

use std::str::FromStr;
use strum::{Display, EnumString};

use crate::error::{Result, UncertaintyError};

/// Mode selector as accepted from callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum UncertaintyMode {
    #[strum(to_string = "percent")]
    Percent,
    #[strum(to_string = "sym", serialize = "symmetric")]
    Symmetric,
    #[strum(to_string = "asym", serialize = "asymmetric")]
    Asymmetric,
}

/// How far each flow may deviate from its baseline
#[derive(Debug, Clone, PartialEq)]
pub enum UncertaintySpec {
    /// Uniform percentage error (0..inf)
    Percent(f64),
    /// Half-ranges per category
    Symmetric(DeviationTables),
    /// Absolute lower/upper bounds per category
    Asymmetric {
        lower: DeviationTables,
        upper: DeviationTables,
    },
}

impl UncertaintySpec {
    pub fn mode(&self) -> UncertaintyMode {
        match self {
            UncertaintySpec::Percent(_) => UncertaintyMode::Percent,
            UncertaintySpec::Symmetric(_) => UncertaintyMode::Symmetric,
            UncertaintySpec::Asymmetric { .. } => UncertaintyMode::Asymmetric,
        }
    }

    /// Strategy that derives bound ratios for this specification
    pub fn strategy(&self) -> Box<dyn BoundStrategy + '_> {
        match self {
            UncertaintySpec::Percent(percent) => Box::new(PercentBounds::new(*percent)),
            UncertaintySpec::Symmetric(tables) => Box::new(SymmetricBounds::new(tables)),
            UncertaintySpec::Asymmetric { lower, upper } => {
                Box::new(AsymmetricBounds::new(lower, upper))
            }
        }
    }
}

/// Loosely-typed request: a mode string plus whatever data the caller has
///
/// Converting into an [`UncertaintySpec`] checks the mode is known and the
/// data it needs is present.
#[derive(Debug, Clone, Default)]
pub struct UncertaintyRequest {
    pub mode: String,
    pub percent: Option<f64>,
    pub tables: Option<DeviationTables>,
    pub lower: Option<DeviationTables>,
    pub upper: Option<DeviationTables>,
}

impl UncertaintyRequest {
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            ..Default::default()
        }
    }

    pub fn percent(mut self, percent: f64) -> Self {
        self.percent = Some(percent);
        self
    }

    pub fn tables(mut self, tables: DeviationTables) -> Self {
        self.tables = Some(tables);
        self
    }

    pub fn lower(mut self, lower: DeviationTables) -> Self {
        self.lower = Some(lower);
        self
    }

    pub fn upper(mut self, upper: DeviationTables) -> Self {
        self.upper = Some(upper);
        self
    }
}

impl TryFrom<UncertaintyRequest> for UncertaintySpec {
    type Error = UncertaintyError;

    fn try_from(request: UncertaintyRequest) -> Result<Self> {
        let mode = UncertaintyMode::from_str(&request.mode)
            .map_err(|_| UncertaintyError::UnknownMode(request.mode.clone()))?;
        let name = mode.to_string();

        match mode {
            UncertaintyMode::Percent => request
                .percent
                .map(UncertaintySpec::Percent)
                .ok_or_else(|| UncertaintyError::missing(&name, "percent")),
            UncertaintyMode::Symmetric => request
                .tables
                .map(UncertaintySpec::Symmetric)
                .ok_or_else(|| UncertaintyError::missing(&name, "tables")),
            UncertaintyMode::Asymmetric => {
                let lower = request
                    .lower
                    .ok_or_else(|| UncertaintyError::missing(&name, "lower"))?;
                let upper = request
                    .upper
                    .ok_or_else(|| UncertaintyError::missing(&name, "upper"))?;
                Ok(UncertaintySpec::Asymmetric { lower, upper })
            }
        }
    }
}
