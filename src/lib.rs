//! # Flow Uncertainty
//!
//! Draws plausible alternatives to a conserved-flow network (ecosystem energy
//! or matter flows) under bounded uncertainty. Each alternative keeps every
//! node balanced and keeps every flow inside its deviation bounds.
//!
//! ```no_run
//! use flow_uncertainty::{plausible_networks, FlowNetwork, UncertaintySpec};
//!
//! # fn run(baseline: FlowNetwork) -> flow_uncertainty::Result<()> {
//! let ensemble = plausible_networks(&baseline, &UncertaintySpec::Percent(25.0), 1000)?;
//! for model in &ensemble.models {
//!     println!("{:?}", model.flows);
//! }
//! # Ok(())
//! # }
//! ```

pub mod advisory;
pub mod config;
pub mod constraints;
pub mod ensemble;
pub mod error;
pub mod network;
pub mod reconstruct;
pub mod sampler;
pub mod telemetry;
pub mod uncertainty;

pub use advisory::Advisory;
pub use config::{BoundsConfig, Config, SamplerConfig};
pub use constraints::{ConstraintBuilder, ConstraintSystem};
pub use ensemble::{plausible_networks, Ensemble, UncertaintyAnalysis};
pub use error::{Result, UncertaintyError};
pub use network::{FlowNetwork, FluxIndex, LossForm, VariableId, VariableLayout};
pub use reconstruct::ModelReconstructor;
pub use sampler::{HitAndRunSampler, PolytopeSampler, SampleSet};
pub use uncertainty::{
    BoundRatios, BoundStrategy, DeviationTables, UncertaintyMode, UncertaintyRequest,
    UncertaintySpec,
};
