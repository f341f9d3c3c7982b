//! Flow network value type and the variable layout derived from it.

pub mod layout;
pub mod model;

pub use layout::{FluxIndex, VariableId, VariableLayout};
pub use model::{FlowNetwork, LossForm};
