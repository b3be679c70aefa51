//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the controller core and the host
//! platform. They are defined here (in `app`) so that both the use-case
//! layer and the adapter layer can depend on them without creating circular
//! dependencies.

pub mod actuator;
pub mod status;

pub use actuator::ActuatorGateway;
pub use status::{NoStatusSource, StatusSource};
