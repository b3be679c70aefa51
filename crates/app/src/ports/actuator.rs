//! Actuator gateway port — one-way relay commands.

use std::sync::Arc;

use autolight_domain::id::DeviceId;

/// Turns a decision into a relay command.
///
/// Calls are fire-and-forget: implementations must return immediately and
/// must not report success or failure back into the controller. Anything that
/// goes wrong downstream is for the adapter to log. Repeating a command with
/// the same value must be harmless.
pub trait ActuatorGateway {
    /// Request `relay` to switch its output on or off.
    fn set_relay(&self, relay: DeviceId, on: bool);
}

impl<T: ActuatorGateway + ?Sized> ActuatorGateway for Arc<T> {
    fn set_relay(&self, relay: DeviceId, on: bool) {
        (**self).set_relay(relay, on);
    }
}
