//! Event ingestion — turns raw platform events into controller events.
//!
//! Only components named in the configuration get through. Anything else is
//! reported as [`IngestError::UnknownDevice`]; configured components that send
//! an unusable payload are reported as [`IngestError::Malformed`]. Ingestion
//! has no side effects; the caller decides what to log and what to forward.

use autolight_domain::config::DeviceConfig;
use autolight_domain::error::IngestError;
use autolight_domain::event::{ControllerEvent, ManualInput};
use autolight_domain::id::DeviceRef;
use autolight_domain::platform::{InputAction, PlatformEvent};

/// Role a configured component plays for the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Relay,
    Motion,
    Lux,
    ManualInput,
}

/// Filters and normalizes platform events against the configured devices.
#[derive(Debug, Clone)]
pub struct EventIngestion {
    roles: Vec<(DeviceRef, Role)>,
}

impl EventIngestion {
    /// Build the identity table from the device configuration.
    #[must_use]
    pub fn new(devices: &DeviceConfig) -> Self {
        let mut roles = vec![
            (DeviceRef::switch(devices.relay.get()), Role::Relay),
            (devices.motion.device_ref(), Role::Motion),
        ];
        if let Some(lux) = devices.lux {
            roles.push((DeviceRef::binary_sensor(lux.get()), Role::Lux));
        }
        roles.extend(
            devices
                .manual_inputs
                .iter()
                .map(|id| (DeviceRef::input(id.get()), Role::ManualInput)),
        );
        Self { roles }
    }

    fn role_of(&self, device: DeviceRef) -> Option<Role> {
        self.roles
            .iter()
            .find_map(|(candidate, role)| (*candidate == device).then_some(*role))
    }

    /// Map a platform event to the controller event it stands for.
    ///
    /// # Errors
    ///
    /// - [`IngestError::UnknownDevice`] when the component is not configured
    ///   for the role the event implies
    /// - [`IngestError::Malformed`] when an expected field is missing or has
    ///   the wrong type
    /// - [`IngestError::IgnoredAction`] for input activity other than press
    ///   and long press
    pub fn normalize(&self, event: &PlatformEvent) -> Result<ControllerEvent, IngestError> {
        let device = event.device();
        let role = self
            .role_of(device)
            .ok_or(IngestError::UnknownDevice(device))?;
        let malformed = |reason: &'static str| IngestError::Malformed { device, reason };

        match (event, role) {
            (PlatformEvent::SwitchStatus { output, source, .. }, Role::Relay) => {
                let output = output.ok_or_else(|| malformed("switch status without output"))?;
                let source = source
                    .clone()
                    .ok_or_else(|| malformed("switch status without source"))?;
                Ok(ControllerEvent::SwitchStatusChanged { output, source })
            }
            (PlatformEvent::BinarySensor { value, .. }, Role::Motion) => {
                let detected = value
                    .as_ref()
                    .ok_or_else(|| malformed("motion reading without value"))?
                    .as_bool()
                    .ok_or_else(|| malformed("motion value is not a boolean"))?;
                Ok(ControllerEvent::MotionChanged { detected })
            }
            (PlatformEvent::BinarySensor { value, .. }, Role::Lux) => {
                let lux = value
                    .as_ref()
                    .ok_or_else(|| malformed("lux reading without value"))?
                    .as_f64()
                    .ok_or_else(|| malformed("lux value is not a number"))?;
                if lux < 0.0 {
                    return Err(malformed("lux value is negative"));
                }
                Ok(ControllerEvent::LuxChanged { lux })
            }
            (PlatformEvent::Input { state, .. }, Role::Motion) => {
                let detected = state.ok_or_else(|| malformed("motion input without state"))?;
                Ok(ControllerEvent::MotionChanged { detected })
            }
            (PlatformEvent::Input { event: action, .. }, Role::ManualInput) => {
                match action.as_ref().ok_or_else(|| malformed("input without event"))? {
                    InputAction::Press => Ok(ControllerEvent::ManualInputPressed {
                        kind: ManualInput::Toggle,
                    }),
                    InputAction::LongPress => Ok(ControllerEvent::ManualInputPressed {
                        kind: ManualInput::LongPush,
                    }),
                    InputAction::Other(action) => Err(IngestError::IgnoredAction {
                        device,
                        action: action.clone(),
                    }),
                }
            }
            // DeviceRef carries the category, so a matching role implies a
            // matching event shape; this arm is unreachable in practice.
            _ => Err(IngestError::UnknownDevice(device)),
        }
    }
}
