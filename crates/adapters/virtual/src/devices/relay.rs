//! Virtual relay — a switch output that reports every change.

use std::sync::Mutex;

use autolight_domain::id::{DeviceId, DeviceRef};
use autolight_domain::platform::{DeviceStatus, PlatformEvent, SwitchSource};

use super::{read, write};

/// A simulated relay output.
pub struct VirtualRelay {
    id: DeviceId,
    output: Mutex<bool>,
}

impl VirtualRelay {
    #[must_use]
    pub fn new(id: DeviceId) -> Self {
        Self {
            id,
            output: Mutex::new(false),
        }
    }

    #[must_use]
    pub fn device(&self) -> DeviceRef {
        DeviceRef::switch(self.id.get())
    }

    #[must_use]
    pub fn output(&self) -> bool {
        read(&self.output)
    }

    /// Drive the output. Returns `true` when it actually changed.
    pub fn set(&self, on: bool) -> bool {
        let mut output = write(&self.output);
        let changed = *output != on;
        *output = on;
        changed
    }

    /// The status notification a change from `source` produces.
    #[must_use]
    pub fn status_event(&self, source: SwitchSource) -> PlatformEvent {
        PlatformEvent::SwitchStatus {
            device_id: self.id,
            output: Some(self.output()),
            source: Some(source),
        }
    }

    #[must_use]
    pub fn status(&self) -> DeviceStatus {
        DeviceStatus::Switch {
            output: self.output(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_off() {
        let relay = VirtualRelay::new(DeviceId::new(0));
        assert!(!relay.output());
    }

    #[test]
    fn should_report_change_only_when_output_moves() {
        let relay = VirtualRelay::new(DeviceId::new(0));
        assert!(relay.set(true));
        assert!(!relay.set(true));
        assert!(relay.set(false));
    }

    #[test]
    fn should_describe_change_with_its_source() {
        let relay = VirtualRelay::new(DeviceId::new(3));
        relay.set(true);
        assert_eq!(
            relay.status_event(SwitchSource::Button),
            PlatformEvent::SwitchStatus {
                device_id: DeviceId::new(3),
                output: Some(true),
                source: Some(SwitchSource::Button),
            }
        );
    }

    #[test]
    fn should_expose_output_as_status() {
        let relay = VirtualRelay::new(DeviceId::new(0));
        relay.set(true);
        assert_eq!(relay.status(), DeviceStatus::Switch { output: true });
    }
}
