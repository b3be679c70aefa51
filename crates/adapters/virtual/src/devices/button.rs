//! Virtual push button — emits press and long press events.

use autolight_domain::id::{DeviceId, DeviceRef};
use autolight_domain::platform::{InputAction, PlatformEvent};

/// A simulated momentary button wired to an input.
pub struct VirtualButton {
    id: DeviceId,
}

impl VirtualButton {
    #[must_use]
    pub fn new(id: DeviceId) -> Self {
        Self { id }
    }

    #[must_use]
    pub fn device(&self) -> DeviceRef {
        DeviceRef::input(self.id.get())
    }

    #[must_use]
    pub fn press(&self) -> PlatformEvent {
        self.event(InputAction::Press)
    }

    #[must_use]
    pub fn long_press(&self) -> PlatformEvent {
        self.event(InputAction::LongPress)
    }

    fn event(&self, action: InputAction) -> PlatformEvent {
        PlatformEvent::Input {
            device_id: self.id,
            event: Some(action),
            state: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_emit_press_on_its_input() {
        let button = VirtualButton::new(DeviceId::new(2));
        assert_eq!(
            button.press(),
            PlatformEvent::Input {
                device_id: DeviceId::new(2),
                event: Some(InputAction::Press),
                state: None,
            }
        );
    }

    #[test]
    fn should_emit_long_press() {
        let button = VirtualButton::new(DeviceId::new(0));
        assert!(matches!(
            button.long_press(),
            PlatformEvent::Input {
                event: Some(InputAction::LongPress),
                ..
            }
        ));
    }
}
