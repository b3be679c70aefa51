//! # autolight-adapter-virtual
//!
//! Virtual platform that simulates the hardware around one controller, for
//! testing and demonstration purposes.
//!
//! ## Provided devices
//!
//! | Device | Address | Behaviour |
//! |--------|---------|-----------|
//! | Virtual Relay | `switch:<relay>` | Follows `set_relay`, echoes `switch_status` with source `loopback` |
//! | Virtual Motion Sensor | `binary_sensor:<id>` or `input:<id>` | Reports occupancy as a value or an input state |
//! | Virtual Lux Sensor | `binary_sensor:<lux>` | Reports illuminance, when configured |
//! | Virtual Button | `input:<id>` | One per manual input, emits press / long press |
//!
//! Everything the devices emit goes to the [`PlatformEvents`] receiver handed
//! out on construction; [`forward`] pipes it into a running controller.
//!
//! ## Dependency rule
//!
//! Depends on `autolight-app` (port traits) and `autolight-domain` only.

mod devices;

use std::future::{self, Future};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use autolight_app::controller::ControllerHandle;
use autolight_app::ports::{ActuatorGateway, StatusSource};
use autolight_domain::config::DeviceConfig;
use autolight_domain::id::{DeviceId, DeviceRef};
use autolight_domain::platform::{DeviceStatus, PlatformEvent, SwitchSource};
use tokio::sync::mpsc;

use devices::{VirtualButton, VirtualLuxSensor, VirtualMotionSensor, VirtualRelay};

/// Stream of events emitted by the virtual devices.
pub type PlatformEvents = mpsc::UnboundedReceiver<PlatformEvent>;

/// Simulated devices wired as the controller configuration describes.
pub struct VirtualPlatform {
    relay: VirtualRelay,
    motion: VirtualMotionSensor,
    lux: Option<VirtualLuxSensor>,
    buttons: Vec<VirtualButton>,
    reachable: AtomicBool,
    commands: Mutex<Vec<bool>>,
    events: mpsc::UnboundedSender<PlatformEvent>,
}

impl VirtualPlatform {
    /// Build the devices named in `devices` and the receiver for their events.
    #[must_use]
    pub fn new(devices: &DeviceConfig) -> (Self, PlatformEvents) {
        let (events, rx) = mpsc::unbounded_channel();
        let platform = Self {
            relay: VirtualRelay::new(devices.relay),
            motion: VirtualMotionSensor::new(devices.motion),
            lux: devices.lux.map(VirtualLuxSensor::new),
            buttons: devices
                .manual_inputs
                .iter()
                .copied()
                .map(VirtualButton::new)
                .collect(),
            reachable: AtomicBool::new(true),
            commands: Mutex::new(Vec::new()),
            events,
        };
        (platform, rx)
    }

    /// Current relay output.
    #[must_use]
    pub fn relay_output(&self) -> bool {
        self.relay.output()
    }

    /// Every command received through [`ActuatorGateway`], in order.
    #[must_use]
    pub fn commands(&self) -> Vec<bool> {
        self.commands
            .lock()
            .map_or_else(|poisoned| poisoned.into_inner().clone(), |g| g.clone())
    }

    /// Someone walks in or leaves.
    pub fn set_motion(&self, detected: bool) {
        self.emit(self.motion.set(detected));
    }

    /// New illuminance reading. Returns `false` when no lux sensor is wired.
    pub fn set_lux(&self, lux: f64) -> bool {
        match &self.lux {
            Some(sensor) => {
                self.emit(sensor.set(lux));
                true
            }
            None => false,
        }
    }

    /// Short press on the button wired to `input`. Returns `false` when no
    /// such button exists.
    pub fn press(&self, input: DeviceId) -> bool {
        self.with_button(input, VirtualButton::press)
    }

    /// Long press on the button wired to `input`.
    pub fn long_press(&self, input: DeviceId) -> bool {
        self.with_button(input, VirtualButton::long_press)
    }

    /// Operate the relay from outside the controller, e.g. from the web UI
    /// (`ws_in`) or its own button (`button`).
    pub fn switch_relay(&self, on: bool, source: SwitchSource) {
        if self.relay.set(on) {
            self.emit(self.relay.status_event(source));
        }
    }

    /// Make status queries fail, as a platform still booting would.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::Relaxed);
    }

    fn with_button(&self, input: DeviceId, action: fn(&VirtualButton) -> PlatformEvent) -> bool {
        let target = DeviceRef::input(input.get());
        match self.buttons.iter().find(|b| b.device() == target) {
            Some(button) => {
                self.emit(action(button));
                true
            }
            None => false,
        }
    }

    fn emit(&self, event: PlatformEvent) {
        // nobody listening once the controller side is gone
        let _ = self.events.send(event);
    }

    fn status(&self, device: DeviceRef) -> Option<DeviceStatus> {
        if !self.reachable.load(Ordering::Relaxed) {
            return None;
        }
        if device == self.relay.device() {
            return Some(self.relay.status());
        }
        if device == self.motion.device() {
            return Some(self.motion.status());
        }
        self.lux
            .as_ref()
            .filter(|sensor| sensor.device() == device)
            .map(VirtualLuxSensor::status)
    }
}

impl ActuatorGateway for VirtualPlatform {
    fn set_relay(&self, relay: DeviceId, on: bool) {
        if DeviceRef::switch(relay.get()) != self.relay.device() {
            return;
        }
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(on);
        if self.relay.set(on) {
            self.emit(self.relay.status_event(SwitchSource::Loopback));
        }
    }
}

impl StatusSource for VirtualPlatform {
    fn query_status(
        &self,
        device: DeviceRef,
    ) -> impl Future<Output = Option<DeviceStatus>> + Send {
        future::ready(self.status(device))
    }
}

/// Feed everything the virtual devices emit into a controller, until either
/// side goes away.
pub async fn forward(mut events: PlatformEvents, handle: ControllerHandle) {
    while let Some(event) = events.recv().await {
        if !handle.submit(event) {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autolight_domain::config::MotionDevice;
    use autolight_domain::platform::InputAction;
    use serde_json::json;

    fn sensor_devices() -> DeviceConfig {
        DeviceConfig {
            relay: DeviceId::new(0),
            motion: MotionDevice::BinarySensor {
                id: DeviceId::new(201),
            },
            lux: Some(DeviceId::new(200)),
            manual_inputs: vec![DeviceId::new(0)],
        }
    }

    #[test]
    fn should_follow_relay_commands_and_echo_as_loopback() {
        let (platform, mut events) = VirtualPlatform::new(&sensor_devices());
        platform.set_relay(DeviceId::new(0), true);

        assert!(platform.relay_output());
        assert_eq!(platform.commands(), vec![true]);
        assert_eq!(
            events.try_recv().unwrap(),
            PlatformEvent::SwitchStatus {
                device_id: DeviceId::new(0),
                output: Some(true),
                source: Some(SwitchSource::Loopback),
            }
        );
    }

    #[test]
    fn should_not_echo_repeated_command() {
        let (platform, mut events) = VirtualPlatform::new(&sensor_devices());
        platform.set_relay(DeviceId::new(0), false);

        assert_eq!(platform.commands(), vec![false]);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn should_ignore_commands_for_other_relays() {
        let (platform, _events) = VirtualPlatform::new(&sensor_devices());
        platform.set_relay(DeviceId::new(1), true);

        assert!(!platform.relay_output());
        assert!(platform.commands().is_empty());
    }

    #[test]
    fn should_emit_sensor_and_button_events() {
        let (platform, mut events) = VirtualPlatform::new(&sensor_devices());
        platform.set_motion(true);
        assert!(platform.set_lux(12.0));
        assert!(platform.press(DeviceId::new(0)));

        assert_eq!(
            events.try_recv().unwrap(),
            PlatformEvent::BinarySensor {
                device_id: DeviceId::new(201),
                value: Some(json!(true)),
            }
        );
        assert_eq!(
            events.try_recv().unwrap(),
            PlatformEvent::BinarySensor {
                device_id: DeviceId::new(200),
                value: Some(json!(12.0)),
            }
        );
        assert!(matches!(
            events.try_recv().unwrap(),
            PlatformEvent::Input {
                event: Some(InputAction::Press),
                ..
            }
        ));
    }

    #[test]
    fn should_refuse_missing_devices() {
        let (platform, mut events) = VirtualPlatform::new(&DeviceConfig::default());
        assert!(!platform.set_lux(10.0));
        assert!(!platform.long_press(DeviceId::new(7)));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn should_report_remote_switching_with_its_source() {
        let (platform, mut events) = VirtualPlatform::new(&sensor_devices());
        platform.switch_relay(true, SwitchSource::WsIn);

        assert!(platform.commands().is_empty());
        assert!(matches!(
            events.try_recv().unwrap(),
            PlatformEvent::SwitchStatus {
                source: Some(SwitchSource::WsIn),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn should_answer_status_queries() {
        let (platform, _events) = VirtualPlatform::new(&sensor_devices());
        platform.set_motion(true);

        let motion = platform
            .query_status(DeviceRef::binary_sensor(201))
            .await
            .unwrap();
        assert_eq!(motion.motion(), Some(true));
        assert_eq!(
            platform.query_status(DeviceRef::switch(0)).await,
            Some(DeviceStatus::Switch { output: false })
        );
        assert_eq!(platform.query_status(DeviceRef::input(9)).await, None);
    }

    #[tokio::test]
    async fn should_answer_nothing_while_unreachable() {
        let (platform, _events) = VirtualPlatform::new(&sensor_devices());
        platform.set_reachable(false);
        assert_eq!(platform.query_status(DeviceRef::switch(0)).await, None);
    }
}
