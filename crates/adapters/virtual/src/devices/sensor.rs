//! Virtual sensors — motion (sensor or contact input) and illuminance.

use std::sync::Mutex;

use autolight_domain::config::MotionDevice;
use autolight_domain::id::{DeviceId, DeviceRef};
use autolight_domain::platform::{DeviceStatus, PlatformEvent};
use serde_json::json;

use super::{read, write};

/// A simulated occupancy detector.
///
/// Reports through whichever channel the configuration wires it to: a
/// boolean sensor value or the state of a contact input.
pub struct VirtualMotionSensor {
    wiring: MotionDevice,
    detected: Mutex<bool>,
}

impl VirtualMotionSensor {
    #[must_use]
    pub fn new(wiring: MotionDevice) -> Self {
        Self {
            wiring,
            detected: Mutex::new(false),
        }
    }

    #[must_use]
    pub fn device(&self) -> DeviceRef {
        self.wiring.device_ref()
    }

    #[must_use]
    pub fn detected(&self) -> bool {
        read(&self.detected)
    }

    /// Record a new reading and return the event announcing it.
    pub fn set(&self, detected: bool) -> PlatformEvent {
        *write(&self.detected) = detected;
        match self.wiring {
            MotionDevice::BinarySensor { id } => PlatformEvent::BinarySensor {
                device_id: id,
                value: Some(json!(detected)),
            },
            MotionDevice::Input { id } => PlatformEvent::Input {
                device_id: id,
                event: None,
                state: Some(detected),
            },
        }
    }

    #[must_use]
    pub fn status(&self) -> DeviceStatus {
        let detected = self.detected();
        match self.wiring {
            MotionDevice::BinarySensor { .. } => DeviceStatus::BinarySensor {
                value: json!(detected),
            },
            MotionDevice::Input { .. } => DeviceStatus::Input {
                state: Some(detected),
            },
        }
    }
}

/// A simulated illuminance sensor.
pub struct VirtualLuxSensor {
    id: DeviceId,
    lux: Mutex<f64>,
}

impl VirtualLuxSensor {
    #[must_use]
    pub fn new(id: DeviceId) -> Self {
        Self {
            id,
            lux: Mutex::new(0.0),
        }
    }

    #[must_use]
    pub fn device(&self) -> DeviceRef {
        DeviceRef::binary_sensor(self.id.get())
    }

    /// Record a new reading and return the event announcing it.
    pub fn set(&self, lux: f64) -> PlatformEvent {
        *write(&self.lux) = lux;
        PlatformEvent::BinarySensor {
            device_id: self.id,
            value: Some(json!(lux)),
        }
    }

    #[must_use]
    pub fn status(&self) -> DeviceStatus {
        DeviceStatus::BinarySensor {
            value: json!(read(&self.lux)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_report_motion_as_sensor_value() {
        let sensor = VirtualMotionSensor::new(MotionDevice::BinarySensor {
            id: DeviceId::new(201),
        });
        assert_eq!(
            sensor.set(true),
            PlatformEvent::BinarySensor {
                device_id: DeviceId::new(201),
                value: Some(json!(true)),
            }
        );
        assert_eq!(sensor.status().motion(), Some(true));
    }

    #[test]
    fn should_report_motion_as_input_state() {
        let sensor = VirtualMotionSensor::new(MotionDevice::Input {
            id: DeviceId::new(1),
        });
        assert_eq!(
            sensor.set(true),
            PlatformEvent::Input {
                device_id: DeviceId::new(1),
                event: None,
                state: Some(true),
            }
        );
        assert!(sensor.detected());
        assert_eq!(sensor.device(), DeviceRef::input(1));
    }

    #[test]
    fn should_start_dark_and_idle() {
        let motion = VirtualMotionSensor::new(MotionDevice::default());
        let lux = VirtualLuxSensor::new(DeviceId::new(200));
        assert_eq!(motion.status().motion(), Some(false));
        assert_eq!(lux.status(), DeviceStatus::BinarySensor { value: json!(0.0) });
    }

    #[test]
    fn should_report_lux_reading() {
        let lux = VirtualLuxSensor::new(DeviceId::new(200));
        assert_eq!(
            lux.set(42.5),
            PlatformEvent::BinarySensor {
                device_id: DeviceId::new(200),
                value: Some(json!(42.5)),
            }
        );
    }
}
