//! Controller configuration — immutable once loaded.
//!
//! Every field has a default so a partial file is enough. The defaults
//! describe a relay on `switch:0`, a button on `input:0` and a PIR wired to
//! `input:1`, with no lux gating and no safety timer.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{DeviceId, DeviceRef};
use crate::platform::SwitchSource;

/// Everything the controller needs to know about its surroundings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Which platform components the controller listens to and drives.
    pub devices: DeviceConfig,
    /// Motion only switches the light on below this illuminance.
    pub lux_threshold: Option<f64>,
    /// Grace period after motion stops before the light goes off.
    #[serde(rename = "off_delay_ms", with = "crate::time::duration_ms")]
    pub off_delay: Duration,
    /// Maximum time motion may keep the light on without a stop signal.
    #[serde(rename = "on_safety_delay_ms", with = "crate::time::option_duration_ms")]
    pub on_safety_delay: Option<Duration>,
    /// Switch-change sources treated as a person taking manual control.
    pub manual_sources: Vec<SwitchSource>,
    /// One-shot motion status query at start.
    pub startup_sync: StartupSyncConfig,
}

/// Identity of the components the controller is wired to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Relay output driving the light.
    pub relay: DeviceId,
    /// Motion detector.
    pub motion: MotionDevice,
    /// Illuminance sensor; lux gating is off without one.
    pub lux: Option<DeviceId>,
    /// Buttons that toggle the light (short press) or release it (long press).
    pub manual_inputs: Vec<DeviceId>,
}

/// Where motion readings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum MotionDevice {
    /// A wireless sensor object reporting a boolean `value`.
    BinarySensor { id: DeviceId },
    /// A PIR wired to an input in switch mode, reporting `state`.
    Input { id: DeviceId },
}

impl MotionDevice {
    #[must_use]
    pub fn device_ref(self) -> DeviceRef {
        match self {
            Self::BinarySensor { id } => DeviceRef::binary_sensor(id.get()),
            Self::Input { id } => DeviceRef::input(id.get()),
        }
    }
}

/// Startup motion synchronisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupSyncConfig {
    pub enabled: bool,
    /// Wait before querying, so the platform has published its inputs.
    #[serde(rename = "delay_ms", with = "crate::time::duration_ms")]
    pub delay: Duration,
    /// Further attempts after an unavailable status, `delay` apart.
    pub retries: u32,
}

impl ControllerConfig {
    /// Check configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when:
    /// - `lux_threshold` is negative or not finite
    /// - `on_safety_delay` is present but zero
    /// - a manual input is listed twice or doubles as the motion input
    /// - the lux sensor is the motion sensor
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(threshold) = self.lux_threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(ValidationError::LuxThreshold(threshold));
            }
        }
        if self.on_safety_delay.is_some_and(|d| d.is_zero()) {
            return Err(ValidationError::ZeroSafetyDelay);
        }
        let motion = self.devices.motion.device_ref();
        if let Some(lux) = self.devices.lux {
            let lux = DeviceRef::binary_sensor(lux.get());
            if lux == motion {
                return Err(ValidationError::LuxSensorIsMotion(lux));
            }
        }
        let mut seen = HashSet::new();
        for id in &self.devices.manual_inputs {
            let input = DeviceRef::input(id.get());
            if input == motion {
                return Err(ValidationError::ManualInputIsMotion(input));
            }
            if !seen.insert(input) {
                return Err(ValidationError::DuplicateManualInput(input));
            }
        }
        Ok(())
    }

    /// The threshold to gate on, when both a lux sensor and a threshold are
    /// configured.
    #[must_use]
    pub fn lux_gate(&self) -> Option<f64> {
        self.devices.lux.and(self.lux_threshold)
    }

    /// Whether a switch change from `source` means someone took over.
    #[must_use]
    pub fn is_manual_source(&self, source: &SwitchSource) -> bool {
        self.manual_sources.contains(source)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            devices: DeviceConfig::default(),
            lux_threshold: None,
            off_delay: Duration::from_secs(10),
            on_safety_delay: None,
            manual_sources: vec![SwitchSource::Button, SwitchSource::WsIn],
            startup_sync: StartupSyncConfig::default(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            relay: DeviceId::new(0),
            motion: MotionDevice::default(),
            lux: None,
            manual_inputs: vec![DeviceId::new(0)],
        }
    }
}

impl Default for MotionDevice {
    fn default() -> Self {
        Self::Input {
            id: DeviceId::new(1),
        }
    }
}

impl Default for StartupSyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay: Duration::from_secs(1),
            retries: 0,
        }
    }
}
