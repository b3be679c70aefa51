//! Platform events — the raw, loosely checked messages a host delivers.
//!
//! These mirror the host's JSON payloads. Every payload field is optional so
//! that a message with a missing field still deserializes and can be
//! rejected by ingestion as malformed instead of failing somewhere upstream.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::id::{DeviceId, DeviceRef};

/// One inbound event from the host platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlatformEvent {
    /// Relay state echo, sent whenever a switch output changes.
    SwitchStatus {
        device_id: DeviceId,
        output: Option<bool>,
        source: Option<SwitchSource>,
    },
    /// Sensor reading; a boolean for motion, a number for illuminance.
    BinarySensor {
        device_id: DeviceId,
        value: Option<serde_json::Value>,
    },
    /// Physical input activity.
    Input {
        device_id: DeviceId,
        event: Option<InputAction>,
        state: Option<bool>,
    },
}

impl PlatformEvent {
    /// The component that emitted this event.
    #[must_use]
    pub fn device(&self) -> DeviceRef {
        match self {
            Self::SwitchStatus { device_id, .. } => DeviceRef::switch(device_id.get()),
            Self::BinarySensor { device_id, .. } => DeviceRef::binary_sensor(device_id.get()),
            Self::Input { device_id, .. } => DeviceRef::input(device_id.get()),
        }
    }
}

/// What caused a switch output to change.
///
/// Parsed case-insensitively; unrecognised tags are kept verbatim in
/// [`Other`](Self::Other) so they can still be listed in configuration, and
/// compare equal regardless of case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SwitchSource {
    /// The device's own physical button.
    Button,
    /// Remote UI over websocket.
    WsIn,
    /// Remote HTTP call.
    HttpIn,
    /// A schedule configured on the device.
    Schedule,
    /// A device-side auto-on/auto-off timer.
    Timer,
    /// Power-on initialisation.
    Init,
    /// A command issued locally by a script, including this controller.
    Loopback,
    Other(String),
}

impl From<&str> for SwitchSource {
    fn from(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "button" => Self::Button,
            "ws_in" => Self::WsIn,
            "http_in" => Self::HttpIn,
            "schedule" => Self::Schedule,
            "timer" => Self::Timer,
            "init" => Self::Init,
            "loopback" => Self::Loopback,
            _ => Self::Other(tag.to_string()),
        }
    }
}

impl PartialEq for SwitchSource {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Other(a), Self::Other(b)) => a.eq_ignore_ascii_case(b),
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

impl Eq for SwitchSource {}

impl Hash for SwitchSource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        if let Self::Other(tag) = self {
            for byte in tag.bytes() {
                byte.to_ascii_lowercase().hash(state);
            }
        }
    }
}

impl From<String> for SwitchSource {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

impl From<SwitchSource> for String {
    fn from(source: SwitchSource) -> Self {
        source.to_string()
    }
}

impl fmt::Display for SwitchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Button => f.write_str("button"),
            Self::WsIn => f.write_str("ws_in"),
            Self::HttpIn => f.write_str("http_in"),
            Self::Schedule => f.write_str("schedule"),
            Self::Timer => f.write_str("timer"),
            Self::Init => f.write_str("init"),
            Self::Loopback => f.write_str("loopback"),
            Self::Other(tag) => f.write_str(tag),
        }
    }
}

/// Input activity reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InputAction {
    /// Short press (`press`, `btn_down`).
    Press,
    /// Long press (`long_press`, `long_push`).
    LongPress,
    /// Any other activity (`btn_up`, `double_push`, `toggle`, …).
    Other(String),
}

impl From<String> for InputAction {
    fn from(tag: String) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "press" | "btn_down" => Self::Press,
            "long_press" | "long_push" => Self::LongPress,
            _ => Self::Other(tag),
        }
    }
}

impl From<InputAction> for String {
    fn from(action: InputAction) -> Self {
        match action {
            InputAction::Press => "press".to_string(),
            InputAction::LongPress => "long_press".to_string(),
            InputAction::Other(tag) => tag,
        }
    }
}

/// Result of a one-off status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceStatus {
    Switch { output: bool },
    Input { state: Option<bool> },
    BinarySensor { value: serde_json::Value },
}

impl DeviceStatus {
    /// Interpret the status as a motion reading, if it carries one.
    #[must_use]
    pub fn motion(&self) -> Option<bool> {
        match self {
            Self::Input { state } => *state,
            Self::BinarySensor { value } => value.as_bool(),
            Self::Switch { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_switch_status_with_platform_source_tag() {
        let event: PlatformEvent = serde_json::from_str(
            r#"{"type": "switch_status", "device_id": 0, "output": true, "source": "WS_in"}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            PlatformEvent::SwitchStatus {
                device_id: DeviceId::new(0),
                output: Some(true),
                source: Some(SwitchSource::WsIn),
            }
        );
    }

    #[test]
    fn should_keep_missing_payload_fields_as_none() {
        let event: PlatformEvent =
            serde_json::from_str(r#"{"type": "binary_sensor", "device_id": 201}"#).unwrap();
        assert_eq!(
            event,
            PlatformEvent::BinarySensor {
                device_id: DeviceId::new(201),
                value: None,
            }
        );
    }

    #[test]
    fn should_map_platform_aliases_to_input_actions() {
        assert_eq!(InputAction::from("btn_down".to_string()), InputAction::Press);
        assert_eq!(InputAction::from("long_push".to_string()), InputAction::LongPress);
        assert_eq!(
            InputAction::from("btn_up".to_string()),
            InputAction::Other("btn_up".to_string())
        );
    }

    #[test]
    fn should_keep_unknown_switch_source_verbatim() {
        let source = SwitchSource::from("MQTT");
        assert_eq!(source, SwitchSource::Other("MQTT".to_string()));
        assert_eq!(source.to_string(), "MQTT");
    }

    #[test]
    fn should_match_unknown_switch_sources_regardless_of_case() {
        use std::collections::HashSet;

        let configured = SwitchSource::Other("MQTT".to_string());
        assert_eq!(configured, SwitchSource::from("mqtt"));
        assert_ne!(configured, SwitchSource::from("zigbee"));
        assert_ne!(SwitchSource::Button, SwitchSource::WsIn);

        let set: HashSet<SwitchSource> = [configured].into_iter().collect();
        assert!(set.contains(&SwitchSource::from("Mqtt")));
    }

    #[test]
    fn should_report_owning_device_of_event() {
        let event = PlatformEvent::Input {
            device_id: DeviceId::new(1),
            event: None,
            state: Some(true),
        };
        assert_eq!(event.device(), DeviceRef::input(1));
    }

    #[test]
    fn should_read_motion_from_input_and_sensor_status() {
        assert_eq!(DeviceStatus::Input { state: Some(true) }.motion(), Some(true));
        assert_eq!(
            DeviceStatus::BinarySensor {
                value: serde_json::json!(false)
            }
            .motion(),
            Some(false)
        );
        assert_eq!(DeviceStatus::Switch { output: true }.motion(), None);
    }
}
