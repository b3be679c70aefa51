//! Controller events — the closed set of inputs the decision engine reacts to.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::platform::SwitchSource;

/// The two independent timers the controller arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Grace period between "motion stopped" and switching the light off.
    OffDelay,
    /// Upper bound on how long motion may keep the light on.
    OnSafety,
}

impl TimerKind {
    pub const ALL: [Self; 2] = [Self::OffDelay, Self::OnSafety];
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OffDelay => f.write_str("off_delay"),
            Self::OnSafety => f.write_str("on_safety"),
        }
    }
}

/// What a manual input asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualInput {
    /// Flip the light and take manual control.
    Toggle,
    /// Switch off and hand control back to automation.
    LongPush,
}

/// A normalized event, produced by ingestion or by an expired timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControllerEvent {
    SwitchStatusChanged { output: bool, source: SwitchSource },
    MotionChanged { detected: bool },
    LuxChanged { lux: f64 },
    ManualInputPressed { kind: ManualInput },
    TimerExpired { kind: TimerKind },
}

impl fmt::Display for ControllerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SwitchStatusChanged { output, source } => {
                write!(f, "switch_status_changed(output={output}, source={source})")
            }
            Self::MotionChanged { detected } => write!(f, "motion_changed({detected})"),
            Self::LuxChanged { lux } => write!(f, "lux_changed({lux})"),
            Self::ManualInputPressed { kind } => write!(f, "manual_input_pressed({kind:?})"),
            Self::TimerExpired { kind } => write!(f, "timer_expired({kind})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_timer_kinds_in_snake_case() {
        assert_eq!(TimerKind::OffDelay.to_string(), "off_delay");
        assert_eq!(TimerKind::OnSafety.to_string(), "on_safety");
    }

    #[test]
    fn should_display_events_compactly() {
        let event = ControllerEvent::SwitchStatusChanged {
            output: true,
            source: SwitchSource::Button,
        };
        assert_eq!(
            event.to_string(),
            "switch_status_changed(output=true, source=button)"
        );
        assert_eq!(
            ControllerEvent::TimerExpired {
                kind: TimerKind::OnSafety
            }
            .to_string(),
            "timer_expired(on_safety)"
        );
    }
}
