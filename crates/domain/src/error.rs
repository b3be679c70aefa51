//! Error types used across the workspace.
//!
//! Nothing here is fatal at runtime: ingestion and status errors are logged
//! and the offending input dropped. Only [`ValidationError`] can stop the
//! process, and only while loading configuration.

use crate::id::DeviceRef;

/// Configuration invariants violated at load time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("lux threshold must be a finite, non-negative number (got {0})")]
    LuxThreshold(f64),

    #[error("on_safety_delay must be greater than zero when present")]
    ZeroSafetyDelay,

    #[error("manual input {0} is also configured as the motion input")]
    ManualInputIsMotion(DeviceRef),

    #[error("manual input {0} is listed more than once")]
    DuplicateManualInput(DeviceRef),

    #[error("lux sensor {0} is also configured as the motion sensor")]
    LuxSensorIsMotion(DeviceRef),
}

/// Why a raw platform event did not become a controller event.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IngestError {
    /// The event's component is not part of the configuration.
    #[error("event from unconfigured device {0}")]
    UnknownDevice(DeviceRef),

    /// A configured component sent an event without a usable payload.
    #[error("malformed event from {device}: {reason}")]
    Malformed {
        device: DeviceRef,
        reason: &'static str,
    },

    /// A configured input reported activity the controller does not act on.
    #[error("ignored {action} from {device}")]
    IgnoredAction { device: DeviceRef, action: String },
}

/// Startup status synchronisation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    /// The platform returned no status for the component.
    #[error("status of {0} is unavailable")]
    StatusUnavailable(DeviceRef),

    /// A status came back but carried no motion reading.
    #[error("status of {0} carries no motion reading")]
    NoMotionReading(DeviceRef),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_malformed_event_with_device_and_reason() {
        let err = IngestError::Malformed {
            device: DeviceRef::binary_sensor(200),
            reason: "lux value is not a number",
        };
        assert_eq!(
            err.to_string(),
            "malformed event from binary_sensor:200: lux value is not a number"
        );
    }

    #[test]
    fn should_display_status_unavailable() {
        let err = SyncError::StatusUnavailable(DeviceRef::input(1));
        assert_eq!(err.to_string(), "status of input:1 is unavailable");
    }
}
