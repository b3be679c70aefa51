//! Controller state — the single mutable record the decision engine owns.
//!
//! A fresh [`ControllerState`] starts in automatic mode with the light off,
//! no motion and a lux reading of zero. It is never persisted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::TimerKind;
use crate::time::Timestamp;

/// Who is in charge of the light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Motion and lux drive the light.
    #[default]
    Auto,
    /// A person switched the light; automation stays out of the way.
    Manual,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Manual => f.write_str("manual"),
        }
    }
}

/// Last commanded relay output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightState {
    On,
    #[default]
    Off,
}

impl LightState {
    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }
}

impl From<bool> for LightState {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
        }
    }
}

/// Mode, light output and the sensor bookkeeping behind decisions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ControllerState {
    mode: Mode,
    light: LightState,
    motion: bool,
    lux: f64,
    last_changed: Option<Timestamp>,
}

impl ControllerState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn light(&self) -> LightState {
        self.light
    }

    #[must_use]
    pub fn motion(&self) -> bool {
        self.motion
    }

    #[must_use]
    pub fn lux(&self) -> f64 {
        self.lux
    }

    #[must_use]
    pub fn last_changed(&self) -> Option<Timestamp> {
        self.last_changed
    }

    /// Switch mode. Returns `true` when the mode actually changed.
    pub fn set_mode(&mut self, mode: Mode, at: Timestamp) -> bool {
        if self.mode == mode {
            return false;
        }
        self.mode = mode;
        self.last_changed = Some(at);
        true
    }

    /// Record a new light output. Returns `true` when it actually changed.
    pub fn set_light(&mut self, light: LightState, at: Timestamp) -> bool {
        if self.light == light {
            return false;
        }
        self.light = light;
        self.last_changed = Some(at);
        true
    }

    pub fn record_motion(&mut self, detected: bool) {
        self.motion = detected;
    }

    /// Store a lux reading, but only while the light is off.
    ///
    /// Readings taken with the light on measure the light itself and would
    /// mask darkness. Returns `true` when the reading was stored.
    pub fn accept_lux(&mut self, lux: f64) -> bool {
        if self.light.is_on() {
            return false;
        }
        self.lux = lux;
        true
    }

    /// Whether the last accepted reading is dark enough for motion to switch
    /// the light on. Without a threshold every reading counts as dark.
    #[must_use]
    pub fn is_dark(&self, threshold: Option<f64>) -> bool {
        threshold.is_none_or(|t| self.lux < t)
    }

    /// Read-only copy for observers, together with the pending timers.
    #[must_use]
    pub fn snapshot(&self, pending: impl IntoIterator<Item = TimerKind>) -> ControllerSnapshot {
        let mut pending_timers: Vec<TimerKind> = pending.into_iter().collect();
        pending_timers.sort();
        ControllerSnapshot {
            mode: self.mode,
            light: self.light,
            motion: self.motion,
            lux: self.lux,
            pending_timers,
            last_changed: self.last_changed,
        }
    }
}

/// Point-in-time view of the controller, published after every event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    pub mode: Mode,
    pub light: LightState,
    pub motion: bool,
    pub lux: f64,
    pub pending_timers: Vec<TimerKind>,
    pub last_changed: Option<Timestamp>,
}

impl ControllerSnapshot {
    #[must_use]
    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.pending_timers.contains(&kind)
    }
}
