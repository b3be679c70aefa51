//! Decision engine — the light controller's state machine.
//!
//! The engine owns the [`ControllerState`] and the [`TimerManager`], and is
//! the only place that commands the relay. It consumes one
//! [`ControllerEvent`] at a time:
//!
//! | Mode   | Event                       | Effect                                        |
//! |--------|-----------------------------|-----------------------------------------------|
//! | any    | switch change, manual source| manual mode, adopt reported output            |
//! | any    | short press                 | manual mode, flip light                       |
//! | any    | long press                  | auto mode, light off, timers cleared          |
//! | auto   | motion, dark enough         | light on, off-delay cleared, safety re-armed  |
//! | auto   | motion stopped              | off-delay armed                               |
//! | auto   | off-delay expired           | light off                                     |
//! | any    | safety expired              | auto mode, light off                          |
//! | any    | lux reading                 | stored only while the light is off            |
//!
//! In manual mode motion and lux only update bookkeeping.

use autolight_domain::config::ControllerConfig;
use autolight_domain::event::{ControllerEvent, ManualInput, TimerKind};
use autolight_domain::platform::SwitchSource;
use autolight_domain::state::{ControllerSnapshot, ControllerState, LightState, Mode};
use autolight_domain::time::now;
use tracing::{debug, info};

use crate::ports::ActuatorGateway;
use crate::timer_manager::{TimerFired, TimerManager};

/// State machine arbitrating motion, lux and manual control of one relay.
pub struct DecisionEngine<A, T> {
    config: ControllerConfig,
    state: ControllerState,
    timers: TimerManager<T>,
    actuator: A,
}

impl<A, T> DecisionEngine<A, T>
where
    A: ActuatorGateway,
    T: From<TimerFired> + Send + 'static,
{
    /// Create an engine in its initial state (auto, light off).
    pub fn new(config: ControllerConfig, actuator: A, timers: TimerManager<T>) -> Self {
        Self {
            config,
            state: ControllerState::new(),
            timers,
            actuator,
        }
    }

    /// Current controller state.
    #[must_use]
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Configuration the engine was built with.
    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Read-only view of the state, including which timers are armed.
    #[must_use]
    pub fn snapshot(&self) -> ControllerSnapshot {
        self.state.snapshot(self.timers.pending())
    }

    /// Process one event to completion.
    pub fn handle(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::SwitchStatusChanged { output, source } => {
                self.on_switch_status(output, &source);
            }
            ControllerEvent::MotionChanged { detected } => self.on_motion(detected),
            ControllerEvent::LuxChanged { lux } => self.on_lux(lux),
            ControllerEvent::ManualInputPressed {
                kind: ManualInput::Toggle,
            } => self.on_toggle(),
            ControllerEvent::ManualInputPressed {
                kind: ManualInput::LongPush,
            } => self.on_long_push(),
            ControllerEvent::TimerExpired {
                kind: TimerKind::OffDelay,
            } => self.on_off_delay_expired(),
            ControllerEvent::TimerExpired {
                kind: TimerKind::OnSafety,
            } => self.on_safety_expired(),
        }
    }

    /// Process an expiry notice from the inbox.
    ///
    /// Notices for timers that were cancelled or re-armed after they fired
    /// are dropped here.
    pub fn handle_timer(&mut self, fired: TimerFired) {
        if !self.timers.claim(fired) {
            debug!(timer = %fired.kind, "dropping stale timer expiry");
            return;
        }
        self.handle(ControllerEvent::TimerExpired { kind: fired.kind });
    }

    /// Seed the motion reading from a startup status query.
    pub fn sync_motion(&mut self, detected: bool) {
        self.state.record_motion(detected);
        info!(motion = detected, "motion reading synchronised");
    }

    /// Disarm every timer. The light is left as it is.
    pub fn shutdown(&mut self) {
        self.timers.cancel_all();
    }

    fn on_switch_status(&mut self, output: bool, source: &SwitchSource) {
        if !self.config.is_manual_source(source) {
            debug!(%source, output, "switch change from non-manual source");
            return;
        }
        // the relay already reflects the change, no command needed
        self.enter_manual(LightState::from(output));
        info!(%source, light = %self.state.light(), "manual override from switch");
    }

    fn on_toggle(&mut self) {
        let light = self.state.light().toggled();
        self.enter_manual(light);
        self.command(light);
        info!(light = %light, "manual toggle");
    }

    fn on_long_push(&mut self) {
        self.timers.cancel_all();
        self.state.set_mode(Mode::Auto, now());
        self.state.set_light(LightState::Off, now());
        self.command(LightState::Off);
        info!("long press, back to automatic with light off");
    }

    fn on_motion(&mut self, detected: bool) {
        self.state.record_motion(detected);
        if self.state.mode() == Mode::Manual {
            debug!(motion = detected, "manual mode, ignoring motion");
            return;
        }

        if detected {
            if !self.state.is_dark(self.config.lux_gate()) {
                debug!(lux = self.state.lux(), "motion while bright, light stays as is");
                return;
            }
            self.timers.cancel(TimerKind::OffDelay);
            self.switch(LightState::On);
            if let Some(delay) = self.config.on_safety_delay {
                self.timers.schedule(TimerKind::OnSafety, delay);
            }
        } else {
            // an explicit stop arrived, the off-delay bounds the on time now
            self.timers.cancel(TimerKind::OnSafety);
            self.timers.schedule(TimerKind::OffDelay, self.config.off_delay);
        }
    }

    fn on_lux(&mut self, lux: f64) {
        if self.state.accept_lux(lux) {
            debug!(lux, "lux reading stored");
        } else {
            debug!(lux, kept = self.state.lux(), "light is on, lux reading ignored");
        }
    }

    fn on_off_delay_expired(&mut self) {
        self.timers.cancel(TimerKind::OffDelay);
        if self.state.mode() != Mode::Auto {
            return;
        }
        self.timers.cancel(TimerKind::OnSafety);
        if self.switch(LightState::Off) {
            info!("no motion within off delay, light off");
        }
    }

    fn on_safety_expired(&mut self) {
        self.timers.cancel_all();
        self.state.set_mode(Mode::Auto, now());
        self.state.set_light(LightState::Off, now());
        self.command(LightState::Off);
        info!(motion = self.state.motion(), "safety delay reached, light off");
    }

    fn enter_manual(&mut self, light: LightState) {
        // automation timers must not touch a light someone is controlling
        self.timers.cancel_all();
        self.state.set_mode(Mode::Manual, now());
        self.state.set_light(light, now());
    }

    /// Record and command `light` if it differs from the current output.
    fn switch(&mut self, light: LightState) -> bool {
        let changed = self.state.set_light(light, now());
        if changed {
            self.command(light);
            info!(light = %light, "light switched automatically");
        }
        changed
    }

    fn command(&self, light: LightState) {
        self.actuator.set_relay(self.config.devices.relay, light.is_on());
    }
}
