//! Controller — the sequential event loop around the decision engine.
//!
//! Everything that can change the controller state arrives as an [`Inbox`]
//! message on one channel: platform events, timer expiries and the result of
//! the startup status query. Messages are handled one at a time, each to
//! completion, so the state needs no locking. Observers get read-only
//! [`ControllerSnapshot`]s through a watch channel after every message.

use std::sync::Arc;

use autolight_domain::config::{ControllerConfig, StartupSyncConfig};
use autolight_domain::error::{IngestError, SyncError};
use autolight_domain::event::ControllerEvent;
use autolight_domain::id::DeviceRef;
use autolight_domain::platform::{DeviceStatus, PlatformEvent};
use autolight_domain::state::ControllerSnapshot;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};

use crate::decision_engine::DecisionEngine;
use crate::ingestion::EventIngestion;
use crate::ports::{ActuatorGateway, NoStatusSource, StatusSource};
use crate::timer_manager::{TimerFired, TimerManager};

/// Messages processed by the controller loop, in arrival order.
#[derive(Debug)]
pub enum Inbox {
    /// Raw event from the host platform.
    Platform(PlatformEvent),
    /// A timer task reached its deadline.
    Timer(TimerFired),
    /// Answer to the startup motion status query.
    MotionStatus {
        attempt: u32,
        status: Option<DeviceStatus>,
    },
    /// Stop after the messages already queued ahead of this one.
    Shutdown,
    /// Like `Shutdown`, but only once no timer is armed any more.
    ShutdownWhenIdle,
}

impl From<TimerFired> for Inbox {
    fn from(fired: TimerFired) -> Self {
        Self::Timer(fired)
    }
}

/// Cloneable handle for feeding and observing a running controller.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    outbox: mpsc::UnboundedSender<Inbox>,
    snapshots: watch::Receiver<ControllerSnapshot>,
}

impl ControllerHandle {
    /// Queue a platform event. Returns `false` once the controller stopped.
    pub fn submit(&self, event: PlatformEvent) -> bool {
        self.outbox.send(Inbox::Platform(event)).is_ok()
    }

    /// Ask the controller to stop once the already queued events are handled.
    pub fn shutdown(&self) {
        let _ = self.outbox.send(Inbox::Shutdown);
    }

    /// Ask the controller to stop once the queued events are handled and
    /// every armed timer has fired, so a pending switch-off still happens.
    pub fn shutdown_when_idle(&self) {
        let _ = self.outbox.send(Inbox::ShutdownWhenIdle);
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ControllerSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified after every processed message.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ControllerSnapshot> {
        self.snapshots.clone()
    }
}

/// Single-actuator light controller.
pub struct Controller<A, S = NoStatusSource> {
    engine: DecisionEngine<A, Inbox>,
    ingestion: EventIngestion,
    inbox: mpsc::UnboundedReceiver<Inbox>,
    outbox: mpsc::UnboundedSender<Inbox>,
    snapshots: watch::Sender<ControllerSnapshot>,
    status: Option<Arc<S>>,
    sync: StartupSyncConfig,
    motion_device: DeviceRef,
    motion_seen: bool,
}

impl<A: ActuatorGateway> Controller<A> {
    /// Build a controller and the handle used to feed it.
    ///
    /// The controller does nothing until [`run`](Self::run) is awaited,
    /// usually on its own task.
    pub fn new(config: ControllerConfig, actuator: A) -> (Self, ControllerHandle) {
        let (outbox, inbox) = mpsc::unbounded_channel();
        let ingestion = EventIngestion::new(&config.devices);
        let sync = config.startup_sync.clone();
        let motion_device = config.devices.motion.device_ref();
        let engine = DecisionEngine::new(config, actuator, TimerManager::new(outbox.clone()));
        let (snapshots, snapshot_rx) = watch::channel(engine.snapshot());

        let handle = ControllerHandle {
            outbox: outbox.clone(),
            snapshots: snapshot_rx,
        };
        let controller = Self {
            engine,
            ingestion,
            inbox,
            outbox,
            snapshots,
            status: None,
            sync,
            motion_device,
            motion_seen: false,
        };
        (controller, handle)
    }
}

impl<A, S> Controller<A, S> {
    /// Query `source` for the motion reading at startup.
    #[must_use]
    pub fn with_status_source<S2: StatusSource>(self, source: S2) -> Controller<A, S2> {
        Controller {
            engine: self.engine,
            ingestion: self.ingestion,
            inbox: self.inbox,
            outbox: self.outbox,
            snapshots: self.snapshots,
            status: Some(Arc::new(source)),
            sync: self.sync,
            motion_device: self.motion_device,
            motion_seen: self.motion_seen,
        }
    }
}

impl<A, S> Controller<A, S>
where
    A: ActuatorGateway,
    S: StatusSource + 'static,
{
    /// Process messages until a shutdown request is dequeued, or until the
    /// timers have run out after [`ControllerHandle::shutdown_when_idle`].
    ///
    /// Timers are disarmed on the way out; the relay is left as it is.
    pub async fn run(mut self) {
        info!(
            relay = %self.engine.config().devices.relay,
            motion = %self.motion_device,
            "controller started"
        );
        self.request_motion_status(0);

        let mut draining = false;
        while let Some(message) = self.inbox.recv().await {
            match message {
                Inbox::Platform(event) => self.on_platform_event(&event),
                Inbox::Timer(fired) => self.engine.handle_timer(fired),
                Inbox::MotionStatus { attempt, status } => self.on_motion_status(attempt, status),
                Inbox::Shutdown => break,
                Inbox::ShutdownWhenIdle => {
                    info!("waiting for armed timers before stopping");
                    draining = true;
                }
            }
            let snapshot = self.engine.snapshot();
            let idle = snapshot.pending_timers.is_empty();
            self.snapshots.send_replace(snapshot);
            if draining && idle {
                break;
            }
        }

        self.engine.shutdown();
        self.snapshots.send_replace(self.engine.snapshot());
        info!("controller stopped");
    }

    fn on_platform_event(&mut self, event: &PlatformEvent) {
        match self.ingestion.normalize(event) {
            Ok(normalized) => {
                debug!(event = %normalized, "processing event");
                if matches!(normalized, ControllerEvent::MotionChanged { .. }) {
                    self.motion_seen = true;
                }
                self.engine.handle(normalized);
            }
            Err(err @ IngestError::UnknownDevice(_)) => trace!(%err, "dropping event"),
            Err(err @ IngestError::IgnoredAction { .. }) => debug!(%err, "dropping event"),
            Err(err @ IngestError::Malformed { .. }) => warn!(%err, "dropping event"),
        }
    }

    fn on_motion_status(&mut self, attempt: u32, status: Option<DeviceStatus>) {
        let reading = match status {
            None => Err(SyncError::StatusUnavailable(self.motion_device)),
            Some(status) => status
                .motion()
                .ok_or(SyncError::NoMotionReading(self.motion_device)),
        };

        match reading {
            Ok(_) if self.motion_seen => {
                debug!("live motion reading already received, ignoring startup status");
            }
            Ok(detected) => self.engine.sync_motion(detected),
            Err(err) if attempt < self.sync.retries => {
                warn!(%err, attempt, "startup sync failed, retrying");
                self.request_motion_status(attempt + 1);
            }
            Err(err) => warn!(%err, attempt, "startup sync failed, keeping defaults"),
        }
    }

    fn request_motion_status(&self, attempt: u32) {
        let Some(source) = self.status.clone() else {
            return;
        };
        if !self.sync.enabled {
            return;
        }
        let device = self.motion_device;
        let delay = self.sync.delay;
        let outbox = self.outbox.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let status = source.query_status(device).await;
            let _ = outbox.send(Inbox::MotionStatus { attempt, status });
        });
    }
}
