//! JSON-lines platform bridge.
//!
//! Inbound, one JSON object per line on stdin: either a platform event
//! (`{"type": "binary_sensor", "device_id": 201, "value": true}`) or the reply
//! to a status request (`{"request_id": 3, "status": {...}}`).
//!
//! Outbound, one [`Command`] per line on stdout:
//!
//! ```text
//! {"method":"set_relay","device_id":0,"on":true}
//! {"method":"get_status","request_id":3,"device":{"kind":"binary_sensor","id":201}}
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use autolight_app::ports::{ActuatorGateway, StatusSource};
use autolight_domain::id::{DeviceId, DeviceRef};
use autolight_domain::platform::{DeviceStatus, PlatformEvent};
use serde::{Deserialize, Serialize};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Request written to the platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Command {
    SetRelay { device_id: DeviceId, on: bool },
    GetStatus { request_id: u64, device: DeviceRef },
}

/// Answer to a [`Command::GetStatus`]; `status` is `null` when the platform
/// has nothing to report.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusReply {
    pub request_id: u64,
    pub status: Option<DeviceStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Inbound {
    Event(PlatformEvent),
    Reply(StatusReply),
}

type Pending = HashMap<u64, oneshot::Sender<Option<DeviceStatus>>>;

/// Outbound side of the bridge: the controller's actuator and status source.
pub struct StdioBridge {
    commands: mpsc::UnboundedSender<Command>,
    pending: Mutex<Pending>,
    next_request: AtomicU64,
    reply_timeout: Duration,
}

impl StdioBridge {
    #[must_use]
    pub fn new(commands: mpsc::UnboundedSender<Command>, reply_timeout: Duration) -> Self {
        Self {
            commands,
            pending: Mutex::new(HashMap::new()),
            next_request: AtomicU64::new(1),
            reply_timeout,
        }
    }

    /// Hand a reply to the query waiting for it.
    pub fn resolve(&self, reply: StatusReply) {
        match self.pending().remove(&reply.request_id) {
            Some(waiter) => {
                let _ = waiter.send(reply.status);
            }
            None => debug!(request_id = reply.request_id, "reply to unknown or expired request"),
        }
    }

    fn pending(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ActuatorGateway for StdioBridge {
    fn set_relay(&self, relay: DeviceId, on: bool) {
        if self
            .commands
            .send(Command::SetRelay {
                device_id: relay,
                on,
            })
            .is_err()
        {
            warn!(%relay, on, "command stream closed, relay command dropped");
        }
    }
}

impl StatusSource for StdioBridge {
    fn query_status(
        &self,
        device: DeviceRef,
    ) -> impl Future<Output = Option<DeviceStatus>> + Send {
        let request_id = self.next_request.fetch_add(1, Ordering::Relaxed);
        let (waiter, reply) = oneshot::channel();
        self.pending().insert(request_id, waiter);
        let sent = self
            .commands
            .send(Command::GetStatus { request_id, device })
            .is_ok();

        async move {
            let status = if sent {
                tokio::time::timeout(self.reply_timeout, reply)
                    .await
                    .ok()
                    .and_then(Result::ok)
                    .flatten()
            } else {
                None
            };
            self.pending().remove(&request_id);
            status
        }
    }
}

/// Read inbound lines until EOF, passing events to `submit` and replies to
/// `bridge`. Stops early when `submit` returns `false`.
///
/// # Errors
///
/// Returns an error when reading from `reader` fails.
pub async fn read_lines<R, F>(reader: R, bridge: &StdioBridge, mut submit: F) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    F: FnMut(PlatformEvent) -> bool,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Inbound>(line) {
            Ok(Inbound::Event(event)) => {
                if !submit(event) {
                    break;
                }
            }
            Ok(Inbound::Reply(reply)) => bridge.resolve(reply),
            Err(err) => warn!(%err, line, "skipping unreadable line"),
        }
    }
    Ok(())
}

/// Write every command as one JSON line until all senders are gone.
///
/// # Errors
///
/// Returns an error when writing to `writer` fails.
pub async fn write_commands<W>(
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut writer: W,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(command) = commands.recv().await {
        let mut line = serde_json::to_vec(&command)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}
