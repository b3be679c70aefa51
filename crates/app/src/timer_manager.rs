//! Timer manager — named, single-shot timers delivered through the inbox.
//!
//! Each [`TimerKind`] owns at most one slot. Arming a kind replaces whatever
//! was in its slot. Expiries are never run inline: the timer task posts a
//! [`TimerFired`] message to the controller's inbox and the controller hands
//! it back through [`TimerManager::claim`] when it reaches the front of the
//! queue.
//!
//! Every arm bumps a generation counter. A `TimerFired` that was already
//! queued when its slot was cancelled or re-armed carries an old generation
//! and is refused by `claim`, so cancel and fire cannot race.

use std::collections::HashMap;
use std::time::Duration;

use autolight_domain::event::TimerKind;
use autolight_domain::time::as_millis;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

/// Expiry notice posted by a timer task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub kind: TimerKind,
    generation: u64,
}

#[derive(Debug)]
struct Slot {
    generation: u64,
    task: JoinHandle<()>,
}

/// Kind-keyed table of armed timers.
///
/// Must be used from within a tokio runtime: arming spawns a task.
#[derive(Debug)]
pub struct TimerManager<T> {
    outbox: mpsc::UnboundedSender<T>,
    slots: HashMap<TimerKind, Slot>,
    next_generation: u64,
}

impl<T> TimerManager<T>
where
    T: From<TimerFired> + Send + 'static,
{
    /// Create a manager that posts expiries to `outbox`.
    #[must_use]
    pub fn new(outbox: mpsc::UnboundedSender<T>) -> Self {
        Self {
            outbox,
            slots: HashMap::new(),
            next_generation: 0,
        }
    }

    /// Arm `kind` to fire `delay` from now, replacing any armed timer of the
    /// same kind.
    pub fn schedule(&mut self, kind: TimerKind, delay: Duration) {
        self.cancel(kind);

        self.next_generation += 1;
        let generation = self.next_generation;
        // fixed here, not when the task first gets polled
        let deadline = Instant::now() + delay;
        let outbox = self.outbox.clone();
        let task = tokio::spawn(async move {
            time::sleep_until(deadline).await;
            // the receiver is gone once the controller has stopped
            let _ = outbox.send(T::from(TimerFired { kind, generation }));
        });

        tracing::debug!(timer = %kind, delay_ms = as_millis(delay), "timer armed");
        self.slots.insert(
            kind,
            Slot { generation, task },
        );
    }
}

impl<T> TimerManager<T> {
    /// Disarm `kind`. Returns `true` when a timer was armed.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        match self.slots.remove(&kind) {
            Some(slot) => {
                slot.task.abort();
                tracing::debug!(timer = %kind, "timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Disarm every timer.
    pub fn cancel_all(&mut self) {
        for kind in TimerKind::ALL {
            self.cancel(kind);
        }
    }

    /// Accept an expiry notice taken off the inbox.
    ///
    /// Returns `true` and frees the slot when the notice belongs to the timer
    /// currently armed for its kind; returns `false` for notices of cancelled
    /// or replaced timers, which must then be dropped.
    pub fn claim(&mut self, fired: TimerFired) -> bool {
        match self.slots.get(&fired.kind) {
            Some(slot) if slot.generation == fired.generation => {
                self.slots.remove(&fired.kind);
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.slots.contains_key(&kind)
    }

    /// Kinds that are currently armed.
    pub fn pending(&self) -> impl Iterator<Item = TimerKind> + '_ {
        self.slots.keys().copied()
    }
}

impl<T> Drop for TimerManager<T> {
    fn drop(&mut self) {
        for slot in self.slots.values() {
            slot.task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> (TimerManager<TimerFired>, mpsc::UnboundedReceiver<TimerFired>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TimerManager::new(tx), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn should_deliver_expiry_after_delay() {
        let (mut timers, mut rx) = manager();
        timers.schedule(TimerKind::OffDelay, Duration::from_secs(10));

        let fired = rx.recv().await.unwrap();
        assert_eq!(fired.kind, TimerKind::OffDelay);
        assert!(timers.claim(fired));
        assert!(!timers.is_pending(TimerKind::OffDelay));
    }

    #[tokio::test(start_paused = true)]
    async fn should_deliver_exactly_at_deadline() {
        let (mut timers, mut rx) = manager();
        let start = Instant::now();
        timers.schedule(TimerKind::OffDelay, Duration::from_secs(10));

        rx.recv().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_one_timer_per_kind() {
        let (mut timers, mut rx) = manager();
        timers.schedule(TimerKind::OffDelay, Duration::from_secs(5));
        timers.schedule(TimerKind::OffDelay, Duration::from_secs(20));
        assert_eq!(timers.pending().count(), 1);

        let fired = rx.recv().await.unwrap();
        assert!(timers.claim(fired));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn should_replace_deadline_when_rearmed() {
        let (mut timers, mut rx) = manager();
        let start = Instant::now();
        timers.schedule(TimerKind::OffDelay, Duration::from_secs(5));
        time::advance(Duration::from_secs(1)).await;
        timers.schedule(TimerKind::OffDelay, Duration::from_secs(5));

        let fired = rx.recv().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(6));
        assert!(timers.claim(fired));
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_deliver_cancelled_timer() {
        let (mut timers, mut rx) = manager();
        timers.schedule(TimerKind::OnSafety, Duration::from_secs(1));
        assert!(timers.cancel(TimerKind::OnSafety));

        time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn should_refuse_notice_queued_before_cancel() {
        let (mut timers, mut rx) = manager();
        timers.schedule(TimerKind::OffDelay, Duration::from_secs(1));

        // Notice is already in the inbox when the slot gets re-armed.
        let stale = rx.recv().await.unwrap();
        timers.schedule(TimerKind::OffDelay, Duration::from_secs(1));

        assert!(!timers.claim(stale));
        assert!(timers.is_pending(TimerKind::OffDelay));
        let fresh = rx.recv().await.unwrap();
        assert!(timers.claim(fresh));
    }

    #[tokio::test]
    async fn should_report_nothing_to_cancel_when_idle() {
        let (mut timers, _rx) = manager();
        assert!(!timers.cancel(TimerKind::OffDelay));
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_kinds_independent() {
        let (mut timers, mut rx) = manager();
        timers.schedule(TimerKind::OffDelay, Duration::from_secs(1));
        timers.schedule(TimerKind::OnSafety, Duration::from_secs(2));
        timers.cancel(TimerKind::OffDelay);

        let fired = rx.recv().await.unwrap();
        assert_eq!(fired.kind, TimerKind::OnSafety);
        assert!(timers.claim(fired));
    }

    #[tokio::test(start_paused = true)]
    async fn should_clear_everything_on_cancel_all() {
        let (mut timers, _rx) = manager();
        timers.schedule(TimerKind::OffDelay, Duration::from_secs(1));
        timers.schedule(TimerKind::OnSafety, Duration::from_secs(1));
        timers.cancel_all();
        assert_eq!(timers.pending().count(), 0);
    }
}
