//! Wall-clock scheduler on the tokio runtime.
//!
//! Each armed timer is a spawned task that sends [`TimerFired`] into an
//! unbounded channel. The guard aborts the task on drop. A fire that was
//! already queued in the channel when the guard dropped is still delivered,
//! but the controller no longer holds a guard with that id and ignores it.
//!
//! Must be used from within a tokio runtime.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::{Scheduler, TimerFired, TimerGuard, TimerId, TimerKind};

#[derive(Debug)]
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<TimerFired>,
    next_id: u64,
}

impl TokioScheduler {
    /// Create a scheduler and the receiver its fires arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerFired>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, next_id: 0 }, rx)
    }

    fn next_id(&mut self) -> TimerId {
        self.next_id += 1;
        TimerId(self.next_id)
    }
}

impl Scheduler for TokioScheduler {
    fn repeating(&mut self, kind: TimerKind, period: Duration) -> TimerGuard {
        let id = self.next_id();
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            // Simple periodic pacing; drift is accepted, bursts are not.
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(TimerFired { id, kind }).is_err() {
                    break;
                }
            }
        });
        let abort = task.abort_handle();
        TimerGuard::new(id, kind, move || abort.abort())
    }

    fn once(&mut self, kind: TimerKind, delay: Duration) -> TimerGuard {
        let id = self.next_id();
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = tx.send(TimerFired { id, kind });
        });
        let abort = task.abort_handle();
        TimerGuard::new(id, kind, move || abort.abort())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn repeating_timer_delivers_fires() {
        let (mut sched, mut rx) = TokioScheduler::new();
        let guard = sched.repeating(TimerKind::Clock, Duration::from_secs(1));
        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.id, guard.id());
        assert_eq!(second.kind, TimerKind::Clock);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_guard_stops_deliveries() {
        let (mut sched, mut rx) = TokioScheduler::new();
        let guard = sched.once(TimerKind::Breathing, Duration::from_secs(4));
        drop(guard);
        time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }
}
