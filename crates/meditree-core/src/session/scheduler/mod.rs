//! Timer scheduling for the session engine.
//!
//! The engine never sleeps or spawns on its own. It asks a [`Scheduler`] to
//! arm timers and receives each expiry back as a [`TimerFired`] message via
//! `SessionController::on_timer`. Every armed timer is owned by a
//! [`TimerGuard`]; dropping the guard cancels the timer before `drop`
//! returns, and the controller discards any fire whose id is not the guard
//! it currently holds. Together these make a stale tick after pause, reset
//! or teardown impossible.

mod manual;
mod realtime;

pub use manual::ManualScheduler;
pub use realtime::TokioScheduler;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which timer chain a fire belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerKind {
    Clock,
    Breathing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Delivered to the controller each time a timer expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub id: TimerId,
    pub kind: TimerKind,
}

/// Source of timers for the engine.
pub trait Scheduler {
    /// Arm a timer firing every `period`, first fire one period from now.
    fn repeating(&mut self, kind: TimerKind, period: Duration) -> TimerGuard;

    /// Arm a timer firing once after `delay`.
    fn once(&mut self, kind: TimerKind, delay: Duration) -> TimerGuard;
}

/// Owning handle to an armed timer. Dropping it cancels the timer.
pub struct TimerGuard {
    id: TimerId,
    kind: TimerKind,
    cancel: Option<Box<dyn FnOnce()>>,
}

impl TimerGuard {
    pub fn new(id: TimerId, kind: TimerKind, cancel: impl FnOnce() + 'static) -> Self {
        Self {
            id,
            kind,
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    /// Whether `fired` was produced by this guard's timer.
    pub fn owns(&self, fired: &TimerFired) -> bool {
        self.id == fired.id && self.kind == fired.kind
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for TimerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerGuard")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn dropping_guard_runs_cancel_once() {
        let cancelled = Rc::new(Cell::new(0));
        let counter = cancelled.clone();
        let guard = TimerGuard::new(TimerId(1), TimerKind::Clock, move || {
            counter.set(counter.get() + 1)
        });
        assert_eq!(cancelled.get(), 0);
        drop(guard);
        assert_eq!(cancelled.get(), 1);
    }

    #[test]
    fn owns_checks_id_and_kind() {
        let guard = TimerGuard::new(TimerId(7), TimerKind::Breathing, || {});
        assert!(guard.owns(&TimerFired {
            id: TimerId(7),
            kind: TimerKind::Breathing
        }));
        assert!(!guard.owns(&TimerFired {
            id: TimerId(7),
            kind: TimerKind::Clock
        }));
        assert!(!guard.owns(&TimerFired {
            id: TimerId(8),
            kind: TimerKind::Breathing
        }));
    }
}
