//! Virtual-time scheduler.
//!
//! Time only moves when the caller says so, which makes sessions fully
//! deterministic in tests and in `session simulate`.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use super::{Scheduler, TimerFired, TimerGuard, TimerId, TimerKind};

#[derive(Debug, Clone, Copy)]
struct Pending {
    kind: TimerKind,
    due: Duration,
    period: Option<Duration>,
}

#[derive(Debug, Default)]
struct Inner {
    now: Duration,
    next_id: u64,
    timers: BTreeMap<TimerId, Pending>,
}

/// Cheap to clone; clones share the same clock and timer table.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    inner: Rc<RefCell<Inner>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time since creation.
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Number of armed timers.
    pub fn pending(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.inner.borrow().timers.contains_key(&id)
    }

    /// Pop the earliest timer due at or before `deadline`, moving virtual
    /// time to its due instant. Repeating timers are re-queued one period
    /// later. Ties fire in arming order.
    pub fn next_due(&self, deadline: Duration) -> Option<TimerFired> {
        let mut inner = self.inner.borrow_mut();
        let (id, pending) = inner
            .timers
            .iter()
            .filter(|(_, p)| p.due <= deadline)
            .min_by_key(|(id, p)| (p.due, **id))
            .map(|(id, p)| (*id, *p))?;

        inner.now = inner.now.max(pending.due);
        match pending.period {
            Some(period) => {
                if let Some(entry) = inner.timers.get_mut(&id) {
                    entry.due = pending.due + period;
                }
            }
            None => {
                inner.timers.remove(&id);
            }
        }
        Some(TimerFired {
            id,
            kind: pending.kind,
        })
    }

    /// Move virtual time forward to `deadline` without firing anything.
    /// Callers drain [`ManualScheduler::next_due`] first.
    pub fn advance_to(&self, deadline: Duration) {
        let mut inner = self.inner.borrow_mut();
        inner.now = inner.now.max(deadline);
    }

    /// Fire everything due within `by`, returning fires in order. Only
    /// suitable when nothing re-arms in response; the controller drives
    /// itself through `next_due` instead.
    pub fn advance(&self, by: Duration) -> Vec<TimerFired> {
        let deadline = self.now() + by;
        let mut fired = Vec::new();
        while let Some(f) = self.next_due(deadline) {
            fired.push(f);
        }
        self.advance_to(deadline);
        fired
    }

    fn arm(&mut self, kind: TimerKind, delay: Duration, period: Option<Duration>) -> TimerGuard {
        let id = {
            let mut inner = self.inner.borrow_mut();
            inner.next_id += 1;
            let id = TimerId(inner.next_id);
            let due = inner.now + delay;
            inner.timers.insert(id, Pending { kind, due, period });
            id
        };
        let weak: Weak<RefCell<Inner>> = Rc::downgrade(&self.inner);
        TimerGuard::new(id, kind, move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().timers.remove(&id);
            }
        })
    }
}

impl Scheduler for ManualScheduler {
    fn repeating(&mut self, kind: TimerKind, period: Duration) -> TimerGuard {
        self.arm(kind, period, Some(period))
    }

    fn once(&mut self, kind: TimerKind, delay: Duration) -> TimerGuard {
        self.arm(kind, delay, None)
    }
}
