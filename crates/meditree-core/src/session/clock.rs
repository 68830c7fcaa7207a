//! Elapsed-time clock.
//!
//! A pure reducer over an integer second counter. It knows nothing about
//! timers: the controller arms a repeating timer while the session runs and
//! feeds each fire into [`ElapsedClock::tick`]. Growth and remaining time are
//! always derived from the counter so they cannot drift from it.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default tick period.
pub const TICK_PERIOD: Duration = Duration::from_millis(1000);

/// Outcome of delivering one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockStep {
    /// Counter advanced and is still below the target.
    Advanced { elapsed_secs: u64 },
    /// Counter reached the target with this tick (or was already there).
    Finished { elapsed_secs: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElapsedClock {
    elapsed_secs: u64,
    target_secs: u64,
}

impl ElapsedClock {
    pub fn new(target_secs: u64) -> Self {
        Self {
            elapsed_secs: 0,
            target_secs,
        }
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn target_secs(&self) -> u64 {
        self.target_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.target_secs.saturating_sub(self.elapsed_secs)
    }

    /// 0.0 ..= 100.0
    pub fn growth_percent(&self) -> f64 {
        growth_percent(self.elapsed_secs, self.target_secs)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed_secs >= self.target_secs
    }

    pub fn tick(&mut self) -> ClockStep {
        if self.is_finished() {
            return ClockStep::Finished {
                elapsed_secs: self.elapsed_secs,
            };
        }
        self.elapsed_secs += 1;
        if self.is_finished() {
            ClockStep::Finished {
                elapsed_secs: self.elapsed_secs,
            }
        } else {
            ClockStep::Advanced {
                elapsed_secs: self.elapsed_secs,
            }
        }
    }

    /// Zero the counter and adopt a (possibly new) target.
    pub fn reset(&mut self, target_secs: u64) {
        self.elapsed_secs = 0;
        self.target_secs = target_secs;
    }
}

pub fn growth_percent(elapsed_secs: u64, target_secs: u64) -> f64 {
    if target_secs == 0 {
        return 100.0;
    }
    (elapsed_secs as f64 / target_secs as f64 * 100.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tick_advances_by_one() {
        let mut clock = ElapsedClock::new(60);
        assert_eq!(clock.tick(), ClockStep::Advanced { elapsed_secs: 1 });
        assert_eq!(clock.elapsed_secs(), 1);
        assert_eq!(clock.remaining_secs(), 59);
    }

    #[test]
    fn never_ticks_past_target() {
        let mut clock = ElapsedClock::new(60);
        for _ in 0..59 {
            clock.tick();
        }
        assert_eq!(clock.tick(), ClockStep::Finished { elapsed_secs: 60 });
        assert_eq!(clock.tick(), ClockStep::Finished { elapsed_secs: 60 });
        assert_eq!(clock.elapsed_secs(), 60);
        assert_eq!(clock.growth_percent(), 100.0);
    }

    #[test]
    fn reset_zeroes_counter() {
        let mut clock = ElapsedClock::new(60);
        clock.tick();
        clock.reset(120);
        assert_eq!(clock.elapsed_secs(), 0);
        assert_eq!(clock.target_secs(), 120);
        assert_eq!(clock.growth_percent(), 0.0);
    }

    proptest! {
        #[test]
        fn growth_tracks_ticks(target in 60u64..=3600, frac in 0.0f64..=1.0) {
            let n = (target as f64 * frac) as u64;
            let mut clock = ElapsedClock::new(target);
            for _ in 0..n {
                clock.tick();
            }
            prop_assert_eq!(clock.elapsed_secs(), n);
            prop_assert_eq!(
                clock.growth_percent(),
                (n as f64 / target as f64 * 100.0).min(100.0)
            );
        }
    }
}
