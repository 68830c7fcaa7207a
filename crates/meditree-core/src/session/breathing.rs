//! Paced-breathing cycle.
//!
//! The driver cycles inhale -> hold -> exhale -> hold2 forever. Each phase
//! is paced by a single-shot timer armed by the controller with
//! [`BreathingDriver::current_duration`]; when it fires the controller calls
//! [`BreathingDriver::advance`] and arms the next one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreathingPhase {
    Inhale,
    Hold,
    Exhale,
    Hold2,
}

impl BreathingPhase {
    pub const CYCLE: [BreathingPhase; 4] = [
        BreathingPhase::Inhale,
        BreathingPhase::Hold,
        BreathingPhase::Exhale,
        BreathingPhase::Hold2,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BreathingPhase::Inhale => "Breathe In",
            BreathingPhase::Hold | BreathingPhase::Hold2 => "Hold",
            BreathingPhase::Exhale => "Breathe Out",
        }
    }

    fn index(&self) -> usize {
        match self {
            BreathingPhase::Inhale => 0,
            BreathingPhase::Hold => 1,
            BreathingPhase::Exhale => 2,
            BreathingPhase::Hold2 => 3,
        }
    }

    pub fn next(&self) -> BreathingPhase {
        Self::CYCLE[(self.index() + 1) % Self::CYCLE.len()]
    }
}

impl fmt::Display for BreathingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-phase durations in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreathingPattern {
    pub inhale_secs: u64,
    pub hold_secs: u64,
    pub exhale_secs: u64,
    pub hold2_secs: u64,
}

impl BreathingPattern {
    pub fn duration_of(&self, phase: BreathingPhase) -> Duration {
        let secs = match phase {
            BreathingPhase::Inhale => self.inhale_secs,
            BreathingPhase::Hold => self.hold_secs,
            BreathingPhase::Exhale => self.exhale_secs,
            BreathingPhase::Hold2 => self.hold2_secs,
        };
        // A zero-length phase would re-arm in a hot loop.
        Duration::from_secs(secs.max(1))
    }

    pub fn cycle_duration(&self) -> Duration {
        BreathingPhase::CYCLE
            .iter()
            .map(|p| self.duration_of(*p))
            .sum()
    }
}

impl Default for BreathingPattern {
    fn default() -> Self {
        Self {
            inhale_secs: 4,
            hold_secs: 2,
            exhale_secs: 6,
            hold2_secs: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreathingDriver {
    pattern: BreathingPattern,
    phase: BreathingPhase,
    cycles_completed: u64,
}

impl BreathingDriver {
    pub fn new(pattern: BreathingPattern) -> Self {
        Self {
            pattern,
            phase: BreathingPhase::Inhale,
            cycles_completed: 0,
        }
    }

    pub fn phase(&self) -> BreathingPhase {
        self.phase
    }

    pub fn label(&self) -> &'static str {
        self.phase.label()
    }

    pub fn pattern(&self) -> &BreathingPattern {
        &self.pattern
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    /// How long the current phase lasts.
    pub fn current_duration(&self) -> Duration {
        self.pattern.duration_of(self.phase)
    }

    pub fn advance(&mut self) -> BreathingPhase {
        self.phase = self.phase.next();
        if self.phase == BreathingPhase::Inhale {
            self.cycles_completed += 1;
        }
        self.phase
    }

    /// Back to the start of the cycle; used on start and on every resume.
    pub fn restart(&mut self) {
        self.phase = BreathingPhase::Inhale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(BreathingPhase::Inhale.label(), "Breathe In");
        assert_eq!(BreathingPhase::Hold.label(), "Hold");
        assert_eq!(BreathingPhase::Exhale.label(), "Breathe Out");
        assert_eq!(BreathingPhase::Hold2.label(), "Hold");
    }

    #[test]
    fn advance_wraps_after_four_phases() {
        let mut driver = BreathingDriver::new(BreathingPattern::default());
        assert_eq!(driver.advance(), BreathingPhase::Hold);
        assert_eq!(driver.advance(), BreathingPhase::Exhale);
        assert_eq!(driver.advance(), BreathingPhase::Hold2);
        assert_eq!(driver.advance(), BreathingPhase::Inhale);
        assert_eq!(driver.cycles_completed(), 1);
    }

    #[test]
    fn reference_cycle_is_fourteen_seconds() {
        assert_eq!(
            BreathingPattern::default().cycle_duration(),
            Duration::from_secs(14)
        );
    }

    #[test]
    fn current_duration_follows_phase() {
        let mut driver = BreathingDriver::new(BreathingPattern::default());
        assert_eq!(driver.current_duration(), Duration::from_secs(4));
        driver.advance();
        assert_eq!(driver.current_duration(), Duration::from_secs(2));
        driver.advance();
        assert_eq!(driver.current_duration(), Duration::from_secs(6));
    }

    #[test]
    fn restart_returns_to_inhale() {
        let mut driver = BreathingDriver::new(BreathingPattern::default());
        driver.advance();
        driver.advance();
        driver.restart();
        assert_eq!(driver.phase(), BreathingPhase::Inhale);
    }
}
