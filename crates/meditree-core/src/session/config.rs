use serde::{Deserialize, Serialize};

use crate::mode::MeditationMode;

pub const MIN_DURATION_SECS: u64 = 60;
pub const MAX_DURATION_SECS: u64 = 3600;
pub const DEFAULT_DURATION_SECS: u64 = 600;

/// Self-reported mood on a 1..=5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mood(u8);

impl Mood {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Clamps into range instead of rejecting.
    pub fn new(value: u8) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Mood {
    fn default() -> Self {
        Self(3)
    }
}

impl From<u8> for Mood {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

/// Clamp a requested duration to the supported 1..=60 minute range.
pub fn clamp_duration_secs(secs: u64) -> u64 {
    secs.clamp(MIN_DURATION_SECS, MAX_DURATION_SECS)
}

/// Session settings chosen during setup. Frozen once the session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub mode: MeditationMode,
    pub target_duration_secs: u64,
    pub mood_before: Mood,
}

impl SessionConfig {
    pub fn new(mode: MeditationMode, duration_secs: u64, mood_before: Mood) -> Self {
        Self {
            mode,
            target_duration_secs: clamp_duration_secs(duration_secs),
            mood_before,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(MeditationMode::default(), DEFAULT_DURATION_SECS, Mood::default())
    }
}
