use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::Mood;
use crate::mode::MeditationMode;

/// Immutable record of a finished session, handed to a [`ResultSink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    /// Whole minutes meditated, rounded down.
    pub duration_minutes: u64,
    pub elapsed_secs: u64,
    pub mode: MeditationMode,
    pub species: String,
    pub mood_before: Mood,
    pub mood_after: Mood,
    pub completed_at: DateTime<Utc>,
}

impl SessionResult {
    pub fn mood_lift(&self) -> i16 {
        self.mood_after.value() as i16 - self.mood_before.value() as i16
    }
}

/// Receives finished sessions. The engine submits exactly once per
/// completion and never looks at the outcome; sinks that can fail keep
/// their own record of it for the caller.
pub trait ResultSink {
    fn submit(&mut self, result: &SessionResult);
}

impl ResultSink for Vec<SessionResult> {
    fn submit(&mut self, result: &SessionResult) {
        self.push(result.clone());
    }
}

impl<T: ResultSink + ?Sized> ResultSink for &mut T {
    fn submit(&mut self, result: &SessionResult) {
        (**self).submit(result);
    }
}
