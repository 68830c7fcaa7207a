use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mode::MeditationMode;
use crate::session::{BreathingPhase, Mood, SessionPhase};

/// Every state change of a session produces an Event.
/// Hosts render from them; the CLI prints them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    Configured {
        target_duration_secs: u64,
        mood_before: Mood,
        at: DateTime<Utc>,
    },
    ModeSelected {
        mode: MeditationMode,
        requires_breathing_pacing: bool,
        at: DateTime<Utc>,
    },
    SessionStarted {
        mode: MeditationMode,
        target_duration_secs: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    Ticked {
        elapsed_secs: u64,
        remaining_secs: u64,
        growth_percent: f64,
    },
    BreathingPhaseChanged {
        phase: BreathingPhase,
        label: String,
    },
    SessionCompleted {
        elapsed_secs: u64,
        growth_percent: f64,
        at: DateTime<Utc>,
    },
    SessionReset {
        at: DateTime<Utc>,
    },
    /// The session was torn down before (or after) completion.
    SessionExited {
        phase: SessionPhase,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Configured { .. } => "Configured",
            SessionEvent::ModeSelected { .. } => "ModeSelected",
            SessionEvent::SessionStarted { .. } => "SessionStarted",
            SessionEvent::SessionPaused { .. } => "SessionPaused",
            SessionEvent::SessionResumed { .. } => "SessionResumed",
            SessionEvent::Ticked { .. } => "Ticked",
            SessionEvent::BreathingPhaseChanged { .. } => "BreathingPhaseChanged",
            SessionEvent::SessionCompleted { .. } => "SessionCompleted",
            SessionEvent::SessionReset { .. } => "SessionReset",
            SessionEvent::SessionExited { .. } => "SessionExited",
        }
    }
}
