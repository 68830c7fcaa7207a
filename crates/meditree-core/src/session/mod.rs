mod breathing;
mod clock;
mod config;
mod controller;
mod result;
pub mod scheduler;

pub use breathing::{BreathingDriver, BreathingPattern, BreathingPhase};
pub use clock::{growth_percent, ClockStep, ElapsedClock, TICK_PERIOD};
pub use config::{
    clamp_duration_secs, Mood, SessionConfig, DEFAULT_DURATION_SECS, MAX_DURATION_SECS,
    MIN_DURATION_SECS,
};
pub use controller::{EngineSettings, SessionController, SessionPhase, SessionSnapshot};
pub use result::{ResultSink, SessionResult};
pub use scheduler::{
    ManualScheduler, Scheduler, TimerFired, TimerGuard, TimerId, TimerKind, TokioScheduler,
};
