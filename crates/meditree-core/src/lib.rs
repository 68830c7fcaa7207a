//! # Meditree Core Library
//!
//! This library provides the guided-session engine behind Meditree, a
//! meditation timer where each finished session grows a tree. The CLI is a
//! thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Session Engine**: a phase controller (`setup -> active -> complete`)
//!   composing an elapsed-time clock and a paced-breathing driver. Timers
//!   come from an injected [`Scheduler`] and are cancelled by dropping their
//!   guards.
//! - **Modes**: a static catalog describing pacing and tree species per mode
//! - **Storage**: SQLite-based result storage and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`SessionController`]: Core session state machine
//! - [`ManualScheduler`] / [`TokioScheduler`]: virtual and wall-clock timers
//! - [`Database`]: Session result persistence and statistics
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod mode;
pub mod session;
pub mod storage;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::SessionEvent;
pub use mode::{MeditationMode, ModeCatalog, ModeInfo, StaticCatalog};
pub use session::{
    BreathingPattern, BreathingPhase, EngineSettings, ManualScheduler, Mood, ResultSink,
    Scheduler, SessionController, SessionPhase, SessionResult, SessionSnapshot, TimerFired,
    TokioScheduler,
};
pub use storage::{Config, Database, DatabaseSink};
