//! Session phase controller.
//!
//! Owns the session lifecycle and composes the [`ElapsedClock`] and the
//! optional [`BreathingDriver`]. Timers are held as [`TimerGuard`]s that
//! exist exactly while the session is active and running; every exit from
//! that condition drops them.
//!
//! ## State Transitions
//!
//! ```text
//! Setup --start()--> Active
//! Active --toggle_pause()--> Active (running flips)
//! Active --elapsed >= target--> Complete
//! Active | Complete --reset()--> Setup
//! Complete --request_completion()--> result submitted
//! ```
//!
//! Commands issued in the wrong phase return `None` and change nothing, so
//! a duplicated UI event (a double tap on "start") is harmless.
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = SessionController::new(scheduler, EngineSettings::default());
//! session.configure(300, 3);
//! session.start();
//! // For every fire delivered by the scheduler:
//! session.on_timer(fired);
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::breathing::{BreathingDriver, BreathingPattern, BreathingPhase};
use super::clock::{ClockStep, ElapsedClock, TICK_PERIOD};
use super::config::{clamp_duration_secs, Mood, SessionConfig, DEFAULT_DURATION_SECS};
use super::result::{ResultSink, SessionResult};
use super::scheduler::{ManualScheduler, Scheduler, TimerFired, TimerGuard, TimerId, TimerKind};
use crate::events::SessionEvent;
use crate::mode::{MeditationMode, ModeCatalog, ModeInfo, StaticCatalog};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Setup,
    Active,
    Complete,
}

/// Everything needed to build a controller before the user touches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub mode: MeditationMode,
    pub duration_secs: u64,
    pub mood_before: Mood,
    pub pattern: BreathingPattern,
    pub tick_period: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            mode: MeditationMode::default(),
            duration_secs: DEFAULT_DURATION_SECS,
            mood_before: Mood::default(),
            pattern: BreathingPattern::default(),
            tick_period: TICK_PERIOD,
        }
    }
}

/// Read-only view for hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub mode: MeditationMode,
    pub is_running: bool,
    pub elapsed_secs: u64,
    pub remaining_secs: u64,
    pub target_duration_secs: u64,
    pub growth_percent: f64,
    pub breathing_phase: Option<BreathingPhase>,
    pub breathing_label: Option<String>,
}

pub struct SessionController<S: Scheduler> {
    scheduler: S,
    catalog: Box<dyn ModeCatalog>,
    mode_info: ModeInfo,
    config: SessionConfig,
    tick_period: Duration,
    phase: SessionPhase,
    running: bool,
    clock: ElapsedClock,
    breathing: BreathingDriver,
    clock_timer: Option<TimerGuard>,
    breathing_timer: Option<TimerGuard>,
    mood_after: Option<Mood>,
    submitted: bool,
}

impl<S: Scheduler> SessionController<S> {
    pub fn new(scheduler: S, settings: EngineSettings) -> Self {
        Self::with_catalog(scheduler, settings, StaticCatalog)
    }

    pub fn with_catalog(
        scheduler: S,
        settings: EngineSettings,
        catalog: impl ModeCatalog + 'static,
    ) -> Self {
        let config = SessionConfig::new(settings.mode, settings.duration_secs, settings.mood_before);
        let mode_info = catalog.info(settings.mode);
        Self {
            scheduler,
            catalog: Box::new(catalog),
            mode_info,
            config,
            tick_period: settings.tick_period,
            phase: SessionPhase::Setup,
            running: false,
            clock: ElapsedClock::new(config.target_duration_secs),
            breathing: BreathingDriver::new(settings.pattern),
            clock_timer: None,
            breathing_timer: None,
            mood_after: None,
            submitted: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn mode_info(&self) -> &ModeInfo {
        &self.mode_info
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.clock.elapsed_secs()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.clock.remaining_secs()
    }

    pub fn growth_percent(&self) -> f64 {
        self.clock.growth_percent()
    }

    pub fn mood_after(&self) -> Option<Mood> {
        self.mood_after
    }

    pub fn requires_breathing(&self) -> bool {
        self.mode_info.requires_breathing_pacing
    }

    /// Current breathing phase, only while it is actually being paced.
    pub fn breathing_phase(&self) -> Option<BreathingPhase> {
        self.breathing_timer.as_ref().map(|_| self.breathing.phase())
    }

    pub fn breathing_label(&self) -> Option<&'static str> {
        self.breathing_phase().map(|p| p.label())
    }

    pub fn clock_timer_id(&self) -> Option<TimerId> {
        self.clock_timer.as_ref().map(TimerGuard::id)
    }

    pub fn breathing_timer_id(&self) -> Option<TimerId> {
        self.breathing_timer.as_ref().map(TimerGuard::id)
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            mode: self.config.mode,
            is_running: self.running,
            elapsed_secs: self.elapsed_secs(),
            remaining_secs: self.remaining_secs(),
            target_duration_secs: self.config.target_duration_secs,
            growth_percent: self.growth_percent(),
            breathing_phase: self.breathing_phase(),
            breathing_label: self.breathing_label().map(String::from),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn configure(&mut self, duration_secs: u64, mood_before: u8) -> Option<SessionEvent> {
        if self.phase != SessionPhase::Setup {
            return None;
        }
        self.config.target_duration_secs = clamp_duration_secs(duration_secs);
        self.config.mood_before = Mood::new(mood_before);
        self.clock.reset(self.config.target_duration_secs);
        tracing::debug!(
            target_secs = self.config.target_duration_secs,
            mood_before = self.config.mood_before.value(),
            "session configured"
        );
        Some(SessionEvent::Configured {
            target_duration_secs: self.config.target_duration_secs,
            mood_before: self.config.mood_before,
            at: Utc::now(),
        })
    }

    pub fn select_mode(&mut self, mode: MeditationMode) -> Option<SessionEvent> {
        if self.phase != SessionPhase::Setup {
            return None;
        }
        self.config.mode = mode;
        self.mode_info = self.catalog.info(mode);
        tracing::debug!(%mode, "mode selected");
        Some(SessionEvent::ModeSelected {
            mode,
            requires_breathing_pacing: self.mode_info.requires_breathing_pacing,
            at: Utc::now(),
        })
    }

    pub fn start(&mut self) -> Option<SessionEvent> {
        if self.phase != SessionPhase::Setup {
            return None;
        }
        self.phase = SessionPhase::Active;
        self.running = true;
        self.clock.reset(self.config.target_duration_secs);
        self.mood_after = None;
        self.submitted = false;
        self.arm();
        tracing::debug!(
            mode = %self.config.mode,
            target_secs = self.config.target_duration_secs,
            breathing = self.requires_breathing(),
            "session started"
        );
        Some(SessionEvent::SessionStarted {
            mode: self.config.mode,
            target_duration_secs: self.config.target_duration_secs,
            at: Utc::now(),
        })
    }

    pub fn toggle_pause(&mut self) -> Option<SessionEvent> {
        if self.phase != SessionPhase::Active {
            return None;
        }
        let elapsed_secs = self.elapsed_secs();
        if self.running {
            self.running = false;
            self.disarm();
            tracing::debug!(elapsed_secs, "session paused");
            Some(SessionEvent::SessionPaused {
                elapsed_secs,
                at: Utc::now(),
            })
        } else {
            self.running = true;
            self.arm();
            tracing::debug!(elapsed_secs, "session resumed");
            Some(SessionEvent::SessionResumed {
                elapsed_secs,
                at: Utc::now(),
            })
        }
    }

    pub fn reset(&mut self) -> Option<SessionEvent> {
        if self.phase == SessionPhase::Setup {
            return None;
        }
        self.disarm();
        self.running = false;
        self.phase = SessionPhase::Setup;
        self.clock.reset(self.config.target_duration_secs);
        self.breathing.restart();
        self.mood_after = None;
        self.submitted = false;
        tracing::debug!("session reset");
        Some(SessionEvent::SessionReset { at: Utc::now() })
    }

    /// Attach the closing mood and hand the result to `sink`.
    ///
    /// Only valid once per completion. The sink's own success or failure is
    /// not observed here.
    pub fn request_completion<K: ResultSink + ?Sized>(
        &mut self,
        mood_after: u8,
        sink: &mut K,
    ) -> Option<SessionResult> {
        if self.phase != SessionPhase::Complete || self.submitted {
            return None;
        }
        let mood_after = Mood::new(mood_after);
        self.mood_after = Some(mood_after);
        let elapsed_secs = self.elapsed_secs();
        let result = SessionResult {
            duration_minutes: elapsed_secs / 60,
            elapsed_secs,
            mode: self.config.mode,
            species: self.mode_info.species.clone(),
            mood_before: self.config.mood_before,
            mood_after,
            completed_at: Utc::now(),
        };
        sink.submit(&result);
        self.submitted = true;
        tracing::debug!(
            duration_minutes = result.duration_minutes,
            mood_after = mood_after.value(),
            "session result submitted"
        );
        Some(result)
    }

    /// Deliver a timer expiry. Fires from timers this controller no longer
    /// holds are dropped without touching state.
    pub fn on_timer(&mut self, fired: TimerFired) -> Option<SessionEvent> {
        match fired.kind {
            TimerKind::Clock => {
                if !self.clock_timer.as_ref().is_some_and(|g| g.owns(&fired)) {
                    tracing::trace!(id = %fired.id, "discarding stale clock fire");
                    return None;
                }
                self.on_clock_tick()
            }
            TimerKind::Breathing => {
                if !self.breathing_timer.as_ref().is_some_and(|g| g.owns(&fired)) {
                    tracing::trace!(id = %fired.id, "discarding stale breathing fire");
                    return None;
                }
                self.on_breathing_phase_end()
            }
        }
    }

    /// Tear the session down. Every armed timer is cancelled before this
    /// returns; dropping the controller has the same effect.
    pub fn exit(mut self) -> SessionEvent {
        self.disarm();
        self.running = false;
        tracing::debug!(phase = ?self.phase, elapsed_secs = self.elapsed_secs(), "session exited");
        SessionEvent::SessionExited {
            phase: self.phase,
            elapsed_secs: self.elapsed_secs(),
            at: Utc::now(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn on_clock_tick(&mut self) -> Option<SessionEvent> {
        match self.clock.tick() {
            ClockStep::Advanced { elapsed_secs } => {
                tracing::trace!(elapsed_secs, "tick");
                Some(SessionEvent::Ticked {
                    elapsed_secs,
                    remaining_secs: self.clock.remaining_secs(),
                    growth_percent: self.clock.growth_percent(),
                })
            }
            ClockStep::Finished { elapsed_secs } => {
                self.running = false;
                self.phase = SessionPhase::Complete;
                self.disarm();
                tracing::debug!(elapsed_secs, "session complete");
                Some(SessionEvent::SessionCompleted {
                    elapsed_secs,
                    growth_percent: self.clock.growth_percent(),
                    at: Utc::now(),
                })
            }
        }
    }

    fn on_breathing_phase_end(&mut self) -> Option<SessionEvent> {
        let phase = self.breathing.advance();
        let next = self
            .scheduler
            .once(TimerKind::Breathing, self.breathing.current_duration());
        self.breathing_timer = Some(next);
        tracing::trace!(?phase, "breathing phase");
        Some(SessionEvent::BreathingPhaseChanged {
            phase,
            label: phase.label().to_string(),
        })
    }

    /// Acquire timers on entering `Active && running`.
    fn arm(&mut self) {
        self.disarm();
        self.clock_timer = Some(self.scheduler.repeating(TimerKind::Clock, self.tick_period));
        if self.requires_breathing() {
            self.breathing.restart();
            self.breathing_timer = Some(
                self.scheduler
                    .once(TimerKind::Breathing, self.breathing.current_duration()),
            );
        }
    }

    /// Release timers on any exit from `Active && running`.
    fn disarm(&mut self) {
        drop(self.clock_timer.take());
        drop(self.breathing_timer.take());
    }
}

impl<S: Scheduler> Drop for SessionController<S> {
    fn drop(&mut self) {
        self.disarm();
    }
}

impl SessionController<ManualScheduler> {
    /// Advance virtual time by `by`, delivering every fire that falls due.
    pub fn advance(&mut self, by: Duration) -> Vec<SessionEvent> {
        let deadline = self.scheduler.now() + by;
        let mut events = Vec::new();
        while let Some(fired) = self.scheduler.next_due(deadline) {
            events.extend(self.on_timer(fired));
        }
        self.scheduler.advance_to(deadline);
        events
    }

    /// Deliver exactly `n` clock ticks, ignoring breathing fires in between
    /// except to keep the cycle going.
    pub fn advance_ticks(&mut self, n: u64) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        for _ in 0..n {
            if self.clock_timer.is_none() {
                break;
            }
            events.extend(self.advance(self.tick_period));
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn focus_session(duration_secs: u64) -> SessionController<ManualScheduler> {
        SessionController::new(
            ManualScheduler::new(),
            EngineSettings {
                mode: MeditationMode::Focus,
                duration_secs,
                ..EngineSettings::default()
            },
        )
    }

    fn breathe_session(duration_secs: u64) -> SessionController<ManualScheduler> {
        SessionController::new(
            ManualScheduler::new(),
            EngineSettings {
                mode: MeditationMode::Breathe,
                duration_secs,
                ..EngineSettings::default()
            },
        )
    }

    #[test]
    fn starts_in_setup() {
        let session = focus_session(300);
        assert_eq!(session.phase(), SessionPhase::Setup);
        assert!(!session.is_running());
        assert_eq!(session.elapsed_secs(), 0);
        assert_eq!(session.scheduler().pending(), 0);
    }

    #[test]
    fn configure_clamps_and_is_setup_only() {
        let mut session = focus_session(300);
        assert!(session.configure(10, 9).is_some());
        assert_eq!(session.config().target_duration_secs, 60);
        assert_eq!(session.config().mood_before.value(), 5);

        session.configure(7200, 2);
        assert_eq!(session.config().target_duration_secs, 3600);

        session.start();
        assert!(session.configure(120, 1).is_none());
        assert_eq!(session.config().target_duration_secs, 3600);
    }

    #[test]
    fn start_arms_clock_and_breathing() {
        let mut session = breathe_session(300);
        assert!(session.start().is_some());
        assert_eq!(session.phase(), SessionPhase::Active);
        assert!(session.is_running());
        assert!(session.clock_timer_id().is_some());
        assert_eq!(session.breathing_phase(), Some(BreathingPhase::Inhale));
        assert_eq!(session.breathing_label(), Some("Breathe In"));
        assert_eq!(session.scheduler().pending(), 2);
    }

    #[test]
    fn focus_mode_never_starts_breathing() {
        let mut session = focus_session(300);
        session.start();
        assert!(session.breathing_timer_id().is_none());
        assert!(session.breathing_phase().is_none());
        assert_eq!(session.scheduler().pending(), 1);
        session.advance(Duration::from_secs(20));
        assert!(session.breathing_phase().is_none());
    }

    #[test]
    fn second_start_is_a_noop() {
        let mut session = focus_session(300);
        session.start();
        session.advance_ticks(5);
        let timer = session.clock_timer_id();

        assert!(session.start().is_none());
        assert_eq!(session.elapsed_secs(), 5);
        assert_eq!(session.phase(), SessionPhase::Active);
        assert_eq!(session.clock_timer_id(), timer);
    }

    #[test]
    fn pause_then_resume_keeps_elapsed() {
        let mut session = focus_session(300);
        session.start();
        session.advance_ticks(7);
        session.toggle_pause();
        session.toggle_pause();
        assert_eq!(session.elapsed_secs(), 7);
        assert!(session.is_running());
    }

    #[test]
    fn paused_session_holds_no_timers() {
        let mut session = breathe_session(300);
        session.start();
        session.advance(Duration::from_secs(3));
        session.toggle_pause();
        assert_eq!(session.scheduler().pending(), 0);
        assert!(session.breathing_phase().is_none());
        assert!(session.advance(Duration::from_secs(30)).is_empty());
        assert_eq!(session.elapsed_secs(), 3);
    }

    #[test]
    fn resume_restarts_breathing_from_inhale() {
        let mut session = breathe_session(300);
        session.start();
        session.advance(Duration::from_secs(5));
        assert_eq!(session.breathing_phase(), Some(BreathingPhase::Hold));
        session.toggle_pause();
        session.toggle_pause();
        assert_eq!(session.breathing_phase(), Some(BreathingPhase::Inhale));
    }

    #[test]
    fn toggle_pause_outside_active_is_noop() {
        let mut session = focus_session(60);
        assert!(session.toggle_pause().is_none());
        session.start();
        session.advance_ticks(60);
        assert_eq!(session.phase(), SessionPhase::Complete);
        assert!(session.toggle_pause().is_none());
        assert!(!session.is_running());
    }

    #[test]
    fn completion_boundary_stops_the_clock() {
        let mut session = focus_session(60);
        session.start();
        let events = session.advance_ticks(59);
        assert_eq!(events.len(), 59);
        assert_eq!(session.phase(), SessionPhase::Active);

        let events = session.advance(Duration::from_secs(1));
        assert!(matches!(
            events.as_slice(),
            [SessionEvent::SessionCompleted { elapsed_secs: 60, .. }]
        ));
        assert_eq!(session.phase(), SessionPhase::Complete);
        assert!(!session.is_running());
        assert_eq!(session.scheduler().pending(), 0);

        session.advance(Duration::from_secs(30));
        assert_eq!(session.elapsed_secs(), 60);
    }

    #[test]
    fn reset_from_setup_is_noop() {
        let mut session = focus_session(60);
        assert!(session.reset().is_none());
    }

    #[test]
    fn reset_from_active_clears_state() {
        let mut session = breathe_session(120);
        session.start();
        session.advance_ticks(10);
        assert!(session.reset().is_some());
        assert_eq!(session.phase(), SessionPhase::Setup);
        assert_eq!(session.elapsed_secs(), 0);
        assert_eq!(session.growth_percent(), 0.0);
        assert_eq!(session.scheduler().pending(), 0);
    }

    #[test]
    fn stale_fire_is_discarded() {
        let mut session = focus_session(300);
        session.start();
        let old = session.clock_timer_id().unwrap();
        session.toggle_pause();
        session.toggle_pause();
        assert_ne!(session.clock_timer_id(), Some(old));

        let stale = TimerFired {
            id: old,
            kind: TimerKind::Clock,
        };
        assert!(session.on_timer(stale).is_none());
        assert_eq!(session.elapsed_secs(), 0);
    }

    #[test]
    fn request_completion_only_once() {
        let mut session = focus_session(60);
        let mut sink: Vec<SessionResult> = Vec::new();
        assert!(session.request_completion(4, &mut sink).is_none());

        session.start();
        session.advance_ticks(60);
        let result = session.request_completion(4, &mut sink).unwrap();
        assert_eq!(result.duration_minutes, 1);
        assert_eq!(result.species, "oak");
        assert!(session.request_completion(5, &mut sink).is_none());
        assert_eq!(sink.len(), 1);
        assert_eq!(session.mood_after(), Some(Mood::new(4)));
    }

    #[test]
    fn select_mode_switches_pacing() {
        let mut session = focus_session(60);
        assert!(!session.requires_breathing());
        session.select_mode(MeditationMode::Calm);
        assert!(session.requires_breathing());
        assert_eq!(session.mode_info().species, "cherry-blossom");
        session.start();
        assert!(session.select_mode(MeditationMode::Focus).is_none());
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut session = breathe_session(120);
        session.start();
        session.advance_ticks(30);
        let snap = session.snapshot();
        assert_eq!(snap.phase, SessionPhase::Active);
        assert_eq!(snap.elapsed_secs, 30);
        assert_eq!(snap.remaining_secs, 90);
        assert_eq!(snap.growth_percent, 25.0);
        assert!(snap.breathing_label.is_some());
    }

    #[test]
    fn exit_cancels_timers() {
        let sched = ManualScheduler::new();
        let mut session = SessionController::new(sched.clone(), EngineSettings::default());
        session.start();
        assert_eq!(sched.pending(), 2);
        let event = session.exit();
        assert!(matches!(event, SessionEvent::SessionExited { phase: SessionPhase::Active, .. }));
        assert_eq!(sched.pending(), 0);
    }
}
