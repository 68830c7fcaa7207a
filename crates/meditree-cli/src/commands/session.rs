use std::io::BufRead;
use std::time::Duration;

use clap::{Args, Subcommand};
use meditree_core::session::Mood;
use meditree_core::{
    Config, Database, DatabaseSink, EngineSettings, ManualScheduler, MeditationMode, Scheduler,
    SessionController, SessionEvent, SessionPhase, SessionResult, TokioScheduler,
};
use serde_json::json;
use tokio::sync::mpsc;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Run a live session (stdin: "p" pause/resume, "r" restart, "q" quit)
    Run(SessionArgs),
    /// Run a session on virtual time; finishes immediately
    Simulate(SessionArgs),
}

#[derive(Args)]
pub struct SessionArgs {
    /// Meditation mode (breathe, focus, calm, body-scan, sleep)
    #[arg(long)]
    mode: Option<MeditationMode>,
    /// Session length in minutes (1-60)
    #[arg(long)]
    minutes: Option<u64>,
    /// Mood before the session (1-5)
    #[arg(long)]
    mood: Option<u8>,
    /// Mood after the session (1-5); defaults to the mood before
    #[arg(long)]
    mood_after: Option<u8>,
    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
    /// Don't store the result
    #[arg(long)]
    no_save: bool,
}

impl SessionArgs {
    fn settings(&self, config: &Config) -> EngineSettings {
        let mut settings = config.engine_settings();
        if let Some(mode) = self.mode {
            settings.mode = mode;
        }
        if let Some(minutes) = self.minutes {
            settings.duration_secs = minutes.saturating_mul(60);
        }
        if let Some(mood) = self.mood {
            settings.mood_before = Mood::new(mood);
        }
        settings
    }
}

struct Printer {
    json: bool,
    breathing: bool,
}

impl Printer {
    fn event(&self, event: &SessionEvent) {
        if self.json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{line}"),
                Err(err) => tracing::warn!(error = %err, "failed to encode event"),
            }
            return;
        }
        match event {
            SessionEvent::SessionStarted {
                mode,
                target_duration_secs,
                ..
            } => println!("Started {mode} session ({})", clock(*target_duration_secs)),
            SessionEvent::Ticked {
                elapsed_secs,
                remaining_secs,
                growth_percent,
            } => {
                if elapsed_secs % 60 == 0 {
                    println!("{} remaining, tree {growth_percent:.0}% grown", clock(*remaining_secs));
                }
            }
            SessionEvent::BreathingPhaseChanged { label, .. } => {
                if self.breathing {
                    println!("  {label}");
                }
            }
            SessionEvent::SessionPaused { elapsed_secs, .. } => {
                println!("Paused at {}", clock(*elapsed_secs))
            }
            SessionEvent::SessionResumed { .. } => println!("Resumed"),
            SessionEvent::SessionCompleted { elapsed_secs, .. } => {
                println!("Session complete after {}", clock(*elapsed_secs))
            }
            SessionEvent::SessionReset { .. } => println!("Session reset"),
            SessionEvent::SessionExited { elapsed_secs, .. } => {
                println!("Session ended after {}", clock(*elapsed_secs))
            }
            SessionEvent::Configured { .. } | SessionEvent::ModeSelected { .. } => {}
        }
    }

    fn result(&self, result: &SessionResult, id: Option<i64>) {
        if self.json {
            println!(
                "{}",
                json!({ "type": "SessionResult", "id": id, "result": result })
            );
            return;
        }
        println!(
            "Grew a {} tree ({} min). Mood {} -> {}",
            result.species,
            result.duration_minutes,
            result.mood_before.value(),
            result.mood_after.value()
        );
    }
}

fn clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();

    match action {
        SessionAction::Run(args) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run_live(&config, args))
        }
        SessionAction::Simulate(args) => simulate(&config, args),
    }
}

/// Forward stdin lines from a plain thread.
///
/// The thread stays blocked in `read` after the session ends; it is not
/// joined, so the process can exit without waiting for another line.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn run_live(config: &Config, args: SessionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let printer = Printer {
        json: args.json,
        breathing: true,
    };
    let (sched, mut fires) = TokioScheduler::new();
    let mut session = SessionController::new(sched, args.settings(config));
    if let Some(event) = session.start() {
        printer.event(&event);
    }

    let mut commands = spawn_stdin_reader();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            Some(fired) = fires.recv() => {
                if let Some(event) = session.on_timer(fired) {
                    printer.event(&event);
                }
                if session.phase() == SessionPhase::Complete {
                    break;
                }
            }
            line = commands.recv(), if stdin_open => {
                match line {
                    Some(input) => match input.trim() {
                        "p" => {
                            if let Some(event) = session.toggle_pause() {
                                printer.event(&event);
                            }
                        }
                        "r" => {
                            for event in session.reset().into_iter().chain(session.start()) {
                                printer.event(&event);
                            }
                        }
                        "q" => {
                            printer.event(&session.exit());
                            return Ok(());
                        }
                        other => tracing::debug!(input = other, "ignoring unknown command"),
                    },
                    None => stdin_open = false,
                }
            }
            _ = &mut ctrl_c => {
                printer.event(&session.exit());
                return Ok(());
            }
        }
    }

    finish(session, &args, &printer)
}

fn simulate(config: &Config, args: SessionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let printer = Printer {
        json: args.json,
        breathing: args.json,
    };
    let settings = args.settings(config);
    let mut session = SessionController::new(ManualScheduler::new(), settings);
    if let Some(event) = session.start() {
        printer.event(&event);
    }
    while session.phase() == SessionPhase::Active {
        for event in session.advance(settings.tick_period.max(Duration::from_millis(1))) {
            printer.event(&event);
        }
    }
    finish(session, &args, &printer)
}

fn finish<S: Scheduler>(
    mut session: SessionController<S>,
    args: &SessionArgs,
    printer: &Printer,
) -> Result<(), Box<dyn std::error::Error>> {
    let mood_after = args
        .mood_after
        .unwrap_or_else(|| session.config().mood_before.value());

    if args.no_save {
        let mut results: Vec<SessionResult> = Vec::new();
        if let Some(result) = session.request_completion(mood_after, &mut results) {
            printer.result(&result, None);
        }
        return Ok(());
    }

    let db = Database::open()?;
    let mut sink = DatabaseSink::new(&db);
    let Some(result) = session.request_completion(mood_after, &mut sink) else {
        return Ok(());
    };
    match sink.take_outcome() {
        Some(Ok(id)) => printer.result(&result, Some(id)),
        Some(Err(err)) => {
            printer.result(&result, None);
            eprintln!("warning: session was not saved: {err}");
        }
        None => {}
    }
    Ok(())
}
