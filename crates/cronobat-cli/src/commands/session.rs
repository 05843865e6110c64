use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use cronobat_core::{
    Clock, Event, FocusApp, ManualClock, ModeKind, NullBroadcast, OverlayHost, RecordingHost,
    ScriptedSource, SessionBroadcast, SystemClock,
};

use super::load_config;
use crate::shell::{TerminalHost, TerminalStatus};

type BoxError = Box<dyn std::error::Error>;

/// Session options shared by `run` and `simulate`.
#[derive(Args, Debug)]
pub struct SessionArgs {
    /// timer, stopwatch or pomodoro
    #[arg(long, default_value = "pomodoro")]
    pub mode: ModeKind,

    /// Countdown length in seconds (timer mode)
    #[arg(long)]
    pub duration: Option<u64>,

    /// Focus phase length in minutes
    #[arg(long)]
    pub focus: Option<u32>,

    /// Break phase length in minutes
    #[arg(long = "break")]
    pub break_minutes: Option<u32>,

    /// JSON-lines file of foreground activity, timestamps relative to start
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Use the redirect view instead of an overlay
    #[arg(long)]
    pub no_overlay: bool,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub session: SessionArgs,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Virtual seconds to run
    #[arg(long, default_value_t = 60)]
    pub seconds: u64,

    /// Include per-second tick events
    #[arg(long)]
    pub ticks: bool,
}

fn load_source(path: Option<&Path>, start_ms: u64) -> Result<ScriptedSource, BoxError> {
    let Some(path) = path else {
        return Ok(ScriptedSource::default());
    };
    Ok(ScriptedSource::from_file(path)?.offset_by(start_ms))
}

fn configure<C, H, B>(
    app: &mut FocusApp<C, ScriptedSource, H, B>,
    args: &SessionArgs,
) -> Result<(), BoxError>
where
    C: Clock,
    H: OverlayHost,
    B: SessionBroadcast,
{
    if app.session().mode().kind() != args.mode {
        app.switch_mode(args.mode);
    }
    if let Some(minutes) = args.focus {
        app.set_focus_minutes(minutes);
    }
    if let Some(minutes) = args.break_minutes {
        app.set_break_minutes(minutes);
    }
    if let Some(secs) = args.duration {
        app.set_timer_duration(secs)?;
    }
    Ok(())
}

fn print_event(event: &Event) -> Result<(), BoxError> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

pub fn run(args: RunArgs, config: Option<&Path>) -> Result<(), BoxError> {
    let config = load_config(config)?;
    let start_ms = SystemClock.now_ms();
    let source = load_source(args.session.events.as_deref(), start_ms)?;
    let mut app = FocusApp::new(
        &config,
        SystemClock,
        source,
        TerminalHost::new(!args.session.no_overlay),
        TerminalStatus::default(),
    );
    configure(&mut app, &args.session)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(drive(app))
}

async fn drive(
    mut app: FocusApp<SystemClock, ScriptedSource, TerminalHost, TerminalStatus>,
) -> Result<(), BoxError> {
    app.start();
    if let Some(message) = log_events(&mut app) {
        return Err(message.into());
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    while let Some(due) = app.next_due_ms() {
        let wait = due.saturating_sub(app.now_ms());
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(wait)) => {
                app.run_due();
            }
            result = &mut ctrl_c => {
                result?;
                tracing::info!("interrupted");
                app.shutdown();
                log_events(&mut app);
                break;
            }
        }
        log_events(&mut app);
    }
    Ok(())
}

/// Log drained events; returns the message of a rejected start.
fn log_events(
    app: &mut FocusApp<SystemClock, ScriptedSource, TerminalHost, TerminalStatus>,
) -> Option<String> {
    let mut rejected = None;
    for event in app.drain_events() {
        match event {
            Event::Ticked { .. } => {}
            Event::StartRejected { message, .. } => rejected = Some(message),
            other => tracing::debug!(kind = other.kind(), "event"),
        }
    }
    rejected
}

pub fn simulate(args: SimulateArgs, config: Option<&Path>) -> Result<(), BoxError> {
    let config = load_config(config)?;
    let start_ms = SystemClock.now_ms();
    let source = load_source(args.session.events.as_deref(), start_ms)?;
    let mut app = FocusApp::new(
        &config,
        ManualClock::starting_at(start_ms),
        source,
        RecordingHost::new(!args.session.no_overlay),
        NullBroadcast,
    );
    configure(&mut app, &args.session)?;

    app.start();
    app.advance_by(args.seconds.saturating_mul(1000));

    for event in app.drain_events() {
        if !args.ticks && matches!(event, Event::Ticked { .. }) {
            continue;
        }
        print_event(&event)?;
    }
    print_event(&app.snapshot())
}
