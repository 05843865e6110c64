use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::intervention::InterventionChannel;
use crate::session::{Mode, ModeKind, Phase, RunStatus};

/// Every state change in the system produces an Event.
/// The shell drains them after each call into the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        mode: Mode,
        seconds: u64,
        /// True when continuing from Paused rather than starting fresh.
        resumed: bool,
        at: DateTime<Utc>,
    },
    SessionPaused {
        mode: Mode,
        seconds: u64,
        at: DateTime<Utc>,
    },
    SessionReset {
        mode: Mode,
        at: DateTime<Utc>,
    },
    ModeSwitched {
        from: ModeKind,
        to: ModeKind,
        at: DateTime<Utc>,
    },
    /// `start()` refused; `message` is meant for a short toast.
    StartRejected {
        mode: ModeKind,
        message: String,
        at: DateTime<Utc>,
    },
    Ticked {
        mode: Mode,
        seconds: u64,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        at: DateTime<Utc>,
    },
    PhaseChanged {
        from: Phase,
        to: Phase,
        duration_secs: u64,
        /// Phase completions since the session was started from Idle.
        completions: u32,
        at: DateTime<Utc>,
    },
    /// Configured Pomodoro cycle bound was hit; the session is Idle again.
    PomodoroLimitReached {
        cycles: u32,
        at: DateTime<Utc>,
    },
    MonitorStarted {
        at: DateTime<Utc>,
    },
    MonitorStopped {
        at: DateTime<Utc>,
    },
    DistractionDetected {
        package: String,
        at: DateTime<Utc>,
    },
    InterventionShown {
        channel: InterventionChannel,
        title: String,
        text: String,
        at: DateTime<Utc>,
    },
    InterventionFinished {
        channel: InterventionChannel,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: Mode,
        status: RunStatus,
        seconds: u64,
        display: String,
        focus_minutes: u32,
        break_minutes: u32,
        timer_duration_secs: u64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Stable name of the variant, matching the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::SessionStarted { .. } => "SessionStarted",
            Event::SessionPaused { .. } => "SessionPaused",
            Event::SessionReset { .. } => "SessionReset",
            Event::ModeSwitched { .. } => "ModeSwitched",
            Event::StartRejected { .. } => "StartRejected",
            Event::Ticked { .. } => "Ticked",
            Event::TimerCompleted { .. } => "TimerCompleted",
            Event::PhaseChanged { .. } => "PhaseChanged",
            Event::PomodoroLimitReached { .. } => "PomodoroLimitReached",
            Event::MonitorStarted { .. } => "MonitorStarted",
            Event::MonitorStopped { .. } => "MonitorStopped",
            Event::DistractionDetected { .. } => "DistractionDetected",
            Event::InterventionShown { .. } => "InterventionShown",
            Event::InterventionFinished { .. } => "InterventionFinished",
            Event::StateSnapshot { .. } => "StateSnapshot",
        }
    }
}

/// Scheduler milliseconds as a UTC timestamp.
pub fn timestamp(ms: u64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms as i64).unwrap_or_default()
}
