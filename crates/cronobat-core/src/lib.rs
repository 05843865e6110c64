//! # Cronobat Core Library
//!
//! Core logic for the Cronobat focus timer: a Timer / Stopwatch / Pomodoro
//! session state machine and a background distraction monitor that pulls the
//! user back when a distracting app comes to the foreground during a focus
//! period.
//!
//! ## Architecture
//!
//! - **Clock**: a cooperative timer queue. Nothing here spawns threads; the
//!   shell pumps [`FocusApp::run_due`] or drives a [`ManualClock`]
//! - **Session**: the mode/phase state machine, ticked once per second
//! - **Monitor**: foreground activity poller and distraction detector
//! - **Intervention**: overlay-or-redirect dispatcher with a short dwell
//!
//! The host environment plugs in through three traits:
//! [`ActivitySource`], [`OverlayHost`] and [`SessionBroadcast`].

pub mod app;
pub mod broadcast;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod intervention;
pub mod monitor;
pub mod session;

pub use app::FocusApp;
pub use broadcast::{BroadcastCall, NullBroadcast, RecordingBroadcast, SessionBroadcast};
pub use clock::{Clock, ManualClock, Scheduler, SystemClock, TaskHandle, TimerQueue, Wakeup};
pub use config::Config;
pub use error::{ActivityError, ConfigError, CoreError, OverlayError, ValidationError};
pub use events::Event;
pub use intervention::{
    DispatcherState, HostCall, InterventionChannel, InterventionDispatcher, OverlayHandle,
    OverlayHost, RecordingHost,
};
pub use monitor::{
    ActivityEvent, ActivityKind, ActivitySource, AppSwitchEvent, DistractionDetector,
    DistractionSet, ForegroundPoller, ScriptedSource, Trigger,
};
pub use session::{
    format_clock, parse_clock, FocusSnapshot, Mode, ModeKind, Phase, RunStatus, SessionMachine,
    SessionSettings, SessionState,
};
