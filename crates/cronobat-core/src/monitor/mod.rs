//! Distraction monitor.
//!
//! The [`ForegroundPoller`] asks an [`ActivitySource`] what came to the
//! foreground since the last poll; the [`DistractionDetector`] decides which
//! of those switches deserve an intervention.

mod detector;
mod poller;
mod source;

pub use detector::{DistractionDetector, DistractionSet, Trigger, DEFAULT_DISTRACTING_APPS};
pub use poller::{AppSwitchEvent, ForegroundPoller, PollerSettings};
pub use source::{ActivityEvent, ActivityKind, ActivitySource, ScriptedSource};
