mod display;
mod machine;
mod mode;

pub use display::{format_clock, parse_clock};
pub use machine::{
    FocusSnapshot, RunStatus, SessionMachine, SessionSettings, SessionState, EMPTY_TIMER_MESSAGE,
};
pub use mode::{Mode, ModeKind, Phase};
