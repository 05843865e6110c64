use serde::{Deserialize, Serialize};

/// Pomodoro phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Focus,
    Break,
}

impl Phase {
    pub fn flipped(self) -> Self {
        match self {
            Phase::Focus => Phase::Break,
            Phase::Break => Phase::Focus,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Focus => "Focus",
            Phase::Break => "Break",
        }
    }
}

/// Timing mode. Only Pomodoro carries a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Mode {
    Timer,
    Stopwatch,
    Pomodoro { phase: Phase },
}

impl Mode {
    /// Pomodoro at the start of its cycle.
    pub fn pomodoro() -> Self {
        Mode::Pomodoro {
            phase: Phase::Focus,
        }
    }

    pub fn kind(self) -> ModeKind {
        match self {
            Mode::Timer => ModeKind::Timer,
            Mode::Stopwatch => ModeKind::Stopwatch,
            Mode::Pomodoro { .. } => ModeKind::Pomodoro,
        }
    }

    pub fn phase(self) -> Option<Phase> {
        match self {
            Mode::Pomodoro { phase } => Some(phase),
            _ => None,
        }
    }

    pub fn title(self) -> &'static str {
        self.kind().title()
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::pomodoro()
    }
}

/// Mode without its phase, used to request a mode switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    Timer,
    Stopwatch,
    Pomodoro,
}

impl ModeKind {
    pub fn title(self) -> &'static str {
        match self {
            ModeKind::Timer => "Timer",
            ModeKind::Stopwatch => "Stopwatch",
            ModeKind::Pomodoro => "Pomodoro",
        }
    }

    /// Canonical idle mode for this kind.
    pub fn initial_mode(self) -> Mode {
        match self {
            ModeKind::Timer => Mode::Timer,
            ModeKind::Stopwatch => Mode::Stopwatch,
            ModeKind::Pomodoro => Mode::pomodoro(),
        }
    }
}

impl std::str::FromStr for ModeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "timer" => Ok(ModeKind::Timer),
            "stopwatch" => Ok(ModeKind::Stopwatch),
            "pomodoro" => Ok(ModeKind::Pomodoro),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}
