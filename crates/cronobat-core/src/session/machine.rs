//! Session state machine.
//!
//! Tick-driven: every running session holds exactly one pending
//! [`Wakeup::SessionTick`] in the scheduler, and each tick schedules the next
//! one only after it has been applied, so ticks never overlap.
//!
//! ## State Transitions
//!
//! ```text
//! Timer:      Idle(duration) -> Running(remaining) <-> Paused(remaining) -> (0) -> Idle(0)
//! Stopwatch:  Idle(0) -> Running(elapsed) <-> Paused(elapsed) -> reset -> Idle(0)
//! Pomodoro:   Idle(Focus) -> Running(phase, remaining) <-> Paused
//!             Running(phase, 0) -> Running(flipped phase, full duration)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = SessionMachine::new(SessionSettings::default());
//! session.start(&mut scheduler);
//! // when the scheduler delivers Wakeup::SessionTick { generation }:
//! session.on_tick(generation, &mut scheduler);
//! ```

use serde::{Deserialize, Serialize};

use super::display::format_clock;
use super::mode::{Mode, ModeKind, Phase};
use crate::clock::{Scheduler, TaskHandle, Wakeup};
use crate::error::ValidationError;
use crate::events::{timestamp, Event};

/// Shown when a Timer is started with nothing configured.
pub const EMPTY_TIMER_MESSAGE: &str = "Set a time first";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Idle,
    Running,
    Paused,
}

/// Tunables for the session machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub focus_minutes: u32,
    pub break_minutes: u32,
    /// Stop after this many Focus+Break cycles. `None` alternates forever.
    pub max_cycles: Option<u32>,
    pub max_timer_secs: u64,
    pub tick_interval_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            focus_minutes: 25,
            break_minutes: 5,
            max_cycles: None,
            max_timer_secs: 3600,
            tick_interval_ms: 1000,
        }
    }
}

/// Plain record of the session, as exposed to shells and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub mode: Mode,
    pub status: RunStatus,
    /// Remaining seconds for countdowns, elapsed seconds for the stopwatch.
    pub seconds: u64,
    pub focus_minutes: u32,
    pub break_minutes: u32,
    pub timer_duration_secs: u64,
}

/// What the session wants the outside world to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusSnapshot {
    pub mode: Mode,
    pub title: String,
    pub text: String,
    pub is_running: bool,
    pub is_focus_active: bool,
}

#[derive(Debug, Clone)]
pub struct SessionMachine {
    mode: Mode,
    status: RunStatus,
    seconds: u64,
    focus_minutes: u32,
    break_minutes: u32,
    timer_duration_secs: u64,
    max_cycles: Option<u32>,
    max_timer_secs: u64,
    tick_interval_ms: u64,
    /// Phase completions since the last start from Idle.
    completions: u32,
    /// Bumped on every (un)subscribe; ticks from older generations are stale.
    generation: u64,
    tick_handle: Option<TaskHandle>,
}

impl SessionMachine {
    /// Starts Idle in Pomodoro/Focus.
    pub fn new(settings: SessionSettings) -> Self {
        let focus_minutes = settings.focus_minutes.max(1);
        Self {
            mode: Mode::pomodoro(),
            status: RunStatus::Idle,
            seconds: minutes_to_secs(focus_minutes),
            focus_minutes,
            break_minutes: settings.break_minutes.max(1),
            timer_duration_secs: 0,
            max_cycles: settings.max_cycles,
            max_timer_secs: settings.max_timer_secs,
            tick_interval_ms: settings.tick_interval_ms.max(1),
            completions: 0,
            generation: 0,
            tick_handle: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        self.status == RunStatus::Running
    }

    /// Timer running, Stopwatch running, or Pomodoro running in Focus.
    pub fn is_focus_active(&self) -> bool {
        self.is_running() && self.mode.phase() != Some(Phase::Break)
    }

    pub fn title(&self) -> &'static str {
        self.mode.title()
    }

    /// Formatted clock, prefixed with the phase for Pomodoro.
    pub fn subtitle(&self) -> String {
        let clock = format_clock(self.seconds);
        match self.mode.phase() {
            Some(phase) => format!("{} • {}", phase.label(), clock),
            None => clock,
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            mode: self.mode,
            status: self.status,
            seconds: self.seconds,
            focus_minutes: self.focus_minutes,
            break_minutes: self.break_minutes,
            timer_duration_secs: self.timer_duration_secs,
        }
    }

    pub fn focus_snapshot(&self) -> FocusSnapshot {
        FocusSnapshot {
            mode: self.mode,
            title: self.title().to_string(),
            text: self.subtitle(),
            is_running: self.is_running(),
            is_focus_active: self.is_focus_active(),
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, now_ms: u64) -> Event {
        Event::StateSnapshot {
            mode: self.mode,
            status: self.status,
            seconds: self.seconds,
            display: format_clock(self.seconds),
            focus_minutes: self.focus_minutes,
            break_minutes: self.break_minutes,
            timer_duration_secs: self.timer_duration_secs,
            at: timestamp(now_ms),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, sched: &mut impl Scheduler) -> Option<Event> {
        let at = timestamp(sched.now_ms());
        let resumed = match self.status {
            RunStatus::Running => return None,
            RunStatus::Paused => true,
            RunStatus::Idle => {
                self.seconds = match self.mode {
                    Mode::Timer if self.timer_duration_secs == 0 => {
                        tracing::info!("timer start rejected: no duration set");
                        return Some(Event::StartRejected {
                            mode: ModeKind::Timer,
                            message: EMPTY_TIMER_MESSAGE.to_string(),
                            at,
                        });
                    }
                    Mode::Timer => self.timer_duration_secs,
                    Mode::Stopwatch => 0,
                    Mode::Pomodoro { phase } => self.phase_secs(phase),
                };
                self.completions = 0;
                false
            }
        };

        self.status = RunStatus::Running;
        self.subscribe(sched);
        tracing::info!(mode = self.title(), seconds = self.seconds, resumed, "session started");
        Some(Event::SessionStarted {
            mode: self.mode,
            seconds: self.seconds,
            resumed,
            at,
        })
    }

    pub fn pause(&mut self, sched: &mut impl Scheduler) -> Option<Event> {
        if self.status != RunStatus::Running {
            return None;
        }
        self.unsubscribe(sched);
        self.status = RunStatus::Paused;
        tracing::info!(mode = self.title(), seconds = self.seconds, "session paused");
        Some(Event::SessionPaused {
            mode: self.mode,
            seconds: self.seconds,
            at: timestamp(sched.now_ms()),
        })
    }

    /// Back to Idle with the mode's canonical value. A Timer also forgets
    /// its configured duration.
    pub fn reset(&mut self, sched: &mut impl Scheduler) -> Option<Event> {
        self.unsubscribe(sched);
        self.status = RunStatus::Idle;
        self.completions = 0;
        match self.mode {
            Mode::Timer => {
                self.timer_duration_secs = 0;
                self.seconds = 0;
            }
            Mode::Stopwatch => self.seconds = 0,
            Mode::Pomodoro { .. } => {
                self.mode = Mode::pomodoro();
                self.seconds = self.phase_secs(Phase::Focus);
            }
        }
        Some(Event::SessionReset {
            mode: self.mode,
            at: timestamp(sched.now_ms()),
        })
    }

    /// Stops whatever runs, clears Timer and Stopwatch state, and lands Idle
    /// in `kind`. Pomodoro lengths survive.
    pub fn switch_mode(&mut self, kind: ModeKind, sched: &mut impl Scheduler) -> Option<Event> {
        let from = self.mode.kind();
        self.unsubscribe(sched);
        self.status = RunStatus::Idle;
        self.completions = 0;
        self.timer_duration_secs = 0;
        self.mode = kind.initial_mode();
        self.seconds = match self.mode {
            Mode::Pomodoro { phase } => self.phase_secs(phase),
            Mode::Timer | Mode::Stopwatch => 0,
        };
        tracing::info!(from = from.title(), to = kind.title(), "mode switched");
        Some(Event::ModeSwitched {
            from,
            to: kind,
            at: timestamp(sched.now_ms()),
        })
    }

    /// Timer length in seconds. Not allowed while the timer runs.
    pub fn set_timer_duration(&mut self, secs: u64) -> Result<(), ValidationError> {
        if self.mode == Mode::Timer && self.is_running() {
            return Err(ValidationError::SessionRunning {
                field: "timer_duration_secs".into(),
            });
        }
        if secs > self.max_timer_secs {
            return Err(ValidationError::OutOfRange {
                field: "timer_duration_secs".into(),
                value: secs,
                max: self.max_timer_secs,
            });
        }
        self.timer_duration_secs = secs;
        if self.mode == Mode::Timer && self.status == RunStatus::Idle {
            self.seconds = secs;
        }
        Ok(())
    }

    /// Focus length; values below one minute become one minute.
    pub fn set_focus_minutes(&mut self, minutes: u32) {
        self.focus_minutes = minutes.max(1);
        if self.mode == Mode::pomodoro() && self.status == RunStatus::Idle {
            self.seconds = self.phase_secs(Phase::Focus);
        }
    }

    /// Break length; values below one minute become one minute.
    pub fn set_break_minutes(&mut self, minutes: u32) {
        self.break_minutes = minutes.max(1);
    }

    /// Apply one tick. Stale generations and ticks arriving after the session
    /// stopped are ignored.
    pub fn on_tick(&mut self, generation: u64, sched: &mut impl Scheduler) -> Option<Event> {
        if generation != self.generation || self.status != RunStatus::Running {
            tracing::debug!(generation, current = self.generation, "stale session tick ignored");
            return None;
        }
        self.tick_handle = None;
        let at = timestamp(sched.now_ms());

        match self.mode {
            Mode::Stopwatch => {
                self.seconds = self.seconds.saturating_add(1);
            }
            Mode::Timer => {
                self.seconds = self.seconds.saturating_sub(1);
                if self.seconds == 0 {
                    self.status = RunStatus::Idle;
                    self.generation += 1;
                    tracing::info!("timer completed");
                    return Some(Event::TimerCompleted { at });
                }
            }
            Mode::Pomodoro { phase } => {
                self.seconds = self.seconds.saturating_sub(1);
                if self.seconds == 0 {
                    return Some(self.complete_phase(phase, sched));
                }
            }
        }

        self.schedule_tick(sched);
        Some(Event::Ticked {
            mode: self.mode,
            seconds: self.seconds,
            at,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_phase(&mut self, finished: Phase, sched: &mut impl Scheduler) -> Event {
        let at = timestamp(sched.now_ms());
        self.completions = self.completions.saturating_add(1);
        let cycles = self.completions / 2;

        if finished == Phase::Break && self.max_cycles.is_some_and(|max| cycles >= max) {
            self.status = RunStatus::Idle;
            self.generation += 1;
            self.completions = 0;
            self.mode = Mode::pomodoro();
            self.seconds = self.phase_secs(Phase::Focus);
            tracing::info!(cycles, "pomodoro cycle limit reached");
            return Event::PomodoroLimitReached { cycles, at };
        }

        let next = finished.flipped();
        self.mode = Mode::Pomodoro { phase: next };
        self.seconds = self.phase_secs(next);
        // Re-enter Running with a fresh subscription.
        self.subscribe(sched);
        tracing::info!(from = finished.label(), to = next.label(), "pomodoro phase changed");
        Event::PhaseChanged {
            from: finished,
            to: next,
            duration_secs: self.seconds,
            completions: self.completions,
            at,
        }
    }

    fn phase_secs(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Focus => minutes_to_secs(self.focus_minutes),
            Phase::Break => minutes_to_secs(self.break_minutes),
        }
    }

    fn subscribe(&mut self, sched: &mut impl Scheduler) {
        self.unsubscribe(sched);
        self.schedule_tick(sched);
    }

    fn schedule_tick(&mut self, sched: &mut impl Scheduler) {
        let wakeup = Wakeup::SessionTick {
            generation: self.generation,
        };
        self.tick_handle = Some(sched.schedule(self.tick_interval_ms, wakeup));
    }

    fn unsubscribe(&mut self, sched: &mut impl Scheduler) {
        if let Some(handle) = self.tick_handle.take() {
            sched.cancel(handle);
        }
        self.generation += 1;
    }
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}

fn minutes_to_secs(minutes: u32) -> u64 {
    u64::from(minutes) * 60
}
