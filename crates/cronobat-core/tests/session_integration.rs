//! Integration tests for the session state machine driven through the
//! runtime on a virtual clock.

use cronobat_core::{
    BroadcastCall, Config, Event, FocusApp, ManualClock, Mode, ModeKind, Phase, RecordingBroadcast,
    RecordingHost, RunStatus, ScriptedSource,
};
use proptest::prelude::*;

const T0: u64 = 1_700_000_000_000;

type SimApp = FocusApp<ManualClock, ScriptedSource, RecordingHost, RecordingBroadcast>;

fn sim(config: &Config) -> SimApp {
    FocusApp::new(
        config,
        ManualClock::starting_at(T0),
        ScriptedSource::default(),
        RecordingHost::new(true),
        RecordingBroadcast::default(),
    )
}

fn one_minute_pomodoro() -> Config {
    let mut cfg = Config::default();
    cfg.pomodoro.focus_minutes = 1;
    cfg.pomodoro.break_minutes = 1;
    cfg
}

#[test]
fn test_zero_duration_timer_is_rejected() {
    let mut app = sim(&Config::default());
    app.switch_mode(ModeKind::Timer);
    app.drain_events();

    app.start();

    let events = app.drain_events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        Event::StartRejected { mode, message, .. } => {
            assert_eq!(*mode, ModeKind::Timer);
            assert!(!message.is_empty());
        }
        other => panic!("expected StartRejected, got {other:?}"),
    }
    assert_eq!(app.session().status(), RunStatus::Idle);
    assert_eq!(app.session().seconds(), 0);
    assert!(app.broadcast().calls().is_empty());
    assert!(app.scheduler().is_empty());
}

#[test]
fn test_one_minute_pomodoro_alternates() {
    let mut app = sim(&one_minute_pomodoro());
    app.start();

    app.advance_by(60_000);
    assert_eq!(app.session().mode(), Mode::Pomodoro { phase: Phase::Break });
    assert_eq!(app.session().seconds(), 60);
    assert_eq!(app.session().status(), RunStatus::Running);

    app.advance_by(60_000);
    assert_eq!(app.session().mode(), Mode::Pomodoro { phase: Phase::Focus });
    assert_eq!(app.session().seconds(), 60);

    let phase_changes = app
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, Event::PhaseChanged { .. }))
        .count();
    assert_eq!(phase_changes, 2);
}

#[test]
fn test_phase_change_rebroadcasts_focus_flag() {
    let mut app = sim(&one_minute_pomodoro());
    app.start();
    app.advance_by(60_000);

    assert_eq!(
        app.broadcast().last(),
        Some(&BroadcastCall::Start {
            mode: Mode::Pomodoro { phase: Phase::Break },
            title: "Pomodoro".into(),
            text: "Break • 01:00".into(),
            is_focus_active: false,
        })
    );
    assert_eq!(app.broadcast().stops(), 0);
}

#[test]
fn test_stopwatch_runs_past_an_hour() {
    let mut app = sim(&Config::default());
    app.switch_mode(ModeKind::Stopwatch);
    app.start();
    app.advance_by(3_601_000);

    assert_eq!(app.session().seconds(), 3601);
    assert_eq!(app.session().subtitle(), "01:00:01");
}

#[test]
fn test_pause_freezes_and_resume_continues() {
    let mut app = sim(&Config::default());
    app.switch_mode(ModeKind::Timer);
    app.set_timer_duration(10).unwrap();
    app.start();
    app.advance_by(3_500);
    app.pause();
    assert_eq!(app.session().seconds(), 7);

    app.advance_by(60_000);
    assert_eq!(app.session().seconds(), 7);

    app.start();
    app.advance_by(7_000);
    assert_eq!(app.session().status(), RunStatus::Idle);
    assert_eq!(app.session().seconds(), 0);
}

#[test]
fn test_mode_switch_while_running_cancels_ticks() {
    let mut app = sim(&Config::default());
    app.start();
    app.advance_by(5_000);
    app.switch_mode(ModeKind::Stopwatch);

    assert!(app.scheduler().is_empty());
    assert_eq!(app.broadcast().last(), Some(&BroadcastCall::Stop));

    app.advance_by(5_000);
    assert_eq!(app.session().seconds(), 0);
}

#[test]
fn test_timer_duration_over_limit_is_an_error() {
    let mut app = sim(&Config::default());
    app.switch_mode(ModeKind::Timer);
    assert!(app.set_timer_duration(7200).is_err());
    assert_eq!(app.session().state().timer_duration_secs, 0);
}

#[test]
fn test_cycle_limit_from_config() {
    let mut cfg = one_minute_pomodoro();
    cfg.pomodoro.max_cycles = Some(2);
    let mut app = sim(&cfg);
    app.start();
    app.advance_by(4 * 60_000);

    assert_eq!(app.session().status(), RunStatus::Idle);
    assert!(app
        .drain_events()
        .iter()
        .any(|e| matches!(e, Event::PomodoroLimitReached { cycles: 2, .. })));
    assert!(app.scheduler().is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn phase_parity_after_n_completions(n in 0u32..12) {
        let mut app = sim(&one_minute_pomodoro());
        app.start();
        app.advance_by(u64::from(n) * 60_000);

        let expected = if n % 2 == 0 { Phase::Focus } else { Phase::Break };
        prop_assert_eq!(app.session().mode(), Mode::Pomodoro { phase: expected });
        prop_assert_eq!(app.session().seconds(), 60);
    }
}
