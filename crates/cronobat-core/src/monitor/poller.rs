//! Foreground activity poller.
//!
//! Runs on its own cadence, independent of the session tick. Each poll asks
//! for events in `[last_seen, now]` and forwards only the foreground
//! ("resumed") ones. Query failures never escape: the batch is dropped and
//! the next poll is scheduled as usual.

use serde::{Deserialize, Serialize};

use super::source::{ActivityKind, ActivitySource};
use crate::clock::{Scheduler, TaskHandle, Wakeup};

/// An app that came to the foreground.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSwitchEvent {
    pub package: String,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerSettings {
    pub interval_ms: u64,
    /// How far back the first query looks, before any event has been seen.
    pub startup_lookback_ms: u64,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            interval_ms: 1500,
            startup_lookback_ms: 2000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForegroundPoller {
    settings: PollerSettings,
    /// Newest timestamp seen in any batch. Only moves forward.
    last_seen_ms: Option<u64>,
    generation: u64,
    handle: Option<TaskHandle>,
    warned_no_access: bool,
}

impl ForegroundPoller {
    pub fn new(settings: PollerSettings) -> Self {
        Self {
            settings,
            last_seen_ms: None,
            generation: 0,
            handle: None,
            warned_no_access: false,
        }
    }

    pub fn last_seen_ms(&self) -> Option<u64> {
        self.last_seen_ms
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Begin polling; the first poll is due immediately. Returns false if
    /// already polling.
    ///
    /// Each run starts fresh: the first query uses the startup lookback, so
    /// switches made while the monitor was stopped are never delivered.
    pub fn start(&mut self, sched: &mut impl Scheduler) -> bool {
        if self.is_active() {
            return false;
        }
        self.last_seen_ms = None;
        self.warned_no_access = false;
        self.generation += 1;
        self.handle = Some(sched.schedule(0, Wakeup::Poll {
            generation: self.generation,
        }));
        true
    }

    /// Cancel the pending poll. Returns false if not polling.
    pub fn stop(&mut self, sched: &mut impl Scheduler) -> bool {
        self.generation += 1;
        match self.handle.take() {
            Some(handle) => {
                sched.cancel(handle);
                true
            }
            None => false,
        }
    }

    /// Handle a scheduled poll: query, then schedule the next one.
    pub fn on_poll(
        &mut self,
        generation: u64,
        source: &mut impl ActivitySource,
        sched: &mut impl Scheduler,
    ) -> Vec<AppSwitchEvent> {
        if generation != self.generation || self.handle.is_none() {
            tracing::debug!(generation, current = self.generation, "stale poll ignored");
            return Vec::new();
        }
        let events = self.poll_once(sched.now_ms(), source);
        self.handle = Some(sched.schedule(self.settings.interval_ms, Wakeup::Poll { generation }));
        events
    }

    /// One query against `source`, ending at `now_ms`.
    pub fn poll_once(&mut self, now_ms: u64, source: &mut impl ActivitySource) -> Vec<AppSwitchEvent> {
        if !source.has_usage_access() {
            if !self.warned_no_access {
                tracing::warn!("usage access not granted; distraction monitor sees no events");
                self.warned_no_access = true;
            }
            return Vec::new();
        }

        let from = self
            .last_seen_ms
            .unwrap_or_else(|| now_ms.saturating_sub(self.settings.startup_lookback_ms));
        let batch = match source.query_events(from, now_ms) {
            Ok(batch) => batch,
            Err(e) => {
                tracing::debug!(error = %e, "activity query failed; retrying next poll");
                return Vec::new();
            }
        };

        let previous = self.last_seen_ms;
        let mut forwarded = Vec::new();
        for event in batch {
            if previous.is_some_and(|seen| event.timestamp_ms <= seen) {
                continue;
            }
            self.last_seen_ms = Some(
                self.last_seen_ms
                    .map_or(event.timestamp_ms, |seen| seen.max(event.timestamp_ms)),
            );
            if event.kind == ActivityKind::Resumed {
                forwarded.push(AppSwitchEvent {
                    package: event.package,
                    timestamp_ms: event.timestamp_ms,
                });
            }
        }
        forwarded
    }
}

impl Default for ForegroundPoller {
    fn default() -> Self {
        Self::new(PollerSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock, TimerQueue};
    use crate::error::ActivityError;
    use crate::monitor::source::{ActivityEvent, ScriptedSource};
    use proptest::prelude::*;

    struct FailingSource;

    impl ActivitySource for FailingSource {
        fn query_events(&mut self, _: u64, _: u64) -> Result<Vec<ActivityEvent>, ActivityError> {
            Err(ActivityError::QueryFailed("binder died".into()))
        }
    }

    /// Records the windows it was asked for.
    #[derive(Default)]
    struct RecordingSource {
        windows: Vec<(u64, u64)>,
    }

    impl ActivitySource for RecordingSource {
        fn query_events(&mut self, from: u64, to: u64) -> Result<Vec<ActivityEvent>, ActivityError> {
            self.windows.push((from, to));
            Ok(Vec::new())
        }
    }

    #[test]
    fn first_query_looks_back_two_seconds() {
        let mut poller = ForegroundPoller::default();
        let mut source = RecordingSource::default();
        poller.poll_once(10_000, &mut source);
        poller.poll_once(11_500, &mut source);
        // Nothing seen yet, so the lookback applies again.
        assert_eq!(source.windows, [(8_000, 10_000), (9_500, 11_500)]);
    }

    #[test]
    fn forwards_only_resumed_events_in_order() {
        let mut poller = ForegroundPoller::default();
        let mut source = ScriptedSource::new(vec![
            ActivityEvent::resumed("a", 9_000),
            ActivityEvent {
                package: "a".into(),
                timestamp_ms: 9_100,
                kind: ActivityKind::Paused,
            },
            ActivityEvent::resumed("b", 9_200),
        ]);
        let got = poller.poll_once(10_000, &mut source);
        let names: Vec<_> = got.iter().map(|e| e.package.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(poller.last_seen_ms(), Some(9_200));
    }

    #[test]
    fn non_foreground_events_still_advance_last_seen() {
        let mut poller = ForegroundPoller::default();
        let mut source = ScriptedSource::new(vec![ActivityEvent {
            package: "a".into(),
            timestamp_ms: 9_500,
            kind: ActivityKind::Stopped,
        }]);
        assert!(poller.poll_once(10_000, &mut source).is_empty());
        assert_eq!(poller.last_seen_ms(), Some(9_500));
    }

    #[test]
    fn boundary_event_is_not_redelivered() {
        let mut poller = ForegroundPoller::default();
        let mut source = ScriptedSource::new(vec![ActivityEvent::resumed("a", 9_000)]);
        assert_eq!(poller.poll_once(10_000, &mut source).len(), 1);
        // The next window starts at 9_000 and would include it again.
        assert!(poller.poll_once(11_500, &mut source).is_empty());
    }

    #[test]
    fn failures_are_swallowed() {
        let mut poller = ForegroundPoller::default();
        assert!(poller.poll_once(10_000, &mut FailingSource).is_empty());
        assert_eq!(poller.last_seen_ms(), None);
    }

    #[test]
    fn missing_access_yields_nothing() {
        let mut poller = ForegroundPoller::default();
        let mut source =
            ScriptedSource::new(vec![ActivityEvent::resumed("a", 9_000)]).with_usage_access(false);
        assert!(poller.poll_once(10_000, &mut source).is_empty());
        assert_eq!(source.queries(), 0);
    }

    #[test]
    fn reschedules_after_each_poll_and_stops_cleanly() {
        let mut q = TimerQueue::new(ManualClock::starting_at(10_000));
        let mut poller = ForegroundPoller::default();
        let mut source = ScriptedSource::default();

        assert!(poller.start(&mut q));
        assert!(!poller.start(&mut q));
        let Some(Wakeup::Poll { generation }) = q.pop_due() else {
            panic!("expected an immediate poll");
        };
        poller.on_poll(generation, &mut source, &mut q);
        assert_eq!(q.next_due_ms(), Some(11_500));

        assert!(poller.stop(&mut q));
        assert!(q.is_empty());
        q.clock_mut().set(20_000);
        assert!(poller.on_poll(generation, &mut source, &mut q).is_empty());
        assert!(q.is_empty());
        assert_eq!(source.queries(), 1);
        assert_eq!(q.clock().now_ms(), 20_000);
    }

    #[test]
    fn restart_forgets_events_from_the_stopped_window() {
        let mut q = TimerQueue::new(ManualClock::starting_at(10_000));
        let mut poller = ForegroundPoller::default();
        let mut source = ScriptedSource::new(vec![
            ActivityEvent::resumed("notes", 9_500),
            ActivityEvent::resumed("video", 30_000),
        ]);

        poller.start(&mut q);
        let Some(Wakeup::Poll { generation }) = q.pop_due() else {
            panic!("expected an immediate poll");
        };
        assert_eq!(poller.on_poll(generation, &mut source, &mut q).len(), 1);
        poller.stop(&mut q);

        q.clock_mut().set(60_000);
        poller.start(&mut q);
        assert_eq!(poller.last_seen_ms(), None);
        let Some(Wakeup::Poll { generation }) = q.pop_due() else {
            panic!("expected an immediate poll");
        };
        assert!(poller.on_poll(generation, &mut source, &mut q).is_empty());
    }

    proptest! {
        #[test]
        fn last_seen_is_monotonic_and_nothing_repeats(
            stamps in proptest::collection::vec(0u64..60_000, 0..40),
            polls in proptest::collection::vec(1u64..5_000, 1..30),
        ) {
            let events: Vec<_> = stamps
                .iter()
                .enumerate()
                .map(|(i, ts)| ActivityEvent::resumed(format!("app{i}"), *ts))
                .collect();
            let mut source = ScriptedSource::new(events);
            let mut poller = ForegroundPoller::default();
            let mut now = 0u64;
            let mut previous = None;
            let mut delivered = std::collections::HashSet::new();

            for step in polls {
                now += step;
                let got = poller.poll_once(now, &mut source);
                for event in got {
                    if let Some(seen) = previous {
                        prop_assert!(event.timestamp_ms > seen);
                    }
                    prop_assert!(delivered.insert(event.package.clone()));
                }
                prop_assert!(poller.last_seen_ms() >= previous);
                previous = poller.last_seen_ms();
            }
        }
    }
}
