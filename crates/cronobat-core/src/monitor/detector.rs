use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::poller::AppSwitchEvent;
use crate::session::FocusSnapshot;

/// Apps treated as distractions unless configured otherwise.
pub const DEFAULT_DISTRACTING_APPS: &[&str] = &[
    "com.google.android.youtube",
    "com.netflix.mediaclient",
    "com.instagram.android",
    "com.facebook.katana",
    "com.zhiliaoapp.musically",
    "com.twitter.android",
    "com.reddit.frontpage",
    "com.snapchat.android",
    "com.pinterest",
    "org.telegram.messenger",
    "com.whatsapp",
    // Threads
    "com.instagram.barcelona",
];

/// Immutable set of distracting application identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistractionSet(BTreeSet<String>);

impl DistractionSet {
    pub fn builtin() -> Self {
        DEFAULT_DISTRACTING_APPS.iter().copied().collect()
    }

    pub fn contains(&self, package: &str) -> bool {
        self.0.contains(package)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for DistractionSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<S: Into<String>> FromIterator<S> for DistractionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Request to pull the user back, carrying what the session currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub package: String,
    pub title: String,
    pub text: String,
    pub at_ms: u64,
}

/// Decides which foreground switches fire an intervention.
#[derive(Debug, Clone)]
pub struct DistractionDetector {
    set: DistractionSet,
    cooldown_ms: u64,
    last_trigger_ms: Option<u64>,
}

impl DistractionDetector {
    pub fn new(set: DistractionSet, cooldown_ms: u64) -> Self {
        Self {
            set,
            cooldown_ms,
            last_trigger_ms: None,
        }
    }

    pub fn set(&self) -> &DistractionSet {
        &self.set
    }

    pub fn last_trigger_ms(&self) -> Option<u64> {
        self.last_trigger_ms
    }

    /// Inert outside a focus period. Otherwise fires for set members once
    /// more than `cooldown_ms` has passed since the previous trigger.
    pub fn on_event(
        &mut self,
        event: &AppSwitchEvent,
        focus: &FocusSnapshot,
        now_ms: u64,
    ) -> Option<Trigger> {
        if !focus.is_focus_active || !self.set.contains(&event.package) {
            return None;
        }
        if let Some(last) = self.last_trigger_ms {
            if now_ms.saturating_sub(last) <= self.cooldown_ms {
                tracing::debug!(package = %event.package, "distraction within cooldown");
                return None;
            }
        }

        self.last_trigger_ms = Some(now_ms);
        tracing::info!(package = %event.package, "distraction detected");
        Some(Trigger {
            package: event.package.clone(),
            title: focus.title.clone(),
            text: focus.text.clone(),
            at_ms: now_ms,
        })
    }
}

impl Default for DistractionDetector {
    fn default() -> Self {
        Self::new(DistractionSet::builtin(), 4000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Mode, Phase};

    fn focus(active: bool) -> FocusSnapshot {
        FocusSnapshot {
            mode: Mode::pomodoro(),
            title: "Pomodoro".into(),
            text: "Focus • 24:59".into(),
            is_running: true,
            is_focus_active: active,
        }
    }

    fn switch(package: &str) -> AppSwitchEvent {
        AppSwitchEvent {
            package: package.into(),
            timestamp_ms: 0,
        }
    }

    #[test]
    fn builtin_set_has_twelve_apps() {
        let set = DistractionSet::builtin();
        assert_eq!(set.len(), 12);
        assert!(set.contains("com.instagram.barcelona"));
        assert!(!set.contains("com.example.notes"));
    }

    #[test]
    fn fires_with_session_text() {
        let mut detector = DistractionDetector::default();
        let trigger = detector
            .on_event(&switch("com.reddit.frontpage"), &focus(true), 50_000)
            .unwrap();
        assert_eq!(trigger.title, "Pomodoro");
        assert_eq!(trigger.text, "Focus • 24:59");
        assert_eq!(trigger.package, "com.reddit.frontpage");
        assert_eq!(trigger.at_ms, 50_000);
        assert_eq!(detector.last_trigger_ms(), Some(50_000));
    }

    #[test]
    fn ignores_apps_outside_the_set() {
        let mut detector = DistractionDetector::default();
        assert!(detector.on_event(&switch("com.example.notes"), &focus(true), 1).is_none());
        assert_eq!(detector.last_trigger_ms(), None);
    }

    #[test]
    fn inert_when_not_focusing() {
        let mut detector = DistractionDetector::default();
        let mut on_break = focus(false);
        on_break.mode = Mode::Pomodoro { phase: Phase::Break };
        assert!(detector.on_event(&switch("com.whatsapp"), &on_break, 10_000).is_none());
    }

    #[test]
    fn cooldown_is_strict() {
        let mut detector = DistractionDetector::default();
        let event = switch("com.whatsapp");
        assert!(detector.on_event(&event, &focus(true), 10_000).is_some());
        assert!(detector.on_event(&event, &focus(true), 13_999).is_none());
        assert!(detector.on_event(&event, &focus(true), 14_000).is_none());
        assert!(detector.on_event(&event, &focus(true), 14_001).is_some());
    }

    #[test]
    fn suppressed_events_do_not_extend_cooldown() {
        let mut detector = DistractionDetector::default();
        let event = switch("com.whatsapp");
        detector.on_event(&event, &focus(true), 10_000);
        detector.on_event(&event, &focus(true), 12_000);
        assert!(detector.on_event(&event, &focus(true), 14_500).is_some());
    }
}
