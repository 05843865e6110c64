//! Intervention dispatcher.
//!
//! A [`Trigger`] is delivered through exactly one channel: a system-wide
//! overlay when the host allows drawing one, otherwise a full-screen redirect
//! view. Either way control returns to the main app after a short dwell.
//!
//! ```text
//! Idle -> (trigger, overlay allowed) -> OverlayShown  -> (dwell) -> Idle
//! Idle -> (trigger, not allowed)     -> RedirectShown -> (dwell) -> Idle
//! ```
//!
//! Triggers that arrive while not Idle are dropped.

use serde::{Deserialize, Serialize};

use crate::clock::{Scheduler, TaskHandle, Wakeup};
use crate::error::OverlayError;
use crate::monitor::Trigger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterventionChannel {
    Overlay,
    Redirect,
}

/// Opaque handle for a shown overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OverlayHandle(pub u64);

/// Window-system side of an intervention.
pub trait OverlayHost {
    /// Whether the app may draw on top of other apps.
    fn can_draw_overlay(&self) -> bool;

    /// Full-screen, always-on-top, non-focusable, touch-transparent overlay.
    fn show_overlay(&mut self, title: &str, text: &str) -> Result<OverlayHandle, OverlayError>;

    fn dismiss_overlay(&mut self, handle: OverlayHandle) -> Result<(), OverlayError>;

    /// Bring the main application window to the foreground.
    fn bring_app_to_front(&mut self);

    /// Open the full-screen redirect view.
    fn navigate_to_redirect(&mut self, title: &str, text: &str);

    /// Redirect view hands back to the main app and closes itself.
    fn close_redirect(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatcherState {
    Idle,
    OverlayShown,
    RedirectShown,
}

#[derive(Debug, Clone, Copy)]
enum Active {
    Overlay(OverlayHandle),
    Redirect,
}

impl Active {
    fn channel(self) -> InterventionChannel {
        match self {
            Active::Overlay(_) => InterventionChannel::Overlay,
            Active::Redirect => InterventionChannel::Redirect,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InterventionDispatcher {
    dwell_ms: u64,
    active: Option<Active>,
    generation: u64,
    dwell_handle: Option<TaskHandle>,
}

impl InterventionDispatcher {
    pub fn new(dwell_ms: u64) -> Self {
        Self {
            dwell_ms,
            active: None,
            generation: 0,
            dwell_handle: None,
        }
    }

    pub fn state(&self) -> DispatcherState {
        match self.active {
            None => DispatcherState::Idle,
            Some(Active::Overlay(_)) => DispatcherState::OverlayShown,
            Some(Active::Redirect) => DispatcherState::RedirectShown,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    /// Show the trigger through one channel. Returns the channel used, or
    /// `None` when an intervention is already in progress.
    pub fn dispatch(
        &mut self,
        trigger: &Trigger,
        host: &mut impl OverlayHost,
        sched: &mut impl Scheduler,
    ) -> Option<InterventionChannel> {
        if !self.is_idle() {
            tracing::debug!(package = %trigger.package, "intervention already active");
            return None;
        }

        let active = if host.can_draw_overlay() {
            match host.show_overlay(&trigger.title, &trigger.text) {
                Ok(handle) => Active::Overlay(handle),
                Err(e) => {
                    // Nothing is on screen yet, so the redirect is still the only channel.
                    tracing::warn!(error = %e, "overlay failed; using redirect view");
                    host.navigate_to_redirect(&trigger.title, &trigger.text);
                    Active::Redirect
                }
            }
        } else {
            host.navigate_to_redirect(&trigger.title, &trigger.text);
            Active::Redirect
        };

        self.generation += 1;
        self.active = Some(active);
        self.dwell_handle = Some(sched.schedule(self.dwell_ms, Wakeup::InterventionDwell {
            generation: self.generation,
        }));
        tracing::info!(channel = ?active.channel(), package = %trigger.package, "intervention shown");
        Some(active.channel())
    }

    /// Dwell elapsed: return to the main app and tear down. Returns the
    /// channel that finished.
    pub fn on_dwell(&mut self, generation: u64, host: &mut impl OverlayHost) -> Option<InterventionChannel> {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "stale intervention dwell ignored");
            return None;
        }
        self.dwell_handle = None;
        let active = self.active.take()?;
        Self::finish(active, host);
        Some(active.channel())
    }

    /// Tear down anything still on screen and cancel the pending dwell.
    pub fn shutdown(&mut self, host: &mut impl OverlayHost, sched: &mut impl Scheduler) {
        if let Some(handle) = self.dwell_handle.take() {
            sched.cancel(handle);
        }
        self.generation += 1;
        if let Some(Active::Overlay(handle)) = self.active.take() {
            if let Err(e) = host.dismiss_overlay(handle) {
                tracing::warn!(error = %e, "failed to dismiss overlay on shutdown");
            }
        }
    }

    fn finish(active: Active, host: &mut impl OverlayHost) {
        match active {
            Active::Overlay(handle) => {
                host.bring_app_to_front();
                if let Err(e) = host.dismiss_overlay(handle) {
                    tracing::warn!(error = %e, "failed to dismiss overlay");
                }
            }
            Active::Redirect => host.close_redirect(),
        }
    }
}

impl Default for InterventionDispatcher {
    fn default() -> Self {
        Self::new(600)
    }
}

/// Call made on a [`RecordingHost`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum HostCall {
    ShowOverlay { title: String, text: String, handle: OverlayHandle },
    DismissOverlay { handle: OverlayHandle },
    BringAppToFront,
    NavigateToRedirect { title: String, text: String },
    CloseRedirect,
}

/// Overlay host that only records what it was asked to do. Used by the
/// simulator and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    overlay_permitted: bool,
    fail_overlay: bool,
    fail_dismiss: bool,
    next_handle: u64,
    calls: Vec<HostCall>,
}

impl RecordingHost {
    pub fn new(overlay_permitted: bool) -> Self {
        Self {
            overlay_permitted,
            ..Self::default()
        }
    }

    /// Make every `show_overlay` fail.
    pub fn failing_overlay(mut self) -> Self {
        self.fail_overlay = true;
        self
    }

    /// Make every `dismiss_overlay` fail after recording the call.
    pub fn failing_dismiss(mut self) -> Self {
        self.fail_dismiss = true;
        self
    }

    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<HostCall> {
        std::mem::take(&mut self.calls)
    }
}

impl OverlayHost for RecordingHost {
    fn can_draw_overlay(&self) -> bool {
        self.overlay_permitted
    }

    fn show_overlay(&mut self, title: &str, text: &str) -> Result<OverlayHandle, OverlayError> {
        if self.fail_overlay {
            return Err(OverlayError::ShowFailed("window manager rejected view".into()));
        }
        self.next_handle += 1;
        let handle = OverlayHandle(self.next_handle);
        self.calls.push(HostCall::ShowOverlay {
            title: title.into(),
            text: text.into(),
            handle,
        });
        Ok(handle)
    }

    fn dismiss_overlay(&mut self, handle: OverlayHandle) -> Result<(), OverlayError> {
        self.calls.push(HostCall::DismissOverlay { handle });
        if self.fail_dismiss {
            return Err(OverlayError::DismissFailed("view already detached".into()));
        }
        Ok(())
    }

    fn bring_app_to_front(&mut self) {
        self.calls.push(HostCall::BringAppToFront);
    }

    fn navigate_to_redirect(&mut self, title: &str, text: &str) {
        self.calls.push(HostCall::NavigateToRedirect {
            title: title.into(),
            text: text.into(),
        });
    }

    fn close_redirect(&mut self) {
        self.calls.push(HostCall::CloseRedirect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock, TimerQueue};

    fn trigger() -> Trigger {
        Trigger {
            package: "com.whatsapp".into(),
            title: "Stopwatch".into(),
            text: "00:42".into(),
            at_ms: 0,
        }
    }

    fn fire_dwell(
        dispatcher: &mut InterventionDispatcher,
        host: &mut RecordingHost,
        q: &mut TimerQueue<ManualClock>,
    ) -> Option<InterventionChannel> {
        let now = q.clock().now_ms();
        q.clock_mut().set(now + 600);
        match q.pop_due()? {
            Wakeup::InterventionDwell { generation } => dispatcher.on_dwell(generation, host),
            other => panic!("unexpected wakeup {other:?}"),
        }
    }

    #[test]
    fn overlay_when_permitted() {
        let mut q = TimerQueue::new(ManualClock::default());
        let mut host = RecordingHost::new(true);
        let mut dispatcher = InterventionDispatcher::default();

        assert_eq!(
            dispatcher.dispatch(&trigger(), &mut host, &mut q),
            Some(InterventionChannel::Overlay)
        );
        assert_eq!(dispatcher.state(), DispatcherState::OverlayShown);
        assert_eq!(q.next_due_ms(), Some(600));

        assert_eq!(
            fire_dwell(&mut dispatcher, &mut host, &mut q),
            Some(InterventionChannel::Overlay)
        );
        assert_eq!(
            host.calls(),
            [
                HostCall::ShowOverlay {
                    title: "Stopwatch".into(),
                    text: "00:42".into(),
                    handle: OverlayHandle(1),
                },
                HostCall::BringAppToFront,
                HostCall::DismissOverlay { handle: OverlayHandle(1) },
            ]
        );
        assert!(dispatcher.is_idle());
    }

    #[test]
    fn redirect_when_not_permitted() {
        let mut q = TimerQueue::new(ManualClock::default());
        let mut host = RecordingHost::new(false);
        let mut dispatcher = InterventionDispatcher::default();

        assert_eq!(
            dispatcher.dispatch(&trigger(), &mut host, &mut q),
            Some(InterventionChannel::Redirect)
        );
        assert_eq!(dispatcher.state(), DispatcherState::RedirectShown);
        fire_dwell(&mut dispatcher, &mut host, &mut q);
        assert_eq!(
            host.calls(),
            [
                HostCall::NavigateToRedirect {
                    title: "Stopwatch".into(),
                    text: "00:42".into(),
                },
                HostCall::CloseRedirect,
            ]
        );
    }

    #[test]
    fn second_trigger_during_dwell_is_noop() {
        let mut q = TimerQueue::new(ManualClock::default());
        let mut host = RecordingHost::new(true);
        let mut dispatcher = InterventionDispatcher::default();

        dispatcher.dispatch(&trigger(), &mut host, &mut q);
        assert_eq!(dispatcher.dispatch(&trigger(), &mut host, &mut q), None);
        assert_eq!(host.calls().len(), 1);
        assert_eq!(q.pending(), 1);
    }

    #[test]
    fn overlay_failure_falls_back_to_redirect() {
        let mut q = TimerQueue::new(ManualClock::default());
        let mut host = RecordingHost::new(true).failing_overlay();
        let mut dispatcher = InterventionDispatcher::default();

        assert_eq!(
            dispatcher.dispatch(&trigger(), &mut host, &mut q),
            Some(InterventionChannel::Redirect)
        );
        assert!(matches!(host.calls(), [HostCall::NavigateToRedirect { .. }]));
    }

    #[test]
    fn dismiss_failure_still_returns_to_app() {
        let mut q = TimerQueue::new(ManualClock::default());
        let mut host = RecordingHost::new(true).failing_dismiss();
        let mut dispatcher = InterventionDispatcher::default();

        dispatcher.dispatch(&trigger(), &mut host, &mut q);
        assert_eq!(
            fire_dwell(&mut dispatcher, &mut host, &mut q),
            Some(InterventionChannel::Overlay)
        );
        assert!(host.calls().contains(&HostCall::BringAppToFront));
        assert!(dispatcher.is_idle());

        // The next trigger is not blocked by the stale overlay.
        assert_eq!(
            dispatcher.dispatch(&trigger(), &mut host, &mut q),
            Some(InterventionChannel::Overlay)
        );
    }

    #[test]
    fn shutdown_dismisses_overlay_and_cancels_dwell() {
        let mut q = TimerQueue::new(ManualClock::default());
        let mut host = RecordingHost::new(true);
        let mut dispatcher = InterventionDispatcher::default();

        dispatcher.dispatch(&trigger(), &mut host, &mut q);
        dispatcher.shutdown(&mut host, &mut q);
        assert!(q.is_empty());
        assert!(dispatcher.is_idle());
        assert_eq!(host.calls().last(), Some(&HostCall::DismissOverlay { handle: OverlayHandle(1) }));
    }
}
