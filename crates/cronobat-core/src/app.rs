//! Focus app runtime.
//!
//! Owns the scheduler and every stateful component, and routes each
//! [`Wakeup`] back to whoever scheduled it. All mutation happens through
//! `&mut self`, on one thread: the shell calls a command or [`run_due`]
//! (live) / [`advance_to`] (simulated), then drains the produced events.
//!
//! The distraction monitor runs exactly while the session is broadcast as
//! running.
//!
//! [`run_due`]: FocusApp::run_due
//! [`advance_to`]: FocusApp::advance_to

use crate::broadcast::SessionBroadcast;
use crate::clock::{Clock, ManualClock, Scheduler, TimerQueue, Wakeup};
use crate::config::Config;
use crate::error::Result;
use crate::events::{timestamp, Event};
use crate::intervention::{InterventionDispatcher, OverlayHost};
use crate::monitor::{ActivitySource, AppSwitchEvent, DistractionDetector, ForegroundPoller};
use crate::session::{ModeKind, SessionMachine};

pub struct FocusApp<C, A, H, B> {
    queue: TimerQueue<C>,
    session: SessionMachine,
    poller: ForegroundPoller,
    detector: DistractionDetector,
    dispatcher: InterventionDispatcher,
    source: A,
    host: H,
    broadcast: B,
    broadcasting: bool,
    events: Vec<Event>,
}

impl<C, A, H, B> FocusApp<C, A, H, B>
where
    C: Clock,
    A: ActivitySource,
    H: OverlayHost,
    B: SessionBroadcast,
{
    pub fn new(config: &Config, clock: C, source: A, host: H, broadcast: B) -> Self {
        Self {
            queue: TimerQueue::new(clock),
            session: SessionMachine::new(config.session_settings()),
            poller: ForegroundPoller::new(config.poller_settings()),
            detector: DistractionDetector::new(config.distraction_set(), config.monitor.cooldown_ms),
            dispatcher: InterventionDispatcher::new(config.intervention.dwell_ms),
            source,
            host,
            broadcast,
            broadcasting: false,
            events: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> &SessionMachine {
        &self.session
    }

    pub fn poller(&self) -> &ForegroundPoller {
        &self.poller
    }

    pub fn detector(&self) -> &DistractionDetector {
        &self.detector
    }

    pub fn dispatcher(&self) -> &InterventionDispatcher {
        &self.dispatcher
    }

    pub fn source(&self) -> &A {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut A {
        &mut self.source
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn broadcast(&self) -> &B {
        &self.broadcast
    }

    pub fn scheduler(&self) -> &TimerQueue<C> {
        &self.queue
    }

    pub fn now_ms(&self) -> u64 {
        self.queue.now_ms()
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.queue.next_due_ms()
    }

    pub fn snapshot(&self) -> Event {
        self.session.snapshot(self.now_ms())
    }

    /// Events produced since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) {
        let event = self.session.start(&mut self.queue);
        self.record(event);
        self.sync_session();
    }

    pub fn pause(&mut self) {
        let event = self.session.pause(&mut self.queue);
        self.record(event);
        self.sync_session();
    }

    pub fn reset(&mut self) {
        let event = self.session.reset(&mut self.queue);
        self.record(event);
        self.sync_session();
    }

    pub fn switch_mode(&mut self, kind: ModeKind) {
        let event = self.session.switch_mode(kind, &mut self.queue);
        self.record(event);
        self.sync_session();
    }

    pub fn set_timer_duration(&mut self, secs: u64) -> Result<()> {
        self.session.set_timer_duration(secs)?;
        Ok(())
    }

    pub fn set_focus_minutes(&mut self, minutes: u32) {
        self.session.set_focus_minutes(minutes);
    }

    pub fn set_break_minutes(&mut self, minutes: u32) {
        self.session.set_break_minutes(minutes);
    }

    /// Route one wakeup to its owner.
    pub fn handle_wakeup(&mut self, wakeup: Wakeup) {
        match wakeup {
            Wakeup::SessionTick { generation } => {
                let event = self.session.on_tick(generation, &mut self.queue);
                if event.is_some() {
                    self.record(event);
                    self.sync_session();
                }
            }
            Wakeup::Poll { generation } => {
                let switches = self
                    .poller
                    .on_poll(generation, &mut self.source, &mut self.queue);
                for switch in switches {
                    self.on_app_switch(&switch);
                }
            }
            Wakeup::InterventionDwell { generation } => {
                if let Some(channel) = self.dispatcher.on_dwell(generation, &mut self.host) {
                    let at = timestamp(self.now_ms());
                    self.events.push(Event::InterventionFinished { channel, at });
                }
            }
        }
    }

    /// Run every wakeup that is due at the clock's current time.
    pub fn run_due(&mut self) -> usize {
        let mut handled = 0;
        while let Some(wakeup) = self.queue.pop_due() {
            self.handle_wakeup(wakeup);
            handled += 1;
        }
        handled
    }

    /// Stop the session and everything it keeps alive.
    pub fn shutdown(&mut self) {
        let event = self.session.pause(&mut self.queue);
        self.record(event);
        self.sync_session();
        if self.poller.stop(&mut self.queue) {
            let at = timestamp(self.now_ms());
            self.events.push(Event::MonitorStopped { at });
        }
        self.dispatcher.shutdown(&mut self.host, &mut self.queue);
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn record(&mut self, event: Option<Event>) {
        if let Some(event) = event {
            self.events.push(event);
        }
    }

    fn on_app_switch(&mut self, switch: &AppSwitchEvent) {
        let focus = self.session.focus_snapshot();
        let now = self.now_ms();
        let Some(trigger) = self.detector.on_event(switch, &focus, now) else {
            return;
        };
        let at = timestamp(trigger.at_ms);
        self.events.push(Event::DistractionDetected {
            package: trigger.package.clone(),
            at,
        });
        if let Some(channel) = self
            .dispatcher
            .dispatch(&trigger, &mut self.host, &mut self.queue)
        {
            self.events.push(Event::InterventionShown {
                channel,
                title: trigger.title,
                text: trigger.text,
                at,
            });
        }
    }

    /// Push the session's display to the broadcast and start or stop the
    /// monitor to match.
    fn sync_session(&mut self) {
        let at = timestamp(self.now_ms());
        if self.session.is_running() {
            let focus = self.session.focus_snapshot();
            self.broadcast
                .start_session(focus.mode, &focus.title, &focus.text, focus.is_focus_active);
            self.broadcasting = true;
            if self.poller.start(&mut self.queue) {
                tracing::info!("distraction monitor started");
                self.events.push(Event::MonitorStarted { at });
            }
        } else if self.broadcasting {
            self.broadcast.stop_session();
            self.broadcasting = false;
            if self.poller.stop(&mut self.queue) {
                tracing::info!("distraction monitor stopped");
                self.events.push(Event::MonitorStopped { at });
            }
        }
    }
}

impl<A, H, B> FocusApp<ManualClock, A, H, B>
where
    A: ActivitySource,
    H: OverlayHost,
    B: SessionBroadcast,
{
    /// Move the virtual clock to `target_ms`, firing every wakeup due on the
    /// way at its own due time.
    pub fn advance_to(&mut self, target_ms: u64) {
        while let Some(due) = self.queue.next_due_ms() {
            if due > target_ms {
                break;
            }
            self.queue.clock_mut().set(due);
            self.run_due();
        }
        self.queue.clock_mut().set(target_ms);
    }

    pub fn advance_by(&mut self, ms: u64) {
        let target = self.now_ms().saturating_add(ms);
        self.advance_to(target);
    }
}
