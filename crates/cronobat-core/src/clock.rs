//! Cooperative scheduler.
//!
//! Nothing here spawns threads or sleeps. Components ask the [`Scheduler`] to
//! deliver a [`Wakeup`] after a delay; the owner of the queue (the
//! [`FocusApp`](crate::FocusApp)) pops due wakeups and routes them back to the
//! component that asked. The clock source is pluggable so tests can drive a
//! [`ManualClock`] millisecond by millisecond while the CLI uses
//! [`SystemClock`].
//!
//! Every wakeup carries the generation of the subscription that scheduled it.
//! Cancelling removes the entry from the queue, and a receiver that has moved
//! on to a newer generation rejects anything older that still slips through.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A source of "now" in epoch milliseconds.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Hand-driven clock for deterministic runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualClock {
    now_ms: u64,
}

impl ManualClock {
    pub fn starting_at(now_ms: u64) -> Self {
        Self { now_ms }
    }

    /// Moves the clock to `now_ms`. Time never runs backwards.
    pub fn set(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }
}

/// What a scheduled task should do when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wakeup {
    /// One-second display tick for the running session.
    SessionTick { generation: u64 },
    /// Foreground activity poll.
    Poll { generation: u64 },
    /// End of the intervention dwell.
    InterventionDwell { generation: u64 },
}

/// Opaque handle returned by [`Scheduler::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

/// Schedule/cancel interface injected into the session machine, the poller
/// and the dispatcher.
pub trait Scheduler {
    fn now_ms(&self) -> u64;

    /// Deliver `wakeup` once, `after_ms` from now.
    fn schedule(&mut self, after_ms: u64, wakeup: Wakeup) -> TaskHandle;

    /// Drop a pending task. Returns false if it already fired or never existed.
    fn cancel(&mut self, handle: TaskHandle) -> bool;
}

#[derive(Debug)]
struct Entry {
    due_ms: u64,
    seq: u64,
    wakeup: Wakeup,
}

// Min-heap on (due, insertion order).
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_ms
            .cmp(&self.due_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for Entry {}

/// Single-threaded timer queue over a [`Clock`].
#[derive(Debug)]
pub struct TimerQueue<C> {
    clock: C,
    entries: BinaryHeap<Entry>,
    next_seq: u64,
}

impl<C: Clock> TimerQueue<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            entries: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Due time of the earliest pending task.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.entries.peek().map(|e| e.due_ms)
    }

    /// Pops the earliest task whose due time has passed.
    pub fn pop_due(&mut self) -> Option<Wakeup> {
        let now = self.clock.now_ms();
        if self.entries.peek()?.due_ms > now {
            return None;
        }
        self.entries.pop().map(|e| e.wakeup)
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C: Clock> Scheduler for TimerQueue<C> {
    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn schedule(&mut self, after_ms: u64, wakeup: Wakeup) -> TaskHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry {
            due_ms: self.clock.now_ms().saturating_add(after_ms),
            seq,
            wakeup,
        });
        TaskHandle(seq)
    }

    fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.seq != handle.0);
        self.entries.len() != before
    }
}
