//! Foreground-session broadcast.
//!
//! The shell turns these calls into a persistent indicator (status
//! notification, tray title) and keeps the process alive while a session is
//! active.

use serde::{Deserialize, Serialize};

use crate::session::Mode;

pub trait SessionBroadcast {
    /// Called on every start, tick and phase change of a running session.
    fn start_session(&mut self, mode: Mode, title: &str, text: &str, is_focus_active: bool);

    /// Called once when the session stops running.
    fn stop_session(&mut self);
}

/// Broadcast that goes nowhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBroadcast;

impl SessionBroadcast for NullBroadcast {
    fn start_session(&mut self, _mode: Mode, _title: &str, _text: &str, _is_focus_active: bool) {}

    fn stop_session(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum BroadcastCall {
    Start {
        mode: Mode,
        title: String,
        text: String,
        is_focus_active: bool,
    },
    Stop,
}

/// Keeps every broadcast for inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingBroadcast {
    calls: Vec<BroadcastCall>,
}

impl RecordingBroadcast {
    pub fn calls(&self) -> &[BroadcastCall] {
        &self.calls
    }

    pub fn last(&self) -> Option<&BroadcastCall> {
        self.calls.last()
    }

    pub fn stops(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, BroadcastCall::Stop))
            .count()
    }
}

impl SessionBroadcast for RecordingBroadcast {
    fn start_session(&mut self, mode: Mode, title: &str, text: &str, is_focus_active: bool) {
        self.calls.push(BroadcastCall::Start {
            mode,
            title: title.into(),
            text: text.into(),
            is_focus_active,
        });
    }

    fn stop_session(&mut self) {
        self.calls.push(BroadcastCall::Stop);
    }
}
