use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ActivityError, Result};

/// Kind of activity-switch event reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// An activity came to the foreground.
    Resumed,
    Paused,
    Stopped,
    #[serde(other)]
    Other,
}

/// One raw event from the host's usage log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub package: String,
    pub timestamp_ms: u64,
    #[serde(default = "default_kind")]
    pub kind: ActivityKind,
}

fn default_kind() -> ActivityKind {
    ActivityKind::Resumed
}

impl ActivityEvent {
    pub fn resumed(package: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            package: package.into(),
            timestamp_ms,
            kind: ActivityKind::Resumed,
        }
    }
}

/// Host query for app-switch events.
pub trait ActivitySource {
    /// Whether the host lets us read the usage log at all.
    fn has_usage_access(&self) -> bool {
        true
    }

    /// Events with `from_ms <= timestamp <= to_ms`, in the order the host
    /// reports them.
    fn query_events(&mut self, from_ms: u64, to_ms: u64) -> Result<Vec<ActivityEvent>, ActivityError>;
}

/// In-memory usage log. Backs tests, the simulator and the CLI's event
/// files.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    events: Vec<ActivityEvent>,
    usage_access: bool,
    queries: usize,
}

impl ScriptedSource {
    pub fn new(mut events: Vec<ActivityEvent>) -> Self {
        events.sort_by_key(|e| e.timestamp_ms);
        Self {
            events,
            usage_access: true,
            queries: 0,
        }
    }

    /// Parse one JSON object per line; blank lines and `#` comments are skipped.
    ///
    /// ```text
    /// {"package": "com.instagram.android", "timestamp_ms": 5000}
    /// {"package": "com.example.notes", "timestamp_ms": 9000, "kind": "paused"}
    /// ```
    pub fn from_json_lines(text: &str) -> Result<Self, ActivityError> {
        let events = text
            .lines()
            .enumerate()
            .filter(|(_, line)| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with('#')
            })
            .map(|(i, line)| {
                serde_json::from_str::<ActivityEvent>(line).map_err(|e| ActivityError::Malformed {
                    line: i + 1,
                    message: e.to_string(),
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::new(events))
    }

    /// Read a JSON-lines feed from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_json_lines(&text)?)
    }

    pub fn with_usage_access(mut self, granted: bool) -> Self {
        self.usage_access = granted;
        self
    }

    /// Shift every timestamp by `base_ms`, turning offsets into absolute times.
    pub fn offset_by(mut self, base_ms: u64) -> Self {
        for event in &mut self.events {
            event.timestamp_ms = event.timestamp_ms.saturating_add(base_ms);
        }
        self
    }

    pub fn push(&mut self, event: ActivityEvent) {
        let at = self
            .events
            .partition_point(|e| e.timestamp_ms <= event.timestamp_ms);
        self.events.insert(at, event);
    }

    pub fn events(&self) -> &[ActivityEvent] {
        &self.events
    }

    /// Number of queries answered so far.
    pub fn queries(&self) -> usize {
        self.queries
    }
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ActivitySource for ScriptedSource {
    fn has_usage_access(&self) -> bool {
        self.usage_access
    }

    fn query_events(&mut self, from_ms: u64, to_ms: u64) -> Result<Vec<ActivityEvent>, ActivityError> {
        if !self.usage_access {
            return Err(ActivityError::PermissionDenied);
        }
        self.queries += 1;
        Ok(self
            .events
            .iter()
            .filter(|e| (from_ms..=to_ms).contains(&e.timestamp_ms))
            .cloned()
            .collect())
    }
}
