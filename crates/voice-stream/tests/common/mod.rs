//! Shared test doubles for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chipper_voice::{ErrorKind, Receiver};

/// Ordered log shared between the receiver and transport doubles, so tests
/// can assert the relative order of notifications and transport calls.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.entries().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

/// Receiver that writes `open:<session_id>` and `error:<kind>` entries.
pub struct RecordingReceiver {
    pub log: EventLog,
}

impl RecordingReceiver {
    pub fn new(log: EventLog) -> Arc<Self> {
        Arc::new(Self { log })
    }
}

impl Receiver for RecordingReceiver {
    fn on_stream_open(&self, session_id: &str) {
        self.log.push(format!("open:{session_id}"));
    }

    fn on_error(&self, kind: ErrorKind, _cause: &anyhow::Error) {
        self.log.push(format!("error:{kind}"));
    }
}

/// Extract the session id from the single `open:` entry.
pub fn opened_session(log: &EventLog) -> Option<String> {
    log.entries()
        .iter()
        .find_map(|e| e.strip_prefix("open:").map(str::to_string))
}
