//! Trace records and the observability collaborator contract.
//!
//! Every state update emits one [`StyleTrace`]: the event digest, the
//! resulting affect snapshot, the synthesized profile, the active policy
//! hints, and human-readable deltas against the previous profile. Traces
//! are handed to a [`TraceSink`] outside the engine's critical section;
//! the core never reads them back.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use uuid::Uuid;

use crate::affect::AffectSnapshot;
use crate::boundary::PolicyHint;
use crate::style::{Mode, StyleProfile};

/// Compact event echo carried inside a trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDigest {
    pub kind: String,
    pub intensity: f64,
}

/// One emitted observation of a state update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleTrace {
    pub id: Uuid,
    pub ts: DateTime<Utc>,
    pub event: EventDigest,
    pub affect: AffectSnapshot,
    pub mode: Mode,
    pub profile: StyleProfile,
    pub hints: Vec<PolicyHint>,
    pub stability: f64,
    /// Signed tone/stance changes against the previous profile ("+0.12").
    pub style_delta: BTreeMap<String, String>,
    /// Signed decoding changes against the previous profile.
    pub decoding_delta: BTreeMap<String, String>,
}

impl StyleTrace {
    /// Human-readable deltas between two profiles.
    pub fn deltas(
        previous: &StyleProfile,
        next: &StyleProfile,
    ) -> (BTreeMap<String, String>, BTreeMap<String, String>) {
        let mut style = BTreeMap::new();
        for (name, prev, cur) in [
            ("warmth", previous.tone.warmth, next.tone.warmth),
            ("formality", previous.tone.formality, next.tone.formality),
            ("humor", previous.tone.humor, next.tone.humor),
            (
                "assertiveness",
                previous.stance.assertiveness,
                next.stance.assertiveness,
            ),
        ] {
            style.insert(name.to_string(), format!("{:+.2}", cur - prev));
        }
        let mut decoding = BTreeMap::new();
        decoding.insert(
            "temperature".to_string(),
            format!(
                "{:+.2}",
                next.decoding.temperature - previous.decoding.temperature
            ),
        );
        decoding.insert(
            "max_tokens".to_string(),
            format!(
                "{:+}",
                next.decoding.max_tokens as i64 - previous.decoding.max_tokens as i64
            ),
        );
        (style, decoding)
    }
}

// ---------------------------------------------------------------------------
// Sink contract
// ---------------------------------------------------------------------------

/// Collaborator contract for durable trace storage. Fire-and-forget: the
/// core never requires a read path.
pub trait TraceSink: Send + Sync {
    fn store(&self, key: &str, value: Value);
}

/// Discards everything. The default sink.
#[derive(Debug, Default)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn store(&self, _key: &str, _value: Value) {}
}

/// Bounded in-memory ring of stored traces, for tests and demos.
#[derive(Debug)]
pub struct MemorySink {
    entries: Mutex<VecDeque<(String, Value)>>,
    capacity: usize,
}

impl MemorySink {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn entries(&self) -> Vec<(String, Value)> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl TraceSink for MemorySink {
    fn store(&self, key: &str, value: Value) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back((key.to_string(), value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_sink_is_bounded() {
        let sink = MemorySink::new(3);
        for i in 0..5 {
            sink.store(&format!("trace:{i}"), json!({ "i": i }));
        }
        let entries = sink.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].0, "trace:2");
        assert_eq!(entries[2].0, "trace:4");
    }

    #[test]
    fn test_null_sink_accepts_anything() {
        NullSink.store("key", json!({"anything": true}));
    }
}
