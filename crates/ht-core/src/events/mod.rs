//! Progress event emission.
//!
//! Lightweight, structured progress events for CLI consumers. The sweep
//! reports after every completed step; the generator reports as it writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;

/// Standard progress event names.
pub mod event_names {
    pub const SWEEP_STARTED: &str = "sweep_started";
    pub const SWEEP_STEP_COMPLETE: &str = "sweep_step_complete";
    pub const SWEEP_COMPLETE: &str = "sweep_complete";

    pub const GENERATE_STARTED: &str = "generate_started";
    pub const GENERATE_PROGRESS: &str = "generate_progress";
    pub const GENERATE_COMPLETE: &str = "generate_complete";
}

/// High-level pipeline phase for a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Sweep,
    Generate,
}

/// Progress counters for a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// Structured progress event for CLI consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub event: String,
    pub timestamp: DateTime<Utc>,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, Value>,
}

impl ProgressEvent {
    pub fn new(event: impl Into<String>, phase: Phase) -> Self {
        Self {
            event: event.into(),
            timestamp: Utc::now(),
            phase,
            progress: None,
            elapsed_ms: None,
            details: HashMap::new(),
        }
    }

    pub fn with_progress(mut self, current: u64, total: Option<u64>) -> Self {
        self.progress = Some(Progress { current, total });
        self
    }

    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = Some(elapsed_ms);
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.details.insert(key.into(), v);
        }
        self
    }

    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"error":"serialization_failed","event":"{}"}}"#,
                self.event
            )
        })
    }
}

/// Sink for progress events. Shared across sweep worker threads.
pub trait ProgressEmitter: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// JSONL writer for progress events (CLI-friendly).
pub struct JsonlWriter<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonlWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consume the writer and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> ProgressEmitter for JsonlWriter<W> {
    fn emit(&self, event: ProgressEvent) {
        let line = event.to_jsonl();
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
        }
    }
}

/// Emitter that keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingEmitter {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far, in arrival order.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl ProgressEmitter for CollectingEmitter {
    fn emit(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_event_jsonl() {
        let event = ProgressEvent::new(event_names::SWEEP_STEP_COMPLETE, Phase::Sweep)
            .with_progress(3, Some(10))
            .with_elapsed_ms(5)
            .with_detail("m", 5);
        let json = event.to_jsonl();
        assert!(json.contains(r#""event":"sweep_step_complete""#));
        assert!(json.contains(r#""phase":"sweep""#));
        assert!(json.contains(r#""current":3"#));
        assert!(json.contains(r#""m":5"#));
    }

    #[test]
    fn test_jsonl_writer_one_line_per_event() {
        let writer = JsonlWriter::new(Vec::new());
        writer.emit(ProgressEvent::new(event_names::SWEEP_STARTED, Phase::Sweep));
        writer.emit(ProgressEvent::new(event_names::SWEEP_COMPLETE, Phase::Sweep));
        let bytes = writer.into_inner();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let parsed: ProgressEvent = serde_json::from_str(line).unwrap();
            assert_eq!(parsed.phase, Phase::Sweep);
        }
    }

    #[test]
    fn test_collecting_emitter_keeps_order() {
        let emitter = CollectingEmitter::new();
        for i in 0..3 {
            emitter.emit(
                ProgressEvent::new(event_names::GENERATE_PROGRESS, Phase::Generate)
                    .with_progress(i, Some(3)),
            );
        }
        let events = emitter.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].progress.unwrap().current, 2);
    }
}
