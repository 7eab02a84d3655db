//! Security event logging with unconditional redaction.
//!
//! # Responsibilities
//! - Record authorization failures and privileged mutations as structured
//!   tracing events
//! - Redact sensitive values (recursively, by key-name substring) before any
//!   emission decision is made
//!
//! # Design Decisions
//! - Redaction always runs, even when emission is disabled, so no code path
//!   can ever log unredacted details
//! - Capture mode keeps redacted events in memory for test assertions

use std::sync::Mutex;

use serde_json::Value;

/// Marker written over redacted values.
pub const REDACTED: &str = "[REDACTED]";

/// Key-name substrings whose values are never emitted.
const SENSITIVE_TERMS: &[&str] = &[
    "password",
    "token",
    "secret",
    "key",
    "authorization",
    "cookie",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

/// One recorded security event, post-redaction.
#[derive(Debug, Clone)]
pub struct SecurityEvent {
    pub event: String,
    pub details: Value,
    pub level: EventLevel,
}

/// Redaction-aware sink for security-relevant rejections and privileged
/// mutations.
pub struct SecurityEventLog {
    emit: bool,
    captured: Option<Mutex<Vec<SecurityEvent>>>,
}

impl SecurityEventLog {
    pub fn new(emit: bool) -> Self {
        Self {
            emit,
            captured: None,
        }
    }

    /// Keep redacted events in memory so tests can assert on them.
    pub fn with_capture(emit: bool) -> Self {
        Self {
            emit,
            captured: Some(Mutex::new(Vec::new())),
        }
    }

    /// Record an event. `details` is redacted first, unconditionally; only
    /// then does emission (or capture) happen.
    pub fn log(&self, event: &str, mut details: Value, level: EventLevel) {
        redact(&mut details);

        crate::observability::metrics::record_security_event(event);

        if self.emit {
            match level {
                EventLevel::Info => {
                    tracing::info!(target: "security", event = %event, details = %details, "Security event")
                }
                EventLevel::Warn => {
                    tracing::warn!(target: "security", event = %event, details = %details, "Security event")
                }
                EventLevel::Error => {
                    tracing::error!(target: "security", event = %event, details = %details, "Security event")
                }
            }
        }

        if let Some(captured) = &self.captured {
            captured
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .push(SecurityEvent {
                    event: event.to_string(),
                    details,
                    level,
                });
        }
    }

    /// Snapshot of captured events. Empty unless built with `with_capture`.
    pub fn captured(&self) -> Vec<SecurityEvent> {
        self.captured
            .as_ref()
            .map(|c| c.lock().unwrap_or_else(|p| p.into_inner()).clone())
            .unwrap_or_default()
    }
}

fn is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_TERMS.iter().any(|term| key.contains(term))
}

/// Replace sensitive values in-place, recursing through objects and arrays.
fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if is_sensitive(key) {
                    *val = Value::String(REDACTED.to_string());
                } else {
                    redact(val);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                redact(item);
            }
        }
        _ => {}
    }
}
