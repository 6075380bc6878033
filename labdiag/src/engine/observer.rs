//! Diagnostic events emitted while validating and evaluating rules.
//!
//! The engine never writes to a log backend directly. It hands typed events
//! to an injected [`DiagnosticObserver`]; [`TracingObserver`] forwards them to
//! `tracing`, [`RecordingObserver`] keeps them for inspection.

use serde::Serialize;
use std::fmt;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DiagnosticEvent {
    /// A rule failed structural validation and was excluded from evaluation.
    RuleSkipped {
        rule_id: Option<String>,
        errors: Vec<String>,
    },
    /// A condition reached evaluation despite being structurally invalid.
    InvalidCondition {
        rule_id: Option<String>,
        condition_id: Option<String>,
        defect: String,
    },
    /// A condition whose type is outside the known vocabulary.
    UnsupportedCondition { rule_id: Option<String> },
    /// A resolved sample was NaN, infinite or beyond the safety bound.
    UnsafeValue {
        rule_id: Option<String>,
        condition_id: String,
        value: f64,
    },
    /// A threshold or range on the condition itself cannot be used.
    InvalidThreshold {
        rule_id: Option<String>,
        condition_id: String,
        reason: String,
    },
    /// A measurement reading with no leading number.
    UnparseableReading {
        rule_id: Option<String>,
        condition_id: String,
        raw: String,
    },
}

impl DiagnosticEvent {
    pub fn rule_id(&self) -> Option<&str> {
        match self {
            DiagnosticEvent::RuleSkipped { rule_id, .. }
            | DiagnosticEvent::InvalidCondition { rule_id, .. }
            | DiagnosticEvent::UnsupportedCondition { rule_id }
            | DiagnosticEvent::UnsafeValue { rule_id, .. }
            | DiagnosticEvent::InvalidThreshold { rule_id, .. }
            | DiagnosticEvent::UnparseableReading { rule_id, .. } => rule_id.as_deref(),
        }
    }
}

impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticEvent::RuleSkipped { rule_id, errors } => write!(
                f,
                "Skipping invalid rule {}: {}",
                rule_id.as_deref().unwrap_or("<no id>"),
                errors.join("; ")
            ),
            DiagnosticEvent::InvalidCondition { condition_id, defect, .. } => write!(
                f,
                "Invalid condition {}: {}",
                condition_id.as_deref().unwrap_or("<no id>"),
                defect
            ),
            DiagnosticEvent::UnsupportedCondition { .. } => write!(f, "Unknown condition type"),
            DiagnosticEvent::UnsafeValue { condition_id, value, .. } => {
                write!(f, "Unsafe value {} for condition {}", value, condition_id)
            }
            DiagnosticEvent::InvalidThreshold { condition_id, reason, .. } => {
                write!(f, "Invalid threshold on condition {}: {}", condition_id, reason)
            }
            DiagnosticEvent::UnparseableReading { condition_id, raw, .. } => write!(
                f,
                "Measurement value '{}' is not numeric (condition {})",
                raw, condition_id
            ),
        }
    }
}

pub trait DiagnosticObserver: Send + Sync {
    fn observe(&self, event: &DiagnosticEvent);
}

/// Forwards every event to `tracing` at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl DiagnosticObserver for TracingObserver {
    fn observe(&self, event: &DiagnosticEvent) {
        tracing::warn!(rule_id = event.rule_id().unwrap_or("-"), "{}", event);
    }
}

/// Discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl DiagnosticObserver for NullObserver {
    fn observe(&self, _event: &DiagnosticEvent) {}
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl DiagnosticObserver for RecordingObserver {
    fn observe(&self, event: &DiagnosticEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        observer.observe(&DiagnosticEvent::UnsupportedCondition { rule_id: None });
        observer.observe(&DiagnosticEvent::UnsafeValue {
            rule_id: Some("r1".to_string()),
            condition_id: "c1".to_string(),
            value: f64::INFINITY,
        });

        let events = observer.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].rule_id(), Some("r1"));

        observer.clear();
        assert!(observer.is_empty());
    }

    #[test]
    fn test_event_display() {
        let event = DiagnosticEvent::RuleSkipped {
            rule_id: Some("bad".to_string()),
            errors: vec!["Rule must have a valid name".to_string()],
        };
        assert_eq!(event.to_string(), "Skipping invalid rule bad: Rule must have a valid name");
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = DiagnosticEvent::UnparseableReading {
            rule_id: None,
            condition_id: "c1".to_string(),
            raw: "n/a".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "unparseable_reading");
        assert_eq!(json["raw"], "n/a");
    }
}
