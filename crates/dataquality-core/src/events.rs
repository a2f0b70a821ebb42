//! Notification sink and the events the engine reports through it

use crate::diagnostic::Diagnostic;
use crate::error::EngineError;
use crate::violation::ViolationRecord;
use serde::Serialize;
use std::sync::Mutex;

/// A constraint could not be evaluated for one value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintFailureEvent {
    /// What went wrong
    #[serde(serialize_with = "serialize_error")]
    pub error: EngineError,

    /// Object being validated
    pub object_id: String,

    /// Attribute being evaluated
    pub attribute_path: String,

    /// Violations collected for the attribute before the failure
    pub partial_violations: Vec<ViolationRecord>,
}

/// The rule store could not be read or is not a mapping
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidConfigEvent {
    /// Parse or shape error
    pub reason: String,
}

/// An attribute was skipped or only partly resolved
///
/// The same diagnostic is also part of the object's validation result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticEvent {
    /// Object being validated
    pub object_id: String,

    pub diagnostic: Diagnostic,
}

/// Everything the engine reports to the sink
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    ConstraintFailure(ConstraintFailureEvent),
    InvalidConfig(InvalidConfigEvent),
    Diagnostic(DiagnosticEvent),
}

/// Receiver of non-fatal failures
pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: Event);
}

/// Sink that forwards every event to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, event: Event) {
        match event {
            Event::ConstraintFailure(failure) => tracing::warn!(
                object_id = %failure.object_id,
                attribute = %failure.attribute_path,
                partial_violations = failure.partial_violations.len(),
                "constraint failure: {}",
                failure.error
            ),
            Event::InvalidConfig(invalid) => {
                tracing::warn!("invalid rule configuration: {}", invalid.reason)
            }
            Event::Diagnostic(event) => tracing::info!(
                object_id = %event.object_id,
                code = %event.diagnostic.code,
                "{}",
                event.diagnostic.message
            ),
        }
    }
}

/// Sink that keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Recorded constraint failures
    pub fn constraint_failures(&self) -> Vec<ConstraintFailureEvent> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::ConstraintFailure(failure) => Some(failure),
                _ => None,
            })
            .collect()
    }

    /// Recorded attribute diagnostics
    pub fn diagnostics(&self) -> Vec<DiagnosticEvent> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Diagnostic(diagnostic) => Some(diagnostic),
                _ => None,
            })
            .collect()
    }

    /// Number of invalid-config events
    pub fn invalid_config_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, Event::InvalidConfig(_)))
            .count()
    }

    /// Forget every recorded event
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, event: Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

fn serialize_error<S: serde::Serializer>(error: &EngineError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&error.to_string())
}
