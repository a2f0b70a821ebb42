//! DataQuality Core
//!
//! Core domain model with stable, versioned types: schemas and attribute
//! categories, the rule document, violations and scores, diagnostics and the
//! events reported to the notification sink.
//! Never rename diagnostic codes - they are part of the public API.

pub mod config;
pub mod diagnostic;
pub mod error;
pub mod events;
pub mod object;
pub mod report;
pub mod rules;
pub mod schema;
pub mod violation;

pub use config::{AllowlistRules, ConfigError, EngineConfig, SeverityThreshold};
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use error::EngineError;
pub use events::{
    ConstraintFailureEvent, DiagnosticEvent, Event, InvalidConfigEvent, NotificationSink,
    RecordingSink, TracingSink,
};
pub use object::{ContainerItem, DataObject, FieldValue, JsonObject};
pub use report::{FailedObject, Report, ReportSummary, ReportVersion};
pub use rules::{AttributeConfig, ClassRules, ParamValue, RuleDocument};
pub use schema::{
    base_class_name, split_container_path, Category, Definition, DefinitionKind, FieldDefinition,
    FieldKind, Schema,
};
pub use violation::{Score, ValidationResult, ViolationRecord};
