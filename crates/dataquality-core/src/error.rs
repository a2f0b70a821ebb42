//! Engine error taxonomy

use crate::schema::DefinitionKind;

/// Errors raised while resolving definitions, rules, values and constraints
///
/// Only `UnknownClass` aborts the validation of an object. Every other
/// variant is local to one attribute or one value and is reported through the
/// notification sink and the result diagnostics instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Unknown {kind} definition: {name}")]
    UnknownClass { kind: DefinitionKind, name: String },

    #[error("Unknown constraint: {0}")]
    UnknownConstraint(String),

    #[error("Invalid rule configuration: {0}")]
    ConfigParse(String),

    #[error("Cannot resolve value of '{path}': {reason}")]
    ValueResolution { path: String, reason: String },

    #[error("Constraint '{constraint}' failed on '{path}': {reason}")]
    ConstraintEvaluation {
        path: String,
        constraint: String,
        reason: String,
    },
}

impl EngineError {
    /// Unknown top-level class
    pub fn unknown_class(name: impl Into<String>) -> Self {
        Self::UnknownClass {
            kind: DefinitionKind::Class,
            name: name.into(),
        }
    }
}
