//! Traits for the systems the engine reads from
//!
//! Definitions, constraint implementations and the rule configuration are
//! owned outside the engine; these traits are the seams it consumes them
//! through.

use dataquality_core::{ClassRules, Definition, DefinitionKind, EngineError};
use serde_json::Value;
use std::sync::Arc;

/// Errors that can occur when fetching definitions
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("Definition not found: {kind} {name}")]
    NotFound { kind: DefinitionKind, name: String },

    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Errors a constraint implementation reports instead of a verdict
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConstraintError {
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Unsupported value: {0}")]
    UnsupportedValue(String),
}

/// Source of class, objectbrick and fieldcollection definitions
///
/// Fetching may perform I/O and block; the engine caches every definition it
/// resolves.
pub trait DefinitionProvider: Send + Sync {
    /// Provider name, for logs
    fn name(&self) -> &'static str;

    /// Fetch one definition
    fn definition(&self, kind: DefinitionKind, name: &str) -> Result<Definition, CatalogError>;
}

/// A named constraint implementation
pub trait Validator: Send + Sync {
    /// Check one value; returns one reason per violation, empty when the value passes
    fn validate(&self, value: &Value, params: &Value) -> Result<Vec<String>, ConstraintError>;
}

/// Lookup of constraint implementations by name
pub trait ValidatorRegistry: Send + Sync {
    /// Resolve a constraint, failing with [`EngineError::UnknownConstraint`]
    fn resolve(&self, name: &str) -> Result<Arc<dyn Validator>, EngineError>;
}

/// Read side of the rule configuration
pub trait ConfigurationStore: Send + Sync {
    /// Every configured attribute of a class; empty when the class is not configured
    fn rules_for_class(&self, class_name: &str) -> ClassRules;

    /// Whether a class has an entry
    fn is_class_configured(&self, class_name: &str) -> bool;

    /// Whether a class has an entry for `attribute`
    fn is_class_attribute_configured(&self, class_name: &str, attribute: &str) -> bool;
}
