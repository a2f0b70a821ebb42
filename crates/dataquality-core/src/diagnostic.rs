//! Diagnostic codes for non-fatal conditions
//!
//! Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    /// A configured attribute path is not backed by the class schema
    AttributeNotInSchema,

    /// A value could not be read and was treated as absent
    ValueResolutionDegraded,

    /// A configured constraint is not registered
    UnknownConstraint,

    /// A constraint implementation failed while evaluating a value
    ConstraintEvaluationFailed,

    /// The rule store could not be read
    InvalidConfig,

    /// A brick/collection field nested inside a brick/collection was ignored
    NestedContainerIgnored,

    /// Two schema fields flatten to the same attribute path
    DuplicateAttributePath,
}

impl DiagnosticCode {
    /// Stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AttributeNotInSchema => "ATTRIBUTE_NOT_IN_SCHEMA",
            Self::ValueResolutionDegraded => "VALUE_RESOLUTION_DEGRADED",
            Self::UnknownConstraint => "UNKNOWN_CONSTRAINT",
            Self::ConstraintEvaluationFailed => "CONSTRAINT_EVALUATION_FAILED",
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::NestedContainerIgnored => "NESTED_CONTAINER_IGNORED",
            Self::DuplicateAttributePath => "DUPLICATE_ATTRIBUTE_PATH",
        }
    }

    /// Severity used unless configuration overrides it
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::AttributeNotInSchema
            | Self::UnknownConstraint
            | Self::ConstraintEvaluationFailed
            | Self::InvalidConfig => Severity::Error,
            Self::ValueResolutionDegraded | Self::DuplicateAttributePath => Severity::Warn,
            Self::NestedContainerIgnored => Severity::Info,
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Class the diagnostic refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    /// Attribute path the diagnostic refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,

    /// Constraint the diagnostic refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic with the code's default severity
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: code.default_severity(),
            message: message.into(),
            class_name: None,
            attribute: None,
            constraint: None,
        }
    }

    /// Set the severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Set the class
    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Set the attribute path
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Set the constraint name
    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }
}
