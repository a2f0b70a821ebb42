//! Violations, scores and per-object validation results

use crate::diagnostic::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One failed constraint on one value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationRecord {
    /// Attribute path the value was read from
    pub attribute_path: String,

    /// Name of the violated constraint
    pub constraint_name: String,

    /// Position in a brick/collection container; absent for single values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_index: Option<usize>,

    /// Human-readable reason
    pub reason: String,
}

/// Fraction of configured attributes without violations
///
/// Kept as a ratio so results compare exactly. An object with no configured
/// attributes is vacuously compliant and scores 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    /// Attributes with zero violations
    pub compliant: usize,

    /// Attributes evaluated
    pub total: usize,
}

impl Score {
    /// Create a score; `compliant` must not exceed `total`
    pub fn new(compliant: usize, total: usize) -> Self {
        debug_assert!(compliant <= total);
        Self { compliant, total }
    }

    /// Score of an object with nothing to check
    pub fn vacuous() -> Self {
        Self::new(0, 0)
    }

    /// Score as a value in `[0, 1]`
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.compliant as f64 / self.total as f64
    }

    /// Whether every evaluated attribute is free of violations
    pub fn is_perfect(&self) -> bool {
        self.compliant == self.total
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.compliant, self.total)
    }
}

/// Outcome of validating one object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Identity of the validated object
    pub object_id: String,

    /// Base class name of the object
    pub class_name: String,

    /// Violations per evaluated attribute path; passing paths map to an empty list
    pub violations_by_path: BTreeMap<String, Vec<ViolationRecord>>,

    /// Aggregate score
    pub score: Score,

    /// Non-fatal conditions observed while validating
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Result for an object with nothing configured
    pub fn empty(object_id: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            class_name: class_name.into(),
            violations_by_path: BTreeMap::new(),
            score: Score::vacuous(),
            diagnostics: Vec::new(),
        }
    }

    /// Record the outcome of one evaluated attribute
    pub fn record(&mut self, path: impl Into<String>, violations: Vec<ViolationRecord>) {
        self.violations_by_path.insert(path.into(), violations);
    }

    /// Recompute the score from the recorded attributes
    pub fn finalize_score(&mut self) {
        let total = self.violations_by_path.len();
        let compliant = self
            .violations_by_path
            .values()
            .filter(|violations| violations.is_empty())
            .count();
        self.score = Score::new(compliant, total);
    }

    /// Violations recorded for a path
    pub fn violations(&self, path: &str) -> &[ViolationRecord] {
        self.violations_by_path
            .get(path)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of violations
    pub fn violation_count(&self) -> usize {
        self.violations_by_path.values().map(Vec::len).sum()
    }

    /// Whether no violation was found
    pub fn is_valid(&self) -> bool {
        self.violation_count() == 0
    }
}
