//! Batch report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use crate::diagnostic::{Diagnostic, Severity};
use crate::violation::ValidationResult;
use serde::{Deserialize, Serialize};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// An object whose validation was aborted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedObject {
    pub object_id: String,
    pub class_name: String,
    pub error: String,
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Objects with a validation result
    pub objects_validated: usize,

    /// Objects whose validation was aborted
    pub objects_failed: usize,

    /// Objects without any violation
    pub fully_compliant: usize,

    /// Total number of violations
    pub violations: usize,

    /// Mean score ratio over validated objects
    pub mean_score: Option<f64>,

    /// Number of error diagnostics
    pub errors: usize,

    /// Number of warning diagnostics
    pub warnings: usize,
}

/// Validation report for a batch of objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Summary statistics
    pub summary: ReportSummary,

    /// Per-object results
    pub results: Vec<ValidationResult>,

    /// Objects that could not be validated
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailedObject>,
}

impl Report {
    /// Create a new empty report
    pub fn new() -> Self {
        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary: ReportSummary::default(),
            results: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Add a validation result
    pub fn add_result(&mut self, result: ValidationResult) {
        self.summary.objects_validated += 1;
        self.summary.violations += result.violation_count();
        if result.is_valid() {
            self.summary.fully_compliant += 1;
        }
        for diagnostic in &result.diagnostics {
            match diagnostic.severity {
                Severity::Error => self.summary.errors += 1,
                Severity::Warn => self.summary.warnings += 1,
                Severity::Info => {}
            }
        }

        self.results.push(result);
        self.summary.mean_score = mean_score(&self.results);
    }

    /// Add an aborted object
    pub fn add_failure(&mut self, failure: FailedObject) {
        self.summary.objects_failed += 1;
        self.failures.push(failure);
    }

    /// All diagnostics across results
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.results.iter().flat_map(|result| result.diagnostics.iter())
    }

    /// Results scoring below `min_score`
    pub fn below(&self, min_score: f64) -> Vec<&ValidationResult> {
        self.results
            .iter()
            .filter(|result| result.score.ratio() < min_score)
            .collect()
    }

    /// Check if the report has any errors
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0 || self.summary.objects_failed > 0
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

fn mean_score(results: &[ValidationResult]) -> Option<f64> {
    if results.is_empty() {
        return None;
    }
    let sum: f64 = results.iter().map(|result| result.score.ratio()).sum();
    Some(sum / results.len() as f64)
}
