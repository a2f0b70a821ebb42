//! Engine configuration (`dataquality.toml`)
//!
//! ```toml
//! enabled = true
//! rules_file = "constraints.yml"
//! definitions_dir = "definitions"
//! min_score = 0.8
//!
//! [allowlist]
//! skip_classes = ["Legacy*"]
//!
//! [severity.overrides]
//! VALUE_RESOLUTION_DEGRADED = "error"
//! ```
//!
//! Relative paths resolve against the directory holding the file.

use crate::diagnostic::{DiagnosticCode, Severity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "dataquality.toml";

/// Per-code severity overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeverityThreshold {
    /// Diagnostic code (as in [`DiagnosticCode::as_str`]) to severity
    #[serde(default)]
    pub overrides: HashMap<String, Severity>,
}

impl SeverityThreshold {
    /// Configured severity of `code`, its default when not overridden
    pub fn severity_of(&self, code: DiagnosticCode) -> Severity {
        match self.overrides.get(code.as_str()) {
            Some(severity) => *severity,
            None => code.default_severity(),
        }
    }

    pub fn set_override(&mut self, code: DiagnosticCode, severity: Severity) {
        self.overrides.insert(code.as_str().to_owned(), severity);
    }
}

/// Classes left out of batch runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllowlistRules {
    /// Class names; `*` matches any run of characters
    #[serde(default)]
    pub skip_classes: Vec<String>,
}

impl AllowlistRules {
    pub fn is_class_skipped(&self, class_name: &str) -> bool {
        self.skip_classes
            .iter()
            .any(|pattern| glob_match(pattern, class_name))
    }
}

/// Contents of `dataquality.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Whether validation runs at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Rule store file (YAML)
    #[serde(default = "default_rules_file")]
    pub rules_file: PathBuf,

    /// Directory holding class/objectbrick/fieldcollection definitions
    #[serde(default = "default_definitions_dir")]
    pub definitions_dir: PathBuf,

    /// Objects scoring below this ratio fail the CLI run
    #[serde(default)]
    pub min_score: Option<f64>,

    #[serde(default)]
    pub allowlist: AllowlistRules,

    #[serde(default)]
    pub severity: SeverityThreshold,

    /// Base for relative paths; the config file's directory
    #[serde(skip)]
    pub project_root: PathBuf,
}

fn default_enabled() -> bool {
    true
}

fn default_rules_file() -> PathBuf {
    PathBuf::from("constraints.yml")
}

fn default_definitions_dir() -> PathBuf {
    PathBuf::from("definitions")
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            rules_file: default_rules_file(),
            definitions_dir: default_definitions_dir(),
            min_score: None,
            allowlist: AllowlistRules::default(),
            severity: SeverityThreshold::default(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl EngineConfig {
    /// Read and validate a config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config = Self::from_toml(&contents)?;
        config.project_root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    /// Parse and validate config text
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;

        match config.min_score {
            Some(min) if !(0.0..=1.0).contains(&min) => Err(ConfigError::Invalid(format!(
                "min_score must be within [0, 1], got {}",
                min
            ))),
            _ => Ok(config),
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, text).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Rule store path, relative to the project root
    pub fn rules_path(&self) -> PathBuf {
        self.project_root.join(&self.rules_file)
    }

    /// Definitions directory, relative to the project root
    pub fn definitions_path(&self) -> PathBuf {
        self.project_root.join(&self.definitions_dir)
    }
}

/// Match `text` against a pattern where `*` stands for any run of characters
fn glob_match(pattern: &str, text: &str) -> bool {
    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };

    let middle: Vec<&str> = parts.collect();
    let Some((last, middle)) = middle.split_last() else {
        // No `*` at all
        return rest.is_empty();
    };

    for part in middle {
        match rest.find(part) {
            Some(at) => rest = &rest[at + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

/// Errors loading or saving the engine config
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Invalid config syntax: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
