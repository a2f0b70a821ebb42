//! Rule stores
//!
//! [`YamlRuleStore`] persists the rule document as a YAML file. Every read
//! parses the file afresh; a file that cannot be parsed or is not a mapping is
//! treated as an empty configuration and reported once per read through the
//! notification sink. Every write is a full read-modify-write of the file and
//! is skipped when it would not change the document. Writes refuse to replace
//! a malformed file but do fill an empty one.
//!
//! [`MemoryRuleStore`] holds the document in memory.

use crate::adapter::ConfigurationStore;
use dataquality_core::{
    AttributeConfig, ClassRules, EngineError, Event, InvalidConfigEvent, NotificationSink,
    ParamValue, RuleDocument,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

/// Errors that can occur when writing the rule store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    /// The stored file is malformed; it is left untouched
    #[error("Refusing to overwrite unreadable rule store: {0}")]
    Unreadable(#[from] EngineError),
}

/// YAML file backed rule store
pub struct YamlRuleStore {
    path: PathBuf,
    sink: Arc<dyn NotificationSink>,

    /// Serializes read-modify-write cycles within the process
    write_lock: Mutex<()>,
}

impl YamlRuleStore {
    pub fn new(path: impl Into<PathBuf>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            path: path.into(),
            sink,
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the YAML file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the file
    ///
    /// A missing file is an empty store. Anything unreadable or not a mapping
    /// is a [`EngineError::ConfigParse`].
    pub fn try_read(&self) -> Result<RuleDocument, EngineError> {
        RuleDocument::from_value(self.parse()?)
    }

    /// Like [`try_read`](Self::try_read), but an empty or comment-only file
    /// reads as an empty document
    fn try_read_for_write(&self) -> Result<RuleDocument, EngineError> {
        match self.parse()? {
            serde_json::Value::Null => Ok(RuleDocument::new()),
            value => RuleDocument::from_value(value),
        }
    }

    fn parse(&self) -> Result<serde_json::Value, EngineError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(serde_json::Value::Object(serde_json::Map::new()))
            }
            Err(e) => {
                return Err(EngineError::ConfigParse(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        serde_yaml::from_str(&contents)
            .map_err(|e| EngineError::ConfigParse(format!("{}: {}", self.path.display(), e)))
    }

    /// Current document; empty (and reported) when the file is malformed
    pub fn read(&self) -> RuleDocument {
        match self.try_read() {
            Ok(document) => document,
            Err(error) => {
                self.report_invalid(&error);
                RuleDocument::new()
            }
        }
    }

    /// Names of all configured classes
    pub fn configured_classes(&self) -> Vec<String> {
        self.read().configured_classes()
    }

    /// Names of the configured attributes of a class
    pub fn configured_attributes(&self, class_name: &str) -> Vec<String> {
        self.read().configured_attributes(class_name)
    }

    /// Note and rules of one attribute
    pub fn attribute_config(&self, class_name: &str, attribute: &str) -> Option<AttributeConfig> {
        self.read().attribute_config(class_name, attribute)
    }

    /// Note of one attribute
    pub fn note(&self, class_name: &str, attribute: &str) -> Option<String> {
        self.attribute_config(class_name, attribute)
            .and_then(|config| config.note)
    }

    /// Configure an attribute without rules; no-op when already configured
    pub fn add_class_attribute(&self, class_name: &str, attribute: &str) -> Result<(), StoreError> {
        self.modify(|doc| doc.add_class_attribute(class_name, attribute))
    }

    /// Remove an attribute and its rules; no-op when not configured
    pub fn remove_class_attribute(&self, class_name: &str, attribute: &str) -> Result<(), StoreError> {
        self.modify(|doc| doc.remove_class_attribute(class_name, attribute))
    }

    /// Add or replace a constraint from raw parameter text
    ///
    /// The text is parsed as JSON when possible and kept as a plain string
    /// otherwise; an empty result means "no parameters".
    pub fn add_or_modify_constraint(
        &self,
        class_name: &str,
        attribute: &str,
        constraint: &str,
        params: Option<&str>,
    ) -> Result<(), StoreError> {
        let params = ParamValue::parse_with_fallback(params).into_value();
        self.modify(|doc| doc.set_constraint(class_name, attribute, constraint, params))
    }

    /// Remove a constraint; no-op when not configured
    pub fn delete_constraint(&self, class_name: &str, attribute: &str, constraint: &str) -> Result<(), StoreError> {
        self.modify(|doc| doc.delete_constraint(class_name, attribute, constraint))
    }

    /// Set or replace the note of an attribute
    pub fn add_or_modify_note(&self, class_name: &str, attribute: &str, note: Option<&str>) -> Result<(), StoreError> {
        let note = note.map(str::to_string);
        self.modify(|doc| doc.set_note(class_name, attribute, note))
    }

    /// Clear the note of an attribute; no-op when not configured
    pub fn delete_note(&self, class_name: &str, attribute: &str) -> Result<(), StoreError> {
        self.modify(|doc| doc.delete_note(class_name, attribute))
    }

    fn modify(&self, change: impl FnOnce(&mut RuleDocument) -> bool) -> Result<(), StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Io("rule store lock poisoned".to_string()))?;

        let mut document = self.try_read_for_write().inspect_err(|error| self.report_invalid(error))?;
        if !change(&mut document) {
            tracing::debug!(path = %self.path.display(), "rule store unchanged, skipping write");
            return Ok(());
        }

        self.write(&document)
    }

    fn write(&self, document: &RuleDocument) -> Result<(), StoreError> {
        let yaml = serde_yaml::to_string(&document.to_value())
            .map_err(|e| StoreError::Serialize(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }
        std::fs::write(&self.path, yaml).map_err(|e| StoreError::Io(e.to_string()))?;

        tracing::debug!(path = %self.path.display(), "rule store written");
        Ok(())
    }

    fn report_invalid(&self, error: &EngineError) {
        tracing::warn!(path = %self.path.display(), "{}", error);
        self.sink.notify(Event::InvalidConfig(InvalidConfigEvent {
            reason: error.to_string(),
        }));
    }
}

impl std::fmt::Debug for YamlRuleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YamlRuleStore").field("path", &self.path).finish()
    }
}

impl ConfigurationStore for YamlRuleStore {
    fn rules_for_class(&self, class_name: &str) -> ClassRules {
        self.read().class_rules(class_name)
    }

    fn is_class_configured(&self, class_name: &str) -> bool {
        self.read().is_class_configured(class_name)
    }

    fn is_class_attribute_configured(&self, class_name: &str, attribute: &str) -> bool {
        self.read().is_class_attribute_configured(class_name, attribute)
    }
}

/// In-memory rule store
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    document: RwLock<RuleDocument>,
}

impl MemoryRuleStore {
    pub fn new(document: RuleDocument) -> Self {
        Self {
            document: RwLock::new(document),
        }
    }

    /// Store holding the given class rules
    pub fn from_rules(rules: impl IntoIterator<Item = ClassRules>) -> Self {
        let mut document = RuleDocument::new();
        for class in rules {
            for (attribute, config) in class.attributes {
                document.add_class_attribute(&class.class_name, &attribute);
                document.set_note(&class.class_name, &attribute, config.note);
                for (constraint, params) in config.rules {
                    document.set_constraint(&class.class_name, &attribute, &constraint, params);
                }
            }
        }
        Self::new(document)
    }

    /// Apply a change to the document; returns whether it changed
    pub fn update(&self, change: impl FnOnce(&mut RuleDocument) -> bool) -> bool {
        self.document
            .write()
            .map(|mut document| change(&mut document))
            .unwrap_or(false)
    }

    /// Snapshot of the document
    pub fn snapshot(&self) -> RuleDocument {
        self.document
            .read()
            .map(|document| document.clone())
            .unwrap_or_default()
    }
}

impl ConfigurationStore for MemoryRuleStore {
    fn rules_for_class(&self, class_name: &str) -> ClassRules {
        self.snapshot().class_rules(class_name)
    }

    fn is_class_configured(&self, class_name: &str) -> bool {
        self.snapshot().is_class_configured(class_name)
    }

    fn is_class_attribute_configured(&self, class_name: &str, attribute: &str) -> bool {
        self.snapshot()
            .is_class_attribute_configured(class_name, attribute)
    }
}
