//! Rule configuration model
//!
//! The persisted layout is a mapping
//! `class -> attribute -> { note: string|null, rules: { constraint: params|null } }`.
//! [`RuleDocument`] wraps that mapping and implements every read and write
//! operation as a pure transformation; persistence lives in the catalog crate.

use crate::error::EngineError;
use crate::schema::base_class_name;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Key holding the free-text note of an attribute
pub const KEY_NOTE: &str = "note";

/// Key holding the constraint mapping of an attribute
pub const KEY_RULES: &str = "rules";

/// Constraint parameters parsed from raw text
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Parsed as structured (JSON) data
    Structured(Value),

    /// Not valid structured data; the raw string is the parameter
    Scalar(String),

    /// No parameters
    None,
}

impl ParamValue {
    /// Parse raw parameter text
    ///
    /// Structured parsing is attempted first; text that does not parse is kept
    /// as a scalar. Empty strings and `null` normalize to [`ParamValue::None`].
    pub fn parse_with_fallback(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::None;
        };

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Null) => Self::None,
            Ok(Value::String(s)) if s.is_empty() => Self::None,
            Ok(value) => Self::Structured(value),
            Err(_) if raw.is_empty() => Self::None,
            Err(_) => Self::Scalar(raw.to_string()),
        }
    }

    /// Value stored in the rule document
    pub fn into_value(self) -> Value {
        match self {
            Self::Structured(value) => value,
            Self::Scalar(s) => Value::String(s),
            Self::None => Value::Null,
        }
    }
}

/// Configuration of one attribute
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeConfig {
    /// Free-text note
    #[serde(default)]
    pub note: Option<String>,

    /// Constraint name to parameters (`Null` when the constraint takes none)
    #[serde(default)]
    pub rules: BTreeMap<String, Value>,
}

impl AttributeConfig {
    /// Read an attribute entry leniently; malformed parts are treated as empty
    fn from_value(value: &Value) -> Self {
        let Some(entry) = value.as_object() else {
            return Self::default();
        };

        let note = entry
            .get(KEY_NOTE)
            .and_then(Value::as_str)
            .map(str::to_string);

        let rules = entry
            .get(KEY_RULES)
            .and_then(Value::as_object)
            .map(|rules| {
                rules
                    .iter()
                    .map(|(name, params)| (name.clone(), params.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Self { note, rules }
    }
}

/// All configured attributes of one class
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassRules {
    /// Base class name
    pub class_name: String,

    /// Attribute path to configuration
    pub attributes: BTreeMap<String, AttributeConfig>,
}

impl ClassRules {
    /// Create an empty rule set
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Configure a constraint (builder style, mostly for tests)
    pub fn with_rule(
        mut self,
        attribute: impl Into<String>,
        constraint: impl Into<String>,
        params: Value,
    ) -> Self {
        self.attributes
            .entry(attribute.into())
            .or_default()
            .rules
            .insert(constraint.into(), params);
        self
    }

    /// Whether no attribute is configured
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Number of configured attributes
    pub fn len(&self) -> usize {
        self.attributes.len()
    }
}

/// The whole rule store as a mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleDocument {
    raw: Map<String, Value>,
}

impl RuleDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a parsed store; anything but a mapping is a parse error
    pub fn from_value(value: Value) -> Result<Self, EngineError> {
        match value {
            Value::Object(raw) => Ok(Self { raw }),
            other => Err(EngineError::ConfigParse(format!(
                "rule store must be a mapping, found {}",
                value_kind(&other)
            ))),
        }
    }

    /// The underlying mapping
    pub fn to_value(&self) -> Value {
        Value::Object(self.raw.clone())
    }

    /// Names of all configured classes
    pub fn configured_classes(&self) -> Vec<String> {
        self.raw.keys().cloned().collect()
    }

    /// Whether a class has an entry
    pub fn is_class_configured(&self, class_name: &str) -> bool {
        self.raw.contains_key(base_class_name(class_name))
    }

    /// Whether a class has an entry for `attribute`
    pub fn is_class_attribute_configured(&self, class_name: &str, attribute: &str) -> bool {
        self.class_section(class_name)
            .map(|section| section.contains_key(attribute))
            .unwrap_or(false)
    }

    /// Names of the configured attributes of a class
    pub fn configured_attributes(&self, class_name: &str) -> Vec<String> {
        self.class_section(class_name)
            .map(|section| section.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Configuration of one attribute, if present
    pub fn attribute_config(&self, class_name: &str, attribute: &str) -> Option<AttributeConfig> {
        self.class_section(class_name)
            .and_then(|section| section.get(attribute))
            .map(AttributeConfig::from_value)
    }

    /// All rules configured for a class; empty when the class is absent
    pub fn class_rules(&self, class_name: &str) -> ClassRules {
        let class_name = base_class_name(class_name);
        let attributes = self
            .class_section(class_name)
            .map(|section| {
                section
                    .iter()
                    .map(|(attribute, entry)| (attribute.clone(), AttributeConfig::from_value(entry)))
                    .collect()
            })
            .unwrap_or_default();

        ClassRules {
            class_name: class_name.to_string(),
            attributes,
        }
    }

    /// Add an empty attribute entry; returns whether the document changed
    pub fn add_class_attribute(&mut self, class_name: &str, attribute: &str) -> bool {
        if self.is_class_attribute_configured(class_name, attribute) {
            return false;
        }

        self.attribute_entry(class_name, attribute);
        true
    }

    /// Remove an attribute entry; returns whether the document changed
    pub fn remove_class_attribute(&mut self, class_name: &str, attribute: &str) -> bool {
        match self.class_section_mut(class_name) {
            Some(section) => section.remove(attribute).is_some(),
            None => false,
        }
    }

    /// Add or replace a constraint, keeping the note; returns whether the document changed
    pub fn set_constraint(
        &mut self,
        class_name: &str,
        attribute: &str,
        constraint: &str,
        params: Value,
    ) -> bool {
        let current = self
            .attribute_config(class_name, attribute)
            .and_then(|config| config.rules.get(constraint).cloned());
        if current.as_ref() == Some(&params) {
            return false;
        }

        let entry = self.attribute_entry(class_name, attribute);
        if !entry.get(KEY_RULES).map(Value::is_object).unwrap_or(false) {
            entry.insert(KEY_RULES.to_string(), Value::Object(Map::new()));
        }
        if let Some(Value::Object(rules)) = entry.get_mut(KEY_RULES) {
            rules.insert(constraint.to_string(), params);
        }
        true
    }

    /// Remove a constraint; returns whether the document changed
    pub fn delete_constraint(&mut self, class_name: &str, attribute: &str, constraint: &str) -> bool {
        let Some(entry) = self
            .class_section_mut(class_name)
            .and_then(|section| section.get_mut(attribute))
            .and_then(Value::as_object_mut)
        else {
            return false;
        };

        match entry.get_mut(KEY_RULES) {
            Some(Value::Object(rules)) => rules.remove(constraint).is_some(),
            _ => false,
        }
    }

    /// Set or replace the note; returns whether the document changed
    pub fn set_note(&mut self, class_name: &str, attribute: &str, note: Option<String>) -> bool {
        let current = self
            .attribute_config(class_name, attribute)
            .and_then(|config| config.note);
        if self.is_class_attribute_configured(class_name, attribute) && current == note {
            return false;
        }

        let entry = self.attribute_entry(class_name, attribute);
        entry.insert(
            KEY_NOTE.to_string(),
            note.map(Value::String).unwrap_or(Value::Null),
        );
        true
    }

    /// Clear the note of a configured attribute; returns whether the document changed
    pub fn delete_note(&mut self, class_name: &str, attribute: &str) -> bool {
        if !self.is_class_attribute_configured(class_name, attribute) {
            return false;
        }
        if self
            .attribute_config(class_name, attribute)
            .and_then(|config| config.note)
            .is_none()
        {
            return false;
        }

        let entry = self.attribute_entry(class_name, attribute);
        entry.insert(KEY_NOTE.to_string(), Value::Null);
        true
    }

    fn class_section(&self, class_name: &str) -> Option<&Map<String, Value>> {
        self.raw
            .get(base_class_name(class_name))
            .and_then(Value::as_object)
    }

    fn class_section_mut(&mut self, class_name: &str) -> Option<&mut Map<String, Value>> {
        self.raw
            .get_mut(base_class_name(class_name))
            .and_then(Value::as_object_mut)
    }

    /// Attribute entry, created (with a null note and no rules) when missing
    fn attribute_entry(&mut self, class_name: &str, attribute: &str) -> &mut Map<String, Value> {
        let section = self
            .raw
            .entry(base_class_name(class_name).to_string())
            .or_insert_with(|| Value::Object(Map::new()));

        let entry = as_mapping(section)
            .entry(attribute.to_string())
            .or_insert_with(empty_attribute_entry);
        as_mapping(entry)
    }
}

/// Replace a non-mapping value with an empty mapping and borrow it
fn as_mapping(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced by a mapping"),
    }
}

fn empty_attribute_entry() -> Value {
    let mut entry = Map::new();
    entry.insert(KEY_NOTE.to_string(), Value::Null);
    entry.insert(KEY_RULES.to_string(), Value::Object(Map::new()));
    Value::Object(entry)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn params_parse_structured_first() {
        assert_eq!(
            ParamValue::parse_with_fallback(Some(r#"{"value": 1}"#)),
            ParamValue::Structured(json!({"value": 1}))
        );
        assert_eq!(
            ParamValue::parse_with_fallback(Some("5")),
            ParamValue::Structured(json!(5))
        );
    }

    #[test]
    fn params_fall_back_to_raw_string() {
        assert_eq!(
            ParamValue::parse_with_fallback(Some("^[A-Z]+$")),
            ParamValue::Scalar("^[A-Z]+$".to_string())
        );
    }

    #[test]
    fn empty_params_normalize_to_none() {
        assert_eq!(ParamValue::parse_with_fallback(Some("")), ParamValue::None);
        assert_eq!(ParamValue::parse_with_fallback(Some("\"\"")), ParamValue::None);
        assert_eq!(ParamValue::parse_with_fallback(Some("null")), ParamValue::None);
        assert_eq!(ParamValue::parse_with_fallback(None), ParamValue::None);
        assert_eq!(ParamValue::None.into_value(), Value::Null);
    }

    #[test]
    fn non_mapping_document_is_rejected() {
        let err = RuleDocument::from_value(json!(["not", "a", "mapping"])).unwrap_err();
        assert!(matches!(err, EngineError::ConfigParse(_)));
        assert!(RuleDocument::from_value(Value::Null).is_err());
    }

    #[test]
    fn class_rules_read_leniently() {
        let doc = RuleDocument::from_value(json!({
            "Product": {
                "sku": {"note": "must exist", "rules": {"NotBlank": null}},
                "broken": "not a mapping",
                "name": {"rules": {"Length": {"min": 3}}}
            }
        }))
        .unwrap();

        let rules = doc.class_rules("App\\Model\\Product");
        assert_eq!(rules.class_name, "Product");
        assert_eq!(rules.len(), 3);
        assert_eq!(rules.attributes["sku"].note.as_deref(), Some("must exist"));
        assert_eq!(rules.attributes["sku"].rules["NotBlank"], Value::Null);
        assert!(rules.attributes["broken"].rules.is_empty());
        assert_eq!(rules.attributes["name"].rules["Length"], json!({"min": 3}));

        assert!(doc.class_rules("Unknown").is_empty());
    }

    #[test]
    fn add_class_attribute_is_idempotent() {
        let mut doc = RuleDocument::new();
        assert!(doc.add_class_attribute("Product", "sku"));
        let after_first = doc.to_value();

        assert!(!doc.add_class_attribute("Product", "sku"));
        assert_eq!(doc.to_value(), after_first);
        assert_eq!(after_first, json!({"Product": {"sku": {"note": null, "rules": {}}}}));
    }

    #[test]
    fn remove_unconfigured_attribute_is_noop() {
        let mut doc = RuleDocument::new();
        assert!(!doc.remove_class_attribute("Product", "sku"));
        assert_eq!(doc, RuleDocument::new());
    }

    #[test]
    fn set_constraint_keeps_note() {
        let mut doc = RuleDocument::new();
        doc.set_note("Product", "sku", Some("keep me".to_string()));
        assert!(doc.set_constraint("Product", "sku", "Length", json!({"min": 1})));
        assert!(doc.set_constraint("Product", "sku", "Length", json!({"min": 2})));
        assert!(!doc.set_constraint("Product", "sku", "Length", json!({"min": 2})));

        let config = doc.attribute_config("Product", "sku").unwrap();
        assert_eq!(config.note.as_deref(), Some("keep me"));
        assert_eq!(config.rules["Length"], json!({"min": 2}));
    }

    #[test]
    fn delete_constraint_and_note() {
        let mut doc = RuleDocument::new();
        doc.set_constraint("Product", "sku", "NotBlank", Value::Null);
        doc.set_note("Product", "sku", Some("n".to_string()));

        assert!(doc.delete_constraint("Product", "sku", "NotBlank"));
        assert!(!doc.delete_constraint("Product", "sku", "NotBlank"));
        assert!(doc.delete_note("Product", "sku"));
        assert!(!doc.delete_note("Product", "sku"));
        assert!(!doc.delete_note("Product", "other"));

        let config = doc.attribute_config("Product", "sku").unwrap();
        assert_eq!(config, AttributeConfig::default());
    }
}
