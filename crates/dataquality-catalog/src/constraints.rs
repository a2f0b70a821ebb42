//! Standard constraint library
//!
//! Every constraint accepts its parameters either as a mapping or, when it has
//! a single main option, as a bare scalar: `Min: 1` is the same as
//! `Min: {value: 1}`. Absent (`null`) values pass every constraint except
//! `NotBlank` and `NotNull`.

use crate::adapter::{ConstraintError, Validator, ValidatorRegistry};
use dataquality_core::EngineError;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// Registry of named constraint implementations
#[derive(Clone, Default)]
pub struct StandardRegistry {
    validators: HashMap<String, Arc<dyn Validator>>,
}

impl StandardRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the standard constraints
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("NotBlank", NotBlank);
        registry.register("NotNull", NotNull);
        registry.register("Blank", Blank);
        registry.register("Length", Length);
        registry.register("Min", Min);
        registry.register("Max", Max);
        registry.register("Range", Range);
        registry.register("Regex", RegexMatch::new());
        registry.register("Choice", Choice);
        registry.register("Email", Email);
        registry.register("Count", Count);
        registry
    }

    /// Register (or replace) a constraint
    pub fn register(&mut self, name: impl Into<String>, validator: impl Validator + 'static) {
        self.validators.insert(name.into(), Arc::new(validator));
    }

    /// Register a closure as a constraint
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&Value, &Value) -> Result<Vec<String>, ConstraintError> + Send + Sync + 'static,
    {
        self.register(name, FnValidator(f));
    }

    /// Registered constraint names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.validators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for StandardRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardRegistry")
            .field("validators", &self.names())
            .finish()
    }
}

impl ValidatorRegistry for StandardRegistry {
    fn resolve(&self, name: &str) -> Result<Arc<dyn Validator>, EngineError> {
        self.validators
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownConstraint(name.to_string()))
    }
}

/// Adapts a closure to [`Validator`]
pub struct FnValidator<F>(pub F);

impl<F> Validator for FnValidator<F>
where
    F: Fn(&Value, &Value) -> Result<Vec<String>, ConstraintError> + Send + Sync,
{
    fn validate(&self, value: &Value, params: &Value) -> Result<Vec<String>, ConstraintError> {
        (self.0)(value, params)
    }
}

/// Value must not be null, an empty string, `false` or an empty list
pub struct NotBlank;

impl Validator for NotBlank {
    fn validate(&self, value: &Value, params: &Value) -> Result<Vec<String>, ConstraintError> {
        Ok(verdict(
            !is_blank(value),
            message(params).unwrap_or("This value should not be blank."),
        ))
    }
}

/// Value must not be null
pub struct NotNull;

impl Validator for NotNull {
    fn validate(&self, value: &Value, params: &Value) -> Result<Vec<String>, ConstraintError> {
        Ok(verdict(
            !value.is_null(),
            message(params).unwrap_or("This value should not be null."),
        ))
    }
}

/// Value must be blank
pub struct Blank;

impl Validator for Blank {
    fn validate(&self, value: &Value, params: &Value) -> Result<Vec<String>, ConstraintError> {
        Ok(verdict(
            is_blank(value),
            message(params).unwrap_or("This value should be blank."),
        ))
    }
}

/// String length bounds: `{min, max}`, or a scalar for an exact length
pub struct Length;

impl Validator for Length {
    fn validate(&self, value: &Value, params: &Value) -> Result<Vec<String>, ConstraintError> {
        if value.is_null() {
            return Ok(Vec::new());
        }
        let text = text_of(value)?;
        let length = text.chars().count() as f64;

        let (min, max) = match params {
            Value::Number(_) => {
                let exact = number_param(params, "exactly", true)?;
                (exact, exact)
            }
            _ => (
                number_param(params, "min", false)?,
                number_param(params, "max", false)?,
            ),
        };
        if min.is_none() && max.is_none() {
            return Err(ConstraintError::InvalidParams(
                "Length requires 'min', 'max' or an exact length".to_string(),
            ));
        }

        let mut reasons = Vec::new();
        if let Some(min) = min {
            if length < min {
                reasons.push(format!(
                    "This value is too short. It should have {} characters or more.",
                    min
                ));
            }
        }
        if let Some(max) = max {
            if length > max {
                reasons.push(format!(
                    "This value is too long. It should have {} characters or less.",
                    max
                ));
            }
        }
        Ok(reasons)
    }
}

/// Numeric lower bound: `{value}` or a scalar
pub struct Min;

impl Validator for Min {
    fn validate(&self, value: &Value, params: &Value) -> Result<Vec<String>, ConstraintError> {
        let bound = required_number(params, "value")?;
        let Some(number) = number_of(value)? else {
            return Ok(Vec::new());
        };
        Ok(verdict(
            number >= bound,
            &format!("This value should be greater than or equal to {}.", bound),
        ))
    }
}

/// Numeric upper bound: `{value}` or a scalar
pub struct Max;

impl Validator for Max {
    fn validate(&self, value: &Value, params: &Value) -> Result<Vec<String>, ConstraintError> {
        let bound = required_number(params, "value")?;
        let Some(number) = number_of(value)? else {
            return Ok(Vec::new());
        };
        Ok(verdict(
            number <= bound,
            &format!("This value should be less than or equal to {}.", bound),
        ))
    }
}

/// Numeric range: `{min, max}`
pub struct Range;

impl Validator for Range {
    fn validate(&self, value: &Value, params: &Value) -> Result<Vec<String>, ConstraintError> {
        let min = number_param(params, "min", false)?;
        let max = number_param(params, "max", false)?;
        if min.is_none() && max.is_none() {
            return Err(ConstraintError::InvalidParams(
                "Range requires 'min' or 'max'".to_string(),
            ));
        }
        let Some(number) = number_of(value)? else {
            return Ok(Vec::new());
        };

        let in_range = min.map(|min| number >= min).unwrap_or(true)
            && max.map(|max| number <= max).unwrap_or(true);
        let reason = match (min, max) {
            (Some(min), Some(max)) => format!("This value should be between {} and {}.", min, max),
            (Some(min), None) => format!("This value should be {} or more.", min),
            (None, Some(max)) => format!("This value should be {} or less.", max),
            (None, None) => String::new(),
        };
        Ok(verdict(in_range, &reason))
    }
}

/// Pattern match: `{pattern}` or a scalar pattern
///
/// Patterns written with `/.../` delimiters have them stripped. Compiled
/// patterns are kept for the lifetime of the validator.
#[derive(Debug, Default)]
pub struct RegexMatch {
    compiled: RwLock<HashMap<String, Regex>>,
}

impl RegexMatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct patterns compiled so far
    pub fn compiled_count(&self) -> usize {
        self.compiled.read().map(|compiled| compiled.len()).unwrap_or(0)
    }

    fn compile(&self, pattern: &str) -> Result<Regex, ConstraintError> {
        let cached = self
            .compiled
            .read()
            .ok()
            .and_then(|compiled| compiled.get(pattern).cloned());
        if let Some(regex) = cached {
            return Ok(regex);
        }

        let regex = Regex::new(strip_delimiters(pattern))
            .map_err(|e| ConstraintError::InvalidParams(e.to_string()))?;
        if let Ok(mut compiled) = self.compiled.write() {
            compiled.insert(pattern.to_string(), regex.clone());
        }
        Ok(regex)
    }
}

impl Validator for RegexMatch {
    fn validate(&self, value: &Value, params: &Value) -> Result<Vec<String>, ConstraintError> {
        let pattern = param(params, "pattern", true)
            .and_then(Value::as_str)
            .ok_or_else(|| ConstraintError::InvalidParams("Regex requires a 'pattern'".to_string()))?;
        let regex = self.compile(pattern)?;

        if value.is_null() {
            return Ok(Vec::new());
        }
        let text = text_of(value)?;
        Ok(verdict(
            regex.is_match(&text),
            message(params).unwrap_or("This value is not valid."),
        ))
    }
}

/// Membership: `{choices: [...]}` or a bare list
pub struct Choice;

impl Validator for Choice {
    fn validate(&self, value: &Value, params: &Value) -> Result<Vec<String>, ConstraintError> {
        let choices = param(params, "choices", true)
            .and_then(Value::as_array)
            .ok_or_else(|| ConstraintError::InvalidParams("Choice requires a list of 'choices'".to_string()))?;

        if value.is_null() {
            return Ok(Vec::new());
        }
        Ok(verdict(
            choices.contains(value),
            message(params).unwrap_or("The value you selected is not a valid choice."),
        ))
    }
}

/// Loose e-mail address check
pub struct Email;

impl Validator for Email {
    fn validate(&self, value: &Value, params: &Value) -> Result<Vec<String>, ConstraintError> {
        static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();

        if is_blank(value) {
            return Ok(Vec::new());
        }
        let text = text_of(value)?;
        let regex = EMAIL
            .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok())
            .as_ref()
            .ok_or_else(|| ConstraintError::InvalidParams("e-mail pattern failed to compile".to_string()))?;
        Ok(verdict(
            regex.is_match(&text),
            message(params).unwrap_or("This value is not a valid email address."),
        ))
    }
}

/// Element count of a list: `{min, max}`, or a scalar for an exact count
pub struct Count;

impl Validator for Count {
    fn validate(&self, value: &Value, params: &Value) -> Result<Vec<String>, ConstraintError> {
        let count = match value {
            Value::Null => return Ok(Vec::new()),
            Value::Array(items) => items.len() as f64,
            Value::Object(entries) => entries.len() as f64,
            other => {
                return Err(ConstraintError::UnsupportedValue(format!(
                    "Count expects a list, got {}",
                    other
                )))
            }
        };

        let (min, max) = match params {
            Value::Number(_) => {
                let exact = number_param(params, "exactly", true)?;
                (exact, exact)
            }
            _ => (
                number_param(params, "min", false)?,
                number_param(params, "max", false)?,
            ),
        };

        let mut reasons = Vec::new();
        if let Some(min) = min {
            if count < min {
                reasons.push(format!("This collection should contain {} elements or more.", min));
            }
        }
        if let Some(max) = max {
            if count > max {
                reasons.push(format!("This collection should contain {} elements or less.", max));
            }
        }
        Ok(reasons)
    }
}

fn verdict(passes: bool, reason: &str) -> Vec<String> {
    if passes {
        Vec::new()
    } else {
        vec![reason.to_string()]
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Bool(b) => !b,
        Value::Array(items) => items.is_empty(),
        Value::Number(_) | Value::Object(_) => false,
    }
}

/// Custom message configured as `{message: "..."}`
fn message(params: &Value) -> Option<&str> {
    params.get("message").and_then(Value::as_str)
}

/// Parameter `key`; a non-mapping `params` stands for the main option
fn param<'a>(params: &'a Value, key: &str, main: bool) -> Option<&'a Value> {
    match params {
        Value::Object(map) => map.get(key),
        Value::Null => None,
        other if main => Some(other),
        _ => None,
    }
}

fn number_param(params: &Value, key: &str, main: bool) -> Result<Option<f64>, ConstraintError> {
    match param(params, key, main) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => number_of(value)?
            .map(Some)
            .ok_or_else(|| ConstraintError::InvalidParams(format!("'{}' must be a number", key))),
    }
}

fn required_number(params: &Value, key: &str) -> Result<f64, ConstraintError> {
    number_param(params, key, true)?
        .ok_or_else(|| ConstraintError::InvalidParams(format!("missing '{}'", key)))
}

/// Numeric view of a value; `None` for null, error for non-numeric data
fn number_of(value: &Value) -> Result<Option<f64>, ConstraintError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ConstraintError::UnsupportedValue(format!("'{}' is not numeric", s))),
        other => Err(ConstraintError::UnsupportedValue(format!(
            "{} is not numeric",
            other
        ))),
    }
}

fn text_of(value: &Value) -> Result<String, ConstraintError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(ConstraintError::UnsupportedValue(format!(
            "expected text, got {}",
            other
        ))),
    }
}

fn strip_delimiters(pattern: &str) -> &str {
    if pattern.len() >= 2 && pattern.starts_with('/') && pattern.ends_with('/') {
        &pattern[1..pattern.len() - 1]
    } else {
        pattern
    }
}
