//! Built-in constraint validators
//!
//! A constraint maps validator ids to options, e.g.
//! `{"contains": {"value": "AX"}}` or `{"numericality": {"greaterThan": 2}}`.
//! Each validator returns the failure messages for one attribute value.
//! Validators whose options are `null` or `false` are skipped.

use std::collections::HashMap;
use std::sync::Arc;

use regex::RegexBuilder;
use serde_json::{Map, Value};

use crate::core::error::ValidationError;
use crate::core::models::Constraint;
use crate::core::models::value::{self, display, loose_eq};
use crate::core::ports::ConstraintValidator;

/// A single validator: `(attribute, value, options) -> messages`
pub type ValidatorFn =
    Arc<dyn Fn(&str, Option<&Value>, &Value) -> Result<Vec<String>, ValidationError> + Send + Sync>;

/// Registry of validators keyed by constraint id
#[derive(Clone)]
pub struct Validators {
    registry: HashMap<String, ValidatorFn>,
}

impl std::fmt::Debug for Validators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&str> = self.registry.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("Validators").field("registry", &ids).finish()
    }
}

impl Default for Validators {
    fn default() -> Self {
        Self::standard()
    }
}

impl Validators {
    /// Registry without any validator
    #[must_use]
    pub fn empty() -> Self {
        Self {
            registry: HashMap::new(),
        }
    }

    /// Registry with every built-in validator
    #[must_use]
    pub fn standard() -> Self {
        let mut validators = Self::empty();
        validators.register("equals", equals);
        validators.register("doesNotEqual", does_not_equal);
        validators.register("contains", contains);
        validators.register("doesNotContain", does_not_contain);
        validators.register("startsWith", starts_with);
        validators.register("endsWith", ends_with);
        validators.register("greaterThan", greater_than);
        validators.register("numericality", numericality);
        validators.register("presence", presence);
        validators.register("format", format_pattern);
        validators.register("inclusion", inclusion);
        validators.register("exclusion", exclusion);
        validators
    }

    /// Add or replace a validator
    pub fn register<F>(&mut self, id: impl Into<String>, validator: F)
    where
        F: Fn(&str, Option<&Value>, &Value) -> Result<Vec<String>, ValidationError> + Send + Sync + 'static,
    {
        self.registry.insert(id.into(), Arc::new(validator));
    }

    /// Whether a validator is registered
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.registry.contains_key(id)
    }
}

impl ConstraintValidator for Validators {
    fn validate(
        &self,
        attribute: &str,
        value: Option<&Value>,
        constraint: &Constraint,
    ) -> Result<Vec<String>, ValidationError> {
        let mut messages = Vec::new();
        for (id, options) in constraint.validators() {
            if matches!(options, Value::Null | Value::Bool(false)) {
                continue;
            }
            let validator = self
                .registry
                .get(id)
                .ok_or_else(|| ValidationError::UnknownValidator(id.to_string()))?;
            messages.extend(validator(attribute, value, options)?);
        }
        Ok(messages)
    }
}

fn operand(options: &Value) -> Option<&Value> {
    options.as_object().and_then(|o| o.get("value"))
}

fn required_operand<'a>(validator: &str, options: &'a Value) -> Result<&'a Value, ValidationError> {
    operand(options).ok_or_else(|| ValidationError::InvalidOptions {
        validator: validator.to_string(),
        message: "missing \"value\"".to_string(),
    })
}

fn present<'a>(validator: &str, attribute: &str, value: Option<&'a Value>) -> Result<&'a Value, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::MissingValue {
            validator: validator.to_string(),
            attribute: attribute.to_string(),
        }),
        Some(v) => Ok(v),
    }
}

fn fail_if(condition: bool, message: impl FnOnce() -> String) -> Vec<String> {
    if condition { vec![message()] } else { Vec::new() }
}

/// Same length and every element of `a` present in `b`
fn arrays_equal(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().all(|v| b.contains(v))
}

fn quoted(value: &Value) -> String {
    if value.is_array() { value.to_string() } else { display(value) }
}

fn equals(attribute: &str, value: Option<&Value>, options: &Value) -> Result<Vec<String>, ValidationError> {
    let expected = operand(options);
    if let (Some(Value::Array(actual)), Some(Value::Array(wanted))) = (value, expected) {
        if arrays_equal(actual, wanted) {
            return Ok(Vec::new());
        }
    }
    Ok(fail_if(!loose_eq(value, expected), || {
        format!("{attribute} must equal {}", expected.map_or_else(String::new, quoted))
    }))
}

fn does_not_equal(attribute: &str, value: Option<&Value>, options: &Value) -> Result<Vec<String>, ValidationError> {
    let expected = operand(options);
    Ok(fail_if(loose_eq(value, expected), || {
        format!("{attribute} cannot equal {}", expected.map_or_else(String::new, display))
    }))
}

/// Substring or membership test; `None` when the value cannot contain anything
fn holds(haystack: &Value, needle: &Value) -> Option<bool> {
    match haystack {
        Value::String(s) => Some(s.contains(display(needle).as_str())),
        Value::Array(items) => Some(items.contains(needle)),
        _ => None,
    }
}

fn contains(attribute: &str, value: Option<&Value>, options: &Value) -> Result<Vec<String>, ValidationError> {
    let haystack = present("contains", attribute, value)?;
    let needle = required_operand("contains", options)?;
    Ok(fail_if(holds(haystack, needle) == Some(false), || {
        format!("{attribute} must contain {}", display(needle))
    }))
}

fn does_not_contain(attribute: &str, value: Option<&Value>, options: &Value) -> Result<Vec<String>, ValidationError> {
    let haystack = present("doesNotContain", attribute, value)?;
    let needle = required_operand("doesNotContain", options)?;
    Ok(fail_if(holds(haystack, needle) == Some(true), || {
        format!("{attribute} cannot contain {}", display(needle))
    }))
}

fn starts_with(attribute: &str, value: Option<&Value>, options: &Value) -> Result<Vec<String>, ValidationError> {
    let text = display(present("startsWith", attribute, value)?);
    let prefix = display(required_operand("startsWith", options)?);
    Ok(fail_if(!text.starts_with(&prefix), || format!("{attribute} must start with {prefix}")))
}

fn ends_with(attribute: &str, value: Option<&Value>, options: &Value) -> Result<Vec<String>, ValidationError> {
    let text = display(present("endsWith", attribute, value)?);
    let suffix = display(required_operand("endsWith", options)?);
    Ok(fail_if(!text.ends_with(&suffix), || format!("{attribute} must end with {suffix}")))
}

fn greater_than(attribute: &str, value: Option<&Value>, options: &Value) -> Result<Vec<String>, ValidationError> {
    let bound = operand(options);
    let failed = match value {
        None => true,
        Some(v) => bound.is_some_and(|b| value::less_or_equal(v, b)),
    };
    Ok(fail_if(failed, || {
        format!("{attribute} must be greater than {}", bound.map_or_else(String::new, display))
    }))
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(_) | Value::String(_) => value::to_number(value),
        _ => None,
    }
}

fn option_number(options: &Map<String, Value>, key: &str) -> Result<Option<f64>, ValidationError> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => value::to_number(v).map(Some).ok_or_else(|| ValidationError::InvalidOptions {
            validator: "numericality".to_string(),
            message: format!("{key} must be a number"),
        }),
    }
}

fn flag(options: &Map<String, Value>, key: &str) -> bool {
    options.get(key).and_then(Value::as_bool).unwrap_or(false)
}

#[allow(clippy::float_cmp)]
fn numericality(attribute: &str, value: Option<&Value>, options: &Value) -> Result<Vec<String>, ValidationError> {
    let empty = Map::new();
    let options = options.as_object().unwrap_or(&empty);
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Ok(Vec::new());
    };
    if flag(options, "strict") && value.is_string() {
        return Ok(vec![format!("{attribute} is not a number")]);
    }
    let Some(number) = numeric(value) else {
        return Ok(vec![format!("{attribute} is not a number")]);
    };

    let mut messages = Vec::new();
    if flag(options, "onlyInteger") && number.fract() != 0.0 {
        messages.push(format!("{attribute} must be an integer"));
    }

    let checks: [(&str, &str, fn(f64, f64) -> bool); 6] = [
        ("greaterThan", "greater than", |v, c| v > c),
        ("greaterThanOrEqualTo", "greater than or equal to", |v, c| v >= c),
        ("equalTo", "equal to", |v, c| v == c),
        ("lessThan", "less than", |v, c| v < c),
        ("lessThanOrEqualTo", "less than or equal to", |v, c| v <= c),
        ("divisibleBy", "divisible by", |v, c| v % c == 0.0),
    ];
    for (key, phrase, check) in checks {
        if let Some(count) = option_number(options, key)? {
            if !check(number, count) {
                messages.push(format!("{attribute} must be {phrase} {count}"));
            }
        }
    }

    if flag(options, "odd") && number % 2.0 != 1.0 && number % 2.0 != -1.0 {
        messages.push(format!("{attribute} must be odd"));
    }
    if flag(options, "even") && number % 2.0 != 0.0 {
        messages.push(format!("{attribute} must be even"));
    }
    Ok(messages)
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

fn presence(attribute: &str, value: Option<&Value>, _options: &Value) -> Result<Vec<String>, ValidationError> {
    Ok(fail_if(is_blank(value), || format!("{attribute} can't be blank")))
}

fn format_pattern(attribute: &str, value: Option<&Value>, options: &Value) -> Result<Vec<String>, ValidationError> {
    let (pattern, flags) = match options {
        Value::String(pattern) => (pattern.as_str(), ""),
        Value::Object(map) => (
            map.get("pattern").and_then(Value::as_str).unwrap_or_default(),
            map.get("flags").and_then(Value::as_str).unwrap_or_default(),
        ),
        _ => ("", ""),
    };
    if pattern.is_empty() {
        return Err(ValidationError::InvalidOptions {
            validator: "format".to_string(),
            message: "missing \"pattern\"".to_string(),
        });
    }
    let regex = RegexBuilder::new(&format!("^(?:{pattern})$"))
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .build()
        .map_err(|e| ValidationError::InvalidOptions {
            validator: "format".to_string(),
            message: e.to_string(),
        })?;
    Ok(match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(text)) => fail_if(!regex.is_match(text), || format!("{attribute} is invalid")),
        Some(_) => vec![format!("{attribute} must be a string")],
    })
}

fn within(validator: &str, options: &Value) -> Result<Vec<Value>, ValidationError> {
    let list = match options {
        Value::Array(items) => Some(items),
        Value::Object(map) => map.get("within").and_then(Value::as_array),
        _ => None,
    };
    list.cloned().ok_or_else(|| ValidationError::InvalidOptions {
        validator: validator.to_string(),
        message: "expected a list of values".to_string(),
    })
}

fn inclusion(attribute: &str, value: Option<&Value>, options: &Value) -> Result<Vec<String>, ValidationError> {
    let list = within("inclusion", options)?;
    Ok(match value {
        None | Some(Value::Null) => Vec::new(),
        Some(v) => fail_if(!list.contains(v), || format!("{attribute} {} is not included in the list", display(v))),
    })
}

fn exclusion(attribute: &str, value: Option<&Value>, options: &Value) -> Result<Vec<String>, ValidationError> {
    let list = within("exclusion", options)?;
    Ok(match value {
        None | Some(Value::Null) => Vec::new(),
        Some(v) => fail_if(list.contains(v), || format!("{attribute} {} is restricted", display(v))),
    })
}
