//! Matching rules
//!
//! A rule is one weighted constraint on a single metadata attribute:
//!
//! ```
//! use hanging_protocols::core::models::{Constraint, Rule};
//!
//! let rule = Rule::series("seriesDescription", Constraint::contains("AX"), true, 3);
//! assert_eq!(rule.constraint().validator_id(), Some("contains"));
//! assert!(!rule.is_rule_for_prior());
//! ```
//!
//! Rules come in four levels (protocol, study, series, image) that behave
//! identically; the level only decides which matching pass consumes them.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::comparator::{Comparator, find_comparator};
use super::{dictionary, ids, value};

/// Attribute name reserved for ordinal references to prior studies
pub const ABSTRACT_PRIOR_VALUE: &str = "abstractPriorValue";

/// Which matching pass consumes a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleLevel {
    /// Scored against the study when ranking protocols
    #[default]
    Protocol,
    /// Selects (and filters) prior studies for a viewport
    Study,
    /// Scored against each series of the source study
    Series,
    /// Scored against each image of a surviving series
    Image,
}

impl std::fmt::Display for RuleLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Protocol => write!(f, "protocol"),
            Self::Study => write!(f, "study"),
            Self::Series => write!(f, "series"),
            Self::Image => write!(f, "image"),
        }
    }
}

/// A rule constraint: validator ids mapped to their options
///
/// Normally holds exactly one validator, e.g. `{"equals": {"value": 2}}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Constraint(Map<String, Value>);

impl Constraint {
    /// Constraint with a single validator and its options
    #[must_use]
    pub fn new(validator: impl Into<String>, options: Value) -> Self {
        let mut map = Map::new();
        map.insert(validator.into(), options);
        Self(map)
    }

    /// `{"equals": {"value": value}}`
    #[must_use]
    pub fn equals(value: impl Into<Value>) -> Self {
        Self::with_value("equals", value.into())
    }

    /// `{"contains": {"value": value}}`
    #[must_use]
    pub fn contains(value: impl Into<Value>) -> Self {
        Self::with_value("contains", value.into())
    }

    /// `{validator: {"value": value}}`
    #[must_use]
    pub fn with_value(validator: &str, value: Value) -> Self {
        let mut options = Map::new();
        options.insert("value".to_string(), value);
        Self::new(validator, Value::Object(options))
    }

    /// Derive a constraint from an observed attribute value
    ///
    /// Numbers produce an `equals` constraint, anything else `contains`.
    #[must_use]
    pub fn from_example(example: &Value) -> Self {
        if example.is_number() {
            Self::equals(example.clone())
        } else {
            Self::contains(example.clone())
        }
    }

    /// Wrap a raw constraint map
    #[must_use]
    pub const fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// The (first) validator id
    #[must_use]
    pub fn validator_id(&self) -> Option<&str> {
        self.0.keys().next().map(String::as_str)
    }

    /// Options of a validator
    #[must_use]
    pub fn options(&self, validator: &str) -> Option<&Value> {
        self.0.get(validator)
    }

    /// The first option value of the first validator
    ///
    /// Used by prior references, which read their index without going
    /// through the comparator registry.
    #[must_use]
    pub fn first_option_value(&self) -> Option<&Value> {
        match self.0.values().next()? {
            Value::Object(options) => options.values().next(),
            other => Some(other),
        }
    }

    /// Iterate `(validator, options)` pairs
    pub fn validators(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether no validator is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Resolved validator and operand of a constraint
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorAndValue {
    /// Comparator id (e.g. `equals`)
    pub validator: &'static str,
    /// Operand read from the validator's options
    pub value: Option<Value>,
}

/// A weighted, optionally required constraint on one attribute
#[derive(Debug, Clone)]
pub struct Rule {
    /// Unique identifier
    pub id: String,
    /// Matching pass that consumes the rule
    pub level: RuleLevel,
    /// Attribute name (tag, keyword or custom attribute)
    pub attribute: String,
    /// A failing required rule forces the score to zero
    pub required: bool,
    /// Score contributed when the rule passes
    pub weight: u32,
    constraint: Constraint,
    constraint_info: OnceLock<Option<&'static Comparator>>,
    validator_and_value: OnceLock<Option<ValidatorAndValue>>,
}

impl Rule {
    /// Create a rule with a fresh id
    pub fn new(
        level: RuleLevel,
        attribute: impl Into<String>,
        constraint: Constraint,
        required: bool,
        weight: u32,
    ) -> Self {
        Self::with_id(ids::generate_id(), level, attribute, constraint, required, weight)
    }

    /// Create a rule with a known id
    pub fn with_id(
        id: impl Into<String>,
        level: RuleLevel,
        attribute: impl Into<String>,
        constraint: Constraint,
        required: bool,
        weight: u32,
    ) -> Self {
        Self {
            id: id.into(),
            level,
            attribute: attribute.into(),
            required,
            weight,
            constraint,
            constraint_info: OnceLock::new(),
            validator_and_value: OnceLock::new(),
        }
    }

    /// Protocol-level rule
    pub fn protocol(attribute: impl Into<String>, constraint: Constraint, required: bool, weight: u32) -> Self {
        Self::new(RuleLevel::Protocol, attribute, constraint, required, weight)
    }

    /// Study-level rule
    pub fn study(attribute: impl Into<String>, constraint: Constraint, required: bool, weight: u32) -> Self {
        Self::new(RuleLevel::Study, attribute, constraint, required, weight)
    }

    /// Series-level rule
    pub fn series(attribute: impl Into<String>, constraint: Constraint, required: bool, weight: u32) -> Self {
        Self::new(RuleLevel::Series, attribute, constraint, required, weight)
    }

    /// Image-level rule
    pub fn image(attribute: impl Into<String>, constraint: Constraint, required: bool, weight: u32) -> Self {
        Self::new(RuleLevel::Image, attribute, constraint, required, weight)
    }

    /// The rule's constraint
    #[must_use]
    pub const fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    /// Replace the constraint, dropping cached constraint lookups
    pub fn set_constraint(&mut self, constraint: Constraint) {
        self.constraint = constraint;
        self.constraint_info = OnceLock::new();
        self.validator_and_value = OnceLock::new();
    }

    /// Registry entry for the constraint's validator key (cached)
    pub fn constraint_info(&self) -> Option<&'static Comparator> {
        *self
            .constraint_info
            .get_or_init(|| self.constraint.validator_id().and_then(find_comparator))
    }

    /// Validator id and operand of the constraint (cached)
    pub fn constraint_validator_and_value(&self) -> Option<&ValidatorAndValue> {
        self.validator_and_value
            .get_or_init(|| {
                let info = self.constraint_info()?;
                let options = self.constraint.options(info.validator)?;
                Some(ValidatorAndValue {
                    validator: info.id,
                    value: options.get(info.option).cloned(),
                })
            })
            .as_ref()
    }

    /// Whether the rule references a prior study
    #[must_use]
    pub fn is_rule_for_prior(&self) -> bool {
        self.attribute == ABSTRACT_PRIOR_VALUE
    }

    /// Whether the attribute is a description tag (`SeriesDescription`, ...)
    #[must_use]
    pub fn is_description_rule(&self) -> bool {
        dictionary::find(&self.attribute)
            .is_some_and(|d| d.keyword.to_ascii_lowercase().contains("description"))
    }

    /// Number of prior studies this rule requires
    ///
    /// `-1` when the rule is not a prior rule. For `equals` constraints a
    /// negative index counts as one prior; other validators give 0.
    pub fn number_of_priors_referenced(&self) -> i64 {
        if !self.is_rule_for_prior() {
            return -1;
        }
        let Some(resolved) = self.constraint_validator_and_value() else {
            return 0;
        };
        let index = resolved.value.as_ref().and_then(value::parse_int).unwrap_or(0);
        if resolved.validator == "equals" {
            if index < 0 { 1 } else { index }
        } else {
            0
        }
    }

    /// Structural equality on attribute and constraint only
    #[must_use]
    pub fn rule_is_equal(&self, other: &Self) -> bool {
        self.attribute == other.attribute && self.constraint == other.constraint
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.level == other.level
            && self.attribute == other.attribute
            && self.required == other.required
            && self.weight == other.weight
            && self.constraint == other.constraint
    }
}
