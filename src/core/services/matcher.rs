//! Rule matcher service - scores metadata against rules
//!
//! Each rule's attribute is resolved (custom attribute, retrieval callback,
//! then DICOM tag), validated against the rule's constraint, and the weights
//! of passing rules are summed. A failing required rule forces the score to
//! zero. The result does not depend on rule order.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::validators::Validators;
use crate::core::models::{AttributeCache, Metadata, Rule};
use crate::core::ports::ConstraintValidator;

/// Message recorded first when a validator cannot evaluate a rule
pub const VALIDATION_FAILURE_MESSAGE: &str = "Something went wrong during validation.";

/// Computes a custom attribute from metadata
pub type AttributeCallback = Arc<dyn Fn(&dyn Metadata) -> Value + Send + Sync>;

/// A registered custom attribute retrieval callback
#[derive(Clone)]
pub struct CustomAttributeRetrieval {
    /// Attribute the callback computes
    pub id: String,
    /// Human-readable name
    pub name: String,
    callback: AttributeCallback,
}

impl std::fmt::Debug for CustomAttributeRetrieval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomAttributeRetrieval")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A rule that passed
#[derive(Debug, Clone, PartialEq)]
pub struct PassedRule {
    /// The rule
    pub rule: Rule,
}

/// A rule that failed, with the validator's messages
#[derive(Debug, Clone, PartialEq)]
pub struct FailedRule {
    /// The rule
    pub rule: Rule,
    /// Why it failed
    pub error_messages: Vec<String>,
}

/// Per-rule outcome of a match
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchDetails {
    /// Rules that passed, in evaluation order
    pub passed: Vec<PassedRule>,
    /// Rules that failed, in evaluation order
    pub failed: Vec<FailedRule>,
}

/// Score and details of matching one metadata object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult {
    /// Sum of passing weights, or 0 if a required rule failed
    pub score: u32,
    /// Which rules passed and failed
    pub details: MatchDetails,
}

/// Scores metadata against rules
#[derive(Clone)]
pub struct Matcher {
    validator: Arc<dyn ConstraintValidator>,
    callbacks: HashMap<String, CustomAttributeRetrieval>,
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher")
            .field("callbacks", &self.callbacks.values().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(Arc::new(Validators::standard()))
    }
}

impl Matcher {
    /// Matcher evaluating constraints with `validator`
    #[must_use]
    pub fn new(validator: Arc<dyn ConstraintValidator>) -> Self {
        Self {
            validator,
            callbacks: HashMap::new(),
        }
    }

    /// Register a callback computing `id` for metadata that lacks it
    ///
    /// A later registration for the same id replaces the earlier one.
    pub fn add_custom_attribute_retrieval_callback<F>(&mut self, id: impl Into<String>, name: impl Into<String>, callback: F)
    where
        F: Fn(&dyn Metadata) -> Value + Send + Sync + 'static,
    {
        let id = id.into();
        self.callbacks.insert(
            id.clone(),
            CustomAttributeRetrieval {
                id,
                name: name.into(),
                callback: Arc::new(callback),
            },
        );
    }

    /// Registered callback for an attribute
    #[must_use]
    pub fn custom_attribute_retrieval(&self, id: &str) -> Option<&CustomAttributeRetrieval> {
        self.callbacks.get(id)
    }

    /// Resolve the value a rule on `attribute` is validated against
    ///
    /// Custom attributes win over tags. A registered callback is invoked at
    /// most once per metadata object; its result is kept in `attributes`.
    pub fn resolve_attribute(&self, metadata: &dyn Metadata, attributes: &AttributeCache, attribute: &str) -> Option<Value> {
        if let Some(value) = attributes.get(metadata, attribute) {
            return Some(value);
        }
        if let Some(retrieval) = self.callbacks.get(attribute) {
            return Some(attributes.get_or_insert_with(metadata, attribute, || (retrieval.callback)(metadata)));
        }
        metadata.tag_value(attribute).cloned()
    }

    /// Score `metadata` against `rules`
    pub fn match_rules<'r, I>(&self, metadata: &dyn Metadata, attributes: &AttributeCache, rules: I) -> MatchResult
    where
        I: IntoIterator<Item = &'r Rule>,
    {
        let mut details = MatchDetails::default();
        let mut required_failed = false;
        let mut score: u32 = 0;

        for rule in rules {
            let value = self.resolve_attribute(metadata, attributes, &rule.attribute);
            let error_messages = match self.validator.validate(&rule.attribute, value.as_ref(), rule.constraint()) {
                Ok(messages) => messages,
                Err(err) => {
                    log::debug!("validation of rule {} on {} failed: {err}", rule.id, rule.attribute);
                    vec![VALIDATION_FAILURE_MESSAGE.to_string(), err.to_string()]
                },
            };

            if error_messages.is_empty() {
                score = score.saturating_add(rule.weight);
                details.passed.push(PassedRule { rule: rule.clone() });
            } else {
                required_failed |= rule.required;
                details.failed.push(FailedRule {
                    rule: rule.clone(),
                    error_messages,
                });
            }
        }

        if required_failed {
            score = 0;
        }

        MatchResult { score, details }
    }
}
