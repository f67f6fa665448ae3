//! Protocol viewports
//!
//! A viewport is one display slot of a screen. Its rules decide which
//! study (current or prior), which series and which image end up in it.

use serde_json::{Map, Value};

use super::attributes::AttributeCache;
use super::metadata::Metadata;
use super::rule::{Rule, RuleLevel};
use super::value;
use crate::core::services::Matcher;
use crate::shared::collections::remove_first;

/// Opaque render settings of a viewport
pub type ViewportSettings = Map<String, Value>;

/// One display slot and the rules that fill it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Viewport {
    /// Render settings, passed through untouched
    pub settings: ViewportSettings,
    /// Rules scored against each image
    pub image_matching_rules: Vec<Rule>,
    /// Rules scored against each series
    pub series_matching_rules: Vec<Rule>,
    /// Prior selection and prior filtering rules
    pub study_matching_rules: Vec<Rule>,
}

/// Outcome of resolving a viewport's prior reference
#[derive(Debug, PartialEq)]
pub struct ReferencedPrior<'a, P> {
    /// The viewport carries a non-zero abstract prior value
    pub references_found: bool,
    /// The prior the value points at, if it is in range
    pub referred_prior: Option<&'a P>,
    /// Parsed abstract prior value of the last prior rule
    pub abstract_prior_value: Option<i64>,
}

impl Viewport {
    /// Empty viewport
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the viewport
    #[must_use]
    pub fn create_clone(&self) -> Self {
        self.clone()
    }

    /// Rules of one level (protocol level has none)
    #[must_use]
    pub fn rules(&self, level: RuleLevel) -> &[Rule] {
        match level {
            RuleLevel::Study => &self.study_matching_rules,
            RuleLevel::Series => &self.series_matching_rules,
            RuleLevel::Image => &self.image_matching_rules,
            RuleLevel::Protocol => &[],
        }
    }

    fn bucket_mut(&mut self, level: RuleLevel) -> Option<&mut Vec<Rule>> {
        match level {
            RuleLevel::Study => Some(&mut self.study_matching_rules),
            RuleLevel::Series => Some(&mut self.series_matching_rules),
            RuleLevel::Image => Some(&mut self.image_matching_rules),
            RuleLevel::Protocol => None,
        }
    }

    /// Append a rule to the bucket of its level
    ///
    /// Returns `false` for protocol-level rules, which viewports do not hold.
    pub fn add_rule(&mut self, rule: Rule) -> bool {
        match self.bucket_mut(rule.level) {
            Some(bucket) => {
                bucket.push(rule);
                true
            },
            None => false,
        }
    }

    /// Remove a rule (by id) from the bucket of its level
    pub fn remove_rule(&mut self, rule: &Rule) -> bool {
        self.bucket_mut(rule.level)
            .is_some_and(|bucket| remove_first(bucket, |r| r.id == rule.id))
    }

    /// Highest prior count referenced by the study rules
    #[must_use]
    pub fn number_of_priors_referenced(&self) -> i64 {
        self.study_matching_rules
            .iter()
            .map(Rule::number_of_priors_referenced)
            .fold(0, i64::max)
    }

    /// Resolve which prior study this viewport refers to
    ///
    /// The last `abstractPriorValue` study rule gives a 1-based index into
    /// the relevant priors (negative values count from the end). All other
    /// study rules filter the priors: with filters present, only priors
    /// scoring above zero are relevant.
    pub fn get_referenced_prior<'a, P: Metadata>(
        &self,
        priors: &'a [P],
        matcher: &Matcher,
        attributes: &AttributeCache,
    ) -> ReferencedPrior<'a, P> {
        let mut filters = Vec::new();
        let mut abstract_prior_value = None;
        let mut references_found = false;

        for rule in &self.study_matching_rules {
            if rule.is_rule_for_prior() {
                abstract_prior_value = rule.constraint().first_option_value().and_then(value::parse_int);
                references_found = abstract_prior_value.is_some_and(|v| v != 0);
            } else {
                filters.push(rule);
            }
        }

        let mut referred_prior = None;
        if let (true, Some(index)) = (references_found, abstract_prior_value) {
            let relevant: Vec<&'a P> = if filters.is_empty() {
                priors.iter().collect()
            } else {
                priors
                    .iter()
                    .filter(|prior| matcher.match_rules(*prior, attributes, filters.iter().copied()).score > 0)
                    .collect()
            };
            let count = i64::try_from(relevant.len()).unwrap_or(i64::MAX);
            let position = if index > 0 && index <= count {
                Some(index - 1)
            } else if index < 0 && count + index >= 0 {
                Some(count + index)
            } else {
                None
            };
            referred_prior = position
                .and_then(|p| usize::try_from(p).ok())
                .and_then(|p| relevant.get(p).copied());
        }

        ReferencedPrior {
            references_found,
            referred_prior,
            abstract_prior_value,
        }
    }
}
