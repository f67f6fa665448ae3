//! Hanging protocols
//!
//! A [`Protocol`] is the root of the model tree: matching rules that decide
//! whether it applies to a study, and the stages that describe what to show.
//! Rules and stages are only reachable mutably through methods that keep
//! [`Protocol::number_of_priors_referenced`] current.

use chrono::{DateTime, Utc};

use super::ids;
use super::rule::Rule;
use super::stage::Stage;
use crate::shared::collections::remove_first;

/// User id given to protocols that belong to nobody in particular
pub const ANY_USER: &str = "*";

/// A named layout plus the rules deciding when to use it
#[derive(Debug, Clone, PartialEq)]
pub struct Protocol {
    /// Unique identifier
    pub id: String,
    /// Identifier of the stored document, when persisted
    pub document_id: Option<String>,
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: Option<String>,
    /// Locked protocols must not be edited
    pub locked: bool,
    /// Owner
    pub user_id: Option<String>,
    /// Creation time
    pub created_date: DateTime<Utc>,
    /// Creator
    pub created_by: Option<String>,
    /// Last modification time
    pub modified_date: DateTime<Utc>,
    /// Last modifier
    pub modified_by: Option<String>,
    protocol_matching_rules: Vec<Rule>,
    stages: Vec<Stage>,
    number_of_priors_referenced: i64,
}

impl Protocol {
    /// Empty, unlocked protocol with a fresh id
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ids::generate_id(),
            document_id: None,
            name: name.into(),
            description,
            locked: false,
            user_id: Some(ANY_USER.to_string()),
            created_date: now,
            created_by: None,
            modified_date: now,
            modified_by: None,
            protocol_matching_rules: Vec::new(),
            stages: Vec::new(),
            number_of_priors_referenced: 0,
        }
    }

    /// Builder: set the id
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Builder: append a protocol matching rule
    #[must_use]
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.add_protocol_matching_rule(rule);
        self
    }

    /// Builder: append a stage
    #[must_use]
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.add_stage(stage);
        self
    }

    /// Rules scored against the study
    #[must_use]
    pub fn protocol_matching_rules(&self) -> &[Rule] {
        &self.protocol_matching_rules
    }

    /// Stages of the display sequence
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Number of prior studies the protocol needs (cached)
    #[must_use]
    pub const fn number_of_priors_referenced(&self) -> i64 {
        self.number_of_priors_referenced
    }

    /// Walk every viewport and compute the number of priors referenced
    #[must_use]
    pub fn compute_number_of_priors_referenced(&self) -> i64 {
        self.stages
            .iter()
            .flat_map(|stage| &stage.screens)
            .flat_map(|screen| &screen.viewports)
            .map(super::viewport::Viewport::number_of_priors_referenced)
            .fold(0, i64::max)
    }

    /// Refresh the cached number of priors referenced
    pub fn update_number_of_priors_referenced(&mut self) {
        self.number_of_priors_referenced = self.compute_number_of_priors_referenced();
    }

    /// Record a modification: refresh derived data and the modified date
    pub fn protocol_was_modified(&mut self) {
        self.update_number_of_priors_referenced();
        self.modified_date = Utc::now();
    }

    /// Append a stage
    pub fn add_stage(&mut self, stage: Stage) {
        self.stages.push(stage);
        self.protocol_was_modified();
    }

    /// Append a protocol matching rule
    pub fn add_protocol_matching_rule(&mut self, rule: Rule) {
        self.protocol_matching_rules.push(rule);
        self.protocol_was_modified();
    }

    /// Remove a protocol matching rule by id
    pub fn remove_protocol_matching_rule(&mut self, rule: &Rule) -> bool {
        let removed = remove_first(&mut self.protocol_matching_rules, |r| r.id == rule.id);
        if removed {
            self.protocol_was_modified();
        }
        removed
    }

    /// Edit the stages in place
    ///
    /// The protocol is marked modified once `edit` returns.
    pub fn stages_mut<R>(&mut self, edit: impl FnOnce(&mut Vec<Stage>) -> R) -> R {
        let result = edit(&mut self.stages);
        self.protocol_was_modified();
        result
    }

    /// Replace rules and stages without touching the modification stamp
    pub fn set_contents(&mut self, protocol_matching_rules: Vec<Rule>, stages: Vec<Stage>) {
        self.protocol_matching_rules = protocol_matching_rules;
        self.stages = stages;
        self.update_number_of_priors_referenced();
    }

    /// Unlocked copy under a fresh id, optionally renamed
    ///
    /// Stages, screens and rules keep their ids.
    #[must_use]
    pub fn create_clone(&self, name: Option<&str>) -> Self {
        let mut clone = self.clone();
        clone.id = ids::generate_id();
        clone.locked = false;
        if let Some(name) = name {
            clone.name = name.to_string();
        }
        clone
    }
}
