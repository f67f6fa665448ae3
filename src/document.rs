//! Plain documents for protocols
//!
//! Protocols are stored and exchanged as nested JSON (or TOML) documents
//! with camelCase field names. The `*Document` types here are the
//! serialization format; `from_object`/`to_object` convert between them and
//! the models. Loading upgrades two legacy shapes:
//!
//! - a stage holding a single screen's `viewports` directly (no `screens`)
//! - a screen layout written as `viewportStructure: {type, properties: {rows, columns}, layoutTemplateName}`
//!
//! Documents are always written back in the current shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::error::ModelError;
use crate::core::models::{
    Constraint, Layout, Protocol, Rule, RuleLevel, Screen, Stage, Viewport, generate_id,
};
use crate::shared::date;

fn default_weight() -> u32 {
    1
}

/// Id to use for a loaded entity
fn entity_id(id: Option<String>, reset_ids: bool) -> String {
    match id {
        Some(id) if !reset_ids && !id.is_empty() => id,
        _ => generate_id(),
    }
}

/// Rule entry (serialization format)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDocument {
    /// Rule id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Attribute name
    #[serde(default)]
    pub attribute: String,
    /// Constraint map
    #[serde(default)]
    pub constraint: Constraint,
    /// Whether the rule is required (default false)
    #[serde(default)]
    pub required: bool,
    /// Rule weight (default 1)
    #[serde(default = "default_weight")]
    pub weight: u32,
}

impl RuleDocument {
    /// Document for a rule
    #[must_use]
    pub fn from_rule(rule: &Rule) -> Self {
        Self {
            id: Some(rule.id.clone()),
            attribute: rule.attribute.clone(),
            constraint: rule.constraint().clone(),
            required: rule.required,
            weight: rule.weight,
        }
    }

    /// Build the rule for a matching pass
    #[must_use]
    pub fn into_rule(self, level: RuleLevel, reset_ids: bool) -> Rule {
        Rule::with_id(
            entity_id(self.id, reset_ids),
            level,
            self.attribute,
            self.constraint,
            self.required,
            self.weight,
        )
    }
}

fn rules_from(documents: Vec<RuleDocument>, level: RuleLevel, reset_ids: bool) -> Vec<Rule> {
    documents.into_iter().map(|d| d.into_rule(level, reset_ids)).collect()
}

fn rule_documents(rules: &[Rule]) -> Vec<RuleDocument> {
    rules.iter().map(RuleDocument::from_rule).collect()
}

/// Viewport entry (serialization format)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportDocument {
    /// Render settings
    #[serde(default)]
    pub viewport_settings: Map<String, Value>,
    /// Image-level rules
    #[serde(default)]
    pub image_matching_rules: Vec<RuleDocument>,
    /// Series-level rules
    #[serde(default)]
    pub series_matching_rules: Vec<RuleDocument>,
    /// Study-level rules
    #[serde(default)]
    pub study_matching_rules: Vec<RuleDocument>,
}

impl ViewportDocument {
    /// Document for a viewport
    #[must_use]
    pub fn from_viewport(viewport: &Viewport) -> Self {
        Self {
            viewport_settings: viewport.settings.clone(),
            image_matching_rules: rule_documents(&viewport.image_matching_rules),
            series_matching_rules: rule_documents(&viewport.series_matching_rules),
            study_matching_rules: rule_documents(&viewport.study_matching_rules),
        }
    }

    /// Build the viewport
    #[must_use]
    pub fn into_viewport(self, reset_ids: bool) -> Viewport {
        Viewport {
            settings: self.viewport_settings,
            image_matching_rules: rules_from(self.image_matching_rules, RuleLevel::Image, reset_ids),
            series_matching_rules: rules_from(self.series_matching_rules, RuleLevel::Series, reset_ids),
            study_matching_rules: rules_from(self.study_matching_rules, RuleLevel::Study, reset_ids),
        }
    }
}

/// Dimensions of a legacy viewport structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyLayoutProperties {
    /// Number of rows
    #[serde(default)]
    pub rows: u32,
    /// Number of columns
    #[serde(default)]
    pub columns: u32,
}

/// Legacy `viewportStructure` layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportStructureDocument {
    /// Layout type
    #[serde(rename = "type")]
    pub layout_type: String,
    /// Grid dimensions
    #[serde(default)]
    pub properties: LegacyLayoutProperties,
    /// Named layout template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_template_name: Option<String>,
}

impl From<ViewportStructureDocument> for Layout {
    fn from(structure: ViewportStructureDocument) -> Self {
        Self {
            layout_type: structure.layout_type,
            rows: structure.properties.rows,
            columns: structure.properties.columns,
            template_name: structure.layout_template_name,
        }
    }
}

/// Screen entry (serialization format)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenDocument {
    /// Screen id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Screen name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Layout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
    /// Legacy layout, read only
    #[serde(default, skip_serializing)]
    pub viewport_structure: Option<ViewportStructureDocument>,
    /// Position hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Value>,
    /// Monitor selectors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectors: Option<Value>,
    /// Viewports
    #[serde(default)]
    pub viewports: Vec<ViewportDocument>,
}

impl ScreenDocument {
    /// Document for a screen
    #[must_use]
    pub fn from_screen(screen: &Screen) -> Self {
        Self {
            id: Some(screen.id.clone()),
            name: screen.name.clone(),
            layout: Some(screen.layout.clone()),
            viewport_structure: None,
            position: screen.position.clone(),
            selectors: screen.selectors.clone(),
            viewports: screen.viewports.iter().map(ViewportDocument::from_viewport).collect(),
        }
    }

    /// Build the screen; a missing layout becomes a 1x1 grid
    #[must_use]
    pub fn into_screen(self, reset_ids: bool) -> Screen {
        let layout = self
            .layout
            .or_else(|| self.viewport_structure.map(Layout::from))
            .unwrap_or_default();
        Screen {
            id: entity_id(self.id, reset_ids),
            name: self.name,
            layout,
            position: self.position.filter(|v| !v.is_null()),
            selectors: self.selectors.filter(|v| !v.is_null()),
            viewports: self.viewports.into_iter().map(|v| v.into_viewport(reset_ids)).collect(),
        }
    }
}

/// Stage entry (serialization format)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDocument {
    /// Stage id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Stage name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Creation time
    #[serde(default, with = "date::optional", skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    /// Screens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screens: Option<Vec<ScreenDocument>>,
    /// Legacy single-screen layout, read only
    #[serde(default, skip_serializing)]
    pub viewport_structure: Option<ViewportStructureDocument>,
    /// Legacy single-screen viewports, read only
    #[serde(default, skip_serializing)]
    pub viewports: Option<Vec<ViewportDocument>>,
}

impl StageDocument {
    /// Document for a stage
    #[must_use]
    pub fn from_stage(stage: &Stage) -> Self {
        Self {
            id: Some(stage.id.clone()),
            name: stage.name.clone(),
            created_date: Some(stage.created_date),
            screens: Some(stage.screens.iter().map(ScreenDocument::from_screen).collect()),
            viewport_structure: None,
            viewports: None,
        }
    }

    /// Move legacy single-screen fields into `screens`
    ///
    /// The upgraded screen takes the stage's id and name.
    #[must_use]
    pub fn upgrade(mut self) -> Self {
        if self.screens.is_none() {
            if let (Some(structure), Some(viewports)) = (self.viewport_structure.take(), self.viewports.take()) {
                self.screens = Some(vec![ScreenDocument {
                    id: self.id.clone(),
                    name: self.name.clone(),
                    viewport_structure: Some(structure),
                    viewports,
                    ..ScreenDocument::default()
                }]);
            }
        }
        self
    }

    /// Build the stage
    #[must_use]
    pub fn into_stage(self, reset_ids: bool) -> Stage {
        let upgraded = self.upgrade();
        Stage {
            id: entity_id(upgraded.id, reset_ids),
            name: upgraded.name,
            created_date: upgraded.created_date.unwrap_or_else(Utc::now),
            screens: upgraded
                .screens
                .unwrap_or_default()
                .into_iter()
                .map(|s| s.into_screen(reset_ids))
                .collect(),
        }
    }
}

/// Protocol entry (serialization format)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolDocument {
    /// Protocol id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Stored document id
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    /// Protocol name
    #[serde(default)]
    pub name: String,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Locked flag
    #[serde(default)]
    pub locked: bool,
    /// Owner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Creation time
    #[serde(default, alias = "createdAt", with = "date::optional", skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    /// Creator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    /// Last modification time
    #[serde(default, alias = "modifiedAt", with = "date::optional", skip_serializing_if = "Option::is_none")]
    pub modified_date: Option<DateTime<Utc>>,
    /// Last modifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
    /// Protocol matching rules
    #[serde(default)]
    pub protocol_matching_rules: Vec<RuleDocument>,
    /// Stages
    #[serde(default)]
    pub stages: Vec<StageDocument>,
    /// Derived; recomputed on load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_priors_referenced: Option<i64>,
}

impl ProtocolDocument {
    /// Parse a JSON protocol document
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse a TOML protocol document
    pub fn from_toml(text: &str) -> Result<Self, ModelError> {
        Ok(toml::from_str(text)?)
    }

    /// Document for a protocol
    #[must_use]
    pub fn from_protocol(protocol: &Protocol) -> Self {
        Self {
            id: Some(protocol.id.clone()),
            document_id: protocol.document_id.clone(),
            name: protocol.name.clone(),
            description: protocol.description.clone(),
            locked: protocol.locked,
            user_id: protocol.user_id.clone(),
            created_date: Some(protocol.created_date),
            created_by: protocol.created_by.clone(),
            modified_date: Some(protocol.modified_date),
            modified_by: protocol.modified_by.clone(),
            protocol_matching_rules: rule_documents(protocol.protocol_matching_rules()),
            stages: protocol.stages().iter().map(StageDocument::from_stage).collect(),
            number_of_priors_referenced: Some(protocol.number_of_priors_referenced()),
        }
    }

    /// Build the protocol
    ///
    /// With `reset_ids`, the protocol and every stage, screen and rule get
    /// fresh ids.
    #[must_use]
    pub fn into_protocol(self, reset_ids: bool) -> Protocol {
        let mut protocol = Protocol::new(self.name, self.description);
        protocol.id = entity_id(self.id, reset_ids);
        protocol.document_id = self.document_id;
        protocol.locked = self.locked;
        protocol.user_id = self.user_id;
        protocol.created_by = self.created_by;
        protocol.modified_by = self.modified_by;
        if let Some(created) = self.created_date {
            protocol.created_date = created;
        }
        if let Some(modified) = self.modified_date {
            protocol.modified_date = modified;
        }
        protocol.set_contents(
            rules_from(self.protocol_matching_rules, RuleLevel::Protocol, reset_ids),
            self.stages.into_iter().map(|s| s.into_stage(reset_ids)).collect(),
        );
        protocol
    }
}

impl Rule {
    /// Build a rule of `level` from a plain object
    pub fn from_object(input: &Value, level: RuleLevel, reset_ids: bool) -> Result<Self, ModelError> {
        Ok(RuleDocument::deserialize(input)?.into_rule(level, reset_ids))
    }

    /// Plain object form of the rule
    pub fn to_object(&self) -> Result<Value, ModelError> {
        Ok(serde_json::to_value(RuleDocument::from_rule(self))?)
    }
}

impl Viewport {
    /// Build a viewport from a plain object
    pub fn from_object(input: &Value, reset_ids: bool) -> Result<Self, ModelError> {
        Ok(ViewportDocument::deserialize(input)?.into_viewport(reset_ids))
    }

    /// Plain object form of the viewport
    pub fn to_object(&self) -> Result<Value, ModelError> {
        Ok(serde_json::to_value(ViewportDocument::from_viewport(self))?)
    }
}

impl Screen {
    /// Build a screen from a plain object
    pub fn from_object(input: &Value, reset_ids: bool) -> Result<Self, ModelError> {
        Ok(ScreenDocument::deserialize(input)?.into_screen(reset_ids))
    }

    /// Plain object form of the screen
    pub fn to_plain_object(&self) -> Result<Value, ModelError> {
        Ok(serde_json::to_value(ScreenDocument::from_screen(self))?)
    }
}

impl Stage {
    /// Build a stage from a plain object, upgrading the legacy shape
    pub fn from_object(input: &Value, reset_ids: bool) -> Result<Self, ModelError> {
        Ok(StageDocument::deserialize(input)?.into_stage(reset_ids))
    }

    /// Plain object form of the stage
    pub fn to_object(&self) -> Result<Value, ModelError> {
        Ok(serde_json::to_value(StageDocument::from_stage(self))?)
    }
}

impl Protocol {
    /// Build a protocol from a plain object
    ///
    /// Dates must be strings; anything else is rejected.
    pub fn from_object(input: &Value, reset_ids: bool) -> Result<Self, ModelError> {
        Ok(ProtocolDocument::deserialize(input)?.into_protocol(reset_ids))
    }

    /// Plain object form of the protocol
    pub fn to_object(&self) -> Result<Value, ModelError> {
        Ok(serde_json::to_value(ProtocolDocument::from_protocol(self))?)
    }
}
