//! Output formatting for human and JSON modes
//!
//! This module provides structured output that can be rendered either as
//! human-readable text or machine-parseable JSON.

use colored::Colorize;
use serde::Serialize;

use crate::core::models::Protocol;
use crate::core::services::{ImageMatch, ImageMatches, ProtocolMatch, ProtocolSummary};

/// Output mode for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output (machine-readable)
    Json,
}

fn print_json<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

/// Result of a `match` run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    /// Study the protocols were ranked for
    pub study_instance_uid: String,
    /// Number of prior studies supplied
    pub prior_count: usize,
    /// Selected protocol
    pub best_protocol: RankedProtocol,
    /// Every matching protocol, best first
    pub matched: Vec<RankedProtocol>,
    /// Protocols that scored zero
    pub non_matched: Vec<ProtocolSummary>,
    /// Stage whose viewports were filled
    pub stage: Option<String>,
    /// Best image for each viewport of the stage's main screen
    pub viewports: Vec<ViewportReport>,
}

/// A protocol with its matching score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedProtocol {
    /// Protocol id
    pub id: String,
    /// Protocol name
    pub name: String,
    /// Matching score
    pub score: u32,
}

impl From<&ProtocolMatch> for RankedProtocol {
    fn from(m: &ProtocolMatch) -> Self {
        Self {
            id: m.protocol.id.clone(),
            name: m.protocol.name.clone(),
            score: m.score,
        }
    }
}

/// Image placement for one viewport
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportReport {
    /// Viewport position on the screen
    pub index: usize,
    /// Number of images that satisfied the viewport
    pub candidates: usize,
    /// Best image, if any
    pub best_match: Option<ImageReport>,
    /// Why matching failed, if it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ViewportReport {
    /// Report built from the engine's ranking
    #[must_use]
    pub fn from_matches(index: usize, matches: &ImageMatches) -> Self {
        Self {
            index,
            candidates: matches.matching_scores.len(),
            best_match: matches.best_match.as_ref().map(ImageReport::from),
            error: None,
        }
    }

    /// Report for a viewport that could not be filled
    #[must_use]
    pub fn failed(index: usize, error: impl ToString) -> Self {
        Self {
            index,
            candidates: 0,
            best_match: None,
            error: Some(error.to_string()),
        }
    }
}

/// A rule that failed while matching an image
#[derive(Debug, Serialize)]
pub struct FailedRuleReport {
    /// Attribute the rule tested
    pub attribute: String,
    /// Validator messages
    pub messages: Vec<String>,
}

/// The image chosen for a viewport
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReport {
    /// Study of the image
    pub study_instance_uid: String,
    /// Series of the image
    pub series_instance_uid: String,
    /// SOP Instance UID
    pub sop_instance_uid: String,
    /// Image id to load
    pub image_id: String,
    /// Combined series and image score
    pub score: u32,
    /// Number of rules that passed
    pub passed_rules: usize,
    /// Rules that failed
    pub failed_rules: Vec<FailedRuleReport>,
}

impl From<&ImageMatch> for ImageReport {
    fn from(m: &ImageMatch) -> Self {
        Self {
            study_instance_uid: m.study_instance_uid.clone(),
            series_instance_uid: m.series_instance_uid.clone(),
            sop_instance_uid: m.sop_instance_uid.clone(),
            image_id: m.image_id.clone(),
            score: m.matching_score,
            passed_rules: m.match_details.passed.len(),
            failed_rules: m
                .match_details
                .failed
                .iter()
                .map(|f| FailedRuleReport {
                    attribute: f.rule.attribute.clone(),
                    messages: f.error_messages.clone(),
                })
                .collect(),
        }
    }
}

impl MatchReport {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode, show_details: bool) {
        match mode {
            OutputMode::Human => self.render_human(show_details),
            OutputMode::Json => print_json(self),
        }
    }

    fn render_human(&self, show_details: bool) {
        println!("Study {} ({} prior(s))\n", self.study_instance_uid.bold(), self.prior_count);
        println!(
            "Best protocol: {} [{}] score {}",
            self.best_protocol.name.green().bold(),
            self.best_protocol.id,
            self.best_protocol.score
        );

        if show_details {
            if self.matched.len() > 1 {
                println!("\nOther matches:");
                for m in self.matched.iter().skip(1) {
                    println!("  {} [{}] score {}", m.name, m.id, m.score);
                }
            }
            if !self.non_matched.is_empty() {
                println!("\nNot matched:");
                for p in &self.non_matched {
                    println!("  {} [{}]", p.name.dimmed(), p.id);
                }
            }
        }

        match &self.stage {
            Some(stage) => println!("\nStage: {stage}"),
            None => println!("\nStage: (unnamed)"),
        }
        if self.viewports.is_empty() {
            println!("  No viewports.");
            return;
        }
        for viewport in &self.viewports {
            match (&viewport.best_match, &viewport.error) {
                (_, Some(error)) => println!("  Viewport {}: {}", viewport.index, error.red()),
                (Some(image), None) => {
                    println!(
                        "  Viewport {}: {} (series {}, score {}, {} candidate(s))",
                        viewport.index,
                        image.image_id.cyan(),
                        image.series_instance_uid,
                        image.score,
                        viewport.candidates
                    );
                    if show_details {
                        for failed in &image.failed_rules {
                            println!("          {}: {}", failed.attribute, failed.messages.join("; "));
                        }
                    }
                },
                (None, None) => println!("  Viewport {}: {}", viewport.index, "no matching image".yellow()),
            }
        }
    }
}

/// Summary of one protocol document
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolInfo {
    /// File the protocol was read from
    pub file: String,
    /// Protocol id
    pub id: String,
    /// Protocol name
    pub name: String,
    /// Whether the protocol is locked
    pub locked: bool,
    /// Number of protocol matching rules
    pub matching_rules: usize,
    /// Number of stages
    pub stages: usize,
    /// Number of screens across stages
    pub screens: usize,
    /// Number of viewports across screens
    pub viewports: usize,
    /// Highest prior index any viewport references
    pub number_of_priors_referenced: i64,
}

impl ProtocolInfo {
    /// Summarize a protocol loaded from `file`
    #[must_use]
    pub fn new(file: impl Into<String>, protocol: &Protocol) -> Self {
        let screens = protocol.stages().iter().map(|s| s.screens.len()).sum();
        let viewports = protocol
            .stages()
            .iter()
            .flat_map(|s| &s.screens)
            .map(|screen| screen.viewports.len())
            .sum();
        Self {
            file: file.into(),
            id: protocol.id.clone(),
            name: protocol.name.clone(),
            locked: protocol.locked,
            matching_rules: protocol.protocol_matching_rules().len(),
            stages: protocol.stages().len(),
            screens,
            viewports,
            number_of_priors_referenced: protocol.number_of_priors_referenced(),
        }
    }
}

/// Result of an `inspect` run
#[derive(Debug, Serialize)]
pub struct InspectReport {
    /// Inspected protocols
    pub protocols: Vec<ProtocolInfo>,
}

impl InspectReport {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => print_json(self),
        }
    }

    fn render_human(&self) {
        if self.protocols.is_empty() {
            println!("No protocols found.");
            return;
        }
        for p in &self.protocols {
            let lock = if p.locked { " (locked)" } else { "" };
            println!("{} [{}]{lock}", p.name.bold(), p.id);
            println!("  file:             {}", p.file);
            println!("  matching rules:   {}", p.matching_rules);
            println!("  stages:           {}", p.stages);
            println!("  screens:          {}", p.screens);
            println!("  viewports:        {}", p.viewports);
            println!("  priors referenced: {}\n", p.number_of_priors_referenced);
        }
    }
}

/// Result of an `init` run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitReport {
    /// Whether files were written (false when already initialized)
    pub initialized: bool,
    /// Config file path
    pub config: String,
    /// Protocol library directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocols_dir: Option<String>,
    /// Study metadata directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub studies_dir: Option<String>,
    /// Fallback protocol document written into the library
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_protocol: Option<String>,
}

impl InitReport {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => print_json(self),
        }
    }

    fn render_human(&self) {
        if !self.initialized {
            println!("Already initialized ({} exists).", self.config);
            println!("Use --force to reinitialize.");
            return;
        }
        println!("Initializing hangproto...\n");
        println!("  Created {}", self.config);
        for path in [&self.protocols_dir, &self.studies_dir, &self.default_protocol].into_iter().flatten() {
            println!("  Created {path}");
        }
        println!("\n{}", "hangproto initialized!".green().bold());
        println!("\nNext steps:");
        println!("  add protocol documents to the protocols directory");
        println!("  hangproto match --study STUDY.json");
    }
}
