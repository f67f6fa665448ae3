//! Protocol engine - ranks protocols for a study and images for viewports
//!
//! The engine borrows a study, its priors and a protocol library. Protocol
//! ranking runs once per engine and is memoized; concurrent callers share
//! the pass in flight. Image matching is recomputed for every viewport.

use std::ops::ControlFlow;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use super::matcher::{MatchDetails, Matcher};
use super::memo::{Memo, MemoState, RetryMemo};
use crate::core::error::EngineError;
use crate::core::models::dictionary::{INSTANCE_NUMBER, SERIES_NUMBER};
use crate::core::models::value::{display, parse_int, to_number};
use crate::core::models::{
    ABSTRACT_PRIOR_VALUE, AttributeCache, InstanceMetadata, Metadata, PriorStudy, Protocol, StudyMetadata, Viewport,
};
use crate::core::ports::{DEFAULT_PROTOCOL_ID, ProtocolDataSource};
use crate::shared::sort::{SortOrder, SortValue, sort_by_specifiers};

/// Custom attribute holding an image's display set id
pub const DISPLAY_SET_UID: &str = "displaySetUID";
/// Custom attribute holding an image's display set number
pub const DISPLAY_SET_NUMBER: &str = "displaySetNumber";
/// Custom attribute holding an image's position in its display set
pub const DISPLAY_SET_IMAGE_NUMBER: &str = "displaySetImageNumber";

/// A protocol that scored above zero
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolMatch {
    /// Protocol matching score
    pub score: u32,
    /// The protocol
    pub protocol: Arc<Protocol>,
}

/// Id and name of a protocol that did not match
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtocolSummary {
    /// Protocol id
    pub id: String,
    /// Protocol name
    pub name: String,
}

impl From<&Protocol> for ProtocolSummary {
    fn from(protocol: &Protocol) -> Self {
        Self {
            id: protocol.id.clone(),
            name: protocol.name.clone(),
        }
    }
}

/// Keys candidate images are ordered by
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortingInfo {
    /// Combined series and image score
    pub score: u32,
    /// Display set number, when assigned
    pub display_set_number: Option<f64>,
    /// Position within the display set, when assigned
    pub display_set_image_number: Option<f64>,
    /// Series Number tag
    pub series: Option<i64>,
    /// Instance Number tag
    pub instance: Option<i64>,
}

/// An image that satisfies a viewport
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMatch {
    /// Study the image belongs to
    pub study_instance_uid: String,
    /// Series the image belongs to
    pub series_instance_uid: String,
    /// SOP Instance UID of the image
    pub sop_instance_uid: String,
    /// Identifier the viewer loads the image by
    pub image_id: String,
    /// Display set the image belongs to, when assigned
    pub display_set_instance_uid: Option<String>,
    /// Position of the image within its series
    pub current_image_id_index: usize,
    /// Combined series and image score
    pub matching_score: u32,
    /// Series and image rule outcomes
    pub match_details: MatchDetails,
    /// Sort keys
    pub sorting_info: SortingInfo,
}

/// Ranked images for one viewport
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageMatches {
    /// Highest ranked image
    pub best_match: Option<ImageMatch>,
    /// Every candidate, best first
    pub matching_scores: Vec<ImageMatch>,
}

/// Memoized engine operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoKey {
    /// Fallback protocol lookup (evicted on failure)
    DefaultProtocol,
    /// Ranked matching protocols (failure is kept)
    MatchedProtocols,
    /// Protocols that scored zero (failure is kept)
    NonMatchedProtocols,
    /// Best protocol (evicted on failure)
    BestMatch,
}

/// Outcome of iterating the protocol library once
#[derive(Debug, Default)]
struct ProtocolPass {
    matched: Vec<ProtocolMatch>,
    non_matched: Vec<ProtocolSummary>,
}

/// Selects protocols and images for a study
pub struct ProtocolEngine {
    study: Arc<StudyMetadata>,
    priors: Vec<PriorStudy>,
    protocols: Arc<dyn ProtocolDataSource>,
    matcher: Matcher,
    attributes: AttributeCache,
    default_protocol_id: String,
    default_protocol: RetryMemo<Arc<Protocol>>,
    protocol_pass: Memo<Arc<ProtocolPass>>,
    matched_protocols: Memo<Arc<Vec<ProtocolMatch>>>,
    best_match: RetryMemo<Arc<Protocol>>,
}

impl std::fmt::Debug for ProtocolEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolEngine")
            .field("study", &self.study.study_instance_uid())
            .field("priors", &self.priors.len())
            .field("matcher", &self.matcher)
            .field("default_protocol_id", &self.default_protocol_id)
            .finish_non_exhaustive()
    }
}

fn custom_number(attributes: &AttributeCache, instance: &InstanceMetadata, attribute: &str) -> Option<f64> {
    attributes.get(instance, attribute).as_ref().and_then(to_number)
}

fn by_score(m: &ImageMatch) -> SortValue {
    SortValue::number(f64::from(m.sorting_info.score))
}

fn by_display_set_number(m: &ImageMatch) -> SortValue {
    SortValue::from_option(m.sorting_info.display_set_number)
}

fn by_display_set_image_number(m: &ImageMatch) -> SortValue {
    SortValue::from_option(m.sorting_info.display_set_image_number)
}

#[allow(clippy::cast_precision_loss)]
fn by_image_index(m: &ImageMatch) -> SortValue {
    SortValue::number(m.current_image_id_index as f64)
}

#[allow(clippy::cast_precision_loss)]
fn by_series_number(m: &ImageMatch) -> SortValue {
    SortValue::from_option(m.sorting_info.series.map(|n| n as f64))
}

#[allow(clippy::cast_precision_loss)]
fn by_instance_number(m: &ImageMatch) -> SortValue {
    SortValue::from_option(m.sorting_info.instance.map(|n| n as f64))
}

fn by_protocol_score(m: &ProtocolMatch) -> SortValue {
    SortValue::number(f64::from(m.score))
}

impl ProtocolEngine {
    /// Engine for `study`, its `priors` and a protocol library
    ///
    /// Fails if the study or a prior has no Study Instance UID.
    pub fn new(
        study: Arc<StudyMetadata>,
        priors: Vec<PriorStudy>,
        protocols: Arc<dyn ProtocolDataSource>,
    ) -> Result<Self, EngineError> {
        if study.study_instance_uid().is_empty() {
            return Err(EngineError::InvalidArgument("study has no StudyInstanceUID".to_string()));
        }
        if let Some(position) = priors.iter().position(|p| p.study_instance_uid().is_empty()) {
            return Err(EngineError::InvalidArgument(format!("prior #{position} has no StudyInstanceUID")));
        }

        Ok(Self {
            study,
            priors,
            protocols,
            matcher: Matcher::default(),
            attributes: AttributeCache::new(),
            default_protocol_id: DEFAULT_PROTOCOL_ID.to_string(),
            default_protocol: RetryMemo::new(),
            protocol_pass: Memo::new(),
            matched_protocols: Memo::new(),
            best_match: RetryMemo::new(),
        })
    }

    /// Builder: replace the matcher
    #[must_use]
    pub fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Builder: look up the fallback protocol under another id
    #[must_use]
    pub fn with_default_protocol_id(mut self, id: impl Into<String>) -> Self {
        self.default_protocol_id = id.into();
        self
    }

    /// The current study
    #[must_use]
    pub fn study(&self) -> &Arc<StudyMetadata> {
        &self.study
    }

    /// The prior studies
    #[must_use]
    pub fn priors(&self) -> &[PriorStudy] {
        &self.priors
    }

    /// The matcher used for every pass
    #[must_use]
    pub const fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Mutable matcher, e.g. to register attribute retrieval callbacks
    pub fn matcher_mut(&mut self) -> &mut Matcher {
        &mut self.matcher
    }

    /// Custom attributes resolved so far
    #[must_use]
    pub const fn attributes(&self) -> &AttributeCache {
        &self.attributes
    }

    /// State of a memoized operation
    #[must_use]
    pub fn memo_state(&self, key: MemoKey) -> MemoState {
        match key {
            MemoKey::DefaultProtocol => self.default_protocol.state(),
            MemoKey::MatchedProtocols => self.matched_protocols.state(),
            MemoKey::NonMatchedProtocols => self.protocol_pass.state(),
            MemoKey::BestMatch => self.best_match.state(),
        }
    }

    /// Discard the protocol matching results so the next call recomputes them
    pub fn reset_protocol_matches(&mut self) {
        self.protocol_pass.reset();
        self.matched_protocols.reset();
        self.best_match.reset();
    }

    /// The fallback protocol of the library (`defaultProtocol` unless
    /// configured otherwise)
    ///
    /// A failed lookup is not cached.
    pub async fn get_default_protocol(&self) -> Result<Arc<Protocol>, EngineError> {
        self.default_protocol
            .get_or_try_init(|| async {
                let result = self.protocols.find_by_id(&self.default_protocol_id).await.map_err(|err| {
                    log::warn!("error while reaching for default protocol: {err}");
                    EngineError::from(err)
                })?;
                match result.item {
                    Some(protocol) if result.found => {
                        log::info!("default protocol found in {:?}", result.duration);
                        Ok(protocol)
                    },
                    _ => {
                        log::warn!("default protocol not found");
                        Err(EngineError::DefaultProtocolNotFound(self.default_protocol_id.clone()))
                    },
                }
            })
            .await
    }

    /// Protocols scoring above zero, best first
    ///
    /// Falls back to the default protocol (score 1) when nothing matches.
    pub async fn get_matched_protocols(&self) -> Result<Arc<Vec<ProtocolMatch>>, EngineError> {
        self.matched_protocols
            .get_or_init(|| async {
                let pass = self.run_protocol_pass().await?;
                if !pass.matched.is_empty() {
                    return Ok(Arc::new(pass.matched.clone()));
                }
                let protocol = self.get_default_protocol().await?;
                log::info!("using default protocol");
                Ok(Arc::new(vec![ProtocolMatch { score: 1, protocol }]))
            })
            .await
    }

    /// Protocols that were scored but did not match
    pub async fn get_non_matched_protocols(&self) -> Result<Vec<ProtocolSummary>, EngineError> {
        Ok(self.run_protocol_pass().await?.non_matched.clone())
    }

    /// The highest ranked protocol
    pub async fn get_best_protocol_match(&self) -> Result<Arc<Protocol>, EngineError> {
        self.best_match
            .get_or_try_init(|| async {
                let matched = self.get_matched_protocols().await.map_err(|err| {
                    log::warn!("error while reaching out for matched protocols: {err}");
                    err
                })?;
                let best = matched
                    .first()
                    .map(|m| Arc::clone(&m.protocol))
                    .ok_or_else(|| EngineError::DefaultProtocolNotFound(self.default_protocol_id.clone()))?;
                log::info!("best protocol match found: {}", best.id);
                Ok(best)
            })
            .await
    }

    async fn run_protocol_pass(&self) -> Result<Arc<ProtocolPass>, EngineError> {
        self.protocol_pass
            .get_or_init(|| async {
                log::info!("protocol matching initialized for study {}", self.study.study_instance_uid());
                let available = i64::try_from(self.priors.len()).unwrap_or(i64::MAX);
                let target: &dyn Metadata = match self.study.first_instance() {
                    Some(instance) => instance,
                    None => self.study.as_ref(),
                };
                let mut pass = ProtocolPass::default();

                let stats = self
                    .protocols
                    .for_each(&mut |protocol, _| {
                        let rules = protocol.protocol_matching_rules();
                        if rules.is_empty() || protocol.number_of_priors_referenced() > available {
                            return ControlFlow::Continue(());
                        }
                        let result = self.matcher.match_rules(target, &self.attributes, rules);
                        if result.score > 0 {
                            pass.matched.push(ProtocolMatch {
                                score: result.score,
                                protocol: Arc::clone(protocol),
                            });
                        } else {
                            pass.non_matched.push(ProtocolSummary::from(protocol.as_ref()));
                        }
                        ControlFlow::Continue(())
                    })
                    .await?;

                log::info!(
                    "protocol matching stats: {} of {} protocols visited in {:?}, {} matched",
                    stats.iterations,
                    stats.items,
                    stats.duration,
                    pass.matched.len()
                );
                sort_by_specifiers(&mut pass.matched, &[(by_protocol_score, SortOrder::Desc)]);
                Ok(Arc::new(pass))
            })
            .await
    }

    /// Rank the images that satisfy a viewport
    ///
    /// The source study is the prior the viewport references, or the current
    /// study. Series failing their rules are skipped entirely, as are images
    /// without pixel data or failing their rules. A rule set that is empty
    /// accepts everything.
    pub async fn match_images(&self, viewport: &Viewport) -> Result<ImageMatches, EngineError> {
        log::info!("image matching initialized");

        let reference = viewport.get_referenced_prior(&self.priors, &self.matcher, &self.attributes);
        let study = if reference.references_found {
            match reference.referred_prior {
                Some(prior) => prior.hydrate().await?,
                None => {
                    return Err(EngineError::PriorStudyNotFound(reference.abstract_prior_value.unwrap_or_default()));
                },
            }
        } else {
            Arc::clone(&self.study)
        };

        if let Some(value) = reference.abstract_prior_value {
            self.attributes.set(study.as_ref(), ABSTRACT_PRIOR_VALUE, json!(value));
        }

        let mut candidates = self.collect_candidates(&study, viewport);
        sort_by_specifiers(
            &mut candidates,
            &[
                (by_score, SortOrder::Desc),
                (by_display_set_number, SortOrder::Asc),
                (by_display_set_image_number, SortOrder::Asc),
                (by_image_index, SortOrder::Asc),
                (by_series_number, SortOrder::Asc),
                (by_instance_number, SortOrder::Asc),
            ],
        );

        let best_match = candidates.first().cloned();
        match &best_match {
            Some(best) => log::info!("best image match: {} (score {})", best.sop_instance_uid, best.matching_score),
            None => log::info!("no image matches the viewport"),
        }

        Ok(ImageMatches {
            best_match,
            matching_scores: candidates,
        })
    }

    fn collect_candidates(&self, study: &StudyMetadata, viewport: &Viewport) -> Vec<ImageMatch> {
        let mut candidates = Vec::new();

        for series in study.series() {
            let Some(first) = series.first_instance() else {
                continue;
            };
            let series_match = self.matcher.match_rules(first, &self.attributes, &viewport.series_matching_rules);
            if series_match.score < 1 && !series_match.details.failed.is_empty() {
                continue;
            }

            for (index, instance) in series.instances().iter().enumerate() {
                if !instance.has_pixel_data() {
                    continue;
                }
                let image_match = self.matcher.match_rules(instance, &self.attributes, &viewport.image_matching_rules);

                let score = series_match.score.saturating_add(image_match.score);
                let mut details = series_match.details.clone();
                details.passed.extend(image_match.details.passed);
                details.failed.extend(image_match.details.failed);
                if score < 1 && !details.failed.is_empty() {
                    continue;
                }

                candidates.push(ImageMatch {
                    study_instance_uid: study.study_instance_uid().to_string(),
                    series_instance_uid: series.series_instance_uid().to_string(),
                    sop_instance_uid: instance.sop_instance_uid().to_string(),
                    image_id: instance.image_id().to_string(),
                    display_set_instance_uid: self.attributes.get(instance, DISPLAY_SET_UID).map(|v| display(&v)),
                    current_image_id_index: index,
                    matching_score: score,
                    match_details: details,
                    sorting_info: SortingInfo {
                        score,
                        display_set_number: custom_number(&self.attributes, instance, DISPLAY_SET_NUMBER),
                        display_set_image_number: custom_number(&self.attributes, instance, DISPLAY_SET_IMAGE_NUMBER),
                        series: instance.tag_value(SERIES_NUMBER).and_then(parse_int),
                        instance: instance.tag_value(INSTANCE_NUMBER).and_then(parse_int),
                    },
                });
            }
        }

        candidates
    }
}
