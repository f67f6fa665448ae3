//! Tests for image matching within a viewport

use std::sync::Arc;

use hanging_protocols::core::error::{EngineError, SourceError};
use hanging_protocols::core::models::{
    ABSTRACT_PRIOR_VALUE, Constraint, InstanceMetadata, Metadata, PriorStudy, Rule, StudyMetadata, StudySummary, Viewport,
};
use hanging_protocols::core::ports::StudyMetadataSource;
use hanging_protocols::core::services::ProtocolEngine;
use hanging_protocols::core::services::engine::{DISPLAY_SET_NUMBER, DISPLAY_SET_UID};
use serde_json::json;

use crate::common::fixtures::{image, prior_viewport, series, study};
use crate::common::mocks::{CountingProtocolSource, CountingStudySource};

/// Two series: "AX T1" (number 2, three images, one without pixel data)
/// and "SAG" (number 1, one image)
fn mr_study(uid: &str) -> StudyMetadata {
    study(
        uid,
        vec![
            series(
                &format!("{uid}.ax"),
                2,
                vec![
                    image(&format!("{uid}.i1"), &[("SeriesDescription", json!("AX T1")), ("InstanceNumber", json!(2))]),
                    image(&format!("{uid}.i2"), &[("SeriesDescription", json!("AX T1")), ("InstanceNumber", json!(1))]),
                    InstanceMetadata::new(format!("{uid}.i3")).with_tag("SeriesDescription", json!("AX T1")),
                ],
            ),
            series(
                &format!("{uid}.sag"),
                1,
                vec![image(&format!("{uid}.j1"), &[("SeriesDescription", json!("SAG")), ("InstanceNumber", json!(1))])],
            ),
        ],
    )
}

fn engine_with_priors(priors: Vec<PriorStudy>) -> ProtocolEngine {
    let source = Arc::new(CountingProtocolSource::new(Vec::new()));
    ProtocolEngine::new(Arc::new(mr_study("1.1")), priors, source).unwrap()
}

fn engine() -> ProtocolEngine {
    engine_with_priors(Vec::new())
}

fn sop_uids(matches: &hanging_protocols::core::services::ImageMatches) -> Vec<&str> {
    matches.matching_scores.iter().map(|m| m.sop_instance_uid.as_str()).collect()
}

#[tokio::test]
async fn test_failing_series_is_skipped() {
    let mut viewport = Viewport::new();
    viewport.add_rule(Rule::series("SeriesDescription", Constraint::contains("AX"), false, 2));

    let matches = engine().match_images(&viewport).await.unwrap();
    assert_eq!(sop_uids(&matches), vec!["1.1.i1", "1.1.i2"]);

    let best = matches.best_match.unwrap();
    assert_eq!(best.sop_instance_uid, "1.1.i1");
    assert_eq!(best.series_instance_uid, "1.1.ax");
    assert_eq!(best.study_instance_uid, "1.1");
    assert_eq!(best.matching_score, 2);
    assert_eq!(best.current_image_id_index, 0);
    assert_eq!(best.sorting_info.series, Some(2));
    assert_eq!(best.sorting_info.instance, Some(2));
}

#[tokio::test]
async fn test_image_rules_add_to_series_score() {
    let mut viewport = Viewport::new();
    viewport.add_rule(Rule::series("SeriesDescription", Constraint::contains("AX"), false, 2));
    viewport.add_rule(Rule::image("InstanceNumber", Constraint::equals(1), false, 5));

    let matches = engine().match_images(&viewport).await.unwrap();
    assert_eq!(sop_uids(&matches), vec!["1.1.i2", "1.1.i1"]);
    assert_eq!(matches.matching_scores[0].matching_score, 7);
    assert_eq!(matches.matching_scores[0].match_details.passed.len(), 2);
    assert_eq!(matches.matching_scores[1].matching_score, 2);
    assert_eq!(matches.matching_scores[1].match_details.failed.len(), 1);
}

#[tokio::test]
async fn test_required_image_rule_drops_image() {
    let mut viewport = Viewport::new();
    viewport.add_rule(Rule::image("InstanceNumber", Constraint::equals(1), true, 1));
    viewport.add_rule(Rule::image("SeriesDescription", Constraint::contains("AX"), false, 1));

    let matches = engine().match_images(&viewport).await.unwrap();
    // i1 fails the required rule; j1 passes it but scores 1 only
    assert_eq!(sop_uids(&matches), vec!["1.1.i2", "1.1.j1"]);
}

#[tokio::test]
async fn test_empty_viewport_accepts_every_image() {
    let matches = engine().match_images(&Viewport::new()).await.unwrap();
    // score ties; image index, then series number decide
    assert_eq!(sop_uids(&matches), vec!["1.1.j1", "1.1.i1", "1.1.i2"]);
    assert!(matches.matching_scores.iter().all(|m| m.matching_score == 0));
}

#[tokio::test]
async fn test_display_set_number_orders_before_image_index() {
    let engine = engine();
    let study = Arc::clone(engine.study());
    let ax = &study.series()[0];
    engine.attributes().set(&ax.instances()[1], DISPLAY_SET_NUMBER, json!(1));
    engine.attributes().set(&ax.instances()[1], DISPLAY_SET_UID, json!("ds-1"));

    let matches = engine.match_images(&Viewport::new()).await.unwrap();
    assert_eq!(sop_uids(&matches)[0], "1.1.i2");
    assert_eq!(matches.matching_scores[0].display_set_instance_uid.as_deref(), Some("ds-1"));
    assert_eq!(matches.matching_scores[0].sorting_info.display_set_number, Some(1.0));
    assert!(matches.matching_scores[1].display_set_instance_uid.is_none());
}

#[tokio::test]
async fn test_matching_is_repeatable() {
    let engine = engine();
    let mut viewport = Viewport::new();
    viewport.add_rule(Rule::image("SeriesDescription", Constraint::contains("AX"), false, 1));
    let first = engine.match_images(&viewport).await.unwrap();
    let second = engine.match_images(&viewport).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_prior_reference_uses_prior_images() {
    let prior = Arc::new(mr_study("0.9"));
    let engine = engine_with_priors(vec![PriorStudy::from(Arc::clone(&prior))]);

    let matches = engine.match_images(&prior_viewport(1)).await.unwrap();
    let best = matches.best_match.unwrap();
    assert_eq!(best.study_instance_uid, "0.9");
    assert_eq!(engine.attributes().get(prior.as_ref(), ABSTRACT_PRIOR_VALUE), Some(json!(1)));
}

#[tokio::test]
async fn test_negative_prior_reference_counts_from_end() {
    let priors = vec![
        PriorStudy::from(mr_study("0.3")),
        PriorStudy::from(mr_study("0.2")),
        PriorStudy::from(mr_study("0.1")),
    ];
    let engine = engine_with_priors(priors);
    let matches = engine.match_images(&prior_viewport(-1)).await.unwrap();
    assert_eq!(matches.best_match.unwrap().study_instance_uid, "0.1");
}

#[tokio::test]
async fn test_missing_prior_is_an_error() {
    let engine = engine_with_priors(vec![PriorStudy::from(mr_study("0.9"))]);
    let err = engine.match_images(&prior_viewport(3)).await.unwrap_err();
    assert_eq!(err, EngineError::PriorStudyNotFound(3));
}

#[tokio::test]
async fn test_prior_summary_is_hydrated() {
    let studies = Arc::new(CountingStudySource::new(vec![mr_study("0.9")]));
    let summary = StudySummary::new("0.9").with_source(Arc::clone(&studies) as Arc<dyn StudyMetadataSource>);
    let engine = engine_with_priors(vec![PriorStudy::from(summary)]);

    let matches = engine.match_images(&prior_viewport(1)).await.unwrap();
    assert_eq!(matches.matching_scores.len(), 3);
    assert!(matches.matching_scores.iter().all(|m| m.study_instance_uid == "0.9"));
    assert_eq!(studies.load_count(), 1);
}

#[tokio::test]
async fn test_summary_without_source_cannot_hydrate() {
    let engine = engine_with_priors(vec![PriorStudy::from(StudySummary::new("0.9"))]);
    let err = engine.match_images(&prior_viewport(1)).await.unwrap_err();
    assert!(matches!(err, EngineError::Source(SourceError::NotImplemented(_))));
}

#[tokio::test]
async fn test_prior_filters_select_relevant_priors() {
    let ct_prior = StudySummary::new("0.8").with_tag("Modality", json!("CT"));
    let mr_prior = StudySummary::new("0.9").with_tag("Modality", json!("MR"));
    let studies = Arc::new(CountingStudySource::new(vec![mr_study("0.9")]));
    let priors = vec![
        PriorStudy::from(ct_prior),
        PriorStudy::from(mr_prior.with_source(Arc::clone(&studies) as Arc<dyn StudyMetadataSource>)),
    ];
    let engine = engine_with_priors(priors);

    let mut viewport = prior_viewport(1);
    viewport.add_rule(Rule::study("Modality", Constraint::equals("MR"), false, 1));
    let matches = engine.match_images(&viewport).await.unwrap();
    assert_eq!(matches.best_match.unwrap().study_instance_uid, "0.9");
}

#[tokio::test]
async fn test_tag_identified_instances_keep_their_own_attributes() {
    let instances = vec![
        InstanceMetadata::default()
            .with_tag("SOPInstanceUID", json!("9.9.1.1"))
            .with_tag("InstanceNumber", json!(1))
            .with_tag("Rows", json!(512)),
        InstanceMetadata::default()
            .with_tag("SOPInstanceUID", json!("9.9.1.2"))
            .with_tag("InstanceNumber", json!(2))
            .with_tag("Rows", json!(512)),
    ];
    let source = Arc::new(CountingProtocolSource::new(Vec::new()));
    let study = Arc::new(study("9.9", vec![series("9.9.1", 1, instances)]));
    let mut engine = ProtocolEngine::new(study, Vec::new(), source).unwrap();
    engine
        .matcher_mut()
        .add_custom_attribute_retrieval_callback("phase", "Phase", |metadata: &dyn Metadata| {
            let number = metadata.tag_value("InstanceNumber").cloned().unwrap_or(serde_json::Value::Null);
            json!(format!("phase-{number}"))
        });

    let mut viewport = Viewport::new();
    viewport.add_rule(Rule::image("phase", Constraint::equals("phase-2"), true, 1));

    let matches = engine.match_images(&viewport).await.unwrap();
    assert_eq!(sop_uids(&matches), vec!["9.9.1.2"]);
}
