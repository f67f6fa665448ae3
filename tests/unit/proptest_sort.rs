//! Property-based tests for candidate ordering

use std::sync::Arc;

use hanging_protocols::core::models::{Constraint, Rule, Viewport};
use hanging_protocols::core::services::engine::DISPLAY_SET_NUMBER;
use hanging_protocols::core::services::{ImageMatch, ProtocolEngine};
use hanging_protocols::shared::sort::{SortOrder, SortValue, sort_by_specifiers};
use proptest::prelude::*;
use serde_json::json;

use crate::common::fixtures::{image, series, study};
use crate::common::mocks::CountingProtocolSource;

/// (series number, [(instance number, modality is MR, display set number)])
type SeriesSpec = (i64, Vec<(i64, bool, Option<u8>)>);

fn series_specs() -> impl Strategy<Value = Vec<SeriesSpec>> {
    prop::collection::vec(
        (1i64..20, prop::collection::vec((1i64..50, any::<bool>(), prop::option::of(0u8..4)), 1..6)),
        1..5,
    )
}

fn run(specs: &[SeriesSpec]) -> Vec<ImageMatch> {
    let mut all_series = Vec::new();
    let mut display_sets = Vec::new();
    for (s, (series_number, images)) in specs.iter().enumerate() {
        let mut instances = Vec::new();
        for (i, (instance_number, is_mr, display_set)) in images.iter().enumerate() {
            let uid = format!("s{s}.i{i}");
            let modality = if *is_mr { "MR" } else { "CT" };
            instances.push(image(&uid, &[("InstanceNumber", json!(instance_number)), ("Modality", json!(modality))]));
            if let Some(number) = display_set {
                display_sets.push((uid, *number));
            }
        }
        all_series.push(series(&format!("s{s}"), *series_number, instances));
    }

    let source = Arc::new(CountingProtocolSource::new(Vec::new()));
    let engine = ProtocolEngine::new(Arc::new(study("1.1", all_series)), Vec::new(), source).unwrap();
    for (uid, number) in display_sets {
        let study = Arc::clone(engine.study());
        study.for_each_instance(|_, instance, _| {
            if instance.uid == uid {
                engine.attributes().set(instance, DISPLAY_SET_NUMBER, json!(number));
            }
        });
    }

    let mut viewport = Viewport::new();
    viewport.add_rule(Rule::image("Modality", Constraint::equals("MR"), false, 3));

    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    runtime.block_on(engine.match_images(&viewport)).unwrap().matching_scores
}

type Tagged = (usize, u8, Option<u8>);

fn by_weight(item: &Tagged) -> SortValue {
    SortValue::number(f64::from(item.1))
}

fn by_optional(item: &Tagged) -> SortValue {
    SortValue::from_option(item.2)
}

fn key(m: &ImageMatch) -> (i64, f64, usize, i64, i64) {
    (
        -i64::from(m.sorting_info.score),
        m.sorting_info.display_set_number.unwrap_or(f64::INFINITY),
        m.current_image_id_index,
        m.sorting_info.series.unwrap_or(i64::MAX),
        m.sorting_info.instance.unwrap_or(i64::MAX),
    )
}

proptest! {
    /// Candidates follow score, display set, image index, series and instance order
    #[test]
    fn candidates_are_ordered_by_keys(specs in series_specs()) {
        let matches = run(&specs);
        let expected: usize = specs.iter().map(|(_, images)| images.len()).sum();
        prop_assert_eq!(matches.len(), expected);
        for pair in matches.windows(2) {
            prop_assert!(key(&pair[0]).partial_cmp(&key(&pair[1])) != Some(std::cmp::Ordering::Greater));
        }
    }

    /// Identical input gives an identical order
    #[test]
    fn ordering_is_deterministic(specs in series_specs()) {
        prop_assert_eq!(run(&specs), run(&specs));
    }

    /// Items tying on every key keep their input order
    #[test]
    fn sort_is_stable(values in prop::collection::vec((0u8..3, prop::option::of(0u8..3)), 0..40)) {
        let mut items: Vec<Tagged> = values.iter().enumerate().map(|(i, (a, b))| (i, *a, *b)).collect();
        sort_by_specifiers(&mut items, &[(by_weight, SortOrder::Desc), (by_optional, SortOrder::Asc)]);
        for pair in items.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if a.1 == b.1 && a.2 == b.2 {
                prop_assert!(a.0 < b.0);
            }
            // missing values sort after present ones
            if a.1 == b.1 && a.2.is_none() {
                prop_assert!(b.2.is_none());
            }
        }
    }
}
