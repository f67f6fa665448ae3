//! Property-based tests for rule scoring
//!
//! Uses proptest to verify properties that should hold for all inputs.

use hanging_protocols::core::models::{AttributeCache, Constraint, InstanceMetadata, Rule};
use hanging_protocols::core::services::Matcher;
use proptest::prelude::*;
use serde_json::json;

/// (passes, required, weight)
type RuleSpec = (bool, bool, u32);

fn metadata() -> InstanceMetadata {
    InstanceMetadata::new("1.2.3").with_tag("Modality", json!("MR"))
}

fn build(specs: &[RuleSpec]) -> Vec<Rule> {
    specs
        .iter()
        .map(|&(passes, required, weight)| {
            let modality = if passes { "MR" } else { "CT" };
            Rule::image("Modality", Constraint::equals(modality), required, weight)
        })
        .collect()
}

fn score(specs: &[RuleSpec]) -> u32 {
    Matcher::default().match_rules(&metadata(), &AttributeCache::new(), &build(specs)).score
}

fn rule_specs() -> impl Strategy<Value = Vec<RuleSpec>> {
    prop::collection::vec((any::<bool>(), any::<bool>(), 0u32..1000), 0..12)
}

proptest! {
    /// A failing required rule forces the score to zero
    #[test]
    fn failed_required_rule_zeroes_score(mut specs in rule_specs(), weight in 0u32..1000) {
        specs.push((false, true, weight));
        prop_assert_eq!(score(&specs), 0);
    }

    /// Without required failures the score is the sum of passing weights
    #[test]
    fn score_is_sum_of_passing_weights(specs in rule_specs()) {
        prop_assume!(!specs.iter().any(|&(passes, required, _)| required && !passes));
        let expected: u32 = specs.iter().filter(|s| s.0).map(|s| s.2).sum();
        prop_assert_eq!(score(&specs), expected);
    }

    /// Rule order never changes the score
    #[test]
    fn score_is_order_independent(
        (specs, shuffled) in rule_specs().prop_flat_map(|specs| (Just(specs.clone()), Just(specs).prop_shuffle()))
    ) {
        prop_assert_eq!(score(&specs), score(&shuffled));
    }

    /// Every rule lands in exactly one of passed or failed
    #[test]
    fn every_rule_is_reported(specs in rule_specs()) {
        let rules = build(&specs);
        let result = Matcher::default().match_rules(&metadata(), &AttributeCache::new(), &rules);
        prop_assert_eq!(result.details.passed.len() + result.details.failed.len(), specs.len());
        prop_assert_eq!(result.details.passed.len(), specs.iter().filter(|s| s.0).count());
    }
}
