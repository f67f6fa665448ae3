//! Tests for editing protocols

use hanging_protocols::builtin::default_protocol;
use hanging_protocols::core::models::{ANY_USER, Constraint, Protocol, Rule, RuleLevel, Screen, Stage, Viewport};

use crate::common::fixtures::prior_viewport;

fn stage_with(viewport: Viewport) -> Stage {
    let mut screen = Screen::with_grid_layout(1, 1, None);
    screen.viewports = vec![viewport];
    Stage::new(Some("Stage".to_string())).with_screen(screen)
}

#[test]
fn test_editing_session_tracks_priors() {
    let mut protocol = Protocol::new("MR brain", None);
    assert_eq!(protocol.user_id.as_deref(), Some(ANY_USER));
    assert_eq!(protocol.number_of_priors_referenced(), 0);

    protocol.add_stage(stage_with(prior_viewport(3)));
    assert_eq!(protocol.number_of_priors_referenced(), 3);

    protocol.add_stage(stage_with(prior_viewport(-2)));
    assert_eq!(protocol.number_of_priors_referenced(), 3);

    protocol.stages_mut(|stages| stages.remove(0));
    // negative references count as one prior
    assert_eq!(protocol.number_of_priors_referenced(), 1);

    protocol.stages_mut(Vec::clear);
    assert_eq!(protocol.number_of_priors_referenced(), 0);
}

#[test]
fn test_matching_rule_edits() {
    let mut protocol = Protocol::new("CT", None);
    let before = protocol.modified_date;
    let rule = Rule::protocol("Modality", Constraint::equals("CT"), true, 1);
    protocol.add_protocol_matching_rule(rule.clone());
    assert_eq!(protocol.protocol_matching_rules().len(), 1);
    assert!(protocol.modified_date >= before);

    assert!(protocol.remove_protocol_matching_rule(&rule));
    assert!(!protocol.remove_protocol_matching_rule(&rule));
    assert!(protocol.protocol_matching_rules().is_empty());
}

#[test]
fn test_clone_of_locked_protocol() {
    let original = default_protocol();
    let copy = original.create_clone(Some("My default"));
    assert!(!copy.locked);
    assert_ne!(copy.id, original.id);
    assert_eq!(copy.name, "My default");
    assert_eq!(copy.stages().len(), original.stages().len());
}

#[test]
fn test_viewport_rule_buckets() {
    let mut viewport = Viewport::new();
    assert!(!viewport.add_rule(Rule::protocol("Modality", Constraint::equals("CT"), false, 1)));
    assert!(viewport.add_rule(Rule::image("Rows", Constraint::equals(512), false, 1)));
    assert_eq!(viewport.rules(RuleLevel::Image).len(), 1);
    assert!(viewport.rules(RuleLevel::Series).is_empty());

    let copy = viewport.create_clone();
    assert_eq!(copy, viewport);
}

#[test]
fn test_description_rules() {
    assert!(Rule::series("SeriesDescription", Constraint::contains("AX"), false, 1).is_description_rule());
    assert!(Rule::series("x0008103e", Constraint::contains("AX"), false, 1).is_description_rule());
    assert!(!Rule::series("Modality", Constraint::equals("MR"), false, 1).is_description_rule());
}

#[test]
fn test_main_screen_is_first() {
    let mut stage = Stage::new(None)
        .with_screen(Screen::with_grid_layout(1, 1, Some("a".to_string())))
        .with_screen(Screen::with_grid_layout(1, 2, Some("b".to_string())));
    let second = stage.screens[1].clone();
    stage.set_main_screen(second);
    assert_eq!(stage.main_screen().and_then(|s| s.name.as_deref()), Some("b"));
    assert_eq!(stage.screens.len(), 2);
}
