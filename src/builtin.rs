//! Built-in protocols

use crate::core::models::{Protocol, Screen, Stage};
use crate::core::ports::DEFAULT_PROTOCOL_ID;

/// The fallback protocol: one stage, one 1x1 screen, one unconstrained viewport
///
/// It has no matching rules, so it is only ever selected as the fallback.
#[must_use]
pub fn default_protocol() -> Protocol {
    let stage = Stage::new(Some("Stage 1".to_string())).with_screen(Screen::with_grid_layout(
        1,
        1,
        Some("oneByOne".to_string()),
    ));
    let mut protocol = Protocol::new("Default", None).with_id(DEFAULT_PROTOCOL_ID).with_stage(stage);
    protocol.locked = true;
    protocol
}
