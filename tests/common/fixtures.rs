//! Test fixtures and builders
//!
//! Provides convenient builders for creating test data.

use hanging_protocols::core::models::{
    Constraint, InstanceMetadata, Protocol, Rule, Screen, SeriesMetadata, Stage, StudyMetadata, Viewport,
};
use serde_json::{Value, json};

/// An image with pixel data and the given tags
pub fn image(uid: &str, tags: &[(&str, Value)]) -> InstanceMetadata {
    let mut instance = InstanceMetadata::new(uid)
        .with_tag("SOPInstanceUID", json!(uid))
        .with_tag("Rows", json!(512));
    for (key, value) in tags {
        instance = instance.with_tag(key, value.clone());
    }
    instance
}

/// A series holding the given instances
///
/// Series tags are copied onto every instance, as in naturalized DICOM.
pub fn series(uid: &str, number: i64, instances: Vec<InstanceMetadata>) -> SeriesMetadata {
    let mut series = SeriesMetadata::new(uid)
        .with_tag("SeriesInstanceUID", json!(uid))
        .with_tag("SeriesNumber", json!(number));
    for instance in instances {
        series = series.with_instance(
            instance
                .with_tag("SeriesInstanceUID", json!(uid))
                .with_tag("SeriesNumber", json!(number)),
        );
    }
    series
}

/// A study holding the given series
pub fn study(uid: &str, series: Vec<SeriesMetadata>) -> StudyMetadata {
    let mut study = StudyMetadata::new(uid).with_tag("StudyInstanceUID", json!(uid));
    for s in series {
        study = study.with_series(s);
    }
    study
}

/// A CT study whose first image describes the study
pub fn ct_study(uid: &str) -> StudyMetadata {
    study(
        uid,
        vec![series(
            &format!("{uid}.1"),
            1,
            vec![image(
                &format!("{uid}.1.1"),
                &[
                    ("Modality", json!("CT")),
                    ("StudyDescription", json!("CT CHEST")),
                    ("SeriesDescription", json!("AX T2")),
                ],
            )],
        )],
    )
}

/// Builder for creating test protocols
pub struct ProtocolBuilder {
    protocol: Protocol,
}

impl ProtocolBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            protocol: Protocol::new(id.to_uppercase(), None).with_id(id),
        }
    }

    pub fn rule(mut self, attribute: &str, constraint: Constraint, required: bool, weight: u32) -> Self {
        self.protocol = self.protocol.with_rule(Rule::protocol(attribute, constraint, required, weight));
        self
    }

    pub fn viewport(mut self, viewport: Viewport) -> Self {
        let mut screen = Screen::with_grid_layout(1, 1, None);
        screen.viewports = vec![viewport];
        self.protocol = self.protocol.with_stage(Stage::new(Some("Stage 1".to_string())).with_screen(screen));
        self
    }

    pub fn build(self) -> Protocol {
        self.protocol
    }
}

/// A protocol matching `Modality` with the given weight
pub fn modality_protocol(id: &str, modality: &str, weight: u32) -> Protocol {
    ProtocolBuilder::new(id)
        .rule("Modality", Constraint::equals(modality), false, weight)
        .build()
}

/// A viewport referencing prior `index` (1-based, negative from the end)
pub fn prior_viewport(index: i64) -> Viewport {
    let mut viewport = Viewport::new();
    viewport.add_rule(Rule::study(
        hanging_protocols::core::models::ABSTRACT_PRIOR_VALUE,
        Constraint::equals(index),
        false,
        1,
    ));
    viewport
}
