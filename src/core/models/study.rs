//! Study, series and instance metadata
//!
//! A [`StudyMetadata`] owns its series, each [`SeriesMetadata`] owns its
//! instances. A [`StudySummary`] carries only study-level tags and can be
//! hydrated into full metadata through a [`StudyMetadataSource`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::dictionary;
use super::metadata::{AttributeMap, Metadata, TagMap};
use crate::core::error::SourceError;
use crate::core::ports::StudyMetadataSource;

macro_rules! impl_metadata {
    ($ty:ty, $uid_tag:expr) => {
        impl Metadata for $ty {
            fn object_id(&self) -> &str {
                if self.uid.is_empty() {
                    self.tag_str($uid_tag).unwrap_or_default()
                } else {
                    &self.uid
                }
            }

            fn tags(&self) -> &TagMap {
                &self.tags
            }

            fn custom_attributes(&self) -> &AttributeMap {
                &self.custom
            }
        }
    };
}

/// A single image (DICOM instance)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceMetadata {
    /// Object id (normally the SOP Instance UID)
    #[serde(default)]
    pub uid: String,
    /// Identifier the viewer loads the image by
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    /// DICOM tags
    #[serde(default)]
    pub tags: TagMap,
    /// Custom attributes (display set membership, ...)
    #[serde(default)]
    pub custom: AttributeMap,
}

impl_metadata!(InstanceMetadata, dictionary::SOP_INSTANCE_UID);

impl InstanceMetadata {
    /// Instance with the given object id and no tags
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Self::default()
        }
    }

    /// Builder: set a tag
    #[must_use]
    pub fn with_tag(mut self, key: &str, value: Value) -> Self {
        self.tags.insert(key, value);
        self
    }

    /// Builder: set a custom attribute
    #[must_use]
    pub fn with_custom(mut self, key: &str, value: Value) -> Self {
        self.custom.insert(key.to_string(), value);
        self
    }

    /// Builder: set the image id
    #[must_use]
    pub fn with_image_id(mut self, image_id: impl Into<String>) -> Self {
        self.image_id = Some(image_id.into());
        self
    }

    /// SOP Instance UID (tag, falling back to the object id)
    #[must_use]
    pub fn sop_instance_uid(&self) -> &str {
        self.tag_str(dictionary::SOP_INSTANCE_UID).unwrap_or(&self.uid)
    }

    /// Image id (explicit, falling back to the SOP Instance UID)
    #[must_use]
    pub fn image_id(&self) -> &str {
        self.image_id.as_deref().unwrap_or_else(|| self.sop_instance_uid())
    }

    /// Whether the instance carries pixel data (positive `Rows`)
    #[must_use]
    pub fn has_pixel_data(&self) -> bool {
        self.tag_value(dictionary::ROWS)
            .and_then(super::value::to_number)
            .is_some_and(|rows| rows > 0.0)
    }
}

/// A series and its instances
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesMetadata {
    /// Object id (normally the Series Instance UID)
    #[serde(default)]
    pub uid: String,
    /// Series-level tags
    #[serde(default)]
    pub tags: TagMap,
    /// Custom attributes
    #[serde(default)]
    pub custom: AttributeMap,
    /// Instances in acquisition order
    #[serde(default)]
    pub instances: Vec<InstanceMetadata>,
}

impl_metadata!(SeriesMetadata, dictionary::SERIES_INSTANCE_UID);

impl SeriesMetadata {
    /// Series with the given object id and no instances
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Self::default()
        }
    }

    /// Builder: set a tag
    #[must_use]
    pub fn with_tag(mut self, key: &str, value: Value) -> Self {
        self.tags.insert(key, value);
        self
    }

    /// Builder: append an instance
    #[must_use]
    pub fn with_instance(mut self, instance: InstanceMetadata) -> Self {
        self.instances.push(instance);
        self
    }

    /// Series Instance UID (tag, falling back to the object id)
    #[must_use]
    pub fn series_instance_uid(&self) -> &str {
        self.tag_str(dictionary::SERIES_INSTANCE_UID).unwrap_or(&self.uid)
    }

    /// First instance of the series
    #[must_use]
    pub fn first_instance(&self) -> Option<&InstanceMetadata> {
        self.instances.first()
    }

    /// Instances of the series
    #[must_use]
    pub fn instances(&self) -> &[InstanceMetadata] {
        &self.instances
    }
}

/// Full metadata of a study
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyMetadata {
    /// Object id (normally the Study Instance UID)
    #[serde(default)]
    pub uid: String,
    /// Study-level tags
    #[serde(default)]
    pub tags: TagMap,
    /// Custom attributes
    #[serde(default)]
    pub custom: AttributeMap,
    /// Series of the study
    #[serde(default)]
    pub series: Vec<SeriesMetadata>,
}

impl_metadata!(StudyMetadata, dictionary::STUDY_INSTANCE_UID);

impl StudyMetadata {
    /// Study with the given object id and no series
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Self::default()
        }
    }

    /// Builder: set a tag
    #[must_use]
    pub fn with_tag(mut self, key: &str, value: Value) -> Self {
        self.tags.insert(key, value);
        self
    }

    /// Builder: append a series
    #[must_use]
    pub fn with_series(mut self, series: SeriesMetadata) -> Self {
        self.series.push(series);
        self
    }

    /// Parse study metadata from a JSON document
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Study Instance UID (tag, falling back to the object id)
    #[must_use]
    pub fn study_instance_uid(&self) -> &str {
        self.tag_str(dictionary::STUDY_INSTANCE_UID).unwrap_or(&self.uid)
    }

    /// Series of the study
    #[must_use]
    pub fn series(&self) -> &[SeriesMetadata] {
        &self.series
    }

    /// First instance of the first series that has one
    #[must_use]
    pub fn first_instance(&self) -> Option<&InstanceMetadata> {
        self.series.iter().find_map(SeriesMetadata::first_instance)
    }

    /// Find a series by Series Instance UID
    #[must_use]
    pub fn find_series(&self, uid: &str) -> Option<&SeriesMetadata> {
        self.series.iter().find(|s| s.series_instance_uid() == uid)
    }

    /// Total number of instances
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.series.iter().map(|s| s.instances.len()).sum()
    }

    /// Visit every series with its index
    pub fn for_each_series(&self, mut visit: impl FnMut(&SeriesMetadata, usize)) {
        for (index, series) in self.series.iter().enumerate() {
            visit(series, index);
        }
    }

    /// Visit every instance of every series
    ///
    /// The index is the instance's position within its series.
    pub fn for_each_instance(&self, mut visit: impl FnMut(&SeriesMetadata, &InstanceMetadata, usize)) {
        for series in &self.series {
            for (index, instance) in series.instances.iter().enumerate() {
                visit(series, instance, index);
            }
        }
    }
}

/// Study-level summary of a (prior) study
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySummary {
    /// Object id (normally the Study Instance UID)
    #[serde(default)]
    pub uid: String,
    /// Study-level tags
    #[serde(default)]
    pub tags: TagMap,
    /// Custom attributes
    #[serde(default)]
    pub custom: AttributeMap,
    #[serde(skip)]
    source: Option<Arc<dyn StudyMetadataSource>>,
}

impl_metadata!(StudySummary, dictionary::STUDY_INSTANCE_UID);

impl std::fmt::Debug for StudySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudySummary")
            .field("uid", &self.uid)
            .field("tags", &self.tags)
            .field("custom", &self.custom)
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

impl StudySummary {
    /// Summary with the given object id
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Self::default()
        }
    }

    /// Builder: set a tag
    #[must_use]
    pub fn with_tag(mut self, key: &str, value: Value) -> Self {
        self.tags.insert(key, value);
        self
    }

    /// Builder: attach the source used to load full metadata
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn StudyMetadataSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Study Instance UID (tag, falling back to the object id)
    #[must_use]
    pub fn study_instance_uid(&self) -> &str {
        self.tag_str(dictionary::STUDY_INSTANCE_UID).unwrap_or(&self.uid)
    }

    /// Load the full metadata this summary describes
    pub async fn load_full_metadata(&self) -> Result<StudyMetadata, SourceError> {
        match &self.source {
            Some(source) => source.load_study(self).await,
            None => Err(SourceError::NotImplemented("StudySummary::load_full_metadata".to_string())),
        }
    }
}

/// A prior study, either summarised or fully loaded
#[derive(Debug, Clone)]
pub enum PriorStudy {
    /// Study-level summary; hydrated on demand
    Summary(StudySummary),
    /// Full metadata, used as is
    Metadata(Arc<StudyMetadata>),
}

impl PriorStudy {
    fn inner(&self) -> &dyn Metadata {
        match self {
            Self::Summary(summary) => summary,
            Self::Metadata(study) => study.as_ref(),
        }
    }

    /// Study Instance UID of the prior
    #[must_use]
    pub fn study_instance_uid(&self) -> &str {
        match self {
            Self::Summary(summary) => summary.study_instance_uid(),
            Self::Metadata(study) => study.study_instance_uid(),
        }
    }

    /// Full metadata of the prior, loading it for summaries
    pub async fn hydrate(&self) -> Result<Arc<StudyMetadata>, SourceError> {
        match self {
            Self::Summary(summary) => summary.load_full_metadata().await.map(Arc::new),
            Self::Metadata(study) => Ok(Arc::clone(study)),
        }
    }
}

impl Metadata for PriorStudy {
    fn object_id(&self) -> &str {
        self.inner().object_id()
    }

    fn tags(&self) -> &TagMap {
        self.inner().tags()
    }

    fn custom_attributes(&self) -> &AttributeMap {
        self.inner().custom_attributes()
    }
}

impl From<StudySummary> for PriorStudy {
    fn from(summary: StudySummary) -> Self {
        Self::Summary(summary)
    }
}

impl From<StudyMetadata> for PriorStudy {
    fn from(study: StudyMetadata) -> Self {
        Self::Metadata(Arc::new(study))
    }
}

impl From<Arc<StudyMetadata>> for PriorStudy {
    fn from(study: Arc<StudyMetadata>) -> Self {
        Self::Metadata(study)
    }
}
