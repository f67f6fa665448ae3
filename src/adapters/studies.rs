//! Study metadata stored as JSON documents
//!
//! A study directory holds one `<StudyInstanceUID>.json` file per study.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::core::error::SourceError;
use crate::core::models::StudyMetadata;
use crate::core::ports::StudyMetadataSource;

/// Load study metadata from a JSON file
pub fn load_study_file(path: &Path) -> Result<StudyMetadata, SourceError> {
    let display = path.display();
    let text = fs::read_to_string(path).map_err(|e| SourceError::io(&display, &e))?;
    StudyMetadata::from_json(&text).map_err(|e| SourceError::parse(&display, e))
}

/// Studies read from a directory of JSON documents
#[derive(Debug, Clone)]
pub struct DirectoryStudySource {
    root: PathBuf,
}

impl DirectoryStudySource {
    /// Source reading from `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of a study's document
    #[must_use]
    pub fn study_path(&self, study_instance_uid: &str) -> PathBuf {
        self.root.join(format!("{study_instance_uid}.json"))
    }
}

#[async_trait]
impl StudyMetadataSource for DirectoryStudySource {
    async fn get_by_instance_uid(&self, study_instance_uid: &str) -> Result<StudyMetadata, SourceError> {
        if study_instance_uid.is_empty() || study_instance_uid.contains(['/', '\\']) || study_instance_uid.starts_with('.') {
            return Err(SourceError::InvalidArgument(format!("invalid StudyInstanceUID: {study_instance_uid:?}")));
        }
        let path = self.study_path(study_instance_uid);
        if !path.is_file() {
            return Err(SourceError::StudyNotFound(study_instance_uid.to_string()));
        }
        log::debug!("loading study {study_instance_uid} from {}", path.display());
        load_study_file(&path)
    }
}
