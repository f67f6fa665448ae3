//! Study metadata source port

use async_trait::async_trait;

use crate::core::error::SourceError;
use crate::core::models::{StudyMetadata, StudySummary};

/// Loads full study metadata, used to hydrate prior summaries
#[async_trait]
pub trait StudyMetadataSource: Send + Sync {
    /// Load a study by Study Instance UID
    async fn get_by_instance_uid(&self, study_instance_uid: &str) -> Result<StudyMetadata, SourceError>;

    /// Load the study a summary describes
    async fn load_study(&self, summary: &StudySummary) -> Result<StudyMetadata, SourceError> {
        self.get_by_instance_uid(summary.study_instance_uid()).await
    }
}
