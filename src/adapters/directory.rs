//! Protocol library backed by a directory of documents
//!
//! Every `*.json` and `*.toml` file under the directory is a protocol
//! document. A JSON file may also hold an array of protocol documents.
//! Files are read once, in path order, when the source is opened.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use walkdir::WalkDir;

use super::memory::InMemoryProtocolSource;
use crate::core::error::SourceError;
use crate::core::models::Protocol;
use crate::core::ports::{IterationStats, ProtocolDataSource, ProtocolVisitor, SearchResult};
use crate::document::ProtocolDocument;

/// Whether a path looks like a protocol document
#[must_use]
pub fn is_protocol_document(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("json" | "toml"))
}

/// Load the protocols stored in one document file
pub fn load_protocol_file(path: &Path) -> Result<Vec<Protocol>, SourceError> {
    let display = path.display();
    let text = fs::read_to_string(path).map_err(|e| SourceError::io(&display, &e))?;

    if path.extension().and_then(|e| e.to_str()) == Some("toml") {
        let document = ProtocolDocument::from_toml(&text).map_err(|e| SourceError::parse(&display, e))?;
        return Ok(vec![document.into_protocol(false)]);
    }

    let value: Value = serde_json::from_str(&text).map_err(|e| SourceError::parse(&display, e))?;
    let objects = match value {
        Value::Array(items) => items,
        single => vec![single],
    };
    objects
        .iter()
        .map(|object| Protocol::from_object(object, false).map_err(|e| SourceError::parse(&display, e)))
        .collect()
}

/// Protocols loaded from a directory tree
#[derive(Debug, Clone)]
pub struct DirectoryProtocolSource {
    root: PathBuf,
    files: Vec<PathBuf>,
    protocols: InMemoryProtocolSource,
}

impl DirectoryProtocolSource {
    /// Load every protocol document under `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(SourceError::Io {
                path: root.display().to_string(),
                message: "not a directory".to_string(),
            });
        }

        let mut files = Vec::new();
        let mut protocols = InMemoryProtocolSource::default();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.map_err(|e| SourceError::Io {
                path: root.display().to_string(),
                message: e.to_string(),
            })?;
            if !entry.file_type().is_file() || !is_protocol_document(entry.path()) {
                continue;
            }
            for protocol in load_protocol_file(entry.path())? {
                protocols.push(protocol);
            }
            files.push(entry.into_path());
        }

        log::debug!("loaded {} protocols from {} files under {}", protocols.len(), files.len(), root.display());
        Ok(Self { root, files, protocols })
    }

    /// Builder: append the built-in default protocol unless one is present
    #[must_use]
    pub fn with_default(mut self) -> Self {
        self.protocols = self.protocols.with_default();
        self
    }

    /// Directory the protocols were loaded from
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Document files that were loaded
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// The loaded protocols
    #[must_use]
    pub fn protocols(&self) -> &[Arc<Protocol>] {
        self.protocols.protocols()
    }
}

#[async_trait]
impl ProtocolDataSource for DirectoryProtocolSource {
    async fn for_each(&self, visit: &mut ProtocolVisitor<'_>) -> Result<IterationStats, SourceError> {
        self.protocols.for_each(visit).await
    }

    async fn find_by_id(&self, id: &str) -> Result<SearchResult, SourceError> {
        self.protocols.find_by_id(id).await
    }
}
