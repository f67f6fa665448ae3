//! In-memory protocol library

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::builtin::default_protocol;
use crate::core::error::SourceError;
use crate::core::models::Protocol;
use crate::core::ports::{DEFAULT_PROTOCOL_ID, IterationStats, ProtocolDataSource, ProtocolVisitor, SearchResult};

/// Ordered list of protocols held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryProtocolSource {
    protocols: Vec<Arc<Protocol>>,
}

impl InMemoryProtocolSource {
    /// Source over the given protocols, in order
    #[must_use]
    pub fn new(protocols: Vec<Protocol>) -> Self {
        Self {
            protocols: protocols.into_iter().map(Arc::new).collect(),
        }
    }

    /// Builder: append the built-in default protocol unless one is present
    #[must_use]
    pub fn with_default(mut self) -> Self {
        if !self.protocols.iter().any(|p| p.id == DEFAULT_PROTOCOL_ID) {
            self.protocols.push(Arc::new(default_protocol()));
        }
        self
    }

    /// Append a protocol
    pub fn push(&mut self, protocol: Protocol) {
        self.protocols.push(Arc::new(protocol));
    }

    /// The protocols, in iteration order
    #[must_use]
    pub fn protocols(&self) -> &[Arc<Protocol>] {
        &self.protocols
    }

    /// Number of protocols
    #[must_use]
    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    /// Whether the source is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }
}

#[async_trait]
impl ProtocolDataSource for InMemoryProtocolSource {
    async fn for_each(&self, visit: &mut ProtocolVisitor<'_>) -> Result<IterationStats, SourceError> {
        let started = Instant::now();
        let mut iterations = 0;
        let mut completed = true;
        for (index, protocol) in self.protocols.iter().enumerate() {
            iterations += 1;
            if visit(protocol, index).is_break() {
                completed = false;
                break;
            }
        }
        Ok(IterationStats {
            completed,
            items: self.protocols.len(),
            iterations,
            duration: started.elapsed(),
        })
    }

    async fn find_by_id(&self, id: &str) -> Result<SearchResult, SourceError> {
        let started = Instant::now();
        let index = self.protocols.iter().position(|p| p.id == id);
        Ok(SearchResult {
            found: index.is_some(),
            item: index.map(|i| Arc::clone(&self.protocols[i])),
            index,
            duration: started.elapsed(),
        })
    }
}

impl FromIterator<Protocol> for InMemoryProtocolSource {
    fn from_iter<I: IntoIterator<Item = Protocol>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
