//! Protocol data source port
//!
//! Defines how the engine enumerates the protocol library.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::core::error::SourceError;
use crate::core::models::Protocol;

/// Id of the protocol used when nothing else matches
pub const DEFAULT_PROTOCOL_ID: &str = "defaultProtocol";

/// Callback invoked for each protocol; `Break` stops the iteration
pub type ProtocolVisitor<'a> = dyn FnMut(&Arc<Protocol>, usize) -> ControlFlow<()> + Send + 'a;

/// Statistics of one iteration over a data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IterationStats {
    /// Every item was visited (no early stop)
    pub completed: bool,
    /// Number of items in the source
    pub items: usize,
    /// Number of items visited
    pub iterations: usize,
    /// Time spent iterating
    pub duration: Duration,
}

/// Outcome of a lookup by id
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    /// Whether the protocol exists
    pub found: bool,
    /// The protocol, when found
    pub item: Option<Arc<Protocol>>,
    /// Position of the protocol in iteration order
    pub index: Option<usize>,
    /// Time spent searching
    pub duration: Duration,
}

/// Library of candidate protocols
///
/// Implementations may fetch lazily; the engine only needs ordered
/// iteration with early abort and lookup by id.
#[async_trait]
pub trait ProtocolDataSource: Send + Sync {
    /// Visit every protocol in order until `visit` returns `Break`
    async fn for_each(&self, visit: &mut ProtocolVisitor<'_>) -> Result<IterationStats, SourceError>;

    /// Find a protocol by id
    ///
    /// The default implementation scans with [`ProtocolDataSource::for_each`].
    async fn find_by_id(&self, id: &str) -> Result<SearchResult, SourceError> {
        let started = Instant::now();
        let mut hit: Option<(usize, Arc<Protocol>)> = None;
        self.for_each(&mut |protocol, index| {
            if protocol.id == id {
                hit = Some((index, Arc::clone(protocol)));
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .await?;

        Ok(match hit {
            Some((index, item)) => SearchResult {
                found: true,
                item: Some(item),
                index: Some(index),
                duration: started.elapsed(),
            },
            None => SearchResult {
                duration: started.elapsed(),
                ..SearchResult::default()
            },
        })
    }
}
