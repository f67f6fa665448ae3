//! Mock implementations of port traits for testing
//!
//! These mocks count calls so tests can verify memoization and
//! single-flight behavior.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hanging_protocols::core::error::SourceError;
use hanging_protocols::core::models::{Protocol, StudyMetadata};
use hanging_protocols::core::ports::{
    IterationStats, ProtocolDataSource, ProtocolVisitor, SearchResult, StudyMetadataSource,
};

/// Protocol source counting every call
#[derive(Debug, Default)]
pub struct CountingProtocolSource {
    protocols: Mutex<Vec<Arc<Protocol>>>,
    delay: Option<Duration>,
    fail_iteration: AtomicBool,
    pub for_each_calls: AtomicUsize,
    pub find_calls: AtomicUsize,
}

impl CountingProtocolSource {
    pub fn new(protocols: Vec<Protocol>) -> Self {
        Self {
            protocols: Mutex::new(protocols.into_iter().map(Arc::new).collect()),
            ..Self::default()
        }
    }

    /// Every call waits this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make `for_each` fail until cleared
    pub fn fail_iteration(&self, fail: bool) {
        self.fail_iteration.store(fail, Ordering::SeqCst);
    }

    pub fn push(&self, protocol: Protocol) {
        self.protocols.lock().unwrap().push(Arc::new(protocol));
    }

    pub fn for_each_count(&self) -> usize {
        self.for_each_calls.load(Ordering::SeqCst)
    }

    pub fn find_count(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    async fn wait(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn snapshot(&self) -> Vec<Arc<Protocol>> {
        self.protocols.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProtocolDataSource for CountingProtocolSource {
    async fn for_each(&self, visit: &mut ProtocolVisitor<'_>) -> Result<IterationStats, SourceError> {
        self.for_each_calls.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        if self.fail_iteration.load(Ordering::SeqCst) {
            return Err(SourceError::Io {
                path: "mock".to_string(),
                message: "connection reset".to_string(),
            });
        }

        let protocols = self.snapshot();
        let mut iterations = 0;
        let mut completed = true;
        for (index, protocol) in protocols.iter().enumerate() {
            iterations += 1;
            if let ControlFlow::Break(()) = visit(protocol, index) {
                completed = false;
                break;
            }
        }
        Ok(IterationStats {
            completed,
            items: protocols.len(),
            iterations,
            duration: Duration::ZERO,
        })
    }

    async fn find_by_id(&self, id: &str) -> Result<SearchResult, SourceError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        let protocols = self.snapshot();
        let index = protocols.iter().position(|p| p.id == id);
        Ok(SearchResult {
            found: index.is_some(),
            item: index.map(|i| Arc::clone(&protocols[i])),
            index,
            duration: Duration::ZERO,
        })
    }
}

/// Study source serving fixed studies and counting loads
#[derive(Debug, Default)]
pub struct CountingStudySource {
    studies: Vec<StudyMetadata>,
    pub loads: AtomicUsize,
}

impl CountingStudySource {
    pub fn new(studies: Vec<StudyMetadata>) -> Self {
        Self {
            studies,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StudyMetadataSource for CountingStudySource {
    async fn get_by_instance_uid(&self, study_instance_uid: &str) -> Result<StudyMetadata, SourceError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.studies
            .iter()
            .find(|s| s.study_instance_uid() == study_instance_uid)
            .cloned()
            .ok_or_else(|| SourceError::StudyNotFound(study_instance_uid.to_string()))
    }
}
