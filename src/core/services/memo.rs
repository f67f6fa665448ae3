//! Single-flight memo cells
//!
//! A memo cell runs its initializer at most once at a time: concurrent
//! callers wait on the computation already in flight and share its result.
//! [`Memo`] keeps whatever the computation produced, failures included.
//! [`RetryMemo`] only keeps successes: callers already waiting on a failed
//! computation share its failure, later callers retry.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::{Mutex, OnceCell};

use crate::core::error::EngineError;

/// Observable state of a memo cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoState {
    /// Nothing computed yet (or the entry was discarded)
    Vacant,
    /// A computation is in flight
    Pending,
    /// A value is cached
    Resolved,
    /// A failure is cached
    Failed,
}

/// Clears the pending flag when the computation ends or is dropped
struct PendingGuard<'a>(&'a AtomicBool);

impl<'a> PendingGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Memo cell caching the first outcome, success or failure
#[derive(Debug)]
pub struct Memo<T> {
    cell: OnceCell<Result<T, EngineError>>,
    pending: AtomicBool,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self {
            cell: OnceCell::new(),
            pending: AtomicBool::new(false),
        }
    }
}

impl<T: Clone> Memo<T> {
    /// Empty cell
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached outcome, computing it with `init` if the cell is vacant
    pub async fn get_or_init<F, Fut>(&self, init: F) -> Result<T, EngineError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, EngineError>>,
    {
        self.cell
            .get_or_init(|| async {
                let _pending = PendingGuard::enter(&self.pending);
                init().await
            })
            .await
            .clone()
    }

    /// Current state
    pub fn state(&self) -> MemoState {
        match self.cell.get() {
            Some(Ok(_)) => MemoState::Resolved,
            Some(Err(_)) => MemoState::Failed,
            None if self.pending.load(Ordering::SeqCst) => MemoState::Pending,
            None => MemoState::Vacant,
        }
    }

    /// Discard the cached outcome
    pub fn reset(&mut self) {
        self.cell.take();
    }
}

/// Outcome of the last failed attempt, tagged with its attempt number
#[derive(Debug, Default)]
struct Attempts {
    last_failure: Option<(u64, EngineError)>,
}

/// Memo cell caching successes only
///
/// Attempts are serialized. Callers that were waiting while an attempt
/// failed receive that failure; callers arriving after it settled start a
/// new attempt.
#[derive(Debug)]
pub struct RetryMemo<T> {
    cell: OnceCell<T>,
    attempts: Mutex<Attempts>,
    settled_failures: AtomicU64,
    pending: AtomicBool,
}

impl<T> Default for RetryMemo<T> {
    fn default() -> Self {
        Self {
            cell: OnceCell::new(),
            attempts: Mutex::new(Attempts::default()),
            settled_failures: AtomicU64::new(0),
            pending: AtomicBool::new(false),
        }
    }
}

impl<T: Clone> RetryMemo<T> {
    /// Empty cell
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value, computing it with `init` if the cell is vacant
    ///
    /// A failure is returned to every caller waiting on the failed attempt
    /// and leaves the cell vacant.
    pub async fn get_or_try_init<F, Fut>(&self, init: F) -> Result<T, EngineError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, EngineError>>,
    {
        if let Some(value) = self.cell.get() {
            return Ok(value.clone());
        }
        let seen = self.settled_failures.load(Ordering::SeqCst);
        let mut attempts = self.attempts.lock().await;
        if let Some(value) = self.cell.get() {
            return Ok(value.clone());
        }
        match &attempts.last_failure {
            Some((attempt, err)) if *attempt > seen => return Err(err.clone()),
            _ => {},
        }

        let result = {
            let _pending = PendingGuard::enter(&self.pending);
            init().await
        };
        match result {
            Ok(value) => {
                attempts.last_failure = None;
                Ok(self.cell.get_or_init(|| async { value }).await.clone())
            },
            Err(err) => {
                let attempt = self.settled_failures.fetch_add(1, Ordering::SeqCst) + 1;
                attempts.last_failure = Some((attempt, err.clone()));
                Err(err)
            },
        }
    }

    /// Current state; failures are never cached
    pub fn state(&self) -> MemoState {
        if self.cell.initialized() {
            MemoState::Resolved
        } else if self.pending.load(Ordering::SeqCst) {
            MemoState::Pending
        } else {
            MemoState::Vacant
        }
    }

    /// Discard the cached value
    pub fn reset(&mut self) {
        self.cell.take();
        self.attempts.get_mut().last_failure = None;
    }
}
