//! In-memory session result sink.
//!
//! Keeps every persisted result in memory. Useful for:
//! - Tests that assert on what a finished session handed off
//! - Single-process embedding without a progress store

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::foundation::{DomainError, ErrorCode, SessionId};
use crate::domain::simulation::SessionResult;
use crate::ports::SessionResultSink;

/// In-memory implementation of the `SessionResultSink` port.
///
/// Thread-safe via internal `Mutex`. Persistence is fire-and-forget from the
/// engine's side, so tests use [`InMemoryResultSink::wait_for`] instead of
/// asserting immediately after a session ends.
#[derive(Default)]
pub struct InMemoryResultSink {
    results: Mutex<Vec<SessionResult>>,
    failing: AtomicBool,
}

impl InMemoryResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent persist fail without storing the result.
    pub fn fail_persists(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn results(&self) -> Vec<SessionResult> {
        self.results
            .lock()
            .expect("InMemoryResultSink: results lock poisoned")
            .clone()
    }

    pub fn result_for(&self, session_id: SessionId) -> Option<SessionResult> {
        self.results()
            .into_iter()
            .find(|r| r.session_id == session_id)
    }

    pub fn len(&self) -> usize {
        self.results
            .lock()
            .expect("InMemoryResultSink: results lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Polls until at least `count` results are stored or `timeout` passes.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.len() >= count {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl SessionResultSink for InMemoryResultSink {
    async fn persist(&self, result: SessionResult) -> Result<(), DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                format!("sink rejected result for session {}", result.session_id),
            ));
        }

        self.results
            .lock()
            .expect("InMemoryResultSink: results lock poisoned")
            .push(result);
        Ok(())
    }
}
