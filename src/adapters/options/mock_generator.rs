//! Mock option generator for testing.
//!
//! Configurable stand-in for a remote generation service:
//!
//! - Pre-configured menus, consumed in order
//! - Simulated latency for timeout and race testing
//! - Error injection for fallback testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let generator = MockOptionGenerator::new()
//!     .with_options(vec![option])
//!     .with_error(GenerationError::unavailable("down"))
//!     .with_delay(Duration::from_millis(50));
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::catalog::{Persona, Stage};
use crate::domain::simulation::{Message, ResponseOption};
use crate::ports::{GenerationError, OptionGenerator};

/// A configured mock reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    Options(Vec<ResponseOption>),
    Error(GenerationError),
}

/// What the generator was asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationCall {
    pub persona_id: String,
    pub stage_key: String,
    pub history_len: usize,
}

/// Mock generator.
///
/// Once the queue is exhausted it answers with an empty menu, which the
/// engine treats like any other unusable reply, or with the error set by
/// [`failing_with`](Self::failing_with).
#[derive(Debug, Clone, Default)]
pub struct MockOptionGenerator {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    exhausted_error: Option<GenerationError>,
    delay: Duration,
    calls: Arc<Mutex<Vec<GenerationCall>>>,
}

impl MockOptionGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful menu.
    pub fn with_options(self, options: Vec<ResponseOption>) -> Self {
        self.push(MockReply::Options(options));
        self
    }

    /// Queues an error.
    pub fn with_error(self, error: GenerationError) -> Self {
        self.push(MockReply::Error(error));
        self
    }

    /// Fails every call once the queue is exhausted.
    pub fn failing_with(mut self, error: GenerationError) -> Self {
        self.exhausted_error = Some(error);
        self
    }

    /// Sets simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .expect("MockOptionGenerator: calls lock poisoned")
            .len()
    }

    pub fn get_calls(&self) -> Vec<GenerationCall> {
        self.calls
            .lock()
            .expect("MockOptionGenerator: calls lock poisoned")
            .clone()
    }

    fn push(&self, reply: MockReply) {
        self.replies
            .lock()
            .expect("MockOptionGenerator: replies lock poisoned")
            .push_back(reply);
    }

    fn next_reply(&self) -> MockReply {
        self.replies
            .lock()
            .expect("MockOptionGenerator: replies lock poisoned")
            .pop_front()
            .unwrap_or_else(|| match &self.exhausted_error {
                Some(err) => MockReply::Error(err.clone()),
                None => MockReply::Options(Vec::new()),
            })
    }
}

#[async_trait]
impl OptionGenerator for MockOptionGenerator {
    async fn generate_response_options(
        &self,
        persona: &Persona,
        stage: &Stage,
        history: &[Message],
    ) -> Result<Vec<ResponseOption>, GenerationError> {
        self.calls
            .lock()
            .expect("MockOptionGenerator: calls lock poisoned")
            .push(GenerationCall {
                persona_id: persona.id.to_string(),
                stage_key: stage.key.clone(),
                history_len: history.len(),
            });

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_reply() {
            MockReply::Options(options) => Ok(options),
            MockReply::Error(err) => Err(err),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
