//! A shareable wrapper that serializes engine operations.
//!
//! The engine itself takes `&mut self`, so a single owner can never overlap
//! two transitions. UIs usually hold many clones of a handle instead; this
//! wrapper rejects an operation started while a previous one's network
//! round-trip is still outstanding, so two answers can never race to decide
//! the next question. Dropping an operation's future mid-await releases the
//! slot and abandons the network call before any state mutation.

use std::sync::Arc;
use tokio::sync::Mutex;

use super::{ContinuationChoice, FlowEngine, FlowSnapshot};
use crate::domain::catalog::AnswerValue;
use crate::domain::foundation::{EngineError, QuestionId};

/// Clonable, serialized access to one [`FlowEngine`].
#[derive(Clone)]
pub struct FlowHandle {
    inner: Arc<Mutex<FlowEngine>>,
}

impl FlowHandle {
    /// Wraps an engine.
    pub fn new(engine: FlowEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Starts the attempt. Rejects with `Busy` if another operation is in
    /// flight.
    pub async fn start(&self) -> Result<FlowSnapshot, EngineError> {
        self.acquire()?.start().await
    }

    /// Answers the current question.
    pub async fn answer(
        &self,
        question_id: &QuestionId,
        value: Option<AnswerValue>,
    ) -> Result<FlowSnapshot, EngineError> {
        self.acquire()?.answer(question_id, value).await
    }

    /// Resolves the continuation prompt.
    pub async fn answer_continuation(
        &self,
        choice: ContinuationChoice,
    ) -> Result<FlowSnapshot, EngineError> {
        self.acquire()?.answer_continuation(choice).await
    }

    /// Steps back to the previous question.
    pub async fn back(&self) -> Result<FlowSnapshot, EngineError> {
        self.acquire()?.back().await
    }

    /// Commits the completed questionnaire.
    pub async fn submit(&self) -> Result<FlowSnapshot, EngineError> {
        self.acquire()?.submit().await
    }

    /// Replaces an already-recorded answer.
    pub async fn edit_answer(
        &self,
        question_id: &QuestionId,
        value: Option<AnswerValue>,
    ) -> Result<FlowSnapshot, EngineError> {
        self.acquire()?.edit_answer(question_id, value).await
    }

    /// Re-attempts the failed operation.
    pub async fn retry(&self) -> Result<FlowSnapshot, EngineError> {
        self.acquire()?.retry().await
    }

    /// Abandons the attempt and clears the cache.
    pub async fn reset(&self) -> Result<FlowSnapshot, EngineError> {
        self.acquire()?.reset().await
    }

    /// The current projection. Waits for an in-flight operation to finish
    /// rather than rejecting, since reading cannot race a transition.
    pub async fn snapshot(&self) -> FlowSnapshot {
        self.inner.lock().await.snapshot()
    }

    fn acquire(&self) -> Result<tokio::sync::OwnedMutexGuard<FlowEngine>, EngineError> {
        Arc::clone(&self.inner)
            .try_lock_owned()
            .map_err(|_| EngineError::Busy)
    }
}

impl std::fmt::Debug for FlowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowHandle").finish_non_exhaustive()
    }
}
