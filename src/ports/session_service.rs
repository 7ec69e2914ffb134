//! Session service port - the authoritative remote questionnaire session.
//!
//! The server owns the canonical answer set, the stage counters, and the
//! continuation threshold. The client adopts whatever this port returns as
//! ground truth whenever it is reachable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::catalog::{AnswerValue, Question};
use crate::domain::foundation::{EngineError, QuestionId};

/// Wire shape of an answer batch: question id to value, `null` for an
/// explicit skip.
pub type AnswerMap = HashMap<QuestionId, Option<AnswerValue>>;

/// The session state returned by every flow endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFlowState {
    /// The question to show next; absent once the flow is complete.
    pub question: Option<Question>,

    /// True once no further questions remain.
    pub is_complete: bool,

    /// Total answered questions across all stages.
    pub progress: u32,

    /// Question count of the current stage (basic or extended).
    pub current_stage_total_questions: u32,

    /// Answered count within the current stage.
    pub current_stage_answered_questions: u32,

    /// True when the server-declared threshold asks for a continuation
    /// decision before the next catalog question.
    #[serde(default)]
    pub show_continuation_prompt: bool,
}

/// Payload of the first-time reconciliation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteResponses {
    /// The server-held answer set for this user.
    pub user_responses: AnswerMap,

    /// The full question catalog, in catalog order.
    pub all_questions: Vec<Question>,
}

/// Errors that can occur talking to the session service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionServiceError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("authentication rejected")]
    Auth,

    #[error("session state conflict")]
    Conflict,

    #[error("session service returned status {0}")]
    Status(u16),

    #[error("unexpected response from session service: {0}")]
    InvalidResponse(String),
}

impl From<SessionServiceError> for EngineError {
    fn from(err: SessionServiceError) -> Self {
        match err {
            SessionServiceError::Auth => EngineError::Auth,
            SessionServiceError::Conflict => EngineError::Conflict,
            other => EngineError::Network(other.to_string()),
        }
    }
}

/// Port for the remote questionnaire session (REST over HTTP).
///
/// # Contract
///
/// Implementations must:
/// - Return `Auth` for credential rejections so the UI can re-authenticate
/// - Return `Conflict` when server-side progress diverged from the client
/// - Treat `submit_answers` as idempotent per `{question id, value}` pair;
///   the client delivers at-least-once
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Fetches the current question and counters.
    async fn fetch_current(&self) -> Result<RemoteFlowState, SessionServiceError>;

    /// Submits one or more answers and returns the resulting state.
    async fn submit_answers(
        &self,
        answers: &AnswerMap,
    ) -> Result<RemoteFlowState, SessionServiceError>;

    /// Steps the server-side cursor back one question.
    async fn previous_question(&self) -> Result<RemoteFlowState, SessionServiceError>;

    /// Commits the completed questionnaire.
    async fn finalize(&self) -> Result<(), SessionServiceError>;

    /// Fetches the server-held answers and the full catalog. Used only for
    /// first-time reconciliation.
    async fn fetch_responses(&self) -> Result<RemoteResponses, SessionServiceError>;
}
