//! The read-only projection the UI renders from.

use serde::Serialize;

use super::{FlowPhase, StageProgress};
use crate::domain::catalog::Question;
use crate::domain::foundation::EngineError;

/// The last error, flattened for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotError {
    /// Human-readable description.
    pub message: String,

    /// True if `retry()` can succeed without new input.
    pub retryable: bool,

    /// True if the UI should redirect to re-authentication.
    pub requires_reauth: bool,
}

impl From<&EngineError> for SnapshotError {
    fn from(error: &EngineError) -> Self {
        Self {
            message: error.to_string(),
            retryable: error.is_retryable(),
            requires_reauth: error.requires_reauth(),
        }
    }
}

/// A point-in-time view of the flow, refreshed after every transition.
///
/// The engine owns the state; the UI renders from this copy and issues the
/// next transition. During `ContinuationPending` the `current_question` is
/// the synthetic continuation prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowSnapshot {
    /// Lifecycle phase.
    pub phase: FlowPhase,

    /// The question to render, if any.
    pub current_question: Option<Question>,

    /// Answered-question count across all stages.
    pub progress: usize,

    /// Stage counters (basic vs. extended).
    pub stage: StageProgress,

    /// True once no further questions remain.
    pub is_complete: bool,

    /// True once the final commit was acknowledged.
    pub is_submitted: bool,

    /// True while the connectivity gate reports offline.
    pub is_offline: bool,

    /// The last recorded error, if the most recent transition failed.
    pub error: Option<SnapshotError>,
}
