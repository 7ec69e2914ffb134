//! The mutable state of one questionnaire attempt.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{QuestionId, UserId};

/// Per-stage progress counters, adopted from the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageProgress {
    /// Question count of the current stage.
    pub total: u32,

    /// Answered count within the current stage.
    pub answered: u32,
}

/// One questionnaire attempt for one user.
///
/// # Invariants
///
/// - `answered_question_ids` is append-only and duplicate-free
/// - `progress()` always equals `answered_question_ids.len()`, so progress
///   is monotonically non-decreasing
/// - owned exclusively by the flow engine; the cache only mirrors it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    user_id: UserId,
    current_question_id: Option<QuestionId>,
    answered_question_ids: Vec<QuestionId>,
    stage: StageProgress,
    is_complete: bool,
    is_submitted: bool,
    continuation_prompt_shown: bool,
}

impl Session {
    /// Creates an empty attempt for a user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            current_question_id: None,
            answered_question_ids: Vec::new(),
            stage: StageProgress::default(),
            is_complete: false,
            is_submitted: false,
            continuation_prompt_shown: false,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    /// The owning user.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// The question currently on screen, if any.
    pub fn current_question_id(&self) -> Option<&QuestionId> {
        self.current_question_id.as_ref()
    }

    /// The answered questions in answer order.
    pub fn answered_question_ids(&self) -> &[QuestionId] {
        &self.answered_question_ids
    }

    /// Total progress; always the length of the answered list.
    pub fn progress(&self) -> usize {
        self.answered_question_ids.len()
    }

    /// Stage counters adopted from the server.
    pub fn stage(&self) -> StageProgress {
        self.stage
    }

    /// True once no further questions remain.
    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    /// True once the final commit was acknowledged.
    pub fn is_submitted(&self) -> bool {
        self.is_submitted
    }

    /// True while the current threshold window already showed the prompt.
    pub fn continuation_prompt_shown(&self) -> bool {
        self.continuation_prompt_shown
    }

    /// True if the question was already answered or skipped.
    pub fn has_answered(&self, id: &QuestionId) -> bool {
        self.answered_question_ids.contains(id)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────

    /// Appends a question to the answered list unless already present.
    ///
    /// Returns true if the list grew. Progress never decreases and never
    /// double-counts a question, which makes retried submissions idempotent.
    pub fn record_answered(&mut self, id: QuestionId) -> bool {
        if self.answered_question_ids.contains(&id) {
            return false;
        }
        self.answered_question_ids.push(id);
        true
    }

    /// Moves the cursor to a new question.
    pub fn set_current_question(&mut self, id: Option<QuestionId>) {
        self.current_question_id = id;
    }

    /// Adopts server-held stage counters.
    pub fn set_stage(&mut self, stage: StageProgress) {
        self.stage = stage;
    }

    /// Marks the attempt complete (no further questions).
    pub fn set_complete(&mut self, complete: bool) {
        self.is_complete = complete;
    }

    /// Marks the final commit acknowledged.
    pub fn set_submitted(&mut self) {
        self.is_submitted = true;
    }

    /// Records that the continuation prompt is on screen for this window.
    pub fn mark_continuation_shown(&mut self) {
        self.continuation_prompt_shown = true;
    }

    /// Re-arms the prompt after an intervening catalog question.
    pub fn clear_continuation_shown(&mut self) {
        self.continuation_prompt_shown = false;
    }

    /// Restores the answered order from cache or reconciliation.
    ///
    /// Deduplicates defensively; the invariant holds even if the durable
    /// copy was produced by an older build.
    pub fn restore_answered(&mut self, order: Vec<QuestionId>) {
        self.answered_question_ids.clear();
        for id in order {
            self.record_answered(id);
        }
    }

    /// Restores the continuation flag from cache.
    pub fn restore_continuation_shown(&mut self, shown: bool) {
        self.continuation_prompt_shown = shown;
    }
}
