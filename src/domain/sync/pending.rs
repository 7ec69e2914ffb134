//! The queued offline answer batch.

use serde::{Deserialize, Serialize};

use crate::domain::catalog::AnswerValue;
use crate::domain::foundation::{BatchId, QuestionId, Timestamp};
use crate::ports::AnswerMap;

/// At most one outstanding batch of answers awaiting network delivery.
///
/// Entries keep submission order; re-recording a question id replaces its
/// value in place, so retrying the same answer never grows the batch.
/// Delivery is at-least-once; the batch id lets the server deduplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSubmission {
    batch_id: BatchId,
    queued_at: Timestamp,
    answers: Vec<(QuestionId, Option<AnswerValue>)>,
}

impl PendingSubmission {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self {
            batch_id: BatchId::new(),
            queued_at: Timestamp::now(),
            answers: Vec::new(),
        }
    }

    /// Returns the batch id.
    pub fn batch_id(&self) -> &BatchId {
        &self.batch_id
    }

    /// Returns when the batch was first queued.
    pub fn queued_at(&self) -> &Timestamp {
        &self.queued_at
    }

    /// Records an answer into the batch, replacing any prior entry for the
    /// same question id.
    pub fn record(&mut self, id: QuestionId, value: Option<AnswerValue>) {
        if let Some(entry) = self.answers.iter_mut().find(|(existing, _)| existing == &id) {
            entry.1 = value;
        } else {
            self.answers.push((id, value));
        }
    }

    /// Number of queued answers.
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// The queued entries in submission order.
    pub fn answers(&self) -> &[(QuestionId, Option<AnswerValue>)] {
        &self.answers
    }

    /// The batch as a wire answer map.
    pub fn to_answer_map(&self) -> AnswerMap {
        self.answers.iter().cloned().collect()
    }
}

impl Default for PendingSubmission {
    fn default() -> Self {
        Self::new()
    }
}
