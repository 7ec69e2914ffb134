//! The questionnaire flow lifecycle.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// The lifecycle phase of one questionnaire attempt.
///
/// Attempts move from loading through active answering, interrupted by
/// continuation decisions, into completion and final submission:
/// `Loading → Active → (ContinuationPending → Active)* → Completing →
/// Submitted`.
///
/// There is no error phase; errors are recorded next to the phase and every
/// phase stays recoverable via `retry()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlowPhase {
    /// Fetching the starting question (remote or cached).
    #[default]
    Loading,

    /// A catalog question is on screen and accepts an answer.
    Active,

    /// The synthetic continuation prompt is on screen.
    ContinuationPending,

    /// No questions remain; awaiting the final commit.
    Completing,

    /// The attempt was committed. Read-only.
    Submitted,
}

impl FlowPhase {
    /// Returns true if a catalog answer is accepted in this phase.
    pub fn accepts_answer(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns true if the continuation decision is accepted in this phase.
    pub fn accepts_continuation_choice(&self) -> bool {
        matches!(self, Self::ContinuationPending)
    }

    /// Returns true if the attempt is still mutable.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Submitted)
    }
}

impl StateMachine for FlowPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        use FlowPhase::*;
        matches!(
            (self, target),
            // Starting question obtained
            (Loading, Active) |
            // Resumed attempt that was already complete
            (Loading, Completing) |
            // Resumed mid-threshold, prompt not yet shown
            (Loading, ContinuationPending) |
            // Server-declared threshold reached
            (Active, ContinuationPending) |
            // All questions answered
            (Active, Completing) |
            // User chose to keep answering
            (ContinuationPending, Active) |
            // User chose to finalize early
            (ContinuationPending, Completing) |
            // Final commit acknowledged
            (Completing, Submitted)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use FlowPhase::*;
        match self {
            Loading => vec![Active, ContinuationPending, Completing],
            Active => vec![ContinuationPending, Completing],
            ContinuationPending => vec![Active, Completing],
            Completing => vec![Submitted],
            Submitted => vec![],
        }
    }
}
