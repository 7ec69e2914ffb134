//! The synthetic continuation prompt and its display policy.
//!
//! Every server-declared threshold of answered questions, the flow pauses
//! and asks whether to keep going or finalize early. The prompt is not a
//! catalog question: it is synthesized here and never recorded in the
//! answered list.

use crate::domain::catalog::{Question, QuestionKind};
use crate::domain::foundation::QuestionId;

use super::Session;
use crate::ports::RemoteFlowState;

/// Reserved id of the synthetic prompt; never present in the catalog.
pub const CONTINUATION_QUESTION_ID: &str = "__continuation__";

/// Option text for continuing with the extended stage.
pub const CONTINUE_OPTION: &str = "Continue with more questions";

/// Option text for finalizing early.
pub const SUBMIT_NOW_OPTION: &str = "Submit my responses now";

/// The user's continuation decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuationChoice {
    /// Keep answering catalog questions.
    Continue,

    /// Finalize with the answers given so far.
    SubmitNow,
}

impl ContinuationChoice {
    /// Parses the literal option text selected in the UI.
    pub fn from_option(option: &str) -> Option<Self> {
        match option {
            CONTINUE_OPTION => Some(Self::Continue),
            SUBMIT_NOW_OPTION => Some(Self::SubmitNow),
            _ => None,
        }
    }
}

/// Builds the synthetic prompt shown instead of the next catalog question.
pub fn continuation_prompt() -> Question {
    let mut question = Question::new(
        QuestionId::new(CONTINUATION_QUESTION_ID).expect("reserved id is non-empty"),
        "You've answered the basic questions. Keep going to sharpen your matches?",
        QuestionKind::SingleChoice,
    );
    question.category = "Progress".to_string();
    question.options = vec![CONTINUE_OPTION.to_string(), SUBMIT_NOW_OPTION.to_string()];
    question.required = true;
    question
}

/// Decides whether the engine should interrupt with the prompt.
///
/// The prompt fires exactly once per threshold crossing: the server signals
/// the crossing, and the shown-flag suppresses a repeat until an intervening
/// catalog question re-arms it.
pub fn should_interrupt(remote: &RemoteFlowState, session: &Session) -> bool {
    remote.show_continuation_prompt
        && !remote.is_complete
        && !session.continuation_prompt_shown()
}
