//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, error types, the state machine trait, and the
//! timestamp value object that form the vocabulary of the questionnaire
//! domain.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{EngineError, ValidationError};
pub use ids::{BatchId, QuestionId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
