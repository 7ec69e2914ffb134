//! Error types for the questionnaire engine.

use thiserror::Error;

/// Errors that occur during answer validation and catalog lookups.
///
/// Validation errors are rejected synchronously, before any state mutation,
/// and are not retryable without a corrected value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Question '{question}' requires an answer")]
    RequiredAnswerMissing { question: String },

    #[error("Question '{question}' does not accept an empty selection")]
    EmptySelection { question: String },

    #[error("'{value}' is not an option for question '{question}'")]
    UnknownOption { question: String, value: String },

    #[error("Question '{question}' expects a {expected} answer, got {actual}")]
    WrongAnswerKind {
        question: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Range answer for '{question}' must satisfy {min} <= min <= max <= {max}")]
    RangeOutOfBounds {
        question: String,
        min: f64,
        max: f64,
    },

    #[error("Unknown question '{question}'")]
    UnknownQuestion { question: String },

    #[error("Duplicate question id '{question}' in catalog")]
    DuplicateQuestionId { question: String },

    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField {
            field: field.into(),
        }
    }

    /// Creates an invalid transition error from debug representations.
    pub fn invalid_transition(from: impl std::fmt::Debug, to: impl std::fmt::Debug) -> Self {
        ValidationError::InvalidTransition {
            from: format!("{:?}", from),
            to: format!("{:?}", to),
        }
    }
}

/// The engine-level error taxonomy surfaced to the UI layer.
///
/// Nothing here is fatal: every variant has a defined corrective action,
/// either `retry()` on the engine or new input from the user. The engine
/// records the last error into its exposed snapshot rather than letting it
/// escape the public API unannotated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Input rejected before any state mutation. Needs a corrected value.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Transport failure or unexpected response. Local optimistic state is
    /// kept; the operation can be retried.
    #[error("network failure: {0}")]
    Network(String),

    /// The operation requires connectivity and none is available.
    #[error("offline: {0}")]
    Offline(&'static str),

    /// The session service rejected the bearer credential. The attempt is
    /// preserved in cache so it can resume after re-authentication.
    #[error("authentication rejected by the session service")]
    Auth,

    /// Server-side progress has diverged from this client (e.g. a second
    /// tab). The engine re-fetches the authoritative state when this occurs.
    #[error("session diverged from the server")]
    Conflict,

    /// A previous operation's network round-trip is still outstanding.
    #[error("a previous operation is still in flight")]
    Busy,

    /// The operation is not permitted in the current flow phase.
    #[error("{0}")]
    InvalidState(String),

    /// The durable local store failed. The in-memory session is unaffected.
    #[error("local cache failure: {0}")]
    Cache(String),
}

impl EngineError {
    /// Returns true if re-attempting the same operation can succeed without
    /// new user input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::Network(_)
                | EngineError::Offline(_)
                | EngineError::Busy
                | EngineError::Cache(_)
        )
    }

    /// Returns true if the UI should redirect to re-authentication.
    pub fn requires_reauth(&self) -> bool {
        matches!(self, EngineError::Auth)
    }

    /// Creates an invalid-state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        EngineError::InvalidState(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_displays_question_context() {
        let err = ValidationError::RequiredAnswerMissing {
            question: "budget".to_string(),
        };
        assert_eq!(format!("{}", err), "Question 'budget' requires an answer");
    }

    #[test]
    fn unknown_option_displays_value_and_question() {
        let err = ValidationError::UnknownOption {
            question: "pets".to_string(),
            value: "Dragon".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "'Dragon' is not an option for question 'pets'"
        );
    }

    #[test]
    fn validation_errors_are_not_retryable() {
        let err = EngineError::Validation(ValidationError::empty_field("answer"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn network_errors_are_retryable() {
        assert!(EngineError::Network("timeout".to_string()).is_retryable());
        assert!(EngineError::Offline("back navigation").is_retryable());
        assert!(EngineError::Busy.is_retryable());
    }

    #[test]
    fn auth_error_requires_reauth() {
        assert!(EngineError::Auth.requires_reauth());
        assert!(!EngineError::Conflict.requires_reauth());
    }

    #[test]
    fn validation_error_converts_into_engine_error() {
        let err: EngineError = ValidationError::empty_field("user_id").into();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
