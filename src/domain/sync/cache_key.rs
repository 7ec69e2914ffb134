//! Structured cache keys.
//!
//! Every durable entry is addressed by `{user id, field}` through one
//! namespacing function, so two users' answer sets can never collide and a
//! user switch cannot read stale keys.

use std::fmt;

use crate::domain::foundation::UserId;

/// The durable fields the engine persists per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheField {
    /// The answer map (question id to value or explicit null).
    Answers,

    /// The append-only answered-question order.
    AnsweredOrder,

    /// The question the user was on, for offline resume.
    CurrentQuestion,

    /// Whether the continuation prompt was already shown for the current
    /// threshold window.
    ContinuationShown,

    /// The queued offline answer batch.
    PendingSubmission,

    /// Final submission requested while offline.
    DeferredSubmit,
}

impl CacheField {
    /// Stable key segment for this field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Answers => "answers",
            Self::AnsweredOrder => "answered_order",
            Self::CurrentQuestion => "current_question",
            Self::ContinuationShown => "continuation_shown",
            Self::PendingSubmission => "pending_submission",
            Self::DeferredSubmit => "deferred_submit",
        }
    }

    /// All fields, for whole-user teardown.
    pub fn all() -> [CacheField; 6] {
        [
            Self::Answers,
            Self::AnsweredOrder,
            Self::CurrentQuestion,
            Self::ContinuationShown,
            Self::PendingSubmission,
            Self::DeferredSubmit,
        ]
    }
}

/// A structured `{user id, field}` cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey<'a> {
    user_id: &'a UserId,
    field: CacheField,
}

impl<'a> CacheKey<'a> {
    /// Creates a key scoped to a user and field.
    pub fn new(user_id: &'a UserId, field: CacheField) -> Self {
        Self { user_id, field }
    }

    /// Renders the key for the underlying string-keyed store.
    pub fn render(&self) -> String {
        format!("nestquest:{}:{}", self.user_id, self.field.as_str())
    }
}

impl fmt::Display for CacheKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
