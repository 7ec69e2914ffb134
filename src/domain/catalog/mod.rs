//! Catalog module - immutable question data and branch resolution.
//!
//! The catalog is load-once, read-only for the lifetime of a session. All
//! mutable flow state lives in `domain::flow`.

mod answer;
mod graph;
mod question;

pub use answer::{AnswerStore, AnswerValue};
pub use graph::{NextStep, QuestionGraph};
pub use question::{BranchRule, Question, QuestionKind, SliderConfig};
