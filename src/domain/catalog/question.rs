//! Question catalog entries and per-question branching rules.

use serde::{Deserialize, Serialize};

use super::AnswerValue;
use crate::domain::foundation::{QuestionId, ValidationError};

/// The input shape of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Exactly one of `options`.
    SingleChoice,

    /// Any non-empty subset of `options`.
    MultipleChoice,

    /// A `[min, max]` range within the slider config bounds.
    Slider,

    /// A non-empty, user-supplied list of strings.
    ListInput,

    /// Free text.
    Text,
}

impl QuestionKind {
    /// The shape of answer value this kind expects, for error messages.
    pub fn expected_shape(&self) -> &'static str {
        match self {
            Self::SingleChoice | Self::Text => "scalar",
            Self::MultipleChoice | Self::ListInput => "list",
            Self::Slider => "range",
        }
    }

    /// Returns true if this kind selects from a fixed option list.
    pub fn has_options(&self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultipleChoice)
    }
}

/// Numeric configuration for slider questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderConfig {
    /// Lowest selectable value.
    pub min: f64,

    /// Highest selectable value.
    pub max: f64,

    /// Selection granularity.
    pub step: f64,

    /// Display unit, e.g. `"€"` or `"m²"`.
    #[serde(default)]
    pub unit: Option<String>,
}

/// A branching rule: a literal answer value mapped to follow-up questions.
///
/// Rules are matched case-sensitively against the literal option text and
/// evaluated in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchRule {
    /// The answer value that activates this rule.
    pub value: String,

    /// Follow-up question ids, spliced into the flow in this order.
    pub next: Vec<QuestionId>,
}

/// One immutable catalog question.
///
/// # Invariants
///
/// - `options` is non-empty for choice kinds
/// - `branches` keys refer to entries of `options` for choice kinds
/// - catalog data never changes during a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Stable identifier.
    pub id: QuestionId,

    /// Grouping label shown above the prompt (e.g. "Location").
    #[serde(default)]
    pub category: String,

    /// The prompt text shown to the user.
    pub text: String,

    /// Input shape.
    #[serde(rename = "type")]
    pub kind: QuestionKind,

    /// Ordered options for choice kinds; empty otherwise.
    #[serde(default)]
    pub options: Vec<String>,

    /// Whether an explicit skip is rejected.
    #[serde(default)]
    pub required: bool,

    /// Slider bounds, present for slider questions.
    #[serde(default)]
    pub config: Option<SliderConfig>,

    /// Answer-value-driven follow-up splices, in declaration order.
    #[serde(default)]
    pub branches: Vec<BranchRule>,

    /// Follow-up asked when this question received a non-null answer.
    #[serde(default)]
    pub on_answered: Option<QuestionId>,

    /// Follow-up asked when this question was explicitly skipped.
    #[serde(default)]
    pub on_unanswered: Option<QuestionId>,
}

impl Question {
    /// Creates a plain question with no options or branching.
    pub fn new(id: QuestionId, text: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            id,
            category: String::new(),
            text: text.into(),
            kind,
            options: Vec::new(),
            required: false,
            config: None,
            branches: Vec::new(),
            on_answered: None,
            on_unanswered: None,
        }
    }

    /// Validates an answer (or explicit skip) against this question's
    /// `required` flag, kind, and option list.
    ///
    /// # Errors
    ///
    /// - `RequiredAnswerMissing` for a skip on a required question
    /// - `WrongAnswerKind` if the value shape does not match the kind
    /// - `EmptySelection` for empty multiple-choice/list-input answers
    /// - `UnknownOption` for values outside the option list
    /// - `RangeOutOfBounds` for slider values outside the configured bounds
    pub fn validate_answer(&self, answer: Option<&AnswerValue>) -> Result<(), ValidationError> {
        let value = match answer {
            None => {
                if self.required {
                    return Err(ValidationError::RequiredAnswerMissing {
                        question: self.id.to_string(),
                    });
                }
                return Ok(());
            }
            Some(value) => value,
        };

        match (self.kind, value) {
            (QuestionKind::Text, AnswerValue::Scalar(_)) => Ok(()),
            (QuestionKind::SingleChoice, AnswerValue::Scalar(chosen)) => {
                self.ensure_option(chosen)
            }
            (QuestionKind::MultipleChoice, AnswerValue::List(chosen)) => {
                if chosen.is_empty() {
                    return Err(ValidationError::EmptySelection {
                        question: self.id.to_string(),
                    });
                }
                chosen.iter().try_for_each(|item| self.ensure_option(item))
            }
            (QuestionKind::ListInput, AnswerValue::List(items)) => {
                if items.is_empty() {
                    return Err(ValidationError::EmptySelection {
                        question: self.id.to_string(),
                    });
                }
                Ok(())
            }
            (QuestionKind::Slider, AnswerValue::Range(lo, hi)) => self.ensure_in_bounds(*lo, *hi),
            (kind, value) => Err(ValidationError::WrongAnswerKind {
                question: self.id.to_string(),
                expected: kind.expected_shape(),
                actual: value.kind_name(),
            }),
        }
    }

    /// Returns the branch rules activated by the given answer, in
    /// declaration order.
    ///
    /// Scalar answers match a rule whose value equals the answer text;
    /// list answers match every rule whose value appears in the set.
    /// Matching is case-sensitive and exact.
    pub fn matched_branches(&self, answer: &AnswerValue) -> Vec<&BranchRule> {
        self.branches
            .iter()
            .filter(|rule| match answer {
                AnswerValue::Scalar(chosen) => chosen == &rule.value,
                AnswerValue::List(chosen) => chosen.iter().any(|item| item == &rule.value),
                AnswerValue::Range(_, _) => false,
            })
            .collect()
    }

    fn ensure_option(&self, chosen: &str) -> Result<(), ValidationError> {
        if self.options.iter().any(|option| option == chosen) {
            Ok(())
        } else {
            Err(ValidationError::UnknownOption {
                question: self.id.to_string(),
                value: chosen.to_string(),
            })
        }
    }

    fn ensure_in_bounds(&self, lo: f64, hi: f64) -> Result<(), ValidationError> {
        let (min, max) = match &self.config {
            Some(config) => (config.min, config.max),
            None => (f64::NEG_INFINITY, f64::INFINITY),
        };
        if lo <= hi && lo >= min && hi <= max {
            Ok(())
        } else {
            Err(ValidationError::RangeOutOfBounds {
                question: self.id.to_string(),
                min,
                max,
            })
        }
    }
}
