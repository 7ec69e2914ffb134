//! The question graph: catalog order plus branch resolution.

use std::collections::{HashMap, HashSet, VecDeque};

use super::{AnswerValue, Question};
use crate::domain::foundation::{QuestionId, ValidationError};

/// The step that follows an answered question.
///
/// The continuation prompt is injected by the flow engine on top of this,
/// driven by the server-declared threshold; the graph itself only knows
/// catalog questions and completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    /// Ask this catalog question next.
    Question(QuestionId),

    /// No unanswered questions remain.
    Complete,
}

/// Immutable catalog of questions with branch-aware next-step resolution.
///
/// Resolution is deterministic: the same question, answer, queue, and
/// answered set always produce the same next step.
#[derive(Debug, Clone, Default)]
pub struct QuestionGraph {
    questions: Vec<Question>,
    index: HashMap<QuestionId, usize>,
}

impl QuestionGraph {
    /// Builds a graph from catalog-ordered questions.
    ///
    /// # Errors
    ///
    /// - `DuplicateQuestionId` if two questions share an id
    pub fn new(questions: Vec<Question>) -> Result<Self, ValidationError> {
        let mut index = HashMap::with_capacity(questions.len());
        for (position, question) in questions.iter().enumerate() {
            if index.insert(question.id.clone(), position).is_some() {
                return Err(ValidationError::DuplicateQuestionId {
                    question: question.id.to_string(),
                });
            }
        }
        Ok(Self { questions, index })
    }

    /// Looks up a question by id.
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.index.get(id).map(|&position| &self.questions[position])
    }

    /// The first question in catalog order, if any.
    pub fn first_question(&self) -> Option<&Question> {
        self.questions.first()
    }

    /// All questions in catalog order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Number of catalog questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// True if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Inserts a question the server surfaced that the local catalog does
    /// not know yet. Appended at the end of catalog order; an existing id is
    /// left untouched (catalog data is immutable once loaded).
    pub fn merge_question(&mut self, question: Question) {
        if !self.index.contains_key(&question.id) {
            self.index.insert(question.id.clone(), self.questions.len());
            self.questions.push(question);
        }
    }

    /// Resolves the step after `current` was answered with `answer`.
    ///
    /// `pending` is the splice queue of branch follow-ups owned by the
    /// caller; matched branches are pushed onto its front. `answered` is the
    /// set of question ids already answered, which are never offered again.
    ///
    /// Resolution order:
    /// 1. explicit skip with an `on_unanswered` follow-up
    /// 2. branch rules matched by the answer (spliced ahead of the queue)
    /// 3. `on_answered` follow-up
    /// 4. the pending queue, then the earliest unanswered question in
    ///    catalog order
    ///
    /// # Errors
    ///
    /// - `UnknownQuestion` if `current` is not in the catalog
    /// - any answer validation error; the caller must not record the answer
    ///   in that case
    pub fn resolve_next(
        &self,
        current: &QuestionId,
        answer: Option<&AnswerValue>,
        pending: &mut VecDeque<QuestionId>,
        answered: &HashSet<QuestionId>,
    ) -> Result<NextStep, ValidationError> {
        let question = self
            .question(current)
            .ok_or_else(|| ValidationError::UnknownQuestion {
                question: current.to_string(),
            })?;
        question.validate_answer(answer)?;

        match answer {
            None => {
                if let Some(follow_up) = &question.on_unanswered {
                    return Ok(NextStep::Question(follow_up.clone()));
                }
            }
            Some(value) => {
                let matched = question.matched_branches(value);
                if !matched.is_empty() {
                    Self::splice_branches(&matched, pending);
                } else if let Some(follow_up) = &question.on_answered {
                    return Ok(NextStep::Question(follow_up.clone()));
                }
            }
        }

        while let Some(id) = pending.pop_front() {
            if !answered.contains(&id) && id != *current {
                return Ok(NextStep::Question(id));
            }
        }

        // A branch may have jumped forward; the default order resumes at the
        // earliest unanswered catalog question, not after the current one.
        for question in &self.questions {
            if question.id != *current && !answered.contains(&question.id) {
                return Ok(NextStep::Question(question.id.clone()));
            }
        }

        Ok(NextStep::Complete)
    }

    /// Splices matched branch follow-ups onto the front of the queue,
    /// concatenated in branch declaration order with duplicates removed
    /// (first occurrence wins).
    fn splice_branches(matched: &[&super::BranchRule], pending: &mut VecDeque<QuestionId>) {
        let mut seen = HashSet::new();
        let mut spliced: Vec<QuestionId> = Vec::new();
        for rule in matched {
            for id in &rule.next {
                if seen.insert(id.clone()) && !pending.contains(id) {
                    spliced.push(id.clone());
                }
            }
        }
        for id in spliced.into_iter().rev() {
            pending.push_front(id);
        }
    }
}
