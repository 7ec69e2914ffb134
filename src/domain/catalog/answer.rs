//! Answer values and the in-memory answer store.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::foundation::QuestionId;

/// A single answer value, tagged by shape.
///
/// The engine never stringifies or re-parses answers internally; the tagged
/// union is resolved once at the UI boundary and carried losslessly to the
/// wire. The untagged serde representation matches the session service's
/// JSON: a bare string, a `[min, max]` number pair, or a string array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// Single-choice or free-text answer.
    Scalar(String),

    /// Slider answer as an inclusive `[min, max]` pair.
    Range(f64, f64),

    /// Multiple-choice or list-input answer, order preserved.
    List(Vec<String>),
}

impl AnswerValue {
    /// Convenience constructor for scalar answers.
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::Scalar(value.into())
    }

    /// Convenience constructor for list answers.
    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    /// Try to get this value as a string slice.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a list of strings.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Try to get this value as a `(min, max)` pair.
    pub fn as_range(&self) -> Option<(f64, f64)> {
        match self {
            Self::Range(lo, hi) => Some((*lo, *hi)),
            _ => None,
        }
    }

    /// The shape name of this value for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Range(_, _) => "range",
            Self::List(_) => "list",
        }
    }
}

/// In-memory answers for the active session, keyed by question id.
///
/// A key mapped to `None` means "explicitly skipped", which is distinct from
/// an absent key ("never answered"). Owned exclusively by the flow engine;
/// the local cache mirrors it but never writes back on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerStore {
    answers: HashMap<QuestionId, Option<AnswerValue>>,
}

impl AnswerStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an answer, replacing any prior value for the same question.
    /// Callers are responsible for ensuring the write is an explicit user
    /// action, never incidental flow progression.
    pub fn record(&mut self, id: QuestionId, value: Option<AnswerValue>) {
        self.answers.insert(id, value);
    }

    /// Looks up an answer.
    ///
    /// Returns `None` if the question was never answered, `Some(None)` if it
    /// was explicitly skipped, `Some(Some(_))` otherwise.
    pub fn get(&self, id: &QuestionId) -> Option<Option<&AnswerValue>> {
        self.answers.get(id).map(|v| v.as_ref())
    }

    /// Returns true if the question has an entry (answered or skipped).
    pub fn contains(&self, id: &QuestionId) -> bool {
        self.answers.contains_key(id)
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Iterates over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &Option<AnswerValue>)> {
        self.answers.iter()
    }

    /// Replaces the entire contents with a server-held answer set.
    ///
    /// Used only by first-time reconciliation.
    pub fn adopt(&mut self, answers: HashMap<QuestionId, Option<AnswerValue>>) {
        self.answers = answers;
    }

    /// Drops all entries.
    pub fn clear(&mut self) {
        self.answers.clear();
    }

    /// Borrows the underlying map, e.g. for wire submission.
    pub fn as_map(&self) -> &HashMap<QuestionId, Option<AnswerValue>> {
        &self.answers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qid(s: &str) -> QuestionId {
        QuestionId::new(s).unwrap()
    }

    #[test]
    fn scalar_serializes_as_bare_string() {
        let v = AnswerValue::scalar("City center");
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"City center\"");
    }

    #[test]
    fn range_serializes_as_number_pair() {
        let v = AnswerValue::Range(500.0, 1200.0);
        assert_eq!(serde_json::to_string(&v).unwrap(), "[500.0,1200.0]");
    }

    #[test]
    fn list_serializes_as_string_array() {
        let v = AnswerValue::list(["Balcony", "Elevator"]);
        assert_eq!(
            serde_json::to_string(&v).unwrap(),
            "[\"Balcony\",\"Elevator\"]"
        );
    }

    #[test]
    fn untagged_deserialization_distinguishes_shapes() {
        let scalar: AnswerValue = serde_json::from_str("\"Yes\"").unwrap();
        assert_eq!(scalar, AnswerValue::scalar("Yes"));

        let range: AnswerValue = serde_json::from_str("[300, 900]").unwrap();
        assert_eq!(range, AnswerValue::Range(300.0, 900.0));

        let list: AnswerValue = serde_json::from_str("[\"A\", \"B\"]").unwrap();
        assert_eq!(list, AnswerValue::list(["A", "B"]));
    }

    #[test]
    fn accessors_return_none_for_other_shapes() {
        let v = AnswerValue::scalar("x");
        assert_eq!(v.as_scalar(), Some("x"));
        assert!(v.as_list().is_none());
        assert!(v.as_range().is_none());
    }

    #[test]
    fn skipped_is_distinct_from_unanswered() {
        let mut store = AnswerStore::new();
        store.record(qid("parking"), None);

        assert_eq!(store.get(&qid("parking")), Some(None));
        assert_eq!(store.get(&qid("never_asked")), None);
        assert!(store.contains(&qid("parking")));
        assert!(!store.contains(&qid("never_asked")));
    }

    #[test]
    fn record_replaces_existing_value() {
        let mut store = AnswerStore::new();
        store.record(qid("floor"), Some(AnswerValue::scalar("Ground")));
        store.record(qid("floor"), Some(AnswerValue::scalar("Top")));

        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get(&qid("floor")),
            Some(Some(&AnswerValue::scalar("Top")))
        );
    }

    #[test]
    fn adopt_replaces_contents_wholesale() {
        let mut store = AnswerStore::new();
        store.record(qid("old"), Some(AnswerValue::scalar("value")));

        let mut remote = HashMap::new();
        remote.insert(qid("new"), Some(AnswerValue::scalar("remote")));
        store.adopt(remote);

        assert!(!store.contains(&qid("old")));
        assert!(store.contains(&qid("new")));
    }

    #[test]
    fn store_round_trips_through_json() {
        let mut store = AnswerStore::new();
        store.record(qid("budget"), Some(AnswerValue::Range(400.0, 800.0)));
        store.record(qid("pets"), None);

        let json = serde_json::to_string(&store).unwrap();
        let back: AnswerStore = serde_json::from_str(&json).unwrap();
        assert_eq!(store, back);
    }
}
