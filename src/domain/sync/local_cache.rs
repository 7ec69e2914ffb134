//! The durable mirror of one user's questionnaire attempt.
//!
//! A thin typed layer over the string key/value `LocalStore` port. Every
//! entry is namespaced by user id; every mutation flows through the engine
//! first, and the cache has no independent write path.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use super::{CacheField, CacheKey, PendingSubmission};
use crate::domain::catalog::AnswerStore;
use crate::domain::foundation::{EngineError, QuestionId, UserId};
use crate::ports::LocalStore;

/// User-scoped typed access to the durable local store.
#[derive(Clone)]
pub struct LocalCache {
    store: Arc<dyn LocalStore>,
    user_id: UserId,
}

impl LocalCache {
    /// Creates a cache scoped to one user.
    pub fn new(store: Arc<dyn LocalStore>, user_id: UserId) -> Self {
        Self { store, user_id }
    }

    /// The user this cache is scoped to.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Loads the cached answer set, if any.
    pub async fn load_answers(&self) -> Result<Option<AnswerStore>, EngineError> {
        self.get_json(CacheField::Answers).await
    }

    /// Persists the answer set.
    pub async fn save_answers(&self, answers: &AnswerStore) -> Result<(), EngineError> {
        self.set_json(CacheField::Answers, answers).await
    }

    /// Loads the answered-question order, if any.
    pub async fn load_order(&self) -> Result<Option<Vec<QuestionId>>, EngineError> {
        self.get_json(CacheField::AnsweredOrder).await
    }

    /// Persists the answered-question order.
    pub async fn save_order(&self, order: &[QuestionId]) -> Result<(), EngineError> {
        self.set_json(CacheField::AnsweredOrder, &order).await
    }

    /// Loads the resume point, if any.
    pub async fn load_current(&self) -> Result<Option<QuestionId>, EngineError> {
        self.get_json(CacheField::CurrentQuestion).await
    }

    /// Persists or clears the resume point.
    pub async fn save_current(&self, current: Option<&QuestionId>) -> Result<(), EngineError> {
        match current {
            Some(id) => self.set_json(CacheField::CurrentQuestion, id).await,
            None => self.remove(CacheField::CurrentQuestion).await,
        }
    }

    /// Whether the continuation prompt was shown for the current window.
    pub async fn continuation_shown(&self) -> Result<bool, EngineError> {
        Ok(self
            .get_json(CacheField::ContinuationShown)
            .await?
            .unwrap_or(false))
    }

    /// Records the continuation-prompt flag.
    pub async fn set_continuation_shown(&self, shown: bool) -> Result<(), EngineError> {
        self.set_json(CacheField::ContinuationShown, &shown).await
    }

    /// Loads the queued offline batch, if any.
    pub async fn load_pending(&self) -> Result<Option<PendingSubmission>, EngineError> {
        self.get_json(CacheField::PendingSubmission).await
    }

    /// Persists the queued offline batch.
    pub async fn save_pending(&self, pending: &PendingSubmission) -> Result<(), EngineError> {
        self.set_json(CacheField::PendingSubmission, pending).await
    }

    /// Clears the queued offline batch after a confirmed flush.
    pub async fn clear_pending(&self) -> Result<(), EngineError> {
        self.remove(CacheField::PendingSubmission).await
    }

    /// Whether a final submission was requested while offline.
    pub async fn deferred_submit(&self) -> Result<bool, EngineError> {
        Ok(self
            .get_json(CacheField::DeferredSubmit)
            .await?
            .unwrap_or(false))
    }

    /// Records the deferred-submit flag.
    pub async fn set_deferred_submit(&self, deferred: bool) -> Result<(), EngineError> {
        self.set_json(CacheField::DeferredSubmit, &deferred).await
    }

    /// Removes every entry for this user. Called on successful submission
    /// and on explicit reset.
    pub async fn clear_all(&self) -> Result<(), EngineError> {
        for field in CacheField::all() {
            self.remove(field).await?;
        }
        Ok(())
    }

    fn key(&self, field: CacheField) -> String {
        CacheKey::new(&self.user_id, field).render()
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        field: CacheField,
    ) -> Result<Option<T>, EngineError> {
        let key = self.key(field);
        match self.store.get(&key).await? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| EngineError::Cache(format!("corrupt entry '{key}': {e}"))),
        }
    }

    async fn set_json<T: Serialize + ?Sized>(
        &self,
        field: CacheField,
        value: &T,
    ) -> Result<(), EngineError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| EngineError::Cache(format!("serialize '{}': {e}", field.as_str())))?;
        self.store.set(&self.key(field), raw).await?;
        Ok(())
    }

    async fn remove(&self, field: CacheField) -> Result<(), EngineError> {
        self.store.remove(&self.key(field)).await?;
        Ok(())
    }
}

impl std::fmt::Debug for LocalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCache")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}
