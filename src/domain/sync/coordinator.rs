//! Startup reconciliation and offline-batch flushing.

use std::sync::Arc;
use tokio::sync::watch;

use super::LocalCache;
use crate::domain::catalog::{AnswerStore, Question};
use crate::domain::foundation::{EngineError, QuestionId};
use crate::ports::{ConnectivityPort, SessionService};

/// Where the starting session state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSource {
    /// Adopted wholesale from the server (nothing was cached).
    Remote,

    /// Resumed from the local cache (local wins once present).
    Cache,

    /// Offline with nothing cached; an empty attempt.
    Fresh,
}

/// The state a questionnaire attempt starts from.
#[derive(Debug, Clone)]
pub struct ReconciledSession {
    /// The adopted answer set.
    pub answers: AnswerStore,

    /// The adopted answered-question order.
    pub order: Vec<QuestionId>,

    /// The server-held catalog, present only after a remote reconciliation.
    pub catalog: Option<Vec<Question>>,

    /// Which side supplied the state.
    pub source: SessionSource,
}

/// Result of a pending-batch flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was queued.
    Idle,

    /// The queued batch was delivered and cleared.
    Flushed { answers: usize },

    /// The batch was delivered and the deferred final submission committed.
    Finalized { answers: usize },
}

/// Reconciles local and remote session state.
///
/// Two rules, applied in order:
/// - on start, the server is authoritative only when the client holds
///   nothing cached; a populated cache is used as-is, no merge
/// - queued offline batches are delivered at-least-once when connectivity
///   returns, and stay queued on failure
#[derive(Clone)]
pub struct SyncCoordinator {
    service: Arc<dyn SessionService>,
    cache: LocalCache,
    connectivity: Arc<dyn ConnectivityPort>,
}

impl SyncCoordinator {
    /// Creates a coordinator over the given ports.
    pub fn new(
        service: Arc<dyn SessionService>,
        cache: LocalCache,
        connectivity: Arc<dyn ConnectivityPort>,
    ) -> Self {
        Self {
            service,
            cache,
            connectivity,
        }
    }

    /// The cache this coordinator mirrors into.
    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    /// Produces the state a new engine instance starts from.
    ///
    /// # Errors
    ///
    /// Network and cache failures propagate; a failed remote fetch leaves
    /// the cache untouched so the next start can retry.
    pub async fn reconcile_on_start(&self) -> Result<ReconciledSession, EngineError> {
        if let Some(answers) = self.cache.load_answers().await? {
            if !answers.is_empty() {
                let order = self.cache.load_order().await?.unwrap_or_default();
                tracing::debug!(
                    user_id = %self.cache.user_id(),
                    answered = order.len(),
                    "resuming questionnaire from local cache"
                );
                return Ok(ReconciledSession {
                    answers,
                    order,
                    catalog: None,
                    source: SessionSource::Cache,
                });
            }
        }

        if !self.connectivity.is_online() {
            tracing::debug!(
                user_id = %self.cache.user_id(),
                "offline with no cached answers, starting fresh attempt"
            );
            return Ok(ReconciledSession {
                answers: AnswerStore::new(),
                order: Vec::new(),
                catalog: None,
                source: SessionSource::Fresh,
            });
        }

        let responses = self.service.fetch_responses().await?;

        let mut answers = AnswerStore::new();
        answers.adopt(responses.user_responses.clone());

        // The wire answer map is unordered; the canonical order of adopted
        // answers is catalog order.
        let order: Vec<QuestionId> = responses
            .all_questions
            .iter()
            .filter(|question| answers.contains(&question.id))
            .map(|question| question.id.clone())
            .collect();

        self.cache.save_answers(&answers).await?;
        self.cache.save_order(&order).await?;

        tracing::debug!(
            user_id = %self.cache.user_id(),
            adopted = order.len(),
            catalog = responses.all_questions.len(),
            "adopted server-held answers into fresh cache"
        );

        Ok(ReconciledSession {
            answers,
            order,
            catalog: Some(responses.all_questions),
            source: SessionSource::Remote,
        })
    }

    /// Delivers the queued offline batch, then any deferred final
    /// submission.
    ///
    /// # Errors
    ///
    /// - `Offline` if connectivity has not actually returned
    /// - `Network` on delivery failure; the batch stays queued for the next
    ///   connectivity transition or manual retry
    pub async fn flush_pending(&self) -> Result<FlushOutcome, EngineError> {
        let pending = self.cache.load_pending().await?;
        let deferred = self.cache.deferred_submit().await?;

        let has_answers = pending.as_ref().is_some_and(|batch| !batch.is_empty());
        if !has_answers && !deferred {
            return Ok(FlushOutcome::Idle);
        }

        if !self.connectivity.is_online() {
            return Err(EngineError::Offline("pending batch flush"));
        }

        let mut flushed = 0;
        if let Some(batch) = pending {
            if !batch.is_empty() {
                flushed = batch.len();
                self.service.submit_answers(&batch.to_answer_map()).await?;
                self.cache.clear_pending().await?;
                tracing::info!(
                    user_id = %self.cache.user_id(),
                    batch_id = %batch.batch_id(),
                    answers = flushed,
                    "flushed pending answer batch"
                );
            } else {
                self.cache.clear_pending().await?;
            }
        }

        if deferred {
            self.service.finalize().await?;
            self.cache.set_deferred_submit(false).await?;
            self.cache.clear_all().await?;
            tracing::info!(
                user_id = %self.cache.user_id(),
                "committed deferred final submission"
            );
            return Ok(FlushOutcome::Finalized { answers: flushed });
        }

        Ok(FlushOutcome::Flushed { answers: flushed })
    }

    /// Flushes on every offline-to-online transition until the sender side
    /// of the watch channel is dropped. Spawn this from the embedding
    /// application.
    pub async fn run_flush_loop(&self, mut connectivity: watch::Receiver<bool>) {
        while connectivity.changed().await.is_ok() {
            let online = *connectivity.borrow();
            if !online {
                continue;
            }
            match self.flush_pending().await {
                Ok(FlushOutcome::Idle) => {}
                Ok(outcome) => {
                    tracing::debug!(?outcome, "connectivity returned, flush complete");
                }
                Err(error) => {
                    tracing::warn!(%error, "flush after reconnect failed, batch stays queued");
                }
            }
        }
    }
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
