//! The questionnaire flow engine.
//!
//! Owns the session, the answer store, and the branch queue for exactly one
//! attempt. Every transition validates first, mutates local state second,
//! and talks to the network last, so a transport failure never rolls back an
//! accepted answer. When the session service is reachable its response is
//! adopted as ground truth; offline, the engine resolves the next question
//! from the local question graph and queues the answer for later delivery.
//!
//! All operations take `&mut self`: one engine owns one session, and the
//! exclusive borrow is what serializes transitions. Wrap the engine in a
//! [`FlowHandle`](super::FlowHandle) to share it with a UI that may fire
//! overlapping events. Dropping an in-flight operation future abandons the
//! network call before any post-response mutation, so tearing down the UI
//! mid-request cannot corrupt the session.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use super::continuation::{self, continuation_prompt, ContinuationChoice};
use super::{FlowPhase, FlowSnapshot, Session, SnapshotError, StageProgress};
use crate::domain::catalog::{AnswerStore, AnswerValue, NextStep, QuestionGraph};
use crate::domain::foundation::{
    EngineError, QuestionId, StateMachine, UserId, ValidationError,
};
use crate::domain::sync::{FlushOutcome, LocalCache, SyncCoordinator};
use crate::ports::{
    AnswerMap, ConnectivityPort, LocalStore, RemoteFlowState, SessionService,
    SessionServiceError,
};

/// The adaptive questionnaire state machine.
pub struct FlowEngine {
    graph: QuestionGraph,
    session: Session,
    answers: AnswerStore,
    branch_queue: VecDeque<QuestionId>,
    cache: LocalCache,
    sync: SyncCoordinator,
    service: Arc<dyn SessionService>,
    connectivity: Arc<dyn ConnectivityPort>,
    phase: FlowPhase,
    last_error: Option<EngineError>,
}

impl FlowEngine {
    /// Creates an engine for one user over the given ports.
    ///
    /// `graph` is the bundled catalog used as the offline fallback; a richer
    /// catalog returned by first-time reconciliation supersedes it.
    pub fn new(
        graph: QuestionGraph,
        user_id: UserId,
        service: Arc<dyn SessionService>,
        store: Arc<dyn LocalStore>,
        connectivity: Arc<dyn ConnectivityPort>,
    ) -> Self {
        let cache = LocalCache::new(store, user_id.clone());
        let sync = SyncCoordinator::new(service.clone(), cache.clone(), connectivity.clone());
        Self {
            graph,
            session: Session::new(user_id),
            answers: AnswerStore::new(),
            branch_queue: VecDeque::new(),
            cache,
            sync,
            service,
            connectivity,
            phase: FlowPhase::Loading,
            last_error: None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    /// Current lifecycle phase.
    pub fn phase(&self) -> FlowPhase {
        self.phase
    }

    /// The attempt state.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The in-memory answers.
    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    /// The sync coordinator, e.g. to spawn its flush loop.
    pub fn sync(&self) -> &SyncCoordinator {
        &self.sync
    }

    /// A read-only projection for the UI, refreshed after every transition.
    pub fn snapshot(&self) -> FlowSnapshot {
        let current_question = if self.phase == FlowPhase::ContinuationPending {
            Some(continuation_prompt())
        } else {
            self.session
                .current_question_id()
                .and_then(|id| self.graph.question(id))
                .cloned()
        };

        FlowSnapshot {
            phase: self.phase,
            current_question,
            progress: self.session.progress(),
            stage: self.session.stage(),
            is_complete: self.session.is_complete(),
            is_submitted: self.session.is_submitted(),
            is_offline: !self.connectivity.is_online(),
            error: self.last_error.as_ref().map(SnapshotError::from),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────

    /// Starts (or restarts) the attempt: reconciles with the server or the
    /// cache, then obtains the starting question.
    ///
    /// In-memory state is cleared first, so a user switch can never leak a
    /// previous user's answers into the new session.
    pub async fn start(&mut self) -> Result<FlowSnapshot, EngineError> {
        let result = self.start_inner().await;
        self.finish(result)
    }

    /// Answers (or, with `None`, explicitly skips) the current question.
    pub async fn answer(
        &mut self,
        question_id: &QuestionId,
        value: Option<AnswerValue>,
    ) -> Result<FlowSnapshot, EngineError> {
        let result = self.answer_inner(question_id, value).await;
        self.finish(result)
    }

    /// Resolves the continuation prompt.
    pub async fn answer_continuation(
        &mut self,
        choice: ContinuationChoice,
    ) -> Result<FlowSnapshot, EngineError> {
        let result = self.answer_continuation_inner(choice).await;
        self.finish(result)
    }

    /// Steps back to the previous question. Requires connectivity; never
    /// mutates the answered list.
    pub async fn back(&mut self) -> Result<FlowSnapshot, EngineError> {
        let result = self.back_inner().await;
        self.finish(result)
    }

    /// Commits the completed questionnaire. Offline, the commit is deferred
    /// until connectivity returns.
    pub async fn submit(&mut self) -> Result<FlowSnapshot, EngineError> {
        let result = self.submit_inner().await;
        self.finish(result)
    }

    /// Replaces an already-recorded answer without moving the cursor.
    ///
    /// This is the only way an existing answer changes; flow progression
    /// never overwrites one.
    pub async fn edit_answer(
        &mut self,
        question_id: &QuestionId,
        value: Option<AnswerValue>,
    ) -> Result<FlowSnapshot, EngineError> {
        let result = self.edit_answer_inner(question_id, value).await;
        self.finish(result)
    }

    /// Re-attempts the operation that failed: the final commit if the
    /// attempt is complete, otherwise the start sequence.
    pub async fn retry(&mut self) -> Result<FlowSnapshot, EngineError> {
        if self.session.is_complete() {
            self.submit().await
        } else {
            self.start().await
        }
    }

    /// Abandons the attempt: clears the session and every cache entry.
    pub async fn reset(&mut self) -> Result<FlowSnapshot, EngineError> {
        let result = self.reset_inner().await;
        self.finish(result)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Transition bodies
    // ─────────────────────────────────────────────────────────────────────

    async fn start_inner(&mut self) -> Result<(), EngineError> {
        self.session = Session::new(self.cache.user_id().clone());
        self.answers.clear();
        self.branch_queue.clear();
        self.phase = FlowPhase::Loading;

        let reconciled = self.sync.reconcile_on_start().await?;
        if let Some(catalog) = reconciled.catalog {
            self.graph = QuestionGraph::new(catalog)?;
        }
        self.answers = reconciled.answers;
        self.session.restore_answered(reconciled.order);
        self.session
            .restore_continuation_shown(self.cache.continuation_shown().await?);

        tracing::debug!(
            user_id = %self.session.user_id(),
            source = ?reconciled.source,
            progress = self.session.progress(),
            "questionnaire attempt starting"
        );

        if self.connectivity.is_online() {
            let remote = self.service.fetch_current().await?;
            self.adopt_remote(remote).await
        } else {
            self.resume_offline().await
        }
    }

    async fn answer_inner(
        &mut self,
        question_id: &QuestionId,
        value: Option<AnswerValue>,
    ) -> Result<(), EngineError> {
        if self.phase == FlowPhase::ContinuationPending {
            return Err(EngineError::invalid_state(
                "the continuation prompt is awaiting a decision",
            ));
        }
        if !self.phase.accepts_answer() {
            return Err(EngineError::invalid_state(format!(
                "cannot answer in the {:?} phase",
                self.phase
            )));
        }
        let current = self
            .session
            .current_question_id()
            .cloned()
            .ok_or_else(|| EngineError::invalid_state("no question is on screen"))?;
        if *question_id != current {
            return Err(EngineError::invalid_state(format!(
                "'{question_id}' is not the current question"
            )));
        }

        // Validate before any mutation.
        let question = self.graph.question(&current).ok_or_else(|| {
            EngineError::Validation(ValidationError::UnknownQuestion {
                question: current.to_string(),
            })
        })?;
        question.validate_answer(value.as_ref())?;

        // Optimistic local update; kept even if delivery fails.
        self.answers.record(current.clone(), value.clone());
        self.session.record_answered(current.clone());
        self.persist_answers().await?;

        tracing::debug!(
            user_id = %self.session.user_id(),
            question_id = %current,
            progress = self.session.progress(),
            skipped = value.is_none(),
            "answer recorded"
        );

        if self.connectivity.is_online() {
            self.deliver_answer(&current, value).await
        } else {
            self.advance_offline(&current, value).await
        }
    }

    async fn answer_continuation_inner(
        &mut self,
        choice: ContinuationChoice,
    ) -> Result<(), EngineError> {
        if !self.phase.accepts_continuation_choice() {
            return Err(EngineError::invalid_state(
                "no continuation prompt is on screen",
            ));
        }

        match choice {
            ContinuationChoice::Continue => {
                self.enter_phase(FlowPhase::Active)?;
                if self.connectivity.is_online() {
                    let remote = self.service.fetch_current().await?;
                    self.adopt_remote(remote).await
                } else {
                    match self.next_unanswered_locally() {
                        Some(id) => self.move_cursor(Some(id)).await,
                        None => {
                            self.session.set_complete(true);
                            self.move_cursor(None).await?;
                            self.enter_phase(FlowPhase::Completing)
                        }
                    }
                }
            }
            ContinuationChoice::SubmitNow => {
                self.session.set_complete(true);
                self.enter_phase(FlowPhase::Completing)?;
                self.submit_inner().await
            }
        }
    }

    async fn back_inner(&mut self) -> Result<(), EngineError> {
        if self.phase == FlowPhase::ContinuationPending {
            return Err(EngineError::invalid_state(
                "cannot navigate back from the continuation prompt",
            ));
        }
        if self.phase != FlowPhase::Active {
            return Err(EngineError::invalid_state(format!(
                "cannot navigate back in the {:?} phase",
                self.phase
            )));
        }
        if self.session.answered_question_ids().is_empty() {
            return Err(EngineError::invalid_state(
                "no answered questions to go back to",
            ));
        }
        if !self.connectivity.is_online() {
            return Err(EngineError::Offline("back navigation requires a connection"));
        }

        // Non-destructive: the answered list and prior answers stay intact.
        match self.service.previous_question().await {
            Ok(remote) => self.adopt_remote(remote).await,
            Err(SessionServiceError::Conflict) => self.recover_from_conflict().await,
            Err(error) => Err(error.into()),
        }
    }

    async fn submit_inner(&mut self) -> Result<(), EngineError> {
        if !self.session.is_complete() {
            return Err(EngineError::invalid_state(
                "the questionnaire is not complete",
            ));
        }
        self.enter_phase(FlowPhase::Completing)?;

        if !self.connectivity.is_online() {
            self.cache.set_deferred_submit(true).await?;
            tracing::warn!(
                user_id = %self.session.user_id(),
                "offline, final submission deferred until connectivity returns"
            );
            return Ok(());
        }

        // Deliver any queued batch first so the commit covers every answer.
        // A deferred commit picked up here already finalizes server-side.
        if let FlushOutcome::Finalized { .. } = self.sync.flush_pending().await? {
            self.complete_submission().await?;
            return Ok(());
        }

        self.service.finalize().await?;
        self.complete_submission().await
    }

    async fn edit_answer_inner(
        &mut self,
        question_id: &QuestionId,
        value: Option<AnswerValue>,
    ) -> Result<(), EngineError> {
        if !self.phase.is_active() {
            return Err(EngineError::invalid_state(
                "the attempt was already submitted",
            ));
        }
        if !self.session.has_answered(question_id) {
            return Err(EngineError::invalid_state(format!(
                "'{question_id}' has not been answered yet"
            )));
        }
        let question = self.graph.question(question_id).ok_or_else(|| {
            EngineError::Validation(ValidationError::UnknownQuestion {
                question: question_id.to_string(),
            })
        })?;
        question.validate_answer(value.as_ref())?;

        self.answers.record(question_id.clone(), value.clone());
        self.persist_answers().await?;

        tracing::debug!(
            user_id = %self.session.user_id(),
            question_id = %question_id,
            "answer edited"
        );

        if !self.connectivity.is_online() {
            return self.queue_pending(question_id, value).await;
        }

        let mut payload = AnswerMap::new();
        payload.insert(question_id.clone(), value.clone());
        match self.service.submit_answers(&payload).await {
            // The response's next-question is deliberately ignored:
            // editing never moves the cursor.
            Ok(_) => Ok(()),
            Err(SessionServiceError::Auth) => Err(EngineError::Auth),
            Err(SessionServiceError::Conflict) => self.recover_from_conflict().await,
            Err(error) => {
                self.queue_pending(question_id, value).await?;
                Err(EngineError::Network(error.to_string()))
            }
        }
    }

    async fn reset_inner(&mut self) -> Result<(), EngineError> {
        self.cache.clear_all().await?;
        self.session = Session::new(self.cache.user_id().clone());
        self.answers.clear();
        self.branch_queue.clear();
        self.phase = FlowPhase::Loading;
        tracing::debug!(user_id = %self.session.user_id(), "attempt reset");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Online path
    // ─────────────────────────────────────────────────────────────────────

    async fn deliver_answer(
        &mut self,
        question_id: &QuestionId,
        value: Option<AnswerValue>,
    ) -> Result<(), EngineError> {
        let mut payload = AnswerMap::new();
        payload.insert(question_id.clone(), value.clone());

        match self.service.submit_answers(&payload).await {
            Ok(remote) => {
                // This catalog answer is the intervening question that
                // re-arms the continuation prompt for the next threshold.
                self.session.clear_continuation_shown();
                self.adopt_remote(remote).await
            }
            Err(SessionServiceError::Auth) => Err(EngineError::Auth),
            Err(SessionServiceError::Conflict) => self.recover_from_conflict().await,
            Err(error) => {
                // Keep the optimistic update; queue for at-least-once
                // delivery and leave the cursor where it is.
                self.queue_pending(question_id, value).await?;
                tracing::warn!(
                    user_id = %self.session.user_id(),
                    question_id = %question_id,
                    %error,
                    "answer delivery failed, queued for flush"
                );
                Err(EngineError::Network(error.to_string()))
            }
        }
    }

    /// Adopts a server response as ground truth: question, stage counters,
    /// completion, and the continuation decision.
    async fn adopt_remote(&mut self, remote: RemoteFlowState) -> Result<(), EngineError> {
        if let Some(question) = &remote.question {
            self.graph.merge_question(question.clone());
        }
        self.session.set_stage(StageProgress {
            total: remote.current_stage_total_questions,
            answered: remote.current_stage_answered_questions,
        });
        self.session.set_complete(remote.is_complete);

        if continuation::should_interrupt(&remote, &self.session) {
            self.session.mark_continuation_shown();
            // keep the server's next question for after a "continue"
            self.session
                .set_current_question(remote.question.as_ref().map(|q| q.id.clone()));
            self.enter_phase(FlowPhase::ContinuationPending)?;
        } else if remote.is_complete {
            self.move_cursor(None).await?;
            self.enter_phase(FlowPhase::Completing)?;
        } else {
            let next = remote.question.as_ref().map(|q| q.id.clone());
            self.move_cursor(next).await?;
            self.enter_phase(FlowPhase::Active)?;
        }

        self.cache
            .set_continuation_shown(self.session.continuation_prompt_shown())
            .await?;
        Ok(())
    }

    /// Discards local divergence and re-fetches the authoritative state.
    async fn recover_from_conflict(&mut self) -> Result<(), EngineError> {
        tracing::warn!(
            user_id = %self.session.user_id(),
            "server reports diverged progress, re-fetching current state"
        );
        if let Ok(remote) = self.service.fetch_current().await {
            self.adopt_remote(remote).await?;
        }
        Err(EngineError::Conflict)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Offline path
    // ─────────────────────────────────────────────────────────────────────

    async fn resume_offline(&mut self) -> Result<(), EngineError> {
        if self.graph.is_empty() {
            return Err(EngineError::Offline(
                "no questionnaire catalog available without a connection",
            ));
        }

        let cached = self.cache.load_current().await?;
        let current = cached
            .filter(|id| self.graph.question(id).is_some())
            .or_else(|| self.next_unanswered_locally());

        match current {
            Some(id) => {
                self.move_cursor(Some(id)).await?;
                self.enter_phase(FlowPhase::Active)
            }
            None => {
                self.session.set_complete(true);
                self.move_cursor(None).await?;
                self.enter_phase(FlowPhase::Completing)
            }
        }
    }

    async fn advance_offline(
        &mut self,
        question_id: &QuestionId,
        value: Option<AnswerValue>,
    ) -> Result<(), EngineError> {
        self.queue_pending(question_id, value.clone()).await?;

        let answered: HashSet<QuestionId> =
            self.session.answered_question_ids().iter().cloned().collect();
        let next = self.graph.resolve_next(
            question_id,
            value.as_ref(),
            &mut self.branch_queue,
            &answered,
        )?;

        self.session.clear_continuation_shown();
        self.cache.set_continuation_shown(false).await?;

        tracing::debug!(
            user_id = %self.session.user_id(),
            question_id = %question_id,
            "offline, resolved next question from the local graph"
        );

        match next {
            NextStep::Question(id) => self.move_cursor(Some(id)).await,
            NextStep::Complete => {
                self.session.set_complete(true);
                self.move_cursor(None).await?;
                self.enter_phase(FlowPhase::Completing)
            }
        }
    }

    /// The next question the local graph would ask, branch queue first.
    fn next_unanswered_locally(&mut self) -> Option<QuestionId> {
        while let Some(id) = self.branch_queue.pop_front() {
            if !self.session.has_answered(&id) {
                return Some(id);
            }
        }
        self.graph
            .questions()
            .iter()
            .map(|question| &question.id)
            .find(|id| !self.session.has_answered(id))
            .cloned()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────

    fn finish(&mut self, result: Result<(), EngineError>) -> Result<FlowSnapshot, EngineError> {
        match result {
            Ok(()) => {
                self.last_error = None;
                Ok(self.snapshot())
            }
            Err(error) => {
                self.last_error = Some(error.clone());
                Err(error)
            }
        }
    }

    fn enter_phase(&mut self, target: FlowPhase) -> Result<(), EngineError> {
        if self.phase == target {
            return Ok(());
        }
        let next = self
            .phase
            .transition_to(target)
            .map_err(|e| EngineError::invalid_state(e.to_string()))?;
        tracing::debug!(from = ?self.phase, to = ?next, "flow phase transition");
        self.phase = next;
        Ok(())
    }

    async fn move_cursor(&mut self, id: Option<QuestionId>) -> Result<(), EngineError> {
        self.session.set_current_question(id.clone());
        self.cache.save_current(id.as_ref()).await
    }

    async fn persist_answers(&mut self) -> Result<(), EngineError> {
        self.cache.save_answers(&self.answers).await?;
        self.cache
            .save_order(self.session.answered_question_ids())
            .await
    }

    async fn queue_pending(
        &mut self,
        question_id: &QuestionId,
        value: Option<AnswerValue>,
    ) -> Result<(), EngineError> {
        let mut batch = self.cache.load_pending().await?.unwrap_or_default();
        batch.record(question_id.clone(), value);
        self.cache.save_pending(&batch).await
    }

    async fn complete_submission(&mut self) -> Result<(), EngineError> {
        self.session.set_submitted();
        self.enter_phase(FlowPhase::Submitted)?;
        self.session.set_current_question(None);
        self.cache.clear_all().await?;
        tracing::info!(
            user_id = %self.session.user_id(),
            progress = self.session.progress(),
            "questionnaire submitted"
        );
        Ok(())
    }
}

impl std::fmt::Debug for FlowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowEngine")
            .field("phase", &self.phase)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex as StdMutex;
    use tokio::sync::watch;

    use crate::adapters::storage::InMemoryLocalStore;
    use crate::domain::catalog::{Question, QuestionKind};
    use crate::ports::{RemoteResponses, SessionServiceError};

    fn qid(s: &str) -> QuestionId {
        QuestionId::new(s).unwrap()
    }

    fn text_question(id: &str) -> Question {
        Question::new(qid(id), format!("prompt {id}"), QuestionKind::Text)
    }

    fn catalog() -> Vec<Question> {
        vec![text_question("q1"), text_question("q2"), text_question("q3")]
    }

    fn state_for(question: Option<&str>, progress: u32) -> RemoteFlowState {
        RemoteFlowState {
            question: question.map(text_question),
            is_complete: question.is_none(),
            progress,
            current_stage_total_questions: 3,
            current_stage_answered_questions: progress.min(3),
            show_continuation_prompt: false,
        }
    }

    /// Serves scripted responses; every submit pops the next state.
    struct ScriptedService {
        states: StdMutex<Vec<RemoteFlowState>>,
        current: StdMutex<RemoteFlowState>,
        fail_submissions: AtomicBool,
        finalized: AtomicBool,
    }

    impl ScriptedService {
        fn new(current: RemoteFlowState, upcoming: Vec<RemoteFlowState>) -> Self {
            Self {
                states: StdMutex::new(upcoming),
                current: StdMutex::new(current),
                fail_submissions: AtomicBool::new(false),
                finalized: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl SessionService for ScriptedService {
        async fn fetch_current(&self) -> Result<RemoteFlowState, SessionServiceError> {
            Ok(self.current.lock().unwrap().clone())
        }

        async fn submit_answers(
            &self,
            _answers: &AnswerMap,
        ) -> Result<RemoteFlowState, SessionServiceError> {
            if self.fail_submissions.load(Ordering::SeqCst) {
                return Err(SessionServiceError::Transport("broken pipe".to_string()));
            }
            let mut states = self.states.lock().unwrap();
            let next = if states.is_empty() {
                state_for(None, 0)
            } else {
                states.remove(0)
            };
            *self.current.lock().unwrap() = next.clone();
            Ok(next)
        }

        async fn previous_question(&self) -> Result<RemoteFlowState, SessionServiceError> {
            Ok(state_for(Some("q1"), 1))
        }

        async fn finalize(&self) -> Result<(), SessionServiceError> {
            self.finalized.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn fetch_responses(&self) -> Result<RemoteResponses, SessionServiceError> {
            Ok(RemoteResponses {
                user_responses: HashMap::new(),
                all_questions: catalog(),
            })
        }
    }

    struct ToggleConnectivity {
        online: AtomicBool,
        tx: watch::Sender<bool>,
    }

    impl ToggleConnectivity {
        fn new(online: bool) -> Self {
            let (tx, _) = watch::channel(online);
            Self {
                online: AtomicBool::new(online),
                tx,
            }
        }

        fn set_online(&self, online: bool) {
            self.online.store(online, Ordering::SeqCst);
            let _ = self.tx.send(online);
        }
    }

    impl ConnectivityPort for ToggleConnectivity {
        fn is_online(&self) -> bool {
            self.online.load(Ordering::SeqCst)
        }

        fn subscribe(&self) -> watch::Receiver<bool> {
            self.tx.subscribe()
        }
    }

    fn engine_with(
        service: Arc<ScriptedService>,
        connectivity: Arc<ToggleConnectivity>,
    ) -> FlowEngine {
        FlowEngine::new(
            QuestionGraph::new(catalog()).unwrap(),
            UserId::new("user-123").unwrap(),
            service,
            Arc::new(InMemoryLocalStore::new()),
            connectivity,
        )
    }

    #[tokio::test]
    async fn start_adopts_the_server_starting_question() {
        let service = Arc::new(ScriptedService::new(state_for(Some("q1"), 0), vec![]));
        let mut engine = engine_with(service, Arc::new(ToggleConnectivity::new(true)));

        let snapshot = engine.start().await.unwrap();

        assert_eq!(snapshot.phase, FlowPhase::Active);
        assert_eq!(
            snapshot.current_question.unwrap().id,
            qid("q1")
        );
        assert!(!snapshot.is_offline);
    }

    #[tokio::test]
    async fn validation_failure_mutates_nothing() {
        let mut required = text_question("q1");
        required.required = true;
        let service = Arc::new(ScriptedService::new(
            RemoteFlowState {
                question: Some(required),
                ..state_for(Some("q1"), 0)
            },
            vec![],
        ));
        let mut engine = engine_with(service, Arc::new(ToggleConnectivity::new(true)));
        engine.start().await.unwrap();

        let err = engine.answer(&qid("q1"), None).await.unwrap_err();

        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(engine.session().progress(), 0);
        assert!(engine.answers().is_empty());
        // error is surfaced in the snapshot until the next success
        assert!(engine.snapshot().error.is_some());
    }

    #[tokio::test]
    async fn skip_advances_progress_but_stores_null() {
        let service = Arc::new(ScriptedService::new(
            state_for(Some("q1"), 0),
            vec![state_for(Some("q2"), 1)],
        ));
        let mut engine = engine_with(service, Arc::new(ToggleConnectivity::new(true)));
        engine.start().await.unwrap();

        let snapshot = engine.answer(&qid("q1"), None).await.unwrap();

        assert_eq!(snapshot.progress, 1);
        assert_eq!(engine.answers().get(&qid("q1")), Some(None));
        assert_eq!(engine.answers().get(&qid("q2")), None);
    }

    #[tokio::test]
    async fn repeated_answer_does_not_double_count() {
        let service = Arc::new(ScriptedService::new(
            state_for(Some("q1"), 0),
            vec![state_for(Some("q1"), 1), state_for(Some("q2"), 1)],
        ));
        let mut engine = engine_with(service, Arc::new(ToggleConnectivity::new(true)));
        engine.start().await.unwrap();

        engine
            .answer(&qid("q1"), Some(AnswerValue::scalar("x")))
            .await
            .unwrap();
        // the server kept the cursor on q1; answering again must not grow
        // the answered list
        engine
            .answer(&qid("q1"), Some(AnswerValue::scalar("x")))
            .await
            .unwrap();

        assert_eq!(engine.session().progress(), 1);
    }

    #[tokio::test]
    async fn failed_delivery_keeps_local_state_and_queues_the_answer() {
        let service = Arc::new(ScriptedService::new(state_for(Some("q1"), 0), vec![]));
        let mut engine = engine_with(service.clone(), Arc::new(ToggleConnectivity::new(true)));
        engine.start().await.unwrap();

        service.fail_submissions.store(true, Ordering::SeqCst);
        let err = engine
            .answer(&qid("q1"), Some(AnswerValue::scalar("kept")))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Network(_)));
        assert!(err.is_retryable());
        // optimistic update stands
        assert_eq!(engine.session().progress(), 1);
        assert_eq!(
            engine.answers().get(&qid("q1")),
            Some(Some(&AnswerValue::scalar("kept")))
        );
        // cursor did not advance
        assert_eq!(engine.session().current_question_id(), Some(&qid("q1")));
        // queued for the next flush
        let pending = engine.sync().cache().load_pending().await.unwrap().unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn continuation_prompt_replaces_the_next_question() {
        let prompted = RemoteFlowState {
            show_continuation_prompt: true,
            ..state_for(Some("q2"), 1)
        };
        let service = Arc::new(ScriptedService::new(state_for(Some("q1"), 0), vec![prompted]));
        let mut engine = engine_with(service.clone(), Arc::new(ToggleConnectivity::new(true)));
        engine.start().await.unwrap();

        let snapshot = engine
            .answer(&qid("q1"), Some(AnswerValue::scalar("a")))
            .await
            .unwrap();

        assert_eq!(snapshot.phase, FlowPhase::ContinuationPending);
        let prompt = snapshot.current_question.unwrap();
        assert_eq!(prompt.id.as_str(), super::super::CONTINUATION_QUESTION_ID);
        assert_eq!(
            prompt.options,
            vec![
                "Continue with more questions".to_string(),
                "Submit my responses now".to_string()
            ]
        );

        // catalog answers are rejected while the prompt is up
        let err = engine
            .answer(&qid("q2"), Some(AnswerValue::scalar("b")))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));
    }

    #[tokio::test]
    async fn submit_now_completes_without_answering_the_next_question() {
        let prompted = RemoteFlowState {
            show_continuation_prompt: true,
            ..state_for(Some("q2"), 1)
        };
        let service = Arc::new(ScriptedService::new(state_for(Some("q1"), 0), vec![prompted]));
        let mut engine = engine_with(service.clone(), Arc::new(ToggleConnectivity::new(true)));
        engine.start().await.unwrap();
        engine
            .answer(&qid("q1"), Some(AnswerValue::scalar("a")))
            .await
            .unwrap();

        let snapshot = engine
            .answer_continuation(ContinuationChoice::SubmitNow)
            .await
            .unwrap();

        assert!(snapshot.is_complete);
        assert!(snapshot.is_submitted);
        assert_eq!(snapshot.phase, FlowPhase::Submitted);
        assert!(service.finalized.load(Ordering::SeqCst));
        // q2 was never answered
        assert_eq!(engine.session().progress(), 1);
    }

    #[tokio::test]
    async fn back_with_empty_history_fails_and_changes_nothing() {
        let service = Arc::new(ScriptedService::new(state_for(Some("q1"), 0), vec![]));
        let mut engine = engine_with(service, Arc::new(ToggleConnectivity::new(true)));
        engine.start().await.unwrap();

        let before = engine.snapshot();
        let err = engine.back().await.unwrap_err();

        assert!(matches!(err, EngineError::InvalidState(_)));
        let after = engine.snapshot();
        assert_eq!(after.phase, before.phase);
        assert_eq!(after.progress, before.progress);
        assert_eq!(after.current_question, before.current_question);
    }

    #[tokio::test]
    async fn back_is_rejected_while_offline() {
        let connectivity = Arc::new(ToggleConnectivity::new(true));
        let service = Arc::new(ScriptedService::new(
            state_for(Some("q1"), 0),
            vec![state_for(Some("q2"), 1)],
        ));
        let mut engine = engine_with(service, connectivity.clone());
        engine.start().await.unwrap();
        engine
            .answer(&qid("q1"), Some(AnswerValue::scalar("a")))
            .await
            .unwrap();

        connectivity.set_online(false);
        let err = engine.back().await.unwrap_err();

        assert_eq!(err, EngineError::Offline("back navigation requires a connection"));
        assert_eq!(engine.session().progress(), 1);
    }

    #[tokio::test]
    async fn submit_before_completion_is_rejected() {
        let service = Arc::new(ScriptedService::new(state_for(Some("q1"), 0), vec![]));
        let mut engine = engine_with(service, Arc::new(ToggleConnectivity::new(true)));
        engine.start().await.unwrap();

        let err = engine.submit().await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));
        assert!(!engine.session().is_submitted());
    }

    #[tokio::test]
    async fn edit_answer_replaces_the_value_without_moving_the_cursor() {
        let service = Arc::new(ScriptedService::new(
            state_for(Some("q1"), 0),
            vec![state_for(Some("q2"), 1), state_for(Some("q3"), 2)],
        ));
        let mut engine = engine_with(service, Arc::new(ToggleConnectivity::new(true)));
        engine.start().await.unwrap();
        engine
            .answer(&qid("q1"), Some(AnswerValue::scalar("first")))
            .await
            .unwrap();

        let snapshot = engine
            .edit_answer(&qid("q1"), Some(AnswerValue::scalar("revised")))
            .await
            .unwrap();

        assert_eq!(
            engine.answers().get(&qid("q1")),
            Some(Some(&AnswerValue::scalar("revised")))
        );
        // cursor stays on q2, progress unchanged
        assert_eq!(snapshot.current_question.unwrap().id, qid("q2"));
        assert_eq!(snapshot.progress, 1);
    }

    #[tokio::test]
    async fn edit_of_an_unanswered_question_is_rejected() {
        let service = Arc::new(ScriptedService::new(state_for(Some("q1"), 0), vec![]));
        let mut engine = engine_with(service, Arc::new(ToggleConnectivity::new(true)));
        engine.start().await.unwrap();

        let err = engine
            .edit_answer(&qid("q3"), Some(AnswerValue::scalar("x")))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));
    }

    #[tokio::test]
    async fn offline_answers_resolve_from_the_local_graph() {
        let connectivity = Arc::new(ToggleConnectivity::new(false));
        let service = Arc::new(ScriptedService::new(state_for(Some("q1"), 0), vec![]));
        let mut engine = engine_with(service, connectivity);

        let snapshot = engine.start().await.unwrap();
        assert!(snapshot.is_offline);
        assert_eq!(snapshot.current_question.unwrap().id, qid("q1"));

        let snapshot = engine
            .answer(&qid("q1"), Some(AnswerValue::scalar("a")))
            .await
            .unwrap();
        assert_eq!(snapshot.current_question.unwrap().id, qid("q2"));

        let pending = engine.sync().cache().load_pending().await.unwrap().unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn answering_everything_offline_completes_and_defers_submission() {
        let connectivity = Arc::new(ToggleConnectivity::new(false));
        let service = Arc::new(ScriptedService::new(state_for(Some("q1"), 0), vec![]));
        let mut engine = engine_with(service.clone(), connectivity);
        engine.start().await.unwrap();

        for id in ["q1", "q2", "q3"] {
            engine
                .answer(&qid(id), Some(AnswerValue::scalar("v")))
                .await
                .unwrap();
        }

        let snapshot = engine.snapshot();
        assert!(snapshot.is_complete);
        assert_eq!(snapshot.phase, FlowPhase::Completing);

        let snapshot = engine.submit().await.unwrap();
        assert!(!snapshot.is_submitted);
        assert_eq!(snapshot.phase, FlowPhase::Completing);
        assert!(engine.sync().cache().deferred_submit().await.unwrap());
        assert!(!service.finalized.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn conflict_refetches_the_authoritative_state() {
        struct ConflictingService(ScriptedService);

        #[async_trait]
        impl SessionService for ConflictingService {
            async fn fetch_current(&self) -> Result<RemoteFlowState, SessionServiceError> {
                Ok(state_for(Some("q3"), 2))
            }
            async fn submit_answers(
                &self,
                _answers: &AnswerMap,
            ) -> Result<RemoteFlowState, SessionServiceError> {
                Err(SessionServiceError::Conflict)
            }
            async fn previous_question(&self) -> Result<RemoteFlowState, SessionServiceError> {
                self.0.previous_question().await
            }
            async fn finalize(&self) -> Result<(), SessionServiceError> {
                self.0.finalize().await
            }
            async fn fetch_responses(&self) -> Result<RemoteResponses, SessionServiceError> {
                self.0.fetch_responses().await
            }
        }

        let service = Arc::new(ConflictingService(ScriptedService::new(
            state_for(Some("q3"), 2),
            vec![],
        )));
        let mut engine = FlowEngine::new(
            QuestionGraph::new(catalog()).unwrap(),
            UserId::new("user-123").unwrap(),
            service,
            Arc::new(InMemoryLocalStore::new()),
            Arc::new(ToggleConnectivity::new(true)),
        );
        engine.start().await.unwrap();

        let err = engine
            .answer(&qid("q3"), Some(AnswerValue::scalar("x")))
            .await
            .unwrap_err();

        assert_eq!(err, EngineError::Conflict);
        // the engine discarded its divergence and follows the server cursor
        assert_eq!(engine.session().current_question_id(), Some(&qid("q3")));
    }
}
