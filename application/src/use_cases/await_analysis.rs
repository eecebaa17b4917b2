//! Await Analysis use case.
//!
//! Submits a symptom analysis and waits for its result, polling the
//! backend when the result is not immediately available.
//!
//! | Submission response            | Strategy                                   |
//! |--------------------------------|--------------------------------------------|
//! | cached, `done` with text       | none, returned directly                    |
//! | pending with `task_id`         | [`poll_by_task_status`](AwaitAnalysisUseCase::poll_by_task_status) |
//! | pending without `task_id`      | [`poll_by_cache_key`](AwaitAnalysisUseCase::poll_by_cache_key)     |
//!
//! Task-status polling is used whenever a task id is available, unless a
//! strategy is forced with [`with_strategy`](AwaitAnalysisUseCase::with_strategy).

use crate::config::PollingParams;
use crate::ports::analysis_backend::{AnalysisBackend, BackendError};
use crate::ports::analysis_logger::{AnalysisEvent, AnalysisLogger, NoAnalysisLogger};
use crate::ports::progress::{NoPollProgress, PollProgressNotifier};
use crate::use_cases::poll_until::{PollHooks, poll_until};
use crate::use_cases::session_registry::ActiveSessions;
use crate::use_cases::shared::{cancellable, check_cancelled};
use careline_domain::util::preview;
use careline_domain::{
    AnalysisError, AnalysisHandle, AnalysisRequest, AnalysisResult, CacheKey, PollPolicy,
    PollSession, PollStrategy, PollVerdict, TaskId, TaskState,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Use case for submitting an analysis and awaiting its result.
///
/// Each call runs its own [`PollSession`]; calls may run concurrently as
/// long as they poll different cache keys. Instances sharing one
/// [`ActiveSessions`] reject a second loop on the same key.
pub struct AwaitAnalysisUseCase {
    backend: Arc<dyn AnalysisBackend>,
    params: PollingParams,
    sessions: ActiveSessions,
    logger: Arc<dyn AnalysisLogger>,
    cancellation_token: Option<CancellationToken>,
    strategy: Option<PollStrategy>,
}

impl Clone for AwaitAnalysisUseCase {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            params: self.params,
            sessions: self.sessions.clone(),
            logger: self.logger.clone(),
            cancellation_token: self.cancellation_token.clone(),
            strategy: self.strategy,
        }
    }
}

impl AwaitAnalysisUseCase {
    pub fn new(backend: Arc<dyn AnalysisBackend>) -> Self {
        Self {
            backend,
            params: PollingParams::default(),
            sessions: ActiveSessions::new(),
            logger: Arc::new(NoAnalysisLogger),
            cancellation_token: None,
            strategy: None,
        }
    }

    pub fn with_params(mut self, params: PollingParams) -> Self {
        self.params = params;
        self
    }

    /// Share a session registry with other use case instances.
    pub fn with_sessions(mut self, sessions: ActiveSessions) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn AnalysisLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Force a polling strategy instead of choosing per handle.
    ///
    /// Forcing task-status polling on a handle without a task id falls
    /// back to cache-key polling.
    pub fn with_strategy(mut self, strategy: Option<PollStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn sessions(&self) -> &ActiveSessions {
        &self.sessions
    }

    /// Submit and await without progress reporting
    pub async fn execute(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        self.submit_and_await(request, &NoPollProgress).await
    }

    /// Submit `request`, then return the finished result.
    ///
    /// Resolves with a `done` result; every error from the poll loop is
    /// returned unmodified.
    pub async fn submit_and_await(
        &self,
        request: &AnalysisRequest,
        progress: &dyn PollProgressNotifier,
    ) -> Result<AnalysisResult, AnalysisError> {
        let outcome = self.submit(request, progress).await;
        self.report_finished(&outcome, progress);
        outcome
    }

    /// Await a previously submitted analysis.
    ///
    /// Used to resume after a timeout, when the job may have completed
    /// server-side in the meantime.
    pub async fn await_handle(
        &self,
        handle: AnalysisHandle,
        progress: &dyn PollProgressNotifier,
    ) -> Result<AnalysisResult, AnalysisError> {
        info!(
            "Resuming analysis {}",
            handle.cache_key().map(|k| k.as_str()).unwrap_or("(cached)")
        );
        self.logger.log(AnalysisEvent::new(
            "analysis_resumed",
            serde_json::json!({
                "task_id": handle.task_id().map(|t| t.as_str()),
                "cache_key": handle.cache_key().map(|k| k.as_str()),
            }),
        ));
        progress.on_resumed(handle.cache_key());

        let outcome = self.dispatch(handle, progress).await;
        self.report_finished(&outcome, progress);
        outcome
    }

    async fn submit(
        &self,
        request: &AnalysisRequest,
        progress: &dyn PollProgressNotifier,
    ) -> Result<AnalysisResult, AnalysisError> {
        check_cancelled(self.cancellation_token.as_ref())?;

        info!(
            "Submitting analysis for conversation {}: {}",
            request.conversation_id(),
            preview(request.symptom_text(), 80)
        );

        let handle = cancellable(
            self.cancellation_token.as_ref(),
            self.backend.start_analysis(request),
        )
        .await?
        .map_err(|e| AnalysisError::Network(e.to_string()))?;

        self.logger.log(AnalysisEvent::new(
            "analysis_submitted",
            serde_json::json!({
                "conversation_id": request.conversation_id().as_str(),
                "cached": handle.ready_result().is_some(),
                "task_id": handle.task_id().map(|t| t.as_str()),
                "cache_key": handle.cache_key().map(|k| k.as_str()),
            }),
        ));
        progress.on_submitted(handle.cache_key());

        self.dispatch(handle, progress).await
    }

    async fn dispatch(
        &self,
        handle: AnalysisHandle,
        progress: &dyn PollProgressNotifier,
    ) -> Result<AnalysisResult, AnalysisError> {
        if let Some(result) = handle.ready_result() {
            info!("Analysis result served from cache");
            progress.on_cache_hit();
            return Ok(result.clone());
        }

        let strategy = self.select_strategy(&handle);
        let (task_id, cache_key) = match handle {
            AnalysisHandle::Cached(result) => {
                return match PollVerdict::from_result(result) {
                    PollVerdict::Failed(reason) => Err(AnalysisError::Failure(reason)),
                    _ => Err(AnalysisError::Failure(
                        "cached analysis is incomplete and has no cache key to poll".to_string(),
                    )),
                };
            }
            AnalysisHandle::Pending { task_id, cache_key } => (task_id, cache_key),
        };

        let policy = self.params.policy_for(strategy);
        match (strategy, task_id) {
            (PollStrategy::TaskStatus, Some(task_id)) => {
                self.poll_by_task_status(&task_id, &cache_key, &policy, progress)
                    .await
            }
            _ => self.poll_by_cache_key(&cache_key, &policy, progress).await,
        }
    }

    /// The handle's preferred strategy unless one is forced.
    ///
    /// Forcing task-status polling on a handle without a task id falls
    /// back to cache-key polling.
    fn select_strategy(&self, handle: &AnalysisHandle) -> PollStrategy {
        let preferred = handle.preferred_strategy();
        match self.strategy {
            Some(PollStrategy::TaskStatus) if handle.task_id().is_none() => {
                warn!("Task-status polling requested but no task id was returned; polling by cache key");
                PollStrategy::CacheKey
            }
            Some(forced) => forced,
            None => preferred,
        }
    }

    /// Poll job state until `SUCCESS`, then fetch the result by cache key.
    ///
    /// A `SUCCESS` whose result has not materialized yet counts as a
    /// pending attempt. `FAILURE` ends the loop immediately.
    pub async fn poll_by_task_status(
        &self,
        task_id: &TaskId,
        cache_key: &CacheKey,
        policy: &PollPolicy,
        progress: &dyn PollProgressNotifier,
    ) -> Result<AnalysisResult, AnalysisError> {
        let _guard = self.sessions.try_acquire(cache_key)?;
        let mut session = PollSession::new(PollStrategy::TaskStatus, cache_key.clone(), policy);
        debug!(
            "Polling task {} (up to {} attempts every {:?}, ~{:?} total)",
            task_id,
            policy.max_attempts,
            policy.interval,
            policy.total_budget()
        );

        let backend = self.backend.as_ref();
        poll_until(&mut session, policy, self.hooks(progress), move || {
            probe_task_status(backend, task_id, cache_key)
        })
        .await
    }

    /// Poll the stored result directly until it is `done` or `error`.
    pub async fn poll_by_cache_key(
        &self,
        cache_key: &CacheKey,
        policy: &PollPolicy,
        progress: &dyn PollProgressNotifier,
    ) -> Result<AnalysisResult, AnalysisError> {
        let _guard = self.sessions.try_acquire(cache_key)?;
        let mut session = PollSession::new(PollStrategy::CacheKey, cache_key.clone(), policy);
        debug!(
            "Polling result {} (up to {} attempts every {:?}, ~{:?} total)",
            cache_key,
            policy.max_attempts,
            policy.interval,
            policy.total_budget()
        );

        let backend = self.backend.as_ref();
        poll_until(&mut session, policy, self.hooks(progress), move || {
            probe_cache_key(backend, cache_key)
        })
        .await
    }

    fn hooks<'a>(&'a self, progress: &'a dyn PollProgressNotifier) -> PollHooks<'a> {
        PollHooks {
            cancellation: self.cancellation_token.as_ref(),
            progress,
            logger: self.logger.as_ref(),
        }
    }

    fn report_finished(
        &self,
        outcome: &Result<AnalysisResult, AnalysisError>,
        progress: &dyn PollProgressNotifier,
    ) {
        match outcome {
            Ok(result) => info!("Analysis completed ({} bytes)", result.text().len()),
            Err(e) if e.is_cancelled() => info!("Analysis cancelled"),
            Err(e) => warn!("Analysis ended with {}: {}", e.kind(), e),
        }

        let payload = match outcome {
            Ok(result) => serde_json::json!({
                "outcome": "done",
                "bytes": result.text().len(),
            }),
            Err(e) => serde_json::json!({
                "outcome": e.kind().as_str(),
                "error": e.to_string(),
            }),
        };
        self.logger.log(AnalysisEvent::new("analysis_finished", payload));
        progress.on_finished(outcome);
    }
}

/// One task-status attempt: `SUCCESS` also fetches the result, which
/// must be ready for the attempt to count as terminal.
async fn probe_task_status(
    backend: &dyn AnalysisBackend,
    task_id: &TaskId,
    cache_key: &CacheKey,
) -> Result<PollVerdict<AnalysisResult>, BackendError> {
    match backend.task_status(task_id).await? {
        TaskState::Success => {
            let result = backend.fetch_result(cache_key).await?;
            if result.is_ready() {
                Ok(PollVerdict::Ready(result))
            } else {
                Ok(PollVerdict::pending(format!(
                    "SUCCESS, result {}",
                    result.status
                )))
            }
        }
        TaskState::Failure => Ok(PollVerdict::Failed(format!(
            "task {} reported FAILURE",
            task_id
        ))),
        state => Ok(PollVerdict::pending(state.as_str())),
    }
}

async fn probe_cache_key(
    backend: &dyn AnalysisBackend,
    cache_key: &CacheKey,
) -> Result<PollVerdict<AnalysisResult>, BackendError> {
    backend
        .fetch_result(cache_key)
        .await
        .map(PollVerdict::from_result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    // ==================== Test Mocks ====================

    /// Backend that replays scripted responses per endpoint and counts calls.
    #[derive(Default)]
    struct ScriptedBackend {
        start: Mutex<VecDeque<Result<AnalysisHandle, BackendError>>>,
        statuses: Mutex<VecDeque<Result<TaskState, BackendError>>>,
        results: Mutex<VecDeque<Result<AnalysisResult, BackendError>>>,
        /// Returned once `statuses` is exhausted.
        status_fallback: Option<TaskState>,
        /// Returned once `results` is exhausted.
        result_fallback: Option<AnalysisResult>,
        start_calls: AtomicUsize,
        status_calls: AtomicUsize,
        result_calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn submitting(handle: AnalysisHandle) -> Self {
            let backend = Self::default();
            backend.start.lock().unwrap().push_back(Ok(handle));
            backend
        }

        fn with_statuses(self, statuses: Vec<Result<TaskState, BackendError>>) -> Self {
            self.statuses.lock().unwrap().extend(statuses);
            self
        }

        fn with_results(self, results: Vec<Result<AnalysisResult, BackendError>>) -> Self {
            self.results.lock().unwrap().extend(results);
            self
        }

        fn with_status_fallback(mut self, state: TaskState) -> Self {
            self.status_fallback = Some(state);
            self
        }

        fn with_result_fallback(mut self, result: AnalysisResult) -> Self {
            self.result_fallback = Some(result);
            self
        }

        fn status_calls(&self) -> usize {
            self.status_calls.load(Ordering::SeqCst)
        }

        fn result_calls(&self) -> usize {
            self.result_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalysisBackend for ScriptedBackend {
        async fn start_analysis(
            &self,
            _request: &AnalysisRequest,
        ) -> Result<AnalysisHandle, BackendError> {
            self.start_calls.fetch_add(1, Ordering::SeqCst);
            self.start
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(BackendError::Other("No more submissions".to_string())))
        }

        async fn task_status(&self, _task_id: &TaskId) -> Result<TaskState, BackendError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            match self.statuses.lock().unwrap().pop_front() {
                Some(next) => next,
                None => self
                    .status_fallback
                    .ok_or_else(|| BackendError::Other("No more statuses".to_string())),
            }
        }

        async fn fetch_result(&self, _cache_key: &CacheKey) -> Result<AnalysisResult, BackendError> {
            self.result_calls.fetch_add(1, Ordering::SeqCst);
            match self.results.lock().unwrap().pop_front() {
                Some(next) => next,
                None => self
                    .result_fallback
                    .clone()
                    .ok_or_else(|| BackendError::Other("No more results".to_string())),
            }
        }
    }

    /// Progress notifier that records what it was told.
    #[derive(Default)]
    struct RecordingProgress {
        submitted: AtomicUsize,
        observed: Mutex<Vec<String>>,
        transient: AtomicUsize,
        cache_hits: AtomicUsize,
        finished: AtomicUsize,
    }

    impl PollProgressNotifier for RecordingProgress {
        fn on_submitted(&self, _cache_key: Option<&CacheKey>) {
            self.submitted.fetch_add(1, Ordering::SeqCst);
        }

        fn on_cache_hit(&self) {
            self.cache_hits.fetch_add(1, Ordering::SeqCst);
        }

        fn on_poll_attempt(&self, _session: &PollSession, observed: &str) {
            self.observed.lock().unwrap().push(observed.to_string());
        }

        fn on_transient_error(&self, _session: &PollSession, _error: &str, _retry_in: Duration) {
            self.transient.fetch_add(1, Ordering::SeqCst);
        }

        fn on_finished(&self, _outcome: &Result<AnalysisResult, AnalysisError>) {
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    const INTERVAL: Duration = Duration::from_millis(4000);

    fn request() -> AnalysisRequest {
        AnalysisRequest::new("chest pain when breathing", "conv-7").unwrap()
    }

    fn fast_params(max_attempts: u32) -> PollingParams {
        PollingParams::default()
            .with_task_status(PollPolicy::new(max_attempts, INTERVAL))
            .with_cache_key(PollPolicy::new(max_attempts, Duration::from_millis(5000)))
    }

    fn use_case(backend: &Arc<ScriptedBackend>) -> AwaitAnalysisUseCase {
        AwaitAnalysisUseCase::new(backend.clone())
    }

    // ==================== Tests ====================

    #[tokio::test(start_paused = true)]
    async fn test_immediate_cache_hit_skips_polling() {
        let backend = Arc::new(ScriptedBackend::submitting(AnalysisHandle::Cached(
            AnalysisResult::done("X"),
        )));
        let progress = RecordingProgress::default();

        let result = use_case(&backend)
            .submit_and_await(&request(), &progress)
            .await
            .unwrap();

        assert_eq!(result, AnalysisResult::done("X"));
        assert_eq!(backend.status_calls(), 0);
        assert_eq!(backend.result_calls(), 0);
        assert_eq!(progress.submitted.load(Ordering::SeqCst), 1);
        assert_eq!(progress.cache_hits.load(Ordering::SeqCst), 1);
        assert_eq!(progress.finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_status_success_path() {
        let backend = Arc::new(
            ScriptedBackend::submitting(AnalysisHandle::pending(Some(TaskId::new("t1")), "k1"))
                .with_statuses(vec![
                    Ok(TaskState::Pending),
                    Ok(TaskState::Pending),
                    Ok(TaskState::Success),
                ])
                .with_results(vec![Ok(AnalysisResult::done("Y"))]),
        );

        let result = use_case(&backend).execute(&request()).await.unwrap();

        assert_eq!(result.text(), "Y");
        assert_eq!(backend.status_calls(), 3);
        assert_eq!(backend.result_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_failure_short_circuits() {
        let backend = Arc::new(
            ScriptedBackend::submitting(AnalysisHandle::pending(Some(TaskId::new("t1")), "k1"))
                .with_statuses(vec![Ok(TaskState::Failure)])
                .with_status_fallback(TaskState::Pending),
        );
        let start = tokio::time::Instant::now();

        let error = use_case(&backend).execute(&request()).await.unwrap_err();

        assert_eq!(error.kind(), careline_domain::AnalysisErrorKind::Failure);
        assert_eq!(backend.status_calls(), 1);
        assert_eq!(backend.result_calls(), 0);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_bound() {
        let backend = Arc::new(
            ScriptedBackend::submitting(AnalysisHandle::pending(Some(TaskId::new("t1")), "k1"))
                .with_status_fallback(TaskState::Pending),
        );
        let start = tokio::time::Instant::now();

        let error = use_case(&backend)
            .with_params(fast_params(3))
            .execute(&request())
            .await
            .unwrap_err();

        assert_eq!(error, AnalysisError::Timeout { attempts: 3 });
        assert_eq!(backend.status_calls(), 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= INTERVAL * 3, "elapsed {:?}", elapsed);
        assert!(elapsed < INTERVAL * 3 + Duration::from_millis(10), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_direct_result_polling_without_task_id() {
        let backend = Arc::new(
            ScriptedBackend::submitting(AnalysisHandle::pending(None, "k1")).with_results(vec![
                Ok(AnalysisResult::processing()),
                Ok(AnalysisResult::processing()),
                Ok(AnalysisResult::done("Z")),
            ]),
        );

        let result = use_case(&backend).execute(&request()).await.unwrap();

        assert_eq!(result.text(), "Z");
        assert_eq!(backend.result_calls(), 3);
        assert_eq!(backend.status_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_error_status_is_failure() {
        let backend = Arc::new(
            ScriptedBackend::submitting(AnalysisHandle::pending(None, "k1"))
                .with_results(vec![Ok(AnalysisResult::processing()), Ok(AnalysisResult::error())]),
        );

        let error = use_case(&backend).execute(&request()).await.unwrap_err();

        assert!(matches!(error, AnalysisError::Failure(_)));
        assert_eq!(backend.result_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_error_mid_loop_is_absorbed() {
        let backend = Arc::new(
            ScriptedBackend::submitting(AnalysisHandle::pending(Some(TaskId::new("t1")), "k1"))
                .with_statuses(vec![
                    Ok(TaskState::Progress),
                    Err(BackendError::ConnectionError("connection reset".to_string())),
                    Ok(TaskState::Success),
                ])
                .with_results(vec![Ok(AnalysisResult::done("recovered"))]),
        );
        let progress = RecordingProgress::default();
        let start = tokio::time::Instant::now();

        let result = use_case(&backend)
            .submit_and_await(&request(), &progress)
            .await
            .unwrap();

        assert_eq!(result.text(), "recovered");
        assert_eq!(backend.status_calls(), 3);
        assert_eq!(progress.transient.load(Ordering::SeqCst), 1);
        // One regular wait plus one stretched wait.
        assert!(start.elapsed() >= INTERVAL * 2 + Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_error_on_last_attempt_propagates() {
        let backend = Arc::new(
            ScriptedBackend::submitting(AnalysisHandle::pending(None, "k1")).with_results(vec![
                Ok(AnalysisResult::processing()),
                Err(BackendError::Status {
                    status: 502,
                    body: "bad gateway".to_string(),
                }),
            ]),
        );

        let error = use_case(&backend)
            .with_params(fast_params(2))
            .execute(&request())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), careline_domain::AnalysisErrorKind::Network);
        assert!(error.to_string().contains("502"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_without_materialized_result_keeps_polling() {
        let backend = Arc::new(
            ScriptedBackend::submitting(AnalysisHandle::pending(Some(TaskId::new("t1")), "k1"))
                .with_status_fallback(TaskState::Success)
                .with_results(vec![
                    Ok(AnalysisResult::processing()),
                    Ok(AnalysisResult::done("")),
                    Ok(AnalysisResult::done("finally")),
                ]),
        );
        let progress = RecordingProgress::default();

        let result = use_case(&backend)
            .submit_and_await(&request(), &progress)
            .await
            .unwrap();

        assert_eq!(result.text(), "finally");
        assert_eq!(backend.status_calls(), 3);
        assert_eq!(backend.result_calls(), 3);
        let observed = progress.observed.lock().unwrap().clone();
        assert_eq!(
            observed,
            vec!["SUCCESS, result processing", "SUCCESS, result done", "ready"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_session_rejected() {
        let backend = Arc::new(
            ScriptedBackend::submitting(AnalysisHandle::pending(None, "k1"))
                .with_result_fallback(AnalysisResult::processing()),
        );
        let sessions = ActiveSessions::new();
        let _held = sessions.try_acquire(&CacheKey::new("k1")).unwrap();

        let error = use_case(&backend)
            .with_sessions(sessions.clone())
            .execute(&request())
            .await
            .unwrap_err();

        assert_eq!(error, AnalysisError::DuplicateSession(CacheKey::new("k1")));
        assert_eq!(backend.result_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_submissions_for_same_key() {
        let backend = Arc::new(
            ScriptedBackend::submitting(AnalysisHandle::pending(None, "k1")).with_results(vec![
                Ok(AnalysisResult::processing()),
                Ok(AnalysisResult::done("first")),
            ]),
        );
        backend
            .start
            .lock()
            .unwrap()
            .push_back(Ok(AnalysisHandle::pending(None, "k1")));

        let first = use_case(&backend);
        let second = first.clone();
        let request = request();

        let (a, b) = tokio::join!(first.execute(&request), second.execute(&request));

        assert_eq!(a.unwrap().text(), "first");
        assert!(matches!(b, Err(AnalysisError::DuplicateSession(_))));
        assert!(first.sessions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_polling_and_releases_session() {
        let backend = Arc::new(
            ScriptedBackend::submitting(AnalysisHandle::pending(Some(TaskId::new("t1")), "k1"))
                .with_status_fallback(TaskState::Pending),
        );
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(4500)).await;
            canceller.cancel();
        });

        let use_case = use_case(&backend).with_cancellation(token);
        let error = use_case.execute(&request()).await.unwrap_err();

        assert!(error.is_cancelled());
        assert_eq!(backend.status_calls(), 2);
        assert!(use_case.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_submit() {
        let backend = Arc::new(ScriptedBackend::submitting(AnalysisHandle::Cached(
            AnalysisResult::done("X"),
        )));
        let token = CancellationToken::new();
        token.cancel();

        let error = use_case(&backend)
            .with_cancellation(token)
            .execute(&request())
            .await
            .unwrap_err();

        assert!(error.is_cancelled());
        assert_eq!(backend.start_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submission_error_is_network() {
        let backend = Arc::new(ScriptedBackend::default());
        backend
            .start
            .lock()
            .unwrap()
            .push_back(Err(BackendError::ConnectionError("dns".to_string())));

        let error = use_case(&backend).execute(&request()).await.unwrap_err();
        assert_eq!(error.kind(), careline_domain::AnalysisErrorKind::Network);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_cache_key_strategy_ignores_task_id() {
        let backend = Arc::new(
            ScriptedBackend::submitting(AnalysisHandle::pending(Some(TaskId::new("t1")), "k1"))
                .with_results(vec![Ok(AnalysisResult::done("direct"))]),
        );

        let result = use_case(&backend)
            .with_strategy(Some(PollStrategy::CacheKey))
            .execute(&request())
            .await
            .unwrap();

        assert_eq!(result.text(), "direct");
        assert_eq!(backend.status_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_task_status_without_task_id_falls_back() {
        let backend = Arc::new(
            ScriptedBackend::submitting(AnalysisHandle::pending(None, "k1"))
                .with_results(vec![Ok(AnalysisResult::done("fallback"))]),
        );

        let result = use_case(&backend)
            .with_strategy(Some(PollStrategy::TaskStatus))
            .execute(&request())
            .await
            .unwrap();

        assert_eq!(result.text(), "fallback");
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_handle_resumes_polling() {
        let backend = Arc::new(
            ScriptedBackend::default().with_results(vec![Ok(AnalysisResult::done("later"))]),
        );

        let result = use_case(&backend)
            .await_handle(AnalysisHandle::pending(None, "k-old"), &NoPollProgress)
            .await
            .unwrap();

        assert_eq!(result.text(), "later");
        assert_eq!(backend.start_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_handle_starts_progress_before_polling() {
        let backend = Arc::new(ScriptedBackend::default().with_results(vec![
            Ok(AnalysisResult::processing()),
            Ok(AnalysisResult::done("later")),
        ]));
        let progress = RecordingProgress::default();

        let result = use_case(&backend)
            .with_params(fast_params(5))
            .await_handle(AnalysisHandle::pending(None, "k-old"), &progress)
            .await
            .unwrap();

        assert_eq!(result.text(), "later");
        assert_eq!(progress.submitted.load(Ordering::SeqCst), 1);
        assert_eq!(progress.observed.lock().unwrap().len(), 2);
        assert_eq!(progress.finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cached_but_incomplete_handle_fails() {
        let backend = Arc::new(ScriptedBackend::default());

        let error = use_case(&backend)
            .await_handle(AnalysisHandle::Cached(AnalysisResult::error()), &NoPollProgress)
            .await
            .unwrap_err();

        assert!(matches!(error, AnalysisError::Failure(_)));
    }
}
