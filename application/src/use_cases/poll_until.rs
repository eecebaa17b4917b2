//! Generic bounded poll loop.
//!
//! Both polling strategies run through [`poll_until`]; they differ only in
//! the probe they pass, which turns one backend round-trip into a
//! [`PollVerdict`].
//!
//! Per attempt:
//!
//! | Probe outcome              | Action                                         |
//! |----------------------------|------------------------------------------------|
//! | `Ready(value)`             | session `Done`, return value                   |
//! | `Failed(reason)`           | session `Failed`, `AnalysisError::Failure`     |
//! | `Pending(_)`               | sleep `interval`, next attempt                 |
//! | `Err(BackendError)`        | sleep `interval + error_backoff`, next attempt |
//! | `Err(..)` on last attempt  | `AnalysisError::Network`                       |
//!
//! When attempts run out the session is `TimedOut` and the loop returns
//! `AnalysisError::Timeout`. Attempts are strictly sequential.

use crate::ports::analysis_backend::BackendError;
use crate::ports::analysis_logger::{AnalysisEvent, AnalysisLogger};
use crate::ports::progress::PollProgressNotifier;
use crate::use_cases::shared::{cancellable, sleep_cancellable};
use careline_domain::{AnalysisError, PollPolicy, PollSession, PollVerdict};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Observers and cancellation shared by every attempt of one loop.
#[derive(Clone, Copy)]
pub struct PollHooks<'a> {
    pub cancellation: Option<&'a CancellationToken>,
    pub progress: &'a dyn PollProgressNotifier,
    pub logger: &'a dyn AnalysisLogger,
}

/// Drive `probe` until it yields a terminal verdict or `session` runs out
/// of attempts.
///
/// Every probe call and every sleep is raced against the cancellation
/// token; on cancellation the session is marked `Cancelled` and
/// `AnalysisError::Cancelled` is returned.
pub async fn poll_until<T, F, Fut>(
    session: &mut PollSession,
    policy: &PollPolicy,
    hooks: PollHooks<'_>,
    mut probe: F,
) -> Result<T, AnalysisError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollVerdict<T>, BackendError>>,
{
    while let Some(attempt) = session.begin_attempt() {
        let observed = match cancellable(hooks.cancellation, probe()).await {
            Ok(observed) => observed,
            Err(cancelled) => {
                session.mark_cancelled();
                return Err(cancelled);
            }
        };

        let delay = match observed {
            Ok(PollVerdict::Ready(value)) => {
                session.mark_done();
                log_attempt(session, hooks, "ready");
                return Ok(value);
            }
            Ok(PollVerdict::Failed(reason)) => {
                session.mark_failed(reason.clone());
                log_attempt(session, hooks, "failed");
                return Err(AnalysisError::Failure(reason));
            }
            Ok(PollVerdict::Pending(label)) => {
                debug!(
                    "Poll {} attempt {}/{}: {}",
                    session.cache_key(),
                    attempt,
                    session.max_attempts(),
                    label
                );
                log_attempt(session, hooks, &label);
                policy.interval
            }
            Err(error) => {
                let message = error.to_string();
                if session.is_last_attempt() {
                    warn!(
                        "Poll {} attempt {}/{} failed, no attempts left: {}",
                        session.cache_key(),
                        attempt,
                        session.max_attempts(),
                        message
                    );
                    session.mark_failed(message.clone());
                    log_attempt(session, hooks, "network_error");
                    return Err(AnalysisError::Network(message));
                }

                let retry_in = policy.error_delay();
                session.record_transient_error();
                warn!(
                    "Poll {} attempt {}/{} failed, retrying in {:?}: {}",
                    session.cache_key(),
                    attempt,
                    session.max_attempts(),
                    retry_in,
                    message
                );
                hooks.progress.on_transient_error(session, &message, retry_in);
                log_attempt(session, hooks, "transient_error");
                retry_in
            }
        };

        if let Err(cancelled) = sleep_cancellable(hooks.cancellation, delay).await {
            session.mark_cancelled();
            return Err(cancelled);
        }
        session.record_wait(delay);
    }

    session.mark_timed_out();
    warn!(
        "Poll {} timed out after {} attempts ({:?} waited)",
        session.cache_key(),
        session.attempts(),
        session.waited()
    );
    Err(AnalysisError::Timeout {
        attempts: session.attempts(),
    })
}

fn log_attempt(session: &PollSession, hooks: PollHooks<'_>, observed: &str) {
    hooks.progress.on_poll_attempt(session, observed);
    hooks.logger.log(AnalysisEvent::new(
        "poll_attempt",
        serde_json::json!({
            "cache_key": session.cache_key().as_str(),
            "strategy": session.strategy().as_str(),
            "attempt": session.attempts(),
            "max_attempts": session.max_attempts(),
            "observed": observed,
            "waited_ms": session.waited().as_millis() as u64,
        }),
    ));
}
