//! Bounded, retried execution of inference operations.
//!
//! Every user-facing operation funnels through [`OperationExecutor::run`]
//! with its own invoke closure. A failed attempt (including a timeout)
//! destroys the now-suspect session so the retry starts from a fresh
//! one; the failure's root cause is assumed to possibly be session
//! corruption.

use crate::capability::{InferenceSession, SessionOptions};
use crate::session::{SessionKey, SessionManager};
use chrono::{DateTime, Utc};
use glint_common::{Error, GlintConfig, Result};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Normalized output of any operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    pub raw: String,
    pub timestamp: DateTime<Utc>,
    /// Attempts actually made, `1..=max_retries + 1`.
    pub attempts: u32,
}

/// Per-run bounds. On-device inference is slow and front-loaded with
/// warm-up cost, so the timeout is multi-minute and retries are few.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub timeout: Duration,
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &GlintConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            timeout: config.operation_timeout(),
            backoff_base: config.backoff_base(),
        }
    }
}

pub struct OperationExecutor {
    manager: Arc<SessionManager>,
}

impl OperationExecutor {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self { manager }
    }

    /// Run `invoke` against the session for `key`, with a bound per
    /// attempt and exponential backoff between attempts.
    ///
    /// The session is obtained through the manager (created if absent);
    /// a failed attempt destroys it before the backoff wait, so the
    /// memo never holds a suspect session across a retry.
    pub async fn run<F, Fut>(
        &self,
        operation: &'static str,
        key: &SessionKey,
        options: &SessionOptions,
        policy: &RetryPolicy,
        invoke: F,
    ) -> Result<OperationResult>
    where
        F: Fn(Arc<dyn InferenceSession>) -> Fut,
        Fut: Future<Output = anyhow::Result<String>> + Send,
    {
        let mut attempt: u32 = 0;
        loop {
            match self.attempt(operation, key, options, policy.timeout, &invoke).await {
                Ok(raw) => {
                    let attempts = attempt + 1;
                    tracing::info!(operation, attempts, "operation succeeded");
                    return Ok(OperationResult {
                        raw,
                        timestamp: Utc::now(),
                        attempts,
                    });
                }
                Err(error) => {
                    tracing::warn!(
                        operation,
                        attempt = attempt + 1,
                        %error,
                        "operation attempt failed"
                    );
                    self.manager.destroy(key).await;

                    if attempt >= policy.max_retries {
                        return Err(Error::OperationFailed {
                            operation,
                            attempts: attempt + 1,
                            cause: Box::new(error),
                        });
                    }

                    let delay = policy.backoff_base * 2u32.saturating_pow(attempt);
                    tracing::debug!(operation, delay_ms = delay.as_millis() as u64, "backing off");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt<F, Fut>(
        &self,
        operation: &'static str,
        key: &SessionKey,
        options: &SessionOptions,
        bound: Duration,
        invoke: &F,
    ) -> Result<String>
    where
        F: Fn(Arc<dyn InferenceSession>) -> Fut,
        Fut: Future<Output = anyhow::Result<String>> + Send,
    {
        let session = self.manager.get_session(key, options).await?;

        match tokio::time::timeout(bound, invoke(session)).await {
            Ok(Ok(raw)) => Ok(raw),
            Ok(Err(error)) => Err(Error::Inference {
                operation,
                cause: Arc::new(error),
            }),
            Err(_) => Err(Error::Timeout {
                what: operation.to_string(),
                elapsed_secs: bound.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{InferenceCapability, SessionKind};
    use crate::mock::{MockCapability, Reply};
    use tokio::time::Instant;

    fn setup(mock: &Arc<MockCapability>) -> (Arc<SessionManager>, OperationExecutor) {
        let manager = Arc::new(SessionManager::new(
            Arc::clone(mock) as Arc<dyn InferenceCapability>,
            &GlintConfig::default(),
        ));
        let executor = OperationExecutor::new(Arc::clone(&manager));
        (manager, executor)
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::from_config(&GlintConfig::default())
    }

    #[tokio::test]
    async fn first_attempt_success() {
        let mock = MockCapability::new();
        let (_, executor) = setup(&mock);
        let key = SessionKey::of(SessionKind::Prompt);

        let result = executor
            .run("review", &key, &SessionOptions::default(), &policy(), |session| async move {
                session.prompt("review this").await
            })
            .await
            .expect("should succeed");

        assert_eq!(result.attempts, 1);
        assert_eq!(result.raw, "ok: review this");
        assert_eq!(mock.created_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_destroys_session_then_retry_succeeds() {
        let mock = MockCapability::new();
        mock.push_reply(Reply::Hang);
        mock.push_reply(Reply::Text("second time lucky".into()));
        let (manager, executor) = setup(&mock);
        let key = SessionKey::of(SessionKind::Prompt);
        let policy = policy();

        let started = Instant::now();
        let result = executor
            .run("review", &key, &SessionOptions::default(), &policy, |session| async move {
                session.prompt("review this").await
            })
            .await
            .expect("retry should succeed");

        assert_eq!(result.attempts, 2);
        assert_eq!(result.raw, "second time lucky");
        // First session was destroyed after the timeout, a fresh one created.
        assert_eq!(mock.created_count(), 2);
        assert_eq!(mock.destroyed_count(), 1);
        // Exactly one timeout (240s) plus one backoff delay (1.5s) elapsed.
        assert_eq!(
            started.elapsed(),
            policy.timeout + policy.backoff_base,
        );
        assert!(manager.has_session(&key).await);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_attempts_surface_operation_failed() {
        let mock = MockCapability::new();
        mock.push_reply(Reply::Fail("garbled output".into()));
        mock.push_reply(Reply::Fail("garbled output again".into()));
        let (manager, executor) = setup(&mock);
        let key = SessionKey::of(SessionKind::Prompt);

        let err = executor
            .run("docs", &key, &SessionOptions::default(), &policy(), |session| async move {
                session.prompt("document this").await
            })
            .await
            .expect_err("should exhaust retries");

        match err {
            Error::OperationFailed {
                operation,
                attempts,
                cause,
            } => {
                assert_eq!(operation, "docs");
                assert_eq!(attempts, 2);
                assert!(cause.to_string().contains("garbled output again"));
            }
            other => panic!("unexpected error: {other}"),
        }
        // No suspect session left memoized after the final failure.
        assert!(!manager.has_session(&key).await);
        assert_eq!(mock.destroyed_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn creation_failure_is_retried_by_outer_loop() {
        let mock = MockCapability::new();
        mock.fail_next_creations(1);
        let (_, executor) = setup(&mock);
        let key = SessionKey::of(SessionKind::Summarizer);

        let result = executor
            .run("summary", &key, &SessionOptions::default(), &policy(), |session| async move {
                session.summarize("summarize this diff").await
            })
            .await
            .expect("second creation should succeed");

        assert_eq!(result.attempts, 2);
        assert_eq!(mock.created_count(), 1);
    }

    #[tokio::test]
    async fn zero_retries_fail_fast() {
        let mock = MockCapability::new();
        mock.push_reply(Reply::Fail("bad".into()));
        let (_, executor) = setup(&mock);
        let key = SessionKey::of(SessionKind::Prompt);
        let policy = RetryPolicy {
            max_retries: 0,
            ..policy()
        };

        let err = executor
            .run("review", &key, &SessionOptions::default(), &policy, |session| async move {
                session.prompt("review this").await
            })
            .await
            .expect_err("should fail");

        assert!(matches!(err, Error::OperationFailed { attempts: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_doubles_per_attempt() {
        let mock = MockCapability::new();
        mock.push_reply(Reply::Fail("flaky".into()));
        mock.push_reply(Reply::Fail("flaky".into()));
        mock.push_reply(Reply::Text("finally".into()));
        let (_, executor) = setup(&mock);
        let key = SessionKey::of(SessionKind::Prompt);
        let policy = RetryPolicy {
            max_retries: 2,
            timeout: Duration::from_secs(240),
            backoff_base: Duration::from_secs(1),
        };

        let started = Instant::now();
        let result = executor
            .run("review", &key, &SessionOptions::default(), &policy, |session| async move {
                session.prompt("review this").await
            })
            .await
            .expect("third attempt succeeds");

        assert_eq!(result.attempts, 3);
        // 1s after the first failure, 2s after the second.
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }
}
