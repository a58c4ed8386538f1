//! Retry/failover controller
//!
//! Drives the ordering strategy and the upstream invoker: transient
//! failures are retried on the same key up to the plan's budget, a key
//! that is itself bad is dropped immediately, and every key failing
//! surfaces the last observed error.

use crate::services::key_pool::{ApiKey, RequestPlan};
use crate::utils::BackoffPolicy;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::time::sleep;

/// Classified result of a single upstream call
#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    /// 2xx with a parsed body
    Success(Value),
    /// Transient; the same key may succeed on retry after backoff
    RetryableFailure { status: Option<u16>, message: String },
    /// The key itself is bad or out of quota; other keys may still work
    FatalForCredential { status: Option<u16>, message: String },
    /// The request is unlikely to succeed, though other keys are still
    /// attempted since upstream behavior is not guaranteed uniform
    FatalForRequest { message: String },
}

/// One network call with one credential and one payload
#[async_trait]
pub trait UpstreamInvoker: Send + Sync {
    async fn invoke(&self, key: &ApiKey, payload: &Value) -> AttemptOutcome;
}

/// Terminal controller failure
#[derive(Error, Debug, Clone)]
pub enum FailoverError {
    /// The plan had no keys; nothing was attempted
    #[error("no upstream API keys configured")]
    NoCredentials,

    /// Every key's every attempt failed; carries the last observed error
    #[error("{message}")]
    Exhausted { status: Option<u16>, message: String },
}

/// Sequential, deterministic retry/failover loop over a request plan
#[derive(Debug, Clone)]
pub struct FailoverController {
    backoff: BackoffPolicy,
}

impl FailoverController {
    pub fn new(backoff: BackoffPolicy) -> Self {
        Self { backoff }
    }

    /// Execute the plan against the invoker.
    ///
    /// Returns the first success immediately. Otherwise walks every key:
    /// retryable failures are retried on the same key with exponential
    /// backoff until the per-key budget runs out, credential-fatal
    /// failures skip straight to the next key, and request-fatal failures
    /// skip ahead too (a different key/endpoint pairing may behave
    /// differently). Backoff never applies between key switches.
    pub async fn execute<I>(
        &self,
        invoker: &I,
        plan: &RequestPlan,
        payload: &Value,
    ) -> Result<Value, FailoverError>
    where
        I: UpstreamInvoker + ?Sized,
    {
        if plan.keys.is_empty() {
            return Err(FailoverError::NoCredentials);
        }

        let mut last_failure: Option<(Option<u16>, String)> = None;

        for key in &plan.keys {
            for attempt in 1..=plan.max_attempts_per_key {
                match invoker.invoke(key, payload).await {
                    AttemptOutcome::Success(body) => {
                        tracing::debug!(key = %key, attempt, "Upstream call succeeded");
                        return Ok(body);
                    }
                    AttemptOutcome::RetryableFailure { status, message } => {
                        tracing::warn!(
                            key = %key,
                            attempt,
                            status = status.unwrap_or(0),
                            error = %message,
                            "Transient upstream failure"
                        );
                        last_failure = Some((status, message));

                        if attempt == plan.max_attempts_per_key {
                            // budget spent, move to the next key immediately
                            break;
                        }
                        sleep(self.backoff.delay_after_attempt(attempt)).await;
                    }
                    AttemptOutcome::FatalForCredential { status, message } => {
                        tracing::warn!(
                            key = %key,
                            status = status.unwrap_or(0),
                            error = %message,
                            "Key rejected upstream, failing over"
                        );
                        last_failure = Some((status, message));
                        break;
                    }
                    AttemptOutcome::FatalForRequest { message } => {
                        tracing::warn!(key = %key, error = %message, "Request-level upstream failure");
                        last_failure = Some((None, message));
                        break;
                    }
                }
            }
        }

        // The most recent error is the most informative about upstream state
        let (status, message) = last_failure
            .unwrap_or((None, "all upstream API keys failed".to_string()));
        Err(FailoverError::Exhausted { status, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn plan(keys: &[&str], max_attempts: u32) -> RequestPlan {
        RequestPlan {
            keys: keys.iter().map(|k| ApiKey::new(*k)).collect(),
            max_attempts_per_key: max_attempts,
        }
    }

    fn controller() -> FailoverController {
        FailoverController::new(BackoffPolicy::new(
            Duration::from_millis(1),
            Duration::from_millis(5),
            false,
        ))
    }

    fn retryable(msg: &str) -> AttemptOutcome {
        AttemptOutcome::RetryableFailure {
            status: Some(503),
            message: msg.to_string(),
        }
    }

    /// Plays back a fixed script of outcomes and counts invocations per key
    struct ScriptedInvoker {
        script: Mutex<Vec<AttemptOutcome>>,
        calls: AtomicUsize,
        calls_per_key: Mutex<Vec<String>>,
    }

    impl ScriptedInvoker {
        fn new(script: Vec<AttemptOutcome>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: AtomicUsize::new(0),
                calls_per_key: Mutex::new(Vec::new()),
            }
        }

        fn total_calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn keys_called(&self) -> Vec<String> {
            self.calls_per_key.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl UpstreamInvoker for ScriptedInvoker {
        async fn invoke(&self, key: &ApiKey, _payload: &Value) -> AttemptOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.calls_per_key
                .lock()
                .unwrap()
                .push(key.secret().to_string());

            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                retryable("script exhausted")
            } else {
                script.remove(0)
            }
        }
    }

    #[tokio::test]
    async fn test_success_short_circuits() {
        let invoker = ScriptedInvoker::new(vec![AttemptOutcome::Success(json!({"ok": true}))]);

        let result = controller()
            .execute(&invoker, &plan(&["k1-secret", "k2-secret"], 3), &json!({}))
            .await
            .unwrap();

        assert_eq!(result, json!({"ok": true}));
        assert_eq!(invoker.total_calls(), 1);
        assert_eq!(invoker.keys_called(), vec!["k1-secret"]);
    }

    #[tokio::test]
    async fn test_retry_bound_per_key() {
        // Always retryable: each key gets exactly max_attempts calls
        let invoker = ScriptedInvoker::new(vec![
            retryable("busy 1"),
            retryable("busy 2"),
            retryable("busy 3"),
            AttemptOutcome::Success(json!("late win")),
        ]);

        let result = controller()
            .execute(&invoker, &plan(&["k1-secret", "k2-secret"], 3), &json!({}))
            .await
            .unwrap();

        assert_eq!(result, json!("late win"));
        // three attempts on k1, then one on k2
        assert_eq!(invoker.total_calls(), 4);
        assert_eq!(
            invoker.keys_called(),
            vec!["k1-secret", "k1-secret", "k1-secret", "k2-secret"]
        );
    }

    #[tokio::test]
    async fn test_fatal_for_credential_short_circuits_retries() {
        let invoker = ScriptedInvoker::new(vec![
            AttemptOutcome::FatalForCredential {
                status: Some(403),
                message: "key revoked".to_string(),
            },
            AttemptOutcome::Success(json!("second key works")),
        ]);

        let result = controller()
            .execute(&invoker, &plan(&["k1-secret", "k2-secret"], 3), &json!({}))
            .await
            .unwrap();

        assert_eq!(result, json!("second key works"));
        // exactly one call on the bad key, no retries
        assert_eq!(
            invoker.keys_called(),
            vec!["k1-secret", "k2-secret"]
        );
    }

    #[tokio::test]
    async fn test_exhaustion_reports_last_error() {
        let invoker = ScriptedInvoker::new(vec![
            retryable("k1 try 1"),
            retryable("k1 try 2"),
            retryable("k2 try 1"),
            retryable("k2 try 2"),
        ]);

        let err = controller()
            .execute(&invoker, &plan(&["k1-secret", "k2-secret"], 2), &json!({}))
            .await
            .unwrap_err();

        assert_eq!(invoker.total_calls(), 4);
        match err {
            FailoverError::Exhausted { status, message } => {
                assert_eq!(status, Some(503));
                assert_eq!(message, "k2 try 2");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fatal_for_request_continues_to_next_key() {
        let invoker = ScriptedInvoker::new(vec![
            AttemptOutcome::FatalForRequest {
                message: "bad payload for this endpoint".to_string(),
            },
            AttemptOutcome::Success(json!("recovered")),
        ]);

        let result = controller()
            .execute(&invoker, &plan(&["k1-secret", "k2-secret"], 3), &json!({}))
            .await
            .unwrap();

        assert_eq!(result, json!("recovered"));
        assert_eq!(invoker.keys_called(), vec!["k1-secret", "k2-secret"]);
    }

    #[tokio::test]
    async fn test_empty_plan_fails_with_zero_invocations() {
        let invoker = ScriptedInvoker::new(vec![]);

        let err = controller()
            .execute(&invoker, &plan(&[], 3), &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, FailoverError::NoCredentials));
        assert_eq!(invoker.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_single_attempt_budget() {
        let invoker = ScriptedInvoker::new(vec![
            retryable("first"),
            retryable("second"),
        ]);

        let err = controller()
            .execute(&invoker, &plan(&["k1-secret", "k2-secret"], 1), &json!({}))
            .await
            .unwrap_err();

        // one attempt per key, no retries
        assert_eq!(invoker.total_calls(), 2);
        assert!(matches!(err, FailoverError::Exhausted { .. }));
    }
}
