//! Exponential backoff around a [`Transport`].

use super::{ApiResponse, RequestDescriptor, Transport, TransportFailure};
use crate::error::{DispatchError, DispatchResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which failures are worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RetryMode {
    /// Every failure except a credential failure is retried, including 4xx
    /// validation errors.
    #[default]
    AnyFailure,
    /// Only connection failures, 408, 429 and 5xx are retried.
    TransientOnly,
}

/// Retry schedule for one request.
///
/// `max_attempts` counts the first call. The wait after failed attempt `n`
/// (0-based) is `initial_delay_ms * factor^n`, capped at `max_delay_ms`.
/// Defaults: 3 attempts, 1000 ms, factor 2, cap 4000 ms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub factor: u32,
    pub mode: RetryMode,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 4000,
            factor: 2,
            mode: RetryMode::AnyFailure,
        }
    }
}

impl RetryPolicy {
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = u64::from(self.factor).saturating_pow(attempt);
        let delay_ms = self
            .initial_delay_ms
            .saturating_mul(multiplier)
            .min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }

    /// Credential failures are never retried; another attempt would read
    /// the same missing token.
    pub fn should_retry(&self, failure: &TransportFailure) -> bool {
        if matches!(failure, TransportFailure::Credentials(_)) {
            return false;
        }
        match self.mode {
            RetryMode::AnyFailure => true,
            RetryMode::TransientOnly => failure.is_transient(),
        }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Wraps a transport with a fixed [`RetryPolicy`].
pub struct RetryingTransport<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: Transport> RetryingTransport<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Sends the request, retrying per policy.
    ///
    /// # Errors
    /// [`DispatchError::Transport`] with the last failure's message once the
    /// attempts are used up, or immediately for a failure the policy does
    /// not retry.
    #[tracing::instrument(
        skip(self, request),
        fields(method = %request.method, path = %request.path())
    )]
    pub async fn execute(&self, request: &RequestDescriptor) -> DispatchResult<ApiResponse> {
        let max_attempts = self.policy.attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.inner.send(request).await {
                Ok(response) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "Request succeeded after retry");
                    }
                    return Ok(response);
                }
                Err(failure) => {
                    if attempt >= max_attempts || !self.policy.should_retry(&failure) {
                        tracing::warn!(
                            attempt,
                            max_attempts,
                            error = %failure,
                            "Request failed, giving up"
                        );
                        return Err(DispatchError::Transport {
                            message: failure.to_string(),
                            attempts: attempt,
                        });
                    }

                    let delay = self.policy.delay_for_attempt(attempt - 1);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        error = %failure,
                        wait_ms = delay.as_millis() as u64,
                        "Request failed, retrying with backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpMethod;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::runtime::Runtime;
    use url::Url;

    /// Plays back a scripted list of outcomes, then keeps failing.
    struct Scripted {
        outcomes: Mutex<Vec<Result<ApiResponse, TransportFailure>>>,
        calls: Mutex<u32>,
    }

    impl Scripted {
        fn new(mut outcomes: Vec<Result<ApiResponse, TransportFailure>>) -> Self {
            outcomes.reverse();
            Self {
                outcomes: Mutex::new(outcomes),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn send(
            &self,
            _request: &RequestDescriptor,
        ) -> Result<ApiResponse, TransportFailure> {
            *self.calls.lock().unwrap() += 1;
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(TransportFailure::Network("script exhausted".into())))
        }
    }

    fn fast_policy(mode: RetryMode) -> RetryPolicy {
        RetryPolicy {
            initial_delay_ms: 1,
            max_delay_ms: 4,
            mode,
            ..RetryPolicy::default()
        }
    }

    fn request() -> RequestDescriptor {
        RequestDescriptor {
            method: HttpMethod::Get,
            url: Url::parse("https://api.frontapp.com/tags").unwrap(),
            body: None,
            query: None,
        }
    }

    fn server_error() -> TransportFailure {
        TransportFailure::Status {
            status: 503,
            message: "Service Unavailable".into(),
        }
    }

    #[test]
    fn test_default_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(4000));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(4000));
        assert_eq!(policy.delay_for_attempt(60), Duration::from_millis(4000));
    }

    #[test]
    fn test_succeeds_on_third_attempt() {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let transport = RetryingTransport::new(
                Scripted::new(vec![
                    Err(server_error()),
                    Err(TransportFailure::Network("connection reset".into())),
                    Ok(ApiResponse::ok(json!({"_results": []}))),
                ]),
                fast_policy(RetryMode::AnyFailure),
            );

            let response = transport.execute(&request()).await.unwrap();
            assert_eq!(response.body, json!({"_results": []}));
            assert_eq!(transport.inner().calls(), 3);
        });
    }

    #[test]
    fn test_gives_up_after_three_attempts() {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let transport = RetryingTransport::new(
                Scripted::new(vec![Err(server_error()), Err(server_error()), Err(server_error())]),
                fast_policy(RetryMode::AnyFailure),
            );

            let err = transport.execute(&request()).await.unwrap_err();
            match err {
                DispatchError::Transport { message, attempts } => {
                    assert_eq!(attempts, 3);
                    assert_eq!(message, "HTTP 503: Service Unavailable");
                }
                other => panic!("Expected Transport error, got {:?}", other),
            }
            assert_eq!(transport.inner().calls(), 3);
        });
    }

    #[test]
    fn test_any_failure_retries_client_errors() {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let bad_request = TransportFailure::Status {
                status: 400,
                message: "bad".into(),
            };
            let transport = RetryingTransport::new(
                Scripted::new(vec![Err(bad_request.clone()), Err(bad_request)]),
                fast_policy(RetryMode::AnyFailure),
            );
            assert!(transport.execute(&request()).await.is_err());
            assert_eq!(transport.inner().calls(), 3);
        });
    }

    #[test]
    fn test_transient_only_stops_on_client_error() {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let transport = RetryingTransport::new(
                Scripted::new(vec![Err(TransportFailure::Status {
                    status: 422,
                    message: "invalid".into(),
                })]),
                fast_policy(RetryMode::TransientOnly),
            );

            let err = transport.execute(&request()).await.unwrap_err();
            assert!(matches!(err, DispatchError::Transport { attempts: 1, .. }));
            assert_eq!(transport.inner().calls(), 1);
        });
    }

    #[test]
    fn test_credential_failure_is_not_retried() {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            for mode in [RetryMode::AnyFailure, RetryMode::TransientOnly] {
                let transport = RetryingTransport::new(
                    Scripted::new(vec![
                        Err(TransportFailure::Credentials("token missing".into())),
                        Ok(ApiResponse::ok(json!({}))),
                    ]),
                    fast_policy(mode),
                );

                let err = transport.execute(&request()).await.unwrap_err();
                assert!(matches!(err, DispatchError::Transport { attempts: 1, .. }));
                assert_eq!(transport.inner().calls(), 1, "{:?}", mode);
            }
        });
    }

    #[test]
    fn test_zero_attempts_still_calls_once() {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let policy = RetryPolicy {
                max_attempts: 0,
                ..fast_policy(RetryMode::AnyFailure)
            };
            let transport = RetryingTransport::new(
                Scripted::new(vec![Ok(ApiResponse::ok(json!({})))]),
                policy,
            );
            assert!(transport.execute(&request()).await.is_ok());
            assert_eq!(transport.inner().calls(), 1);
        });
    }
}
