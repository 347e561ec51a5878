// ============================================================================
// Service Client
// ============================================================================
//
// HTTP client for one backend service. Handles:
// - URL building and JSON request forwarding
// - Circuit breaker around every call
// - Outcome classification: transport errors, timeouts and 5xx responses
//   count against the breaker; any completed response below 500 is a valid
//   outcome, 404 included
// - Static fallback value substituted while the circuit is open
//
// ============================================================================

use axum::http::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, warn};

use crate::config::CircuitBreakerConfig;
use crate::error::AppError;
use crate::gateway::circuit_breaker::{CircuitBreaker, CircuitBreakerError, CircuitState};

/// A completed backend response: transport worked and the status is below
/// 500. Client errors ride along so the caller can relay them verbatim.
#[derive(Debug, Clone)]
pub struct Upstream {
    pub status: StatusCode,
    pub body: Value,
}

#[derive(Debug, thiserror::Error)]
enum CallError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend reported {status}")]
    Status { status: StatusCode, body: Value },
}

pub struct ServiceClient {
    name: &'static str,
    base_url: String,
    client: reqwest::Client,
    breaker: CircuitBreaker,
    fallback: Value,
}

impl ServiceClient {
    pub fn new(
        name: &'static str,
        base_url: String,
        fallback: Value,
        breaker_config: CircuitBreakerConfig,
    ) -> Self {
        // Configure connection pooling and keep-alive
        let client = reqwest::Client::builder()
            .timeout(breaker_config.call_timeout)
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name,
            base_url,
            client,
            breaker: CircuitBreaker::new(breaker_config),
            fallback,
        }
    }

    pub async fn get(&self, path: &str) -> Result<Upstream, AppError> {
        self.dispatch(self.client.get(self.url(path))).await
    }

    pub async fn get_with_query(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Upstream, AppError> {
        self.dispatch(self.client.get(self.url(path)).query(query))
            .await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Upstream, AppError> {
        self.dispatch(self.client.post(self.url(path)).json(body))
            .await
    }

    /// Current circuit state, for health reporting.
    pub async fn circuit_state(&self) -> CircuitState {
        self.breaker.state().await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Run one request under the circuit breaker and classify the outcome.
    async fn dispatch(&self, request: reqwest::RequestBuilder) -> Result<Upstream, AppError> {
        let result = self
            .breaker
            .call(async move {
                let response = request.send().await.map_err(CallError::Transport)?;
                let status = response.status();
                let bytes = response.bytes().await.map_err(CallError::Transport)?;
                let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

                if status.is_server_error() {
                    // 5xx responses count as failures
                    return Err(CallError::Status { status, body });
                }

                // Everything below 500 is a completed call, 4xx included
                Ok(Upstream { status, body })
            })
            .await;

        match result {
            Ok(upstream) => Ok(upstream),
            Err(CircuitBreakerError::Open) => {
                warn!(
                    service = self.name,
                    fallback = %self.fallback,
                    "Circuit open - substituting fallback"
                );
                Err(AppError::Unavailable {
                    service: self.name,
                    fallback: self.fallback.clone(),
                })
            }
            Err(CircuitBreakerError::Timeout { timeout }) => {
                warn!(
                    service = self.name,
                    timeout_ms = timeout.as_millis() as u64,
                    "Backend call timed out"
                );
                Err(AppError::Unavailable {
                    service: self.name,
                    fallback: self.fallback.clone(),
                })
            }
            Err(CircuitBreakerError::Inner(CallError::Transport(e))) => {
                warn!(service = self.name, error = %e, "Backend unreachable");
                Err(AppError::Unavailable {
                    service: self.name,
                    fallback: self.fallback.clone(),
                })
            }
            Err(CircuitBreakerError::Inner(CallError::Status { status, body })) => {
                error!(
                    service = self.name,
                    status = status.as_u16(),
                    body = %body,
                    "Backend reported server error"
                );
                Err(AppError::internal(format!(
                    "{} service reported {}",
                    self.name, status
                )))
            }
        }
    }
}
