use std::time::Duration;

// ============================================================================
// Configuration Constants
// ============================================================================

// Default port values
const DEFAULT_GATEWAY_PORT: u16 = 8000;
const DEFAULT_USERS_PORT: u16 = 8001;
const DEFAULT_ORDERS_PORT: u16 = 8002;

// Default backend addresses, matching the default ports above
const DEFAULT_USERS_SERVICE_URL: &str = "http://127.0.0.1:8001";
const DEFAULT_ORDERS_SERVICE_URL: &str = "http://127.0.0.1:8002";

// Token defaults
const DEFAULT_JWT_SECRET: &str = "supersecret";
const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

// Circuit breaker defaults
const DEFAULT_BREAKER_TIMEOUT_MS: u64 = 3000;
const DEFAULT_BREAKER_COOLDOWN_MS: u64 = 3000;
const DEFAULT_BREAKER_ERROR_THRESHOLD_PCT: u8 = 50;
const DEFAULT_BREAKER_WINDOW_SIZE: usize = 10;
const DEFAULT_BREAKER_MIN_CALLS: usize = 5;

// ============================================================================
// Configuration Structures
// ============================================================================

/// Circuit breaker tuning, shared by every backend client.
#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Per-call deadline; calls still running at the deadline count as failures
    pub call_timeout: Duration,
    /// How long an open circuit waits before admitting a probe
    pub cooldown: Duration,
    /// Failure percentage at which the circuit opens
    pub error_threshold_pct: u8,
    /// Number of recent call outcomes kept in the rolling window
    pub window_size: usize,
    /// Minimum recorded outcomes before the threshold is evaluated
    pub min_calls: usize,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_millis(DEFAULT_BREAKER_TIMEOUT_MS),
            cooldown: Duration::from_millis(DEFAULT_BREAKER_COOLDOWN_MS),
            error_threshold_pct: DEFAULT_BREAKER_ERROR_THRESHOLD_PCT,
            window_size: DEFAULT_BREAKER_WINDOW_SIZE,
            min_calls: DEFAULT_BREAKER_MIN_CALLS,
        }
    }
}

/// Gateway configuration, loaded from the environment with sensible defaults.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub users_service_url: String,
    pub orders_service_url: String,
    pub breaker: CircuitBreakerConfig,
    pub rust_log: String,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_GATEWAY_PORT),
            jwt_secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            token_ttl_secs: std::env::var("TOKEN_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TOKEN_TTL_SECS),
            users_service_url: std::env::var("USERS_SERVICE_URL")
                .unwrap_or_else(|_| DEFAULT_USERS_SERVICE_URL.to_string()),
            orders_service_url: std::env::var("ORDERS_SERVICE_URL")
                .unwrap_or_else(|_| DEFAULT_ORDERS_SERVICE_URL.to_string()),
            breaker: CircuitBreakerConfig {
                call_timeout: Duration::from_millis(
                    std::env::var("BREAKER_TIMEOUT_MS")
                        .ok()
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(DEFAULT_BREAKER_TIMEOUT_MS),
                ),
                cooldown: Duration::from_millis(
                    std::env::var("BREAKER_COOLDOWN_MS")
                        .ok()
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(DEFAULT_BREAKER_COOLDOWN_MS),
                ),
                error_threshold_pct: std::env::var("BREAKER_ERROR_THRESHOLD_PCT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_BREAKER_ERROR_THRESHOLD_PCT),
                window_size: std::env::var("BREAKER_WINDOW_SIZE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_BREAKER_WINDOW_SIZE),
                min_calls: std::env::var("BREAKER_MIN_CALLS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_BREAKER_MIN_CALLS),
            },
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

/// Configuration for a backend service binary.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub port: u16,
    pub rust_log: String,
}

impl ServiceConfig {
    pub fn users_from_env() -> Self {
        Self::from_env(DEFAULT_USERS_PORT)
    }

    pub fn orders_from_env() -> Self {
        Self::from_env(DEFAULT_ORDERS_PORT)
    }

    fn from_env(default_port: u16) -> Self {
        dotenvy::dotenv().ok();

        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(default_port),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}
