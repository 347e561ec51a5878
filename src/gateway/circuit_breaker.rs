// ============================================================================
// Circuit Breaker
// ============================================================================
//
// Isolates a failing backend so the gateway keeps answering while the
// backend is down.
//
// States:
// - Closed: normal operation, every call outcome lands in a rolling window
// - Open: the windowed error rate crossed the threshold, calls are rejected
//   immediately without touching the backend
// - HalfOpen: the cool-down elapsed and at most one probe call is in
//   flight at a time
//
// A probe that succeeds closes the circuit and clears the window; a probe
// that fails reopens it and restarts the cool-down. The probe slot is a
// one-permit semaphore whose permit travels inside the admission ticket, so
// a probe future dropped mid-flight (a caller hanging up) releases the slot
// on its own. All state lives behind one mutex, and the lock is never held
// across an await of the guarded call.
//
// ============================================================================

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

use crate::config::CircuitBreakerConfig;

/// Error returned by [`CircuitBreaker::call`].
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    #[error("Circuit breaker is open - service unavailable")]
    Open,

    #[error("Call timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Call failed: {0}")]
    Inner(#[source] E),
}

/// Circuit state, as exposed on the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Admission ticket handed out under the lock; outcomes are only recorded
/// against the cycle the call was admitted in.
struct Permit {
    generation: u64,
    /// Probe calls hold the single probe slot for as long as they live.
    /// Dropping the ticket, recorded or not, frees the slot.
    probe: Option<OwnedSemaphorePermit>,
}

struct BreakerState {
    state: CircuitState,
    /// Rolling window of recent outcomes; true marks a failure.
    window: VecDeque<bool>,
    opened_at: Option<Instant>,
    /// Bumped whenever the window is reset, so calls that outlive a full
    /// open/recover cycle cannot pollute the fresh window.
    generation: u64,
}

pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
    probe_slot: Arc<Semaphore>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        let window = VecDeque::with_capacity(config.window_size);
        Self {
            config,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                window,
                opened_at: None,
                generation: 0,
            }),
            probe_slot: Arc::new(Semaphore::new(1)),
        }
    }

    /// Run `operation` under the breaker.
    ///
    /// Returns `Open` without polling the operation when the circuit is open
    /// (or a probe is already in flight), `Timeout` when the per-call
    /// deadline passes, and `Inner` when the operation itself fails. Timeouts
    /// and inner failures count against the window; an `Open` rejection is
    /// not an outcome and does not.
    pub async fn call<F, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        let permit = match self.try_acquire().await {
            Some(permit) => permit,
            None => return Err(CircuitBreakerError::Open),
        };

        match tokio::time::timeout(self.config.call_timeout, operation).await {
            Ok(Ok(value)) => {
                self.record(permit, false).await;
                Ok(value)
            }
            Ok(Err(error)) => {
                self.record(permit, true).await;
                Err(CircuitBreakerError::Inner(error))
            }
            Err(_elapsed) => {
                self.record(permit, true).await;
                Err(CircuitBreakerError::Timeout {
                    timeout: self.config.call_timeout,
                })
            }
        }
    }

    /// Current state, for health reporting.
    pub async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }

    /// Decide whether a call may proceed, transitioning Open -> HalfOpen
    /// when the cool-down has elapsed. At most one probe is in flight at a
    /// time; the slot frees itself when the probe finishes or is dropped.
    async fn try_acquire(&self) -> Option<Permit> {
        let mut inner = self.inner.lock().await;

        match inner.state {
            CircuitState::Closed => {
                return Some(Permit {
                    generation: inner.generation,
                    probe: None,
                });
            }
            CircuitState::Open => {
                let cooled_down = match inner.opened_at {
                    Some(at) => at.elapsed() >= self.config.cooldown,
                    None => true,
                };
                if !cooled_down {
                    return None;
                }
                inner.state = CircuitState::HalfOpen;
                tracing::info!("Circuit breaker HALF_OPEN - admitting one probe");
            }
            CircuitState::HalfOpen => {}
        }

        // Half-open: whoever takes the one slot is the probe
        let slot = self.probe_slot.clone().try_acquire_owned().ok()?;
        Some(Permit {
            generation: inner.generation,
            probe: Some(slot),
        })
    }

    /// Record a call outcome and apply state transitions.
    async fn record(&self, permit: Permit, failed: bool) {
        let mut inner = self.inner.lock().await;

        if permit.probe.is_some() {
            if failed {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                tracing::warn!("Circuit breaker OPEN - probe failed, cool-down restarted");
            } else {
                inner.state = CircuitState::Closed;
                inner.window.clear();
                inner.opened_at = None;
                inner.generation += 1;
                tracing::info!("Circuit breaker CLOSED - probe succeeded");
            }
            return;
        }

        // Outcomes of calls admitted in an earlier cycle no longer count
        if inner.state != CircuitState::Closed || permit.generation != inner.generation {
            return;
        }

        if inner.window.len() == self.config.window_size {
            inner.window.pop_front();
        }
        inner.window.push_back(failed);

        if inner.window.len() < self.config.min_calls {
            return;
        }

        let failures = inner.window.iter().filter(|&&failed| failed).count();
        let error_pct = failures * 100 / inner.window.len();

        if error_pct >= self.config.error_threshold_pct as usize {
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
            tracing::error!(
                failures,
                window = inner.window.len(),
                error_pct,
                cooldown_ms = self.config.cooldown.as_millis() as u64,
                "Circuit breaker OPEN - error threshold exceeded"
            );
        }
    }
}
