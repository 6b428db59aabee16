use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

// ============================================================================
// Circuit Breaker
// ============================================================================
//
// Guards calls to the product service. After `failure_threshold`
// consecutive failures the circuit opens and calls fail fast; once
// `cool_down` has elapsed one trial call at a time is let through
// (HalfOpen) and `success_threshold` successes close the circuit again.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    /// Gauge encoding: 0=Closed, 1=Open, 2=HalfOpen
    pub fn code(&self) -> u8 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit
    pub failure_threshold: u32,
    /// Time the circuit stays open before a trial call
    pub cool_down: Duration,
    /// Successes needed in HalfOpen to close
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cool_down: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    #[error("circuit breaker is open")]
    CircuitOpen,

    #[error("operation failed: {0}")]
    OperationFailed(E),
}

struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

#[derive(Clone)]
pub struct CircuitBreaker {
    inner: Arc<Mutex<BreakerState>>,
    config: CircuitBreakerConfig,
}

/// Releases the HalfOpen trial slot if the trial call is dropped before
/// it reports back.
struct TrialPermit<'a> {
    breaker: &'a CircuitBreaker,
    active: bool,
}

impl Drop for TrialPermit<'_> {
    fn drop(&mut self) {
        if self.active {
            self.breaker.lock().trial_in_flight = false;
        }
    }
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                opened_at: None,
                trial_in_flight: false,
            })),
            config,
        }
    }

    /// Run `operation` unless the circuit is open
    pub async fn call<F, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: std::future::Future<Output = Result<T, E>>,
    {
        let mut permit = TrialPermit {
            breaker: self,
            active: self.admit()?,
        };

        let result = operation.await;
        permit.active = false;

        match result {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(err) => {
                self.on_failure();
                Err(CircuitBreakerError::OperationFailed(err))
            }
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    // No await happens while the lock is held, so a poisoned state is still consistent
    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns whether the admitted call is the HalfOpen trial
    fn admit<E>(&self) -> Result<bool, CircuitBreakerError<E>> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => Ok(false),
            CircuitState::HalfOpen if inner.trial_in_flight => Err(CircuitBreakerError::CircuitOpen),
            CircuitState::HalfOpen => {
                inner.trial_in_flight = true;
                Ok(true)
            }
            CircuitState::Open => {
                let cooled = inner
                    .opened_at
                    .is_some_and(|opened| opened.elapsed() >= self.config.cool_down);
                if !cooled {
                    return Err(CircuitBreakerError::CircuitOpen);
                }

                tracing::info!("Circuit breaker half-open, allowing trial call");
                inner.state = CircuitState::HalfOpen;
                inner.success_count = 0;
                inner.trial_in_flight = true;
                Ok(true)
            }
        }
    }

    fn on_success(&self) {
        let mut inner = self.lock();
        inner.trial_in_flight = false;
        match inner.state {
            CircuitState::HalfOpen => {
                inner.success_count += 1;
                if inner.success_count >= self.config.success_threshold {
                    tracing::info!(successes = inner.success_count, "Circuit breaker closed");
                    inner.state = CircuitState::Closed;
                    inner.failure_count = 0;
                    inner.success_count = 0;
                    inner.opened_at = None;
                }
            }
            CircuitState::Closed => inner.failure_count = 0,
            CircuitState::Open => {}
        }
    }

    fn on_failure(&self) {
        let mut inner = self.lock();
        inner.trial_in_flight = false;
        inner.failure_count += 1;

        match inner.state {
            CircuitState::Closed if inner.failure_count >= self.config.failure_threshold => {
                tracing::warn!(failures = inner.failure_count, "Circuit breaker opened");
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
            }
            CircuitState::HalfOpen => {
                tracing::warn!("Trial call failed, circuit breaker re-opened");
                inner.state = CircuitState::Open;
                inner.success_count = 0;
                inner.opened_at = Some(Instant::now());
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(failure_threshold: u32, cool_down: Duration, success_threshold: u32) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold,
            cool_down,
            success_threshold,
        })
    }

    #[tokio::test]
    async fn test_circuit_breaker_opens_after_failures() {
        let cb = breaker(3, Duration::from_secs(1), 2);

        for _ in 0..3 {
            let result = cb.call(async { Err::<(), _>("error") }).await;
            assert!(matches!(result, Err(CircuitBreakerError::OperationFailed("error"))));
        }

        assert_eq!(cb.state(), CircuitState::Open);

        let result = cb.call(async { Ok::<_, &str>(()) }).await;
        assert!(matches!(result, Err(CircuitBreakerError::CircuitOpen)));
    }

    #[tokio::test]
    async fn test_success_resets_failure_streak() {
        let cb = breaker(2, Duration::from_secs(1), 1);

        let _ = cb.call(async { Err::<(), _>("error") }).await;
        let _ = cb.call(async { Ok::<_, &str>(()) }).await;
        let _ = cb.call(async { Err::<(), _>("error") }).await;

        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_circuit_breaker_half_open_after_cool_down() {
        let cb = breaker(2, Duration::from_millis(100), 1);

        for _ in 0..2 {
            let _ = cb.call(async { Err::<(), _>("error") }).await;
        }
        assert_eq!(cb.state(), CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(150)).await;

        let result = cb.call(async { Ok::<_, &str>(()) }).await;
        assert!(result.is_ok());
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_failed_trial_reopens() {
        let cb = breaker(1, Duration::from_millis(50), 1);

        let _ = cb.call(async { Err::<(), _>("error") }).await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        let _ = cb.call(async { Err::<(), _>("still down") }).await;

        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(CircuitState::Open.code(), 1);
    }

    #[tokio::test]
    async fn test_half_open_admits_one_trial_at_a_time() {
        let cb = breaker(1, Duration::from_millis(50), 1);

        let _ = cb.call(async { Err::<(), _>("error") }).await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        let slow_trial = cb.call(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, &str>(())
        });
        let concurrent = cb.call(async { Ok::<_, &str>(()) });
        let (trial, rejected) = tokio::join!(slow_trial, concurrent);

        assert!(trial.is_ok());
        assert!(matches!(rejected, Err(CircuitBreakerError::CircuitOpen)));
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_dropped_trial_frees_the_slot() {
        let cb = breaker(1, Duration::from_millis(50), 1);

        let _ = cb.call(async { Err::<(), _>("error") }).await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            cb.call(std::future::pending::<Result<(), &str>>()),
        )
        .await;
        assert!(abandoned.is_err());
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        let result = cb.call(async { Ok::<_, &str>(()) }).await;
        assert!(result.is_ok());
        assert_eq!(cb.state(), CircuitState::Closed);
    }
}
