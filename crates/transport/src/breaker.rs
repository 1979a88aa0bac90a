//! Circuit breaker over remote calls.
//!
//! State machine:
//!
//! ```text
//! Closed ──(error rate ≥ threshold within window)──▶ Open
//!   ▲                                                 │ reset_timeout elapsed
//!   └──────(trial succeeds)── HalfOpen ◀──────────────┘
//!                              │ trial fails
//!                              └──────────────▶ Open (cooldown restarts)
//! ```
//!
//! Every call is also bounded by `call_timeout`; a timeout counts as a failure.
//! While open, calls fail with [`BreakerError::Open`] without running the
//! wrapped future at all.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use iamgate_core::IamError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl core::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Breaker configuration.
///
/// Durations are (de)serialized as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Deadline for a single call.
    #[serde(with = "millis")]
    pub call_timeout: Duration,
    /// Failure percentage (0-100) within the window that trips the breaker.
    pub error_threshold_percentage: u32,
    /// Minimum calls in the window before the error rate is considered.
    pub volume_threshold: u32,
    /// Length of the rolling statistics window.
    #[serde(with = "millis")]
    pub rolling_window: Duration,
    /// Cooldown spent open before trial calls are let through.
    #[serde(with = "millis")]
    pub reset_timeout: Duration,
    /// Concurrent trial calls allowed while half-open.
    pub half_open_max_calls: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(3),
            error_threshold_percentage: 50,
            volume_threshold: 5,
            rolling_window: Duration::from_secs(10),
            reset_timeout: Duration::from_secs(30),
            half_open_max_calls: 1,
        }
    }
}

impl BreakerConfig {
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_error_threshold_percentage(mut self, pct: u32) -> Self {
        self.error_threshold_percentage = pct.min(100);
        self
    }

    pub fn with_volume_threshold(mut self, calls: u32) -> Self {
        self.volume_threshold = calls;
        self
    }

    pub fn with_rolling_window(mut self, window: Duration) -> Self {
        self.rolling_window = window;
        self
    }

    pub fn with_reset_timeout(mut self, cooldown: Duration) -> Self {
        self.reset_timeout = cooldown;
        self
    }

    pub fn with_half_open_max_calls(mut self, calls: u32) -> Self {
        self.half_open_max_calls = calls.max(1);
        self
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BreakerError<E> {
    #[error("circuit open")]
    Open,

    #[error("call timed out")]
    Timeout,

    #[error("{0}")]
    Inner(E),
}

impl<E> From<BreakerError<E>> for IamError
where
    E: Into<IamError>,
{
    fn from(value: BreakerError<E>) -> Self {
        match value {
            BreakerError::Open => IamError::CircuitOpen,
            BreakerError::Timeout => IamError::Timeout,
            BreakerError::Inner(e) => e.into(),
        }
    }
}

/// Point-in-time view of a breaker, for health reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerStatus {
    pub name: String,
    pub state: CircuitState,
    pub window_calls: usize,
    pub window_failures: usize,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    /// `(finished_at, failed)` for calls completed while closed.
    window: VecDeque<(Instant, bool)>,
    opened_at: Option<Instant>,
    trials_in_flight: u32,
}

/// Circuit breaker guarding one kind of remote call.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                window: VecDeque::new(),
                opened_at: None,
                trials_in_flight: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn status(&self) -> BreakerStatus {
        let mut inner = self.lock();
        self.prune(&mut inner, Instant::now());
        BreakerStatus {
            name: self.name.clone(),
            state: inner.state,
            window_calls: inner.window.len(),
            window_failures: inner.window.iter().filter(|(_, failed)| *failed).count(),
        }
    }

    /// Run `call` under the breaker and the per-call deadline.
    ///
    /// `Err` from `call` counts as a failure; callers that want some errors to
    /// leave the statistics untouched should return them inside `Ok`.
    pub async fn call<F, T, E>(&self, call: F) -> Result<T, BreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        let Some(mut permit) = self.acquire() else {
            debug!(breaker = %self.name, "short-circuited: breaker open");
            return Err(BreakerError::Open);
        };

        match tokio::time::timeout(self.config.call_timeout, call).await {
            Ok(Ok(value)) => {
                permit.succeed();
                Ok(value)
            }
            Ok(Err(e)) => {
                permit.fail();
                Err(BreakerError::Inner(e))
            }
            Err(_) => {
                warn!(
                    breaker = %self.name,
                    timeout_ms = self.config.call_timeout.as_millis() as u64,
                    "call exceeded deadline"
                );
                permit.fail();
                Err(BreakerError::Timeout)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn acquire(&self) -> Option<Permit<'_>> {
        let now = Instant::now();
        let mut inner = self.lock();

        match inner.state {
            CircuitState::Closed => Some(Permit::new(self, false)),
            CircuitState::Open => {
                let cooled = inner
                    .opened_at
                    .is_none_or(|opened| now.duration_since(opened) >= self.config.reset_timeout);
                if !cooled {
                    return None;
                }
                inner.state = CircuitState::HalfOpen;
                inner.trials_in_flight = 1;
                info!(breaker = %self.name, state = %CircuitState::HalfOpen, "cooldown elapsed, allowing trial call");
                Some(Permit::new(self, true))
            }
            CircuitState::HalfOpen => {
                if inner.trials_in_flight >= self.config.half_open_max_calls {
                    return None;
                }
                inner.trials_in_flight += 1;
                Some(Permit::new(self, true))
            }
        }
    }

    fn record(&self, trial: bool, failed: bool) {
        let now = Instant::now();
        let mut inner = self.lock();

        if trial {
            inner.trials_in_flight = inner.trials_in_flight.saturating_sub(1);
            if inner.state != CircuitState::HalfOpen {
                return;
            }
            if failed {
                self.trip(&mut inner, now);
            } else {
                inner.state = CircuitState::Closed;
                inner.window.clear();
                inner.opened_at = None;
                info!(breaker = %self.name, state = %CircuitState::Closed, "trial call succeeded, breaker closed");
            }
            return;
        }

        // Late completions from before a trip do not feed the new cycle.
        if inner.state != CircuitState::Closed {
            return;
        }

        inner.window.push_back((now, failed));
        self.prune(&mut inner, now);

        let calls = inner.window.len() as u64;
        let failures = inner.window.iter().filter(|(_, f)| *f).count() as u64;
        if failed
            && calls >= u64::from(self.config.volume_threshold)
            && failures * 100 >= u64::from(self.config.error_threshold_percentage) * calls
        {
            self.trip(&mut inner, now);
        }
    }

    fn release_trial(&self) {
        let mut inner = self.lock();
        inner.trials_in_flight = inner.trials_in_flight.saturating_sub(1);
    }

    fn trip(&self, inner: &mut Inner, now: Instant) {
        let failures = inner.window.iter().filter(|(_, f)| *f).count();
        inner.state = CircuitState::Open;
        inner.opened_at = Some(now);
        inner.trials_in_flight = 0;
        inner.window.clear();
        warn!(
            breaker = %self.name,
            state = %CircuitState::Open,
            failures,
            cooldown_ms = self.config.reset_timeout.as_millis() as u64,
            "breaker tripped"
        );
    }

    fn prune(&self, inner: &mut Inner, now: Instant) {
        while let Some((at, _)) = inner.window.front() {
            if now.duration_since(*at) > self.config.rolling_window {
                inner.window.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Admission to run one call; releases a half-open slot if dropped unfinished.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    finished: bool,
}

impl<'a> Permit<'a> {
    fn new(breaker: &'a CircuitBreaker, trial: bool) -> Self {
        Self {
            breaker,
            trial,
            finished: false,
        }
    }

    fn succeed(&mut self) {
        self.finished = true;
        self.breaker.record(self.trial, false);
    }

    fn fail(&mut self) {
        self.finished = true;
        self.breaker.record(self.trial, true);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.finished && self.trial {
            self.breaker.release_trial();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config() -> BreakerConfig {
        BreakerConfig::default()
            .with_call_timeout(Duration::from_millis(100))
            .with_error_threshold_percentage(50)
            .with_volume_threshold(4)
            .with_rolling_window(Duration::from_secs(10))
            .with_reset_timeout(Duration::from_secs(30))
    }

    async fn failing(breaker: &CircuitBreaker, invoked: &AtomicUsize) -> Result<(), BreakerError<&'static str>> {
        breaker
            .call(async {
                invoked.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("boom")
            })
            .await
    }

    async fn succeeding(breaker: &CircuitBreaker, invoked: &AtomicUsize) -> Result<u8, BreakerError<&'static str>> {
        breaker
            .call(async {
                invoked.fetch_add(1, Ordering::SeqCst);
                Ok::<_, &'static str>(7)
            })
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn stays_closed_below_volume_threshold() {
        let breaker = CircuitBreaker::new("iam", config());
        let invoked = AtomicUsize::new(0);

        for _ in 0..3 {
            assert_eq!(failing(&breaker, &invoked).await, Err(BreakerError::Inner("boom")));
        }

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.status().window_failures, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn trips_then_short_circuits_without_invoking_call() {
        let breaker = CircuitBreaker::new("iam", config());
        let invoked = AtomicUsize::new(0);

        for _ in 0..4 {
            let _ = failing(&breaker, &invoked).await;
        }
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(invoked.load(Ordering::SeqCst), 4);

        for _ in 0..3 {
            assert_eq!(succeeding(&breaker, &invoked).await, Err(BreakerError::Open));
        }
        assert_eq!(invoked.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn error_rate_below_threshold_keeps_closed() {
        let breaker = CircuitBreaker::new("iam", config());
        let invoked = AtomicUsize::new(0);

        for _ in 0..3 {
            succeeding(&breaker, &invoked).await.unwrap();
        }
        let _ = failing(&breaker, &invoked).await;

        // 1 of 4 failed: 25% < 50%
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_outside_window_are_forgotten() {
        let breaker = CircuitBreaker::new("iam", config());
        let invoked = AtomicUsize::new(0);

        for _ in 0..3 {
            let _ = failing(&breaker, &invoked).await;
        }
        tokio::time::advance(Duration::from_secs(11)).await;
        let _ = failing(&breaker, &invoked).await;

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.status().window_calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_allows_one_trial_and_success_closes() {
        let breaker = CircuitBreaker::new("iam", config());
        let invoked = AtomicUsize::new(0);

        for _ in 0..4 {
            let _ = failing(&breaker, &invoked).await;
        }
        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(succeeding(&breaker, &invoked).await, Err(BreakerError::Open));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(succeeding(&breaker, &invoked).await, Ok(7));
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(invoked.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_trial_reopens_and_restarts_cooldown() {
        let breaker = CircuitBreaker::new("iam", config());
        let invoked = AtomicUsize::new(0);

        for _ in 0..4 {
            let _ = failing(&breaker, &invoked).await;
        }
        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(failing(&breaker, &invoked).await, Err(BreakerError::Inner("boom")));
        assert_eq!(breaker.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_secs(15)).await;
        assert_eq!(succeeding(&breaker, &invoked).await, Err(BreakerError::Open));

        tokio::time::advance(Duration::from_secs(15)).await;
        assert_eq!(succeeding(&breaker, &invoked).await, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_bounds_concurrent_trials() {
        let breaker = CircuitBreaker::new("iam", config());
        let invoked = AtomicUsize::new(0);

        for _ in 0..4 {
            let _ = failing(&breaker, &invoked).await;
        }
        tokio::time::advance(Duration::from_secs(30)).await;

        let slow_trial = breaker.call(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, &'static str>(1)
        });
        let second = async {
            tokio::task::yield_now().await;
            succeeding(&breaker, &invoked).await
        };

        let (first, second) = tokio::join!(slow_trial, second);
        assert_eq!(first, Ok(1));
        assert_eq!(second, Err(BreakerError::Open));
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_counts_as_failure() {
        let breaker = CircuitBreaker::new("iam", config().with_volume_threshold(1));

        let result = breaker
            .call(async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, &'static str>(())
            })
            .await;

        assert_eq!(result, Err(BreakerError::Timeout));
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[test]
    fn config_reads_durations_as_millis() {
        let cfg: BreakerConfig = serde_json::from_str(r#"{"call_timeout": 1500, "reset_timeout": 5000}"#).unwrap();
        assert_eq!(cfg.call_timeout, Duration::from_millis(1500));
        assert_eq!(cfg.reset_timeout, Duration::from_secs(5));
        assert_eq!(cfg.error_threshold_percentage, 50);
    }
}
