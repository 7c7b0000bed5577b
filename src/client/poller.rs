//! Bounded-wait polling for scan completion.
//!
//! A job starts `Pending` and eventually moves to a terminal status. The
//! poller queries the status at a fixed interval until that happens or the
//! configured timeout passes:
//!
//! ```text
//! Pending --query--> Pending   (elapsed <= timeout: sleep, query again)
//!         --query--> Terminal  (returned as-is, no confirmation query)
//!         --query--> TimedOut  (elapsed > timeout: WebAvError::Timeout)
//! ```
//!
//! The first query is always issued, even with a zero timeout. Time is read
//! through the [`Clock`] trait so the loop can be driven by a fake clock.

use crate::core::{FileStatus, WebAvError, WebAvResult};

use async_trait::async_trait;
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Default maximum wait for a job to finish.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(600);

/// Default delay between status queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Timing for one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Give up once this much time has passed with the job still pending.
    pub timeout: Duration,

    /// Fixed delay between queries. Never grows.
    pub poll_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_WAIT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PollConfig {
    /// Creates a configuration with the defaults (600 s timeout, 100 ms interval).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration from fractional seconds.
    ///
    /// Negative, NaN or out-of-range values become zero.
    pub fn from_secs_f64(timeout_seconds: f64, poll_interval_seconds: f64) -> Self {
        Self {
            timeout: secs_or_zero(timeout_seconds),
            poll_interval: secs_or_zero(poll_interval_seconds),
        }
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

fn secs_or_zero(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
}

/// Source of time for the polling loop.
#[async_trait]
pub trait Clock: Send + Sync + Debug {
    /// Returns the current instant.
    fn now(&self) -> Instant;

    /// Suspends for the given duration.
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the tokio timer. Honors paused time in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Bookkeeping for a single wait; never outlives the call.
#[derive(Debug)]
struct PollState<'a> {
    job_id: &'a str,
    started_at: Instant,
    timeout: Duration,
    poll_interval: Duration,
    attempts: u32,
}

/// Turns repeated status queries into one bounded wait.
#[derive(Debug, Clone)]
pub struct Poller<C = TokioClock> {
    config: PollConfig,
    clock: C,
}

impl Poller<TokioClock> {
    /// Creates a poller using the tokio timer.
    pub fn new(config: PollConfig) -> Self {
        Self::with_clock(config, TokioClock)
    }
}

impl Default for Poller<TokioClock> {
    fn default() -> Self {
        Self::new(PollConfig::default())
    }
}

impl<C: Clock> Poller<C> {
    /// Creates a poller with a custom clock.
    pub fn with_clock(config: PollConfig, clock: C) -> Self {
        Self { config, clock }
    }

    /// Returns the timing configuration.
    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Returns the clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Queries until the job leaves `Pending` or the timeout passes.
    ///
    /// `query` is called once per iteration and its errors are returned
    /// immediately; they are not retried.
    ///
    /// # Errors
    ///
    /// - `Timeout` if the job is still pending after the configured timeout.
    /// - Any error returned by `query`.
    pub async fn wait_for<F, Fut>(&self, job_id: &str, mut query: F) -> WebAvResult<FileStatus>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = WebAvResult<FileStatus>>,
    {
        let mut state = PollState {
            job_id,
            started_at: self.clock.now(),
            timeout: self.config.timeout,
            poll_interval: self.config.poll_interval,
            attempts: 0,
        };

        loop {
            state.attempts += 1;
            let status = query().await?;

            if status.is_terminal() {
                tracing::info!(
                    job_id = state.job_id,
                    status = %status.virus_status,
                    attempts = state.attempts,
                    "Scan finished"
                );
                return Ok(status);
            }

            let elapsed = self.clock.now().saturating_duration_since(state.started_at);
            if elapsed > state.timeout {
                tracing::warn!(
                    job_id = state.job_id,
                    timeout_ms = state.timeout.as_millis() as u64,
                    attempts = state.attempts,
                    "Timed out waiting for scan"
                );
                return Err(WebAvError::Timeout {
                    timeout: state.timeout,
                    attempts: state.attempts,
                });
            }

            tracing::debug!(
                job_id = state.job_id,
                attempt = state.attempts,
                elapsed_ms = elapsed.as_millis() as u64,
                "Scan still pending"
            );
            self.clock.sleep(state.poll_interval).await;
        }
    }
}
