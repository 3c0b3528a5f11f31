//! Polling waiter for asynchronous remote state transitions
//!
//! A [`StateChangeConf`] repeatedly calls a refresh function until the
//! reported state lands in the target set, the overall timeout elapses, or
//! the refresh fails. Resources use it after Create/Update/Delete calls whose
//! effect the remote API applies asynchronously.
//!
//! ```no_run
//! # use tfplug::retry::StateChangeConf;
//! # use std::time::Duration;
//! # async fn run(ctx: tfplug::Context) {
//! let port = StateChangeConf::new(|| async {
//!     Ok::<_, std::io::Error>((Some(42), "ACTIVE".to_string()))
//! })
//! .pending(["PENDING"])
//! .target(["ACTIVE"])
//! .timeout(Duration::from_secs(600))
//! .wait_for_state(&ctx)
//! .await;
//! # }
//! ```

use crate::context::Context;
use crate::timeouts::format_duration;
use std::future::Future;
use std::time::Duration;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

const INITIAL_WAIT: Duration = Duration::from_millis(100);
const MAX_WAIT: Duration = Duration::from_secs(10);
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(180);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20 * 60);
const DEFAULT_NOT_FOUND_CHECKS: u32 = 20;

#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error(
        "timeout while waiting for state to become '{}' (last state: '{last_state}', timeout: {})",
        .expected.join(", "),
        format_duration(.timeout)
    )]
    Timeout {
        last_state: String,
        expected: Vec<String>,
        timeout: Duration,
    },

    #[error("couldn't find resource ({retries} retries)")]
    NotFound { retries: u32 },

    #[error("unexpected state '{state}', wanted target '{}'", .expected.join(", "))]
    UnexpectedState { state: String, expected: Vec<String> },

    #[error("{0}")]
    Refresh(#[source] BoxError),

    #[error("context cancelled while waiting for state to become '{}'", .expected.join(", "))]
    Cancelled { expected: Vec<String> },
}

impl WaitError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, WaitError::NotFound { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }
}

/// Configuration of a single wait for a remote state change.
pub struct StateChangeConf<F> {
    refresh: F,
    pending: Vec<String>,
    target: Vec<String>,
    delay: Duration,
    timeout: Duration,
    min_timeout: Duration,
    poll_interval: Duration,
    not_found_checks: u32,
    continuous_target_occurence: u32,
}

impl<F> StateChangeConf<F> {
    /// `refresh` returns the current object (None when it does not exist
    /// yet) together with its state string.
    pub fn new(refresh: F) -> Self {
        Self {
            refresh,
            pending: Vec::new(),
            target: Vec::new(),
            delay: Duration::ZERO,
            timeout: DEFAULT_TIMEOUT,
            min_timeout: Duration::ZERO,
            poll_interval: Duration::ZERO,
            not_found_checks: DEFAULT_NOT_FOUND_CHECKS,
            continuous_target_occurence: 1,
        }
    }

    pub fn pending<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pending = states.into_iter().map(Into::into).collect();
        self
    }

    pub fn target<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target = states.into_iter().map(Into::into).collect();
        self
    }

    /// Wait before the first refresh. Counts against the timeout.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Smallest wait between refreshes.
    pub fn min_timeout(mut self, min_timeout: Duration) -> Self {
        self.min_timeout = min_timeout;
        self
    }

    /// Fixed wait between refreshes. Ignored unless below 180s.
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Number of consecutive "not found" refreshes tolerated.
    pub fn not_found_checks(mut self, checks: u32) -> Self {
        self.not_found_checks = checks;
        self
    }

    /// Number of consecutive target observations required.
    pub fn continuous_target_occurence(mut self, occurences: u32) -> Self {
        self.continuous_target_occurence = occurences.max(1);
        self
    }

    /// Polls until the target state is reached and returns the last
    /// refreshed object.
    pub async fn wait_for_state<T, E, Fut>(&self, ctx: &Context) -> Result<Option<T>, WaitError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<(Option<T>, String), E>>,
        E: Into<BoxError>,
    {
        tracing::debug!(
            "Waiting for state to become: {:?} (pending: {:?})",
            self.target,
            self.pending
        );

        let mut last_state = String::new();
        let outcome = tokio::select! {
            res = tokio::time::timeout(self.timeout, self.poll(&mut last_state)) => Some(res),
            _ = ctx.cancelled() => None,
        };

        match outcome {
            Some(Ok(result)) => result,
            Some(Err(_)) => {
                tracing::warn!(
                    "WaitForState timeout after {}, last state: {:?}",
                    format_duration(self.timeout),
                    last_state
                );
                Err(WaitError::Timeout {
                    last_state,
                    expected: self.target.clone(),
                    timeout: self.timeout,
                })
            }
            None => Err(WaitError::Cancelled {
                expected: self.target.clone(),
            }),
        }
    }

    async fn poll<T, E, Fut>(&self, last_state: &mut String) -> Result<Option<T>, WaitError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<(Option<T>, String), E>>,
        E: Into<BoxError>,
    {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let mut wait = INITIAL_WAIT;
        let mut target_occurence = 0;
        let mut not_found_tick = 0;

        loop {
            let (result, state) = (self.refresh)()
                .await
                .map_err(|e| WaitError::Refresh(e.into()))?;
            last_state.clone_from(&state);

            match result {
                None if self.target.is_empty() => {
                    target_occurence += 1;
                    if target_occurence >= self.continuous_target_occurence {
                        return Ok(None);
                    }
                }
                None => {
                    not_found_tick += 1;
                    tracing::debug!(
                        "Resource not found yet ({}/{})",
                        not_found_tick,
                        self.not_found_checks
                    );
                    if not_found_tick > self.not_found_checks {
                        return Err(WaitError::NotFound {
                            retries: not_found_tick,
                        });
                    }
                }
                Some(value) => {
                    not_found_tick = 0;
                    if self.target.contains(&state) {
                        target_occurence += 1;
                        if target_occurence >= self.continuous_target_occurence {
                            return Ok(Some(value));
                        }
                    } else if self.pending.contains(&state) {
                        target_occurence = 0;
                    } else if !self.pending.is_empty() {
                        return Err(WaitError::UnexpectedState {
                            state,
                            expected: self.target.clone(),
                        });
                    }
                }
            }

            wait = self.next_wait(wait, target_occurence);
            tracing::trace!("Waiting {:?} before next try", wait);
            tokio::time::sleep(wait).await;
        }
    }

    fn next_wait(&self, mut wait: Duration, target_occurence: u32) -> Duration {
        // Back off only while the target has not been seen yet.
        if target_occurence == 0 {
            wait *= 2;
        }

        if !self.poll_interval.is_zero() && self.poll_interval < MAX_POLL_INTERVAL {
            self.poll_interval
        } else if wait < self.min_timeout {
            self.min_timeout
        } else if wait > MAX_WAIT {
            MAX_WAIT
        } else {
            wait
        }
    }
}
