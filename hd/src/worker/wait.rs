//! Bounded-wait policy for buffer operations

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::buffer::{BoundedBuffer, Slot};
use crate::error::HandoffError;

/// What a worker does when a bounded wait runs out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutPolicy {
    /// Wait again, up to the retry limit
    #[default]
    Retry,
    /// Give up on the first timeout
    Abort,
}

impl std::fmt::Display for TimeoutPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Retry => write!(f, "retry"),
            Self::Abort => write!(f, "abort"),
        }
    }
}

impl std::str::FromStr for TimeoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "retry" => Ok(Self::Retry),
            "abort" => Ok(Self::Abort),
            _ => Err(format!("Unknown timeout policy: {}", s)),
        }
    }
}

/// How long workers wait on the buffer, and what happens when that runs out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Ceiling for a single wait; `None` waits indefinitely
    pub timeout: Option<Duration>,
    pub on_timeout: TimeoutPolicy,
    /// Extra attempts allowed under `TimeoutPolicy::Retry`
    pub max_retries: u32,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            on_timeout: TimeoutPolicy::Retry,
            max_retries: 3,
        }
    }
}

impl WaitPolicy {
    /// Never time out
    pub fn unbounded() -> Self {
        Self {
            timeout: None,
            ..Default::default()
        }
    }

    /// Put a slot, applying the timeout policy
    pub async fn put<T>(&self, buffer: &BoundedBuffer<T>, slot: Slot<T>) -> Result<(), HandoffError> {
        let Some(timeout) = self.timeout else {
            buffer.put(slot).await;
            return Ok(());
        };

        let mut slot = slot;
        let mut timeouts = 0;
        loop {
            match buffer.put_timeout(slot, timeout).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    timeouts += 1;
                    if !self.should_retry(timeouts) {
                        warn!(timeouts, ?timeout, policy = %self.on_timeout, "WaitPolicy::put: giving up");
                        return Err(err.cause);
                    }
                    debug!(timeouts, ?timeout, "WaitPolicy::put: timed out, retrying");
                    slot = err.slot;
                }
            }
        }
    }

    /// Get a slot, applying the timeout policy
    pub async fn get<T>(&self, buffer: &BoundedBuffer<T>) -> Result<Slot<T>, HandoffError> {
        let Some(timeout) = self.timeout else {
            return Ok(buffer.get().await);
        };

        let mut timeouts = 0;
        loop {
            match buffer.get_timeout(timeout).await {
                Ok(slot) => return Ok(slot),
                Err(err) => {
                    timeouts += 1;
                    if !err.is_transient() || !self.should_retry(timeouts) {
                        warn!(timeouts, ?timeout, policy = %self.on_timeout, "WaitPolicy::get: giving up");
                        return Err(err);
                    }
                    debug!(timeouts, ?timeout, "WaitPolicy::get: timed out, retrying");
                }
            }
        }
    }

    fn should_retry(&self, timeouts: u32) -> bool {
        match self.on_timeout {
            TimeoutPolicy::Retry => timeouts <= self.max_retries,
            TimeoutPolicy::Abort => false,
        }
    }
}
