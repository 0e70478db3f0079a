//! Run configuration for a pipeline

use crate::error::HandoffError;
use crate::worker::{Pacing, WaitPolicy};

/// Everything a pipeline needs to know before it starts workers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Buffer capacity, at least 1
    pub capacity: usize,
    /// Number of producer tasks, at least 1
    pub producers: usize,
    /// Number of consumer tasks, at least 1
    pub consumers: usize,
    pub wait: WaitPolicy,
    pub producer_pacing: Pacing,
    pub consumer_pacing: Pacing,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capacity: 2,
            producers: 1,
            consumers: 1,
            wait: WaitPolicy::default(),
            producer_pacing: Pacing::none(),
            consumer_pacing: Pacing::none(),
        }
    }
}

impl PipelineConfig {
    /// Config with the given shape and default waits and pacing
    pub fn new(capacity: usize, producers: usize, consumers: usize) -> Self {
        Self {
            capacity,
            producers,
            consumers,
            ..Default::default()
        }
    }

    pub fn with_wait(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_pacing(mut self, producer: Pacing, consumer: Pacing) -> Self {
        self.producer_pacing = producer;
        self.consumer_pacing = consumer;
        self
    }

    /// Reject values no run could start with
    pub fn validate(&self) -> Result<(), HandoffError> {
        if self.capacity < 1 {
            return Err(HandoffError::configuration(format!(
                "capacity must be at least 1, got {}",
                self.capacity
            )));
        }
        if self.producers < 1 {
            return Err(HandoffError::configuration("at least one producer is required"));
        }
        if self.consumers < 1 {
            return Err(HandoffError::configuration("at least one consumer is required"));
        }
        if self.wait.timeout.is_some_and(|t| t.is_zero()) {
            return Err(HandoffError::configuration("wait timeout must be greater than zero"));
        }
        Ok(())
    }
}
