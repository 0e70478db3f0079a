//! Error types for the handoff core

use std::time::Duration;
use thiserror::Error;

use crate::buffer::Slot;
use crate::feed::FeedError;

/// Errors that can occur while configuring or running a handoff pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandoffError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),
}

impl HandoffError {
    /// Shorthand for a configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        HandoffError::Configuration(reason.into())
    }

    /// Shorthand for a protocol violation
    pub fn violation(reason: impl Into<String>) -> Self {
        HandoffError::ProtocolViolation(reason.into())
    }

    /// Check if this error may clear up on retry
    pub fn is_transient(&self) -> bool {
        matches!(self, HandoffError::Timeout(_))
    }

    /// Check if this error indicates a synchronization bug
    pub fn is_fatal(&self) -> bool {
        matches!(self, HandoffError::ProtocolViolation(_))
    }

    /// Short machine-friendly label, used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            HandoffError::Configuration(_) => "configuration",
            HandoffError::Feed(_) => "feed",
            HandoffError::Timeout(_) => "timeout",
            HandoffError::ProtocolViolation(_) => "protocol-violation",
        }
    }
}

/// Error for a put that could not complete
///
/// The slot that was being put is handed back so the caller can retry it
/// without losing the item.
#[derive(Debug)]
pub struct PutError<T> {
    /// The slot that was not inserted
    pub slot: Slot<T>,
    /// Why it was not inserted
    pub cause: HandoffError,
}

impl<T> PutError<T> {
    /// Drop the slot and keep only the cause
    pub fn into_cause(self) -> HandoffError {
        self.cause
    }
}

impl<T> std::fmt::Display for PutError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "put failed: {}", self.cause)
    }
}

impl<T: std::fmt::Debug> std::error::Error for PutError<T> {}
