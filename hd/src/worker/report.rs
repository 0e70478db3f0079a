//! Terminal worker reports

use serde::{Serialize, Serializer};
use tracing::{error, info};

use crate::error::HandoffError;

use super::lifecycle::{Lifecycle, WorkerId, WorkerState};

/// Why a worker stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exit {
    /// Ran out of work and shut down cleanly
    Exhausted,
    /// Stopped early because of an error
    Failed(HandoffError),
}

impl Exit {
    pub fn is_failed(&self) -> bool {
        matches!(self, Exit::Failed(_))
    }

    pub fn error(&self) -> Option<&HandoffError> {
        match self {
            Exit::Exhausted => None,
            Exit::Failed(err) => Some(err),
        }
    }
}

impl Serialize for Exit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Exit::Exhausted => serializer.serialize_str("exhausted"),
            Exit::Failed(err) => serializer.collect_str(&format_args!("failed ({}): {}", err.kind(), err)),
        }
    }
}

/// Termination-token activity of a single worker
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenActions {
    /// Tokens put by a producer on exhaustion
    pub emitted: u64,
    /// Tokens put by a failed producer to release the consumer pool
    pub wake_ups: u64,
    /// Tokens taken by a consumer while other producers were still running
    pub absorbed: u64,
    /// Tokens a consumer put back for its live peers
    pub forwarded: u64,
    /// Tokens a consumer dropped because no peer was left
    pub discarded: u64,
}

/// Final status of one worker
#[derive(Debug, Clone, Serialize)]
pub struct WorkerReport {
    pub id: WorkerId,
    pub state: WorkerState,
    pub exit: Exit,
    /// Items taken from the feed (producer) or appended to the sink (consumer)
    pub items: u64,
    pub tokens: TokenActions,
}

impl WorkerReport {
    /// Drive a lifecycle to `Stopped` and record how it got there
    pub(crate) fn conclude(
        mut lifecycle: Lifecycle,
        outcome: Result<(), HandoffError>,
        items: u64,
        tokens: TokenActions,
    ) -> Self {
        let id = lifecycle.id();
        let exit = match outcome {
            Ok(()) => lifecycle.advance(WorkerState::Exhausted).map(|_| Exit::Exhausted),
            Err(err) => lifecycle.advance(WorkerState::Failed).map(|_| Exit::Failed(err)),
        };
        let exit = match exit.and_then(|exit| lifecycle.advance(WorkerState::Stopped).map(|_| exit)) {
            Ok(exit) => exit,
            Err(violation) => Exit::Failed(violation),
        };

        match &exit {
            Exit::Exhausted => info!(worker = %id, items, "Worker stopped"),
            Exit::Failed(err) => error!(worker = %id, items, error = %err, "Worker failed"),
        }

        Self {
            id,
            state: lifecycle.state(),
            exit,
            items,
            tokens,
        }
    }

    /// Stopped without an unhandled failure
    pub fn is_clean(&self) -> bool {
        self.state == WorkerState::Stopped && !self.exit.is_failed()
    }
}
