//! Aggregated result of a pipeline run

use serde::Serialize;

use crate::buffer::BufferStats;
use crate::error::HandoffError;
use crate::worker::{RosterStats, WorkerKind, WorkerReport};

/// Terminal status of every worker plus the run-level counters
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub workers: Vec<WorkerReport>,
    pub buffer: BufferStats,
    pub tokens: RosterStats,
    /// Items producers took from the feed and handed off
    pub items_taken: u64,
    /// Items consumers appended to the sink
    pub items_delivered: u64,
}

impl RunReport {
    pub(crate) fn new(workers: Vec<WorkerReport>, buffer: BufferStats, tokens: RosterStats) -> Self {
        let count = |kind: WorkerKind| -> u64 {
            workers
                .iter()
                .filter(|w| w.id.kind == kind)
                .map(|w| w.items)
                .sum()
        };
        let items_taken = count(WorkerKind::Producer);
        let items_delivered = count(WorkerKind::Consumer);

        Self {
            workers,
            buffer,
            tokens,
            items_taken,
            items_delivered,
        }
    }

    /// Workers that stopped because of an error
    pub fn failures(&self) -> Vec<&WorkerReport> {
        self.workers.iter().filter(|w| !w.is_clean()).collect()
    }

    /// Every worker stopped cleanly and all counts reconcile
    pub fn is_success(&self) -> bool {
        self.reconcile().is_ok()
    }

    /// Check worker statuses, item counts and the token ledger
    ///
    /// Returns the first problem found. A failed worker is reported as its
    /// own error; count mismatches are protocol violations.
    pub fn reconcile(&self) -> Result<(), HandoffError> {
        if let Some(failed) = self.workers.iter().find(|w| !w.is_clean()) {
            return Err(match failed.exit.error() {
                Some(err) => err.clone(),
                None => HandoffError::violation(format!("{} did not reach a clean stop", failed.id)),
            });
        }

        if self.items_taken != self.items_delivered {
            return Err(HandoffError::violation(format!(
                "{} items taken but {} delivered",
                self.items_taken, self.items_delivered
            )));
        }
        if self.buffer.items_got != self.items_delivered {
            return Err(HandoffError::violation(format!(
                "buffer handed out {} items but consumers delivered {}",
                self.buffer.items_got, self.items_delivered
            )));
        }
        if self.buffer.in_flight() != 0 {
            return Err(HandoffError::violation(format!(
                "{} slots left in the buffer",
                self.buffer.in_flight()
            )));
        }

        self.tokens.reconcile()
    }
}
