//! Producer and consumer workers
//!
//! Workers move slots between the collaborators and the shared buffer. Each
//! one runs to a terminal `Stopped` state exactly once and hands back a
//! [`WorkerReport`]. Shutdown is coordinated through the [`Roster`]: every
//! producer emits one termination token, and consumers absorb or forward
//! tokens until no live consumer is left.

mod consumer;
mod lifecycle;
mod pacing;
mod producer;
mod report;
mod roster;
mod wait;

use std::sync::Arc;

use crate::buffer::BoundedBuffer;

pub use consumer::Consumer;
pub use lifecycle::{Lifecycle, WorkerId, WorkerKind, WorkerState};
pub use pacing::Pacing;
pub use producer::Producer;
pub use report::{Exit, TokenActions, WorkerReport};
pub use roster::{Roster, RosterStats, TokenFate};
pub use wait::{TimeoutPolicy, WaitPolicy};

/// State shared by every worker in a run
pub struct Shared<T> {
    pub buffer: Arc<BoundedBuffer<T>>,
    pub roster: Arc<Roster>,
    pub wait: WaitPolicy,
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            buffer: Arc::clone(&self.buffer),
            roster: Arc::clone(&self.roster),
            wait: self.wait,
        }
    }
}
