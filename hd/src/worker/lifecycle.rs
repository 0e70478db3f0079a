//! Worker identity and lifecycle

use serde::Serialize;
use tracing::debug;

use crate::error::HandoffError;

/// Which side of the buffer a worker sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerKind {
    Producer,
    Consumer,
}

impl std::fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Producer => write!(f, "producer"),
            Self::Consumer => write!(f, "consumer"),
        }
    }
}

/// Identifies one worker within a run, e.g. `consumer-2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct WorkerId {
    pub kind: WorkerKind,
    pub index: usize,
}

impl WorkerId {
    pub fn producer(index: usize) -> Self {
        Self {
            kind: WorkerKind::Producer,
            index,
        }
    }

    pub fn consumer(index: usize) -> Self {
        Self {
            kind: WorkerKind::Consumer,
            index,
        }
    }
}

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.kind, self.index)
    }
}

/// Lifecycle state of a worker
///
/// `Running -> (Exhausted | Failed) -> Stopped`. There is no way back:
/// a stopped worker stays stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Running,
    Exhausted,
    Failed,
    Stopped,
}

impl WorkerState {
    /// Check if moving to `next` is a legal transition
    pub fn can_transition_to(self, next: WorkerState) -> bool {
        matches!(
            (self, next),
            (Self::Running, Self::Exhausted)
                | (Self::Running, Self::Failed)
                | (Self::Exhausted, Self::Stopped)
                | (Self::Failed, Self::Stopped)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Stopped
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Exhausted => write!(f, "exhausted"),
            Self::Failed => write!(f, "failed"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Tracks one worker's state and rejects illegal transitions
#[derive(Debug)]
pub struct Lifecycle {
    id: WorkerId,
    state: WorkerState,
}

impl Lifecycle {
    /// Start a new worker in the `Running` state
    pub fn new(id: WorkerId) -> Self {
        debug!(worker = %id, "Lifecycle::new: called");
        Self {
            id,
            state: WorkerState::Running,
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Move to `next`, failing with a protocol violation if that is not allowed
    pub fn advance(&mut self, next: WorkerState) -> Result<(), HandoffError> {
        debug!(worker = %self.id, from = %self.state, to = %next, "Lifecycle::advance: called");
        if !self.state.can_transition_to(next) {
            return Err(HandoffError::violation(format!(
                "{} cannot move from {} to {}",
                self.id, self.state, next
            )));
        }
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_id_display() {
        assert_eq!(WorkerId::producer(0).to_string(), "producer-0");
        assert_eq!(WorkerId::consumer(3).to_string(), "consumer-3");
    }

    #[test]
    fn test_happy_path() {
        let mut lifecycle = Lifecycle::new(WorkerId::producer(1));
        assert_eq!(lifecycle.state(), WorkerState::Running);

        lifecycle.advance(WorkerState::Exhausted).unwrap();
        lifecycle.advance(WorkerState::Stopped).unwrap();
        assert!(lifecycle.state().is_terminal());
    }

    #[test]
    fn test_failure_path() {
        let mut lifecycle = Lifecycle::new(WorkerId::consumer(0));
        lifecycle.advance(WorkerState::Failed).unwrap();
        lifecycle.advance(WorkerState::Stopped).unwrap();
    }

    #[test]
    fn test_no_restart() {
        let mut lifecycle = Lifecycle::new(WorkerId::consumer(0));
        lifecycle.advance(WorkerState::Exhausted).unwrap();
        lifecycle.advance(WorkerState::Stopped).unwrap();

        let err = lifecycle.advance(WorkerState::Running).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("consumer-0"));
        assert_eq!(lifecycle.state(), WorkerState::Stopped);
    }

    #[test]
    fn test_cannot_skip_to_stopped() {
        assert!(!WorkerState::Running.can_transition_to(WorkerState::Stopped));
        assert!(!WorkerState::Exhausted.can_transition_to(WorkerState::Failed));
    }
}
