//! Producer worker

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::buffer::Slot;
use crate::error::HandoffError;
use crate::feed::SourceFeed;

use super::Shared;
use super::lifecycle::{Lifecycle, WorkerId};
use super::pacing::Pacing;
use super::report::{TokenActions, WorkerReport};

/// Moves items from a source feed into the buffer
///
/// Emits exactly one termination token when the feed is exhausted. A failed
/// producer never emits one; it puts a wake-up token instead, so consumers
/// are not left waiting on it while the run is still reported as failed.
/// `run` consumes the producer, so it cannot be started twice.
pub struct Producer<T> {
    lifecycle: Lifecycle,
    shared: Shared<T>,
    feed: Arc<dyn SourceFeed<T>>,
    pacing: Pacing,
}

impl<T: Send + 'static> Producer<T> {
    pub fn new(index: usize, shared: Shared<T>, feed: Arc<dyn SourceFeed<T>>, pacing: Pacing) -> Self {
        Self {
            lifecycle: Lifecycle::new(WorkerId::producer(index)),
            shared,
            feed,
            pacing,
        }
    }

    pub fn id(&self) -> WorkerId {
        self.lifecycle.id()
    }

    /// Run until the feed is exhausted or fails
    pub async fn run(self) -> WorkerReport {
        let id = self.id();
        info!(worker = %id, "Producer started");

        let mut items = 0;
        let mut tokens = TokenActions::default();
        let outcome = self.produce(&mut items, &mut tokens).await;
        if outcome.is_err() && tokens.emitted == 0 {
            self.wake_consumers(&mut tokens).await;
        }

        WorkerReport::conclude(self.lifecycle, outcome, items, tokens)
    }

    async fn produce(&self, items: &mut u64, tokens: &mut TokenActions) -> Result<(), HandoffError> {
        let id = self.id();
        let Shared { buffer, roster, wait } = &self.shared;

        loop {
            match self.feed.take_next().await {
                Ok(Some(item)) => {
                    wait.put(buffer, Slot::Item(item)).await?;
                    *items += 1;
                    debug!(worker = %id, items = *items, "Producer::produce: item handed off");
                    self.pacing.pause().await;
                }
                Ok(None) => {
                    debug!(worker = %id, "Producer::produce: feed exhausted, emitting termination token");
                    wait.put(buffer, Slot::Termination).await?;
                    tokens.emitted += 1;
                    roster.record_emitted()?;
                    return Ok(());
                }
                Err(e) => {
                    error!(worker = %id, error = %e, "Producer feed failed");
                    return Err(e.into());
                }
            }
        }
    }

    // the original failure stays the exit reason; this only logs its own.
    async fn wake_consumers(&self, tokens: &mut TokenActions) {
        let id = self.id();
        let Shared { buffer, roster, wait } = &self.shared;

        if let Err(e) = wait.put(buffer, Slot::Termination).await {
            error!(worker = %id, error = %e, "Producer could not put wake-up token");
            return;
        }
        tokens.wake_ups += 1;
        if let Err(e) = roster.producer_failed() {
            error!(worker = %id, error = %e, "Wake-up token broke the token ledger");
        }
        debug!(worker = %id, "Producer::wake_consumers: wake-up token put");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BoundedBuffer;
    use crate::feed::{FeedError, MemoryFeed};
    use crate::worker::{Exit, Roster, WaitPolicy, WorkerState};
    use async_trait::async_trait;

    fn shared(capacity: usize, producers: usize) -> Shared<u32> {
        Shared {
            buffer: Arc::new(BoundedBuffer::new(capacity).unwrap()),
            roster: Arc::new(Roster::new(producers, 1).unwrap()),
            wait: WaitPolicy::unbounded(),
        }
    }

    struct BrokenFeed;

    #[async_trait]
    impl SourceFeed<u32> for BrokenFeed {
        async fn take_next(&self) -> Result<Option<u32>, FeedError> {
            Err(FeedError::new("device unplugged"))
        }
    }

    #[tokio::test]
    async fn test_emits_items_then_one_token() {
        let shared = shared(10, 1);
        let feed = Arc::new(MemoryFeed::new([1, 2, 3]));

        let report = Producer::new(0, shared.clone(), feed, Pacing::none()).run().await;

        assert!(report.is_clean());
        assert_eq!(report.items, 3);
        assert_eq!(report.tokens.emitted, 1);
        assert_eq!(
            shared.buffer.snapshot().await,
            vec![Slot::Item(1), Slot::Item(2), Slot::Item(3), Slot::Termination]
        );
        assert_eq!(shared.roster.stats().tokens_emitted, 1);
    }

    #[tokio::test]
    async fn test_empty_feed_emits_only_token() {
        let shared = shared(1, 1);
        let feed = Arc::new(MemoryFeed::new(Vec::<u32>::new()));

        let report = Producer::new(0, shared.clone(), feed, Pacing::none()).run().await;

        assert!(report.is_clean());
        assert_eq!(report.items, 0);
        assert_eq!(shared.buffer.snapshot().await, vec![Slot::Termination]);
    }

    #[tokio::test]
    async fn test_feed_failure_puts_wake_up_not_emission() {
        let shared = shared(4, 1);

        let report = Producer::new(2, shared.clone(), Arc::new(BrokenFeed), Pacing::none())
            .run()
            .await;

        assert_eq!(report.state, WorkerState::Stopped);
        assert!(matches!(report.exit, Exit::Failed(HandoffError::Feed(_))));
        assert_eq!(report.tokens.emitted, 0);
        assert_eq!(report.tokens.wake_ups, 1);
        assert_eq!(shared.buffer.snapshot().await, vec![Slot::Termination]);

        let stats = shared.roster.stats();
        assert_eq!(stats.tokens_emitted, 0);
        assert_eq!(stats.wake_ups, 1);
    }

    #[tokio::test]
    async fn test_full_buffer_with_abort_policy_fails() {
        let mut shared = shared(1, 1);
        shared.wait = WaitPolicy {
            timeout: Some(std::time::Duration::from_millis(10)),
            on_timeout: crate::worker::TimeoutPolicy::Abort,
            max_retries: 0,
        };
        let feed = Arc::new(MemoryFeed::new([1, 2]));

        // Nobody consumes, so the second put can never find room
        let report = Producer::new(0, shared.clone(), feed, Pacing::none()).run().await;

        // The put timeout stays the exit reason even though the wake-up put also failed
        assert!(report.exit.error().is_some_and(|e| e.is_transient()));
        assert_eq!(report.items, 1);
        assert_eq!(report.tokens.emitted, 0);
        assert_eq!(report.tokens.wake_ups, 0);
    }
}
