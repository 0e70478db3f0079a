//! Consumer worker

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::buffer::Slot;
use crate::error::HandoffError;
use crate::feed::SinkCollector;

use super::Shared;
use super::lifecycle::{Lifecycle, WorkerId};
use super::pacing::Pacing;
use super::report::{TokenActions, WorkerReport};
use super::roster::TokenFate;

/// Moves items from the buffer into a sink collector
///
/// Exits when the roster says a termination token retires it. Tokens taken
/// while producers are still running are absorbed and the consumer keeps
/// draining.
pub struct Consumer<T> {
    lifecycle: Lifecycle,
    shared: Shared<T>,
    sink: Arc<dyn SinkCollector<T>>,
    pacing: Pacing,
}

#[derive(Default)]
struct Progress {
    items: u64,
    tokens: TokenActions,
    // set once the roster has counted this consumer out
    departed: bool,
}

impl<T: Send + 'static> Consumer<T> {
    pub fn new(index: usize, shared: Shared<T>, sink: Arc<dyn SinkCollector<T>>, pacing: Pacing) -> Self {
        Self {
            lifecycle: Lifecycle::new(WorkerId::consumer(index)),
            shared,
            sink,
            pacing,
        }
    }

    pub fn id(&self) -> WorkerId {
        self.lifecycle.id()
    }

    /// Run until retired by a termination token or until a wait fails
    pub async fn run(self) -> WorkerReport {
        let id = self.id();
        info!(worker = %id, "Consumer started");

        let mut progress = Progress::default();
        let outcome = self.consume(&mut progress).await;

        if let Err(original) = &outcome
            && !progress.departed
        {
            // Keep the ripple from waiting on a consumer that is gone
            match self.shared.roster.consumer_left() {
                Ok(remaining) => warn!(worker = %id, remaining, "Consumer left the pool early"),
                Err(e) => error!(worker = %id, error = %e, %original, "Consumer could not leave the pool"),
            }
        }

        WorkerReport::conclude(self.lifecycle, outcome, progress.items, progress.tokens)
    }

    async fn consume(&self, progress: &mut Progress) -> Result<(), HandoffError> {
        let id = self.id();
        let Shared { buffer, roster, wait } = &self.shared;

        loop {
            match wait.get(buffer).await? {
                Slot::Item(item) => {
                    self.sink.append(item).await;
                    progress.items += 1;
                    debug!(worker = %id, items = progress.items, "Consumer::consume: item collected");
                    self.pacing.pause().await;
                }
                Slot::Termination => {
                    let fate = roster.observe_token()?;
                    debug!(worker = %id, ?fate, "Consumer::consume: termination token");
                    match fate {
                        TokenFate::Absorb => {
                            progress.tokens.absorbed += 1;
                        }
                        TokenFate::Forward => {
                            progress.departed = true;
                            wait.put(buffer, Slot::Termination).await?;
                            progress.tokens.forwarded += 1;
                            return Ok(());
                        }
                        TokenFate::Discard => {
                            progress.departed = true;
                            progress.tokens.discarded += 1;
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}
