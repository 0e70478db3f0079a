//! Source and sink collaborators
//!
//! The core only sees these two capability traits. Implementations must be
//! safe to call from many workers at once: a feed never hands out the same
//! item twice, and a sink never loses an appended item.

mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::{MemoryFeed, MemorySink};

/// A read failure from a source feed, distinct from normal exhaustion
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct FeedError {
    pub reason: String,
}

impl FeedError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Supplies work items to producers
#[async_trait]
pub trait SourceFeed<T>: Send + Sync {
    /// Take the next item
    ///
    /// `Ok(None)` means the feed is exhausted and will stay exhausted.
    async fn take_next(&self) -> Result<Option<T>, FeedError>;
}

/// Accumulates items delivered by consumers
#[async_trait]
pub trait SinkCollector<T>: Send + Sync {
    /// Store one item
    async fn append(&self, item: T);
}
