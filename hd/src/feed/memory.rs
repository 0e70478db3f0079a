//! In-memory feed and sink

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{FeedError, SinkCollector, SourceFeed};

/// Feed backed by a queue of items, handed out front to back
pub struct MemoryFeed<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> MemoryFeed<T> {
    /// Create a feed that yields `items` in order, then reports exhaustion
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        let items: VecDeque<T> = items.into_iter().collect();
        debug!(count = items.len(), "MemoryFeed::new: called");
        Self { items: Mutex::new(items) }
    }

    /// Number of items not yet taken
    pub async fn remaining(&self) -> usize {
        self.items.lock().await.len()
    }
}

#[async_trait]
impl<T: Send> SourceFeed<T> for MemoryFeed<T> {
    async fn take_next(&self) -> Result<Option<T>, FeedError> {
        let item = self.items.lock().await.pop_front();
        debug!(exhausted = item.is_none(), "MemoryFeed::take_next: called");
        Ok(item)
    }
}

/// Sink that keeps every item in arrival order
pub struct MemorySink<T> {
    items: Mutex<Vec<T>>,
}

impl<T> MemorySink<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    /// Number of items collected so far
    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    /// Check if nothing has been collected yet
    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    /// Consume the sink and return the collected items
    pub fn into_items(self) -> Vec<T> {
        self.items.into_inner()
    }
}

impl<T: Clone> MemorySink<T> {
    /// Copy of the collected items in arrival order
    pub async fn items(&self) -> Vec<T> {
        self.items.lock().await.clone()
    }
}

impl<T> Default for MemorySink<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send> SinkCollector<T> for MemorySink<T> {
    async fn append(&self, item: T) {
        let mut items = self.items.lock().await;
        items.push(item);
        debug!(len = items.len(), "MemorySink::append: called");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_feed_yields_in_order_then_exhausts() {
        let feed = MemoryFeed::new([1, 2]);

        assert_eq!(feed.take_next().await, Ok(Some(1)));
        assert_eq!(feed.take_next().await, Ok(Some(2)));
        assert_eq!(feed.take_next().await, Ok(None));
        // Exhaustion is permanent
        assert_eq!(feed.take_next().await, Ok(None));
        assert_eq!(feed.remaining().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_feed_never_hands_out_twice() {
        let feed = Arc::new(MemoryFeed::new(0..1000u32));

        let takers: Vec<_> = (0..4)
            .map(|_| {
                let feed = Arc::clone(&feed);
                tokio::spawn(async move {
                    let mut taken = Vec::new();
                    while let Ok(Some(item)) = feed.take_next().await {
                        taken.push(item);
                    }
                    taken
                })
            })
            .collect();

        let mut all = Vec::new();
        for taker in takers {
            all.extend(taker.await.unwrap());
        }
        all.sort();
        assert_eq!(all, (0..1000).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_sink_collects_in_arrival_order() {
        let sink = MemorySink::new();
        assert!(sink.is_empty().await);

        sink.append("x").await;
        sink.append("y").await;

        assert_eq!(sink.len().await, 2);
        assert_eq!(sink.items().await, vec!["x", "y"]);
        assert_eq!(sink.into_items(), vec!["x", "y"]);
    }
}
