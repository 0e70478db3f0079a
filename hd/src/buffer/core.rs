//! Bounded buffer implementation

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{HandoffError, PutError};

use super::slot::Slot;
use super::stats::BufferStats;

/// Internal state protected by mutex
struct BufferInner<T> {
    /// Slots in FIFO order, never longer than the capacity
    slots: VecDeque<Slot<T>>,

    /// Statistics
    stats: BufferStats,
}

/// Fixed-capacity FIFO shared by producers and consumers
///
/// Every check-wait-mutate sequence runs under one mutex. Waiters register
/// for a notification while they still hold the lock, then release it and
/// sleep. Wakeups are broadcast, so a woken waiter always loops back and
/// re-tests its condition.
pub struct BoundedBuffer<T> {
    capacity: usize,
    inner: Mutex<BufferInner<T>>,
    /// Signalled after every append
    not_empty: Notify,
    /// Signalled after every removal
    not_full: Notify,
}

impl<T> BoundedBuffer<T> {
    /// Create an empty buffer holding at most `capacity` slots
    pub fn new(capacity: usize) -> Result<Self, HandoffError> {
        debug!(capacity, "BoundedBuffer::new: called");
        if capacity < 1 {
            debug!(capacity, "BoundedBuffer::new: rejecting capacity");
            return Err(HandoffError::configuration(format!(
                "buffer capacity must be at least 1, got {}",
                capacity
            )));
        }

        Ok(Self {
            capacity,
            inner: Mutex::new(BufferInner {
                slots: VecDeque::with_capacity(capacity),
                stats: BufferStats::default(),
            }),
            not_empty: Notify::new(),
            not_full: Notify::new(),
        })
    }

    /// Maximum number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a slot, waiting for as long as the buffer is full
    pub async fn put(&self, slot: Slot<T>) {
        debug!(
            capacity = self.capacity,
            termination = slot.is_termination(),
            "BoundedBuffer::put: called"
        );
        loop {
            let mut inner = self.inner.lock().await;
            if inner.slots.len() < self.capacity {
                self.push_locked(&mut inner, slot);
                return;
            }

            debug!(len = inner.slots.len(), "BoundedBuffer::put: full, waiting");
            inner.stats.put_waits += 1;
            let notified = self.not_full.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            drop(inner);

            notified.await;
        }
    }

    /// Append a slot, giving up after `timeout`
    ///
    /// On timeout the slot comes back inside the error.
    pub async fn put_timeout(&self, slot: Slot<T>, timeout: Duration) -> Result<(), PutError<T>> {
        debug!(
            capacity = self.capacity,
            termination = slot.is_termination(),
            ?timeout,
            "BoundedBuffer::put_timeout: called"
        );
        let deadline = Instant::now() + timeout;
        loop {
            let mut inner = self.inner.lock().await;
            if inner.slots.len() < self.capacity {
                self.push_locked(&mut inner, slot);
                return Ok(());
            }

            debug!(len = inner.slots.len(), "BoundedBuffer::put_timeout: full, waiting");
            inner.stats.put_waits += 1;
            let notified = self.not_full.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            drop(inner);

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                warn!(?timeout, "BoundedBuffer::put_timeout: gave up waiting for space");
                self.inner.lock().await.stats.put_timeouts += 1;
                return Err(PutError {
                    slot,
                    cause: HandoffError::Timeout(timeout),
                });
            }
        }
    }

    /// Remove the head slot, waiting for as long as the buffer is empty
    pub async fn get(&self) -> Slot<T> {
        debug!(capacity = self.capacity, "BoundedBuffer::get: called");
        loop {
            let mut inner = self.inner.lock().await;
            if let Some(slot) = self.pop_locked(&mut inner) {
                return slot;
            }

            debug!("BoundedBuffer::get: empty, waiting");
            inner.stats.get_waits += 1;
            let notified = self.not_empty.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            drop(inner);

            notified.await;
        }
    }

    /// Remove the head slot, giving up after `timeout`
    pub async fn get_timeout(&self, timeout: Duration) -> Result<Slot<T>, HandoffError> {
        debug!(capacity = self.capacity, ?timeout, "BoundedBuffer::get_timeout: called");
        let deadline = Instant::now() + timeout;
        loop {
            let mut inner = self.inner.lock().await;
            if let Some(slot) = self.pop_locked(&mut inner) {
                return Ok(slot);
            }

            debug!("BoundedBuffer::get_timeout: empty, waiting");
            inner.stats.get_waits += 1;
            let notified = self.not_empty.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            drop(inner);

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                warn!(?timeout, "BoundedBuffer::get_timeout: gave up waiting for data");
                self.inner.lock().await.stats.get_timeouts += 1;
                return Err(HandoffError::Timeout(timeout));
            }
        }
    }

    /// Current number of slots
    pub async fn len(&self) -> usize {
        self.inner.lock().await.slots.len()
    }

    /// Check if the buffer holds no slots
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.slots.is_empty()
    }

    /// Get the buffer statistics
    pub async fn stats(&self) -> BufferStats {
        debug!("BoundedBuffer::stats: called");
        self.inner.lock().await.stats.clone()
    }

    // caller holds the lock and has checked there is room.
    fn push_locked(&self, inner: &mut BufferInner<T>, slot: Slot<T>) {
        if slot.is_termination() {
            inner.stats.terminations_put += 1;
        } else {
            inner.stats.items_put += 1;
        }
        inner.slots.push_back(slot);

        let len = inner.slots.len();
        inner.stats.peak_len = inner.stats.peak_len.max(len);
        debug!(len, capacity = self.capacity, "BoundedBuffer: appended");

        self.not_empty.notify_waiters();
    }

    // caller holds the lock. None means the buffer is empty.
    fn pop_locked(&self, inner: &mut BufferInner<T>) -> Option<Slot<T>> {
        let slot = inner.slots.pop_front()?;
        if slot.is_termination() {
            inner.stats.terminations_got += 1;
        } else {
            inner.stats.items_got += 1;
        }
        debug!(len = inner.slots.len(), capacity = self.capacity, "BoundedBuffer: removed");

        self.not_full.notify_waiters();
        Some(slot)
    }
}

impl<T: Clone> BoundedBuffer<T> {
    /// Copy of the current contents, head first. Diagnostics only.
    pub async fn snapshot(&self) -> Vec<Slot<T>> {
        debug!("BoundedBuffer::snapshot: called");
        self.inner.lock().await.slots.iter().cloned().collect()
    }
}

impl<T> std::fmt::Debug for BoundedBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedBuffer").field("capacity", &self.capacity).finish()
    }
}
