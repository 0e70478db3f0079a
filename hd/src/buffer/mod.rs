//! Bounded handoff buffer
//!
//! A fixed-capacity FIFO shared by every producer and consumer in a run.
//! `put` blocks while the buffer is full and `get` blocks while it is empty.
//! Both sides wait on broadcast notifications and re-check their condition
//! under the lock after every wakeup.

mod core;
mod slot;
mod stats;

pub use self::core::BoundedBuffer;
pub use slot::Slot;
pub use stats::BufferStats;
