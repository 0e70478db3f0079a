//! Handoff - bounded-buffer producer/consumer coordination
//!
//! A fixed-capacity FIFO shared by any number of producer and consumer tasks.
//! Producers pull work from a [`SourceFeed`](feed::SourceFeed) and put it in
//! the buffer; consumers take it out and hand it to a
//! [`SinkCollector`](feed::SinkCollector). Shutdown travels through the same
//! buffer as termination tokens, one per producer, which the consumer pool
//! absorbs or forwards until every consumer has stopped.
//!
//! # Modules
//!
//! - [`buffer`] - The bounded buffer and its slot type
//! - [`feed`] - Source and sink collaborator traits plus in-memory versions
//! - [`worker`] - Producers, consumers, lifecycles and the shutdown roster
//! - [`pipeline`] - Run orchestration and reporting
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod buffer;
pub mod cli;
pub mod config;
pub mod error;
pub mod feed;
pub mod pipeline;
pub mod worker;

pub use buffer::{BoundedBuffer, BufferStats, Slot};
pub use error::{HandoffError, PutError};
pub use feed::{FeedError, MemoryFeed, MemorySink, SinkCollector, SourceFeed};
pub use pipeline::{Pipeline, PipelineConfig, RunReport};
pub use worker::{TimeoutPolicy, WaitPolicy};
