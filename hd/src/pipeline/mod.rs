//! Run-level orchestration
//!
//! A [`Pipeline`] validates its configuration, builds one buffer and one
//! roster per run, spawns every worker as a tokio task and folds their
//! terminal reports into a [`RunReport`].

mod config;
mod report;

use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::buffer::BoundedBuffer;
use crate::error::HandoffError;
use crate::feed::{SinkCollector, SourceFeed};
use crate::worker::{Consumer, Lifecycle, Producer, Roster, Shared, TokenActions, WorkerId, WorkerReport};

pub use config::PipelineConfig;
pub use report::RunReport;

/// Runs producers and consumers against one shared buffer
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline, rejecting invalid configuration up front
    pub fn new(config: PipelineConfig) -> Result<Self, HandoffError> {
        debug!(?config, "Pipeline::new: called");
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Move every item from `feed` to `sink` and report how it went
    ///
    /// Worker failures do not abort the run; they show up in the report.
    /// The error case is reserved for setup problems.
    pub async fn run<T, F, S>(&self, feed: Arc<F>, sink: Arc<S>) -> Result<RunReport, HandoffError>
    where
        T: Send + 'static,
        F: SourceFeed<T> + 'static,
        S: SinkCollector<T> + 'static,
    {
        let feed: Arc<dyn SourceFeed<T>> = feed;
        let sink: Arc<dyn SinkCollector<T>> = sink;
        let config = &self.config;
        let shared = Shared {
            buffer: Arc::new(BoundedBuffer::new(config.capacity)?),
            roster: Arc::new(Roster::new(config.producers, config.consumers)?),
            wait: config.wait,
        };
        info!(
            capacity = config.capacity,
            producers = config.producers,
            consumers = config.consumers,
            "Pipeline run started"
        );

        let mut handles: Vec<(WorkerId, JoinHandle<WorkerReport>)> =
            Vec::with_capacity(config.producers + config.consumers);

        for index in 0..config.consumers {
            let consumer = Consumer::new(index, shared.clone(), Arc::clone(&sink), config.consumer_pacing);
            handles.push((consumer.id(), tokio::spawn(consumer.run())));
        }
        for index in 0..config.producers {
            let producer = Producer::new(index, shared.clone(), Arc::clone(&feed), config.producer_pacing);
            handles.push((producer.id(), tokio::spawn(producer.run())));
        }

        let (ids, tasks): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let results = join_all(tasks).await;

        let workers = ids
            .into_iter()
            .zip(results)
            .map(|(id, result)| match result {
                Ok(report) => report,
                Err(e) => {
                    error!(worker = %id, error = %e, "Worker task did not complete");
                    WorkerReport::conclude(
                        Lifecycle::new(id),
                        Err(HandoffError::violation(format!("{} task aborted: {}", id, e))),
                        0,
                        TokenActions::default(),
                    )
                }
            })
            .collect();

        let report = RunReport::new(workers, shared.buffer.stats().await, shared.roster.stats());
        match report.reconcile() {
            Ok(()) => info!(items = report.items_delivered, "Pipeline run completed"),
            Err(e) => error!(error = %e, failures = report.failures().len(), "Pipeline run failed"),
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{MemoryFeed, MemorySink};
    use crate::worker::WorkerState;

    #[test]
    fn test_new_rejects_zero_capacity() {
        let err = Pipeline::new(PipelineConfig::new(0, 1, 1)).unwrap_err();
        assert!(matches!(err, HandoffError::Configuration(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_run_moves_every_item() {
        let pipeline = Pipeline::new(PipelineConfig::new(3, 2, 2)).unwrap();
        let sink = Arc::new(MemorySink::new());

        let report = pipeline
            .run(Arc::new(MemoryFeed::new(0..40u32)), sink.clone())
            .await
            .unwrap();

        report.reconcile().unwrap();
        assert_eq!(report.workers.len(), 4);
        assert!(report.workers.iter().all(|w| w.state == WorkerState::Stopped));

        let mut items = sink.items().await;
        items.sort();
        assert_eq!(items, (0..40).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_empty_feed_still_shuts_down() {
        let pipeline = Pipeline::new(PipelineConfig::new(1, 1, 2)).unwrap();
        let sink = Arc::new(MemorySink::<u32>::new());

        let report = pipeline
            .run(Arc::new(MemoryFeed::new(Vec::new())), sink.clone())
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.items_delivered, 0);
        assert_eq!(report.tokens.tokens_forwarded, 1);
        assert!(sink.is_empty().await);
    }
}
