//! # Sharded Ingestion
//!
//! ```text
//!                    ┌──────────────┐
//!   event source ──▶ │ reader thread│── id % W ──┬──▶ [queue 0] ──▶ worker 0 (StateTracker)
//!   (lazy, fallible) └──────────────┘            ├──▶ [queue 1] ──▶ worker 1 (StateTracker)
//!                                                └──▶ [queue W-1] ▶ worker W-1
//!                                                         │
//!                              barrier: join all ◀────────┘  shard maps merged
//! ```
//!
//! Routing is by task id, never by arrival order, so every event of a task
//! lands in the same FIFO queue and is applied in decoder-emission order.
//! Each worker owns the tracker for its shard; shard key sets are disjoint,
//! so merging at the barrier needs no lock.
//!
//! Queues are bounded: when a worker falls behind, the reader blocks on
//! `send` instead of buffering the trace in memory.

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::thread;

use crate::config::PipelineConfig;
use crate::domain::{DecodeError, IngestError, Task, TaskId, TraceEvent};
use crate::tracker::StateTracker;

/// Counters collected while ingesting one trace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Events successfully pulled from the source
    pub events_read: u64,
    pub transitions: u64,
    pub exits: u64,
    /// Events attributed to a non-task resource
    pub discarded: u64,
    /// Events applied by each shard worker, indexed by worker
    pub per_worker: Vec<u64>,
}

/// Result of ingesting one trace
#[derive(Debug)]
pub struct IngestResult {
    /// Every task observed, including terminated ones
    pub tasks: HashMap<TaskId, Task>,
    /// Decode errors; reading stopped at the first one
    pub errors: Vec<DecodeError>,
    pub stats: IngestStats,
}

/// Fixed-size pool of shard workers fed by one reader
#[derive(Debug, Clone)]
pub struct Pipeline {
    workers: usize,
    queue_capacity: usize,
}

impl Pipeline {
    /// # Errors
    /// Returns an error if `workers` or `queue_capacity` is zero.
    pub fn new(workers: usize, queue_capacity: usize) -> Result<Self, IngestError> {
        if workers == 0 {
            return Err(IngestError::NoWorkers);
        }
        if queue_capacity == 0 {
            return Err(IngestError::ZeroQueueCapacity);
        }
        Ok(Self { workers, queue_capacity })
    }

    /// # Errors
    /// Returns an error if the configured pool or queue size is zero.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, IngestError> {
        Self::new(config.workers, config.queue_capacity)
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Worker index owning `id`
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn shard_for(&self, id: TaskId) -> usize {
        // Result is < workers, which is a usize
        (id.0 % self.workers as u64) as usize
    }

    /// Ingest every event of `source` and return the per-task timelines.
    ///
    /// End of iteration is end-of-stream. The first `Err` item is recorded
    /// and stops reading; events already queued are still applied, so the
    /// returned tasks are consistent for the prefix that was consumed.
    ///
    /// Returns only after every worker has drained its queue and been joined.
    ///
    /// # Errors
    /// Returns an error only if the reader or a worker thread panicked.
    pub fn run<I>(&self, source: I) -> Result<IngestResult, IngestError>
    where
        I: IntoIterator<Item = Result<TraceEvent, DecodeError>>,
        I::IntoIter: Send,
    {
        let source = source.into_iter();
        let (senders, receivers): (Vec<Sender<TraceEvent>>, Vec<Receiver<TraceEvent>>) =
            (0..self.workers).map(|_| bounded(self.queue_capacity)).unzip();

        thread::scope(|scope| {
            let worker_handles: Vec<_> = receivers
                .into_iter()
                .enumerate()
                .map(|(index, events)| scope.spawn(move || run_worker(index, &events)))
                .collect();

            let reader = scope.spawn(move || self.read_events(source, senders));

            // Join everything before inspecting results so no panicked
            // thread is left unjoined.
            let read_outcome = reader.join();
            let worker_outcomes: Vec<_> = worker_handles.into_iter().map(|h| h.join()).collect();

            let (errors, mut stats) = read_outcome.map_err(|_| IngestError::ReaderPanicked)?;

            let mut tasks = HashMap::new();
            for (index, outcome) in worker_outcomes.into_iter().enumerate() {
                let (tracker, processed) = outcome.map_err(|_| IngestError::WorkerPanicked(index))?;
                stats.per_worker.push(processed);
                tasks.extend(tracker.into_tasks());
            }

            info!(
                "Ingested {} events ({} non-task discarded) across {} workers: {} tasks, {} decode errors",
                stats.events_read,
                stats.discarded,
                self.workers,
                tasks.len(),
                errors.len()
            );

            Ok(IngestResult { tasks, errors, stats })
        })
    }

    /// Pull events and route them to shard queues until the source ends or
    /// fails. Dropping `senders` on return closes every queue.
    fn read_events<I>(&self, source: I, senders: Vec<Sender<TraceEvent>>) -> (Vec<DecodeError>, IngestStats)
    where
        I: Iterator<Item = Result<TraceEvent, DecodeError>>,
    {
        let mut errors = Vec::new();
        let mut stats = IngestStats::default();

        for item in source {
            let event = match item {
                Ok(event) => event,
                Err(err) => {
                    warn!("Stopping trace read: {err}");
                    errors.push(err);
                    break;
                }
            };
            stats.events_read += 1;

            let Some(id) = event.task_id() else {
                stats.discarded += 1;
                continue;
            };
            match event {
                TraceEvent::Transition(_) => stats.transitions += 1,
                TraceEvent::Exit(_) => stats.exits += 1,
            }

            let shard = self.shard_for(id);
            if senders[shard].send(event).is_err() {
                // Only happens if the worker is gone; its join reports why.
                warn!("Shard worker {shard} stopped accepting events, ending read");
                break;
            }
        }

        (errors, stats)
    }
}

/// Apply queued events until the reader closes the queue.
fn run_worker(index: usize, events: &Receiver<TraceEvent>) -> (StateTracker, u64) {
    let mut tracker = StateTracker::new();
    let mut processed = 0u64;

    for event in events {
        tracker.apply(event);
        processed += 1;
    }

    debug!("Shard worker {index} drained: {processed} events, {} tasks", tracker.len());
    (tracker, processed)
}
