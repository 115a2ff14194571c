//! One analysis run: ingest a source, then analyze the resulting tasks.

use std::collections::HashMap;

use crate::analysis;
use crate::config::Config;
use crate::domain::{DecodeError, IngestError, Summary, Task, TaskId, TraceEvent};
use crate::ingest::{IngestStats, Pipeline};

/// Owned snapshot of a completed run
#[derive(Debug)]
pub struct Analysis {
    pub summary: Summary,
    pub tasks: HashMap<TaskId, Task>,
    /// Decode errors hit while reading; at most one, since reading stops there
    pub errors: Vec<DecodeError>,
    pub stats: IngestStats,
}

impl Analysis {
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// True if the source ended early on a decode error
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Ingest every event from `source` and analyze the result.
///
/// # Errors
/// Returns an error if the pipeline settings are invalid or an ingestion
/// thread panicked. Decode errors are not fatal; they end up in
/// [`Analysis::errors`].
pub fn run<I>(source: I, config: &Config) -> Result<Analysis, IngestError>
where
    I: IntoIterator<Item = Result<TraceEvent, DecodeError>>,
    I::IntoIter: Send,
{
    let pipeline = Pipeline::from_config(&config.pipeline)?;
    let ingested = pipeline.run(source)?;
    let summary = analysis::analyze(&ingested.tasks, &config.analysis);

    Ok(Analysis { summary, tasks: ingested.tasks, errors: ingested.errors, stats: ingested.stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::domain::{Resource, State, StateTransition, Timestamp};

    fn transition(task: u64, ts: u64, from: State, to: State, reason: &str) -> TraceEvent {
        TraceEvent::Transition(StateTransition {
            resource: Resource::Task(TaskId(task)),
            timestamp: Timestamp(ts),
            from,
            to,
            reason: reason.to_string(),
        })
    }

    #[test]
    fn test_run_end_to_end() {
        let config = Config {
            pipeline: PipelineConfig { workers: 2, queue_capacity: 4 },
            ..Config::default()
        };
        let events = vec![
            Ok(transition(1, 0, State::Runnable, State::Running, "")),
            Ok(transition(1, 10, State::Running, State::Blocked, "sync.Mutex.Lock")),
            Ok(transition(1, 40, State::Blocked, State::Runnable, "")),
        ];

        let analysis = run(events, &config).unwrap();
        assert!(!analysis.is_partial());
        assert_eq!(analysis.summary.total_tasks, 1);
        assert_eq!(analysis.task(TaskId(1)).unwrap().total_blocked().0, 30);
        assert_eq!(analysis.stats.transitions, 3);
    }

    #[test]
    fn test_invalid_pipeline_config() {
        let config = Config {
            pipeline: PipelineConfig { workers: 0, queue_capacity: 4 },
            ..Config::default()
        };
        let events: Vec<Result<TraceEvent, DecodeError>> = Vec::new();
        assert!(matches!(run(events, &config), Err(IngestError::NoWorkers)));
    }
}
