//! Aggregation and bottleneck detection
//!
//! Pure computation over the task map produced by ingestion. Runs strictly
//! after every shard worker has been joined, so it never races with
//! ingestion and needs no synchronization.

pub mod aggregator;
pub mod insights;
pub mod rules;

use std::collections::HashMap;

use crate::config::AnalysisConfig;
use crate::domain::{Summary, Task, TaskId};

pub use aggregator::tasks_by_reason;
pub use insights::{generate_insights, Insight, Severity};

/// Compute the aggregate [`Summary`] for a set of tasks.
///
/// Repeatable: the same task map and config always yield an identical
/// summary.
#[must_use]
pub fn analyze(tasks: &HashMap<TaskId, Task>, config: &AnalysisConfig) -> Summary {
    let ordered = aggregator::ordered_tasks(tasks);

    // No eviction during a run, so the peak is every task ever observed
    let mut summary =
        Summary { total_tasks: tasks.len(), peak_tasks: tasks.len(), ..Summary::default() };

    aggregator::aggregate_blocking(&ordered, &mut summary);
    summary.top_blocked = aggregator::rank_most_blocked(&ordered, config.top_n);
    summary.issues = rules::detect_issues(&summary, &ordered, config);
    summary.has_performance_issues = !summary.issues.is_empty();

    summary
}
