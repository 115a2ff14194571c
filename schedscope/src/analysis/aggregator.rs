//! Global blocking statistics and offender ranking.
//!
//! # Determinism
//!
//! Everything here works on tasks in ascending id order and breaks ranking
//! ties by id, so the same task map always produces the same output no
//! matter how the `HashMap` iterates.
//!
//! # Performance
//!
//! - `aggregate_blocking()`: O(tasks × reasons)
//! - `rank_most_blocked()`: O(n log n) sort; no heap, `n` is small in
//!   practice relative to the scan

// Percentage calculations intentionally convert u64 to f64
#![allow(clippy::cast_precision_loss)]

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use crate::domain::{BlockedTask, BlockingReason, Duration, Summary, Task, TaskId};

/// Tasks sorted by id
#[must_use]
pub fn ordered_tasks(tasks: &HashMap<TaskId, Task>) -> Vec<&Task> {
    let mut ordered: Vec<&Task> = tasks.values().collect();
    ordered.sort_unstable_by_key(|t| t.id);
    ordered
}

/// Fill the time totals, per-reason breakdown and percentages of `summary`.
///
/// Percentages are left empty when nothing was blocked.
pub fn aggregate_blocking(tasks: &[&Task], summary: &mut Summary) {
    let mut breakdown: BTreeMap<BlockingReason, Duration> = BTreeMap::new();

    for task in tasks {
        summary.total_blocked_time += task.total_blocked();
        summary.total_runtime += task.total_runtime;
        for (&reason, &duration) in task.blocking_by_reason() {
            *breakdown.entry(reason).or_default() += duration;
        }
    }

    let total = summary.total_blocked_time;
    if !total.is_zero() {
        summary.blocking_percent = breakdown
            .iter()
            .map(|(&reason, duration)| (reason, percent_of(*duration, total)))
            .collect();
    }
    summary.blocking_breakdown = breakdown;
}

/// The `n` tasks with the most blocked time, descending.
///
/// Tasks that never completed a blocking interval are not ranked.
#[must_use]
pub fn rank_most_blocked(tasks: &[&Task], n: usize) -> Vec<BlockedTask> {
    let mut blocked: Vec<&Task> = tasks.iter().copied().filter(|t| !t.total_blocked().is_zero()).collect();
    blocked.sort_by_key(|t| (Reverse(t.total_blocked()), t.id));
    blocked.truncate(n);

    blocked
        .into_iter()
        .map(|t| BlockedTask {
            id: t.id,
            total_blocked: t.total_blocked(),
            dominant_reason: t.dominant_reason(),
        })
        .collect()
}

/// The `n` tasks with the most time blocked on `reason`, descending.
#[must_use]
pub fn tasks_by_reason(
    tasks: &HashMap<TaskId, Task>,
    reason: BlockingReason,
    n: usize,
) -> Vec<&Task> {
    let mut matching: Vec<(&Task, Duration)> = tasks
        .values()
        .filter_map(|t| {
            t.blocking_by_reason().get(&reason).filter(|d| !d.is_zero()).map(|&d| (t, d))
        })
        .collect();
    matching.sort_by_key(|(t, d)| (Reverse(*d), t.id));
    matching.into_iter().take(n).map(|(t, _)| t).collect()
}

/// `100 × part / total`; caller guarantees `total` is non-zero
pub(crate) fn percent_of(part: Duration, total: Duration) -> f64 {
    (part.0 as f64 / total.0 as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BlockingInterval, Timestamp};

    fn task(id: u64, blocks: &[(u64, u64, BlockingReason)]) -> Task {
        let mut task = Task::new(TaskId(id), Timestamp(0));
        for &(start, end, reason) in blocks {
            task.add_blocking_interval(BlockingInterval {
                start: Timestamp(start),
                end: Timestamp(end),
                reason,
            });
        }
        task
    }

    fn map(tasks: Vec<Task>) -> HashMap<TaskId, Task> {
        tasks.into_iter().map(|t| (t.id, t)).collect()
    }

    #[test]
    fn test_aggregate_blocking_breakdown_and_percent() {
        let tasks = map(vec![
            task(1, &[(0, 30, BlockingReason::LockAcquire)]),
            task(2, &[(0, 10, BlockingReason::LockAcquire), (10, 70, BlockingReason::ChannelReceive)]),
        ]);
        let mut summary = Summary::default();
        aggregate_blocking(&ordered_tasks(&tasks), &mut summary);

        assert_eq!(summary.total_blocked_time, Duration(100));
        assert_eq!(summary.blocking_breakdown[&BlockingReason::LockAcquire], Duration(40));
        assert_eq!(summary.blocking_breakdown[&BlockingReason::ChannelReceive], Duration(60));
        assert!((summary.blocking_percent[&BlockingReason::LockAcquire] - 40.0).abs() < 1e-9);
        assert!((summary.blocking_percent[&BlockingReason::ChannelReceive] - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_percentages_without_blocking() {
        let tasks = map(vec![task(1, &[]), task(2, &[])]);
        let mut summary = Summary::default();
        aggregate_blocking(&ordered_tasks(&tasks), &mut summary);

        assert!(summary.total_blocked_time.is_zero());
        assert!(summary.blocking_breakdown.is_empty());
        assert!(summary.blocking_percent.is_empty());
    }

    #[test]
    fn test_rank_most_blocked_orders_and_truncates() {
        let tasks = map(vec![
            task(1, &[(0, 5, BlockingReason::Syscall)]),
            task(2, &[(0, 50, BlockingReason::TimedSleep)]),
            task(3, &[]),
            task(4, &[(0, 20, BlockingReason::GenericSync)]),
            task(5, &[(0, 20, BlockingReason::NetworkIo)]),
        ]);
        let ranked = rank_most_blocked(&ordered_tasks(&tasks), 3);

        let ids: Vec<u64> = ranked.iter().map(|b| b.id.0).collect();
        assert_eq!(ids, vec![2, 4, 5]);
        assert_eq!(ranked[0].dominant_reason, Some(BlockingReason::TimedSleep));
    }

    #[test]
    fn test_tasks_by_reason() {
        let tasks = map(vec![
            task(1, &[(0, 5, BlockingReason::ChannelSend)]),
            task(2, &[(0, 50, BlockingReason::ChannelSend)]),
            task(3, &[(0, 90, BlockingReason::Syscall)]),
        ]);
        let senders = tasks_by_reason(&tasks, BlockingReason::ChannelSend, 10);
        let ids: Vec<u64> = senders.iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![2, 1]);

        assert_eq!(tasks_by_reason(&tasks, BlockingReason::ChannelSend, 1).len(), 1);
        assert!(tasks_by_reason(&tasks, BlockingReason::GarbageCollection, 10).is_empty());
    }
}
