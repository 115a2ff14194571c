//! Fixed rule set for bottleneck detection.
//!
//! Rules are evaluated independently, in a fixed order, and every rule that
//! fires contributes one [`Issue`]. Thresholds come from [`AnalysisConfig`].

use crate::config::AnalysisConfig;
use crate::domain::{BlockingReason, Issue, Summary, Task};

use super::aggregator::percent_of;

/// Evaluate every rule against an aggregated `summary`.
///
/// `tasks` must be in ascending id order: the starvation rule reports only
/// the first starving task it meets. `summary` must already hold the
/// aggregated blocking totals for the same tasks.
#[must_use]
pub fn detect_issues(summary: &Summary, tasks: &[&Task], config: &AnalysisConfig) -> Vec<Issue> {
    let mut issues = Vec::new();

    let share_rules: [(BlockingReason, f64, fn(f64, f64) -> Issue); 4] = [
        (BlockingReason::ChannelReceive, config.channel_receive_percent, |percent, threshold| {
            Issue::ChannelReceiveBlocking { percent, threshold }
        }),
        (BlockingReason::ChannelSend, config.channel_send_percent, |percent, threshold| {
            Issue::ChannelSendBlocking { percent, threshold }
        }),
        (BlockingReason::LockAcquire, config.lock_percent, |percent, threshold| {
            Issue::LockContention { percent, threshold }
        }),
        (BlockingReason::GarbageCollection, config.gc_percent, |percent, threshold| {
            Issue::GcPressure { percent, threshold }
        }),
    ];

    for (reason, threshold, issue) in share_rules {
        if let Some(percent) = summary.percent(reason).filter(|&p| p > threshold) {
            issues.push(issue(percent, threshold));
        }
    }

    // Scanned from `tasks`, not `summary.top_blocked`, whose length is a
    // display setting
    let most_blocked = tasks
        .iter()
        .copied()
        .filter(|t| !t.total_blocked().is_zero())
        .max_by(|a, b| a.total_blocked().cmp(&b.total_blocked()).then_with(|| b.id.cmp(&a.id)));
    if let Some(top) = most_blocked.filter(|_| !summary.total_blocked_time.is_zero()) {
        let percent = percent_of(top.total_blocked(), summary.total_blocked_time);
        if percent > config.dominant_task_percent {
            issues.push(Issue::DominantTask {
                task: top.id,
                percent,
                threshold: config.dominant_task_percent,
            });
        }
    }

    let starving = tasks.iter().find_map(|t| {
        t.runnable_ratio().filter(|&r| r > config.starvation_ratio).map(|r| (t.id, r))
    });
    if let Some((task, ratio)) = starving {
        issues.push(Issue::Starvation { task, ratio, threshold: config.starvation_ratio });
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BlockingInterval, Duration, TaskId, Timestamp};

    fn summary_with(percents: &[(BlockingReason, f64)]) -> Summary {
        Summary {
            blocking_percent: percents.iter().copied().collect(),
            total_blocked_time: Duration(1_000),
            ..Summary::default()
        }
    }

    fn blocked(id: u64, blocked: u64) -> Task {
        let mut task = Task::new(TaskId(id), Timestamp(0));
        task.add_blocking_interval(BlockingInterval {
            start: Timestamp(0),
            end: Timestamp(blocked),
            reason: BlockingReason::Syscall,
        });
        task
    }

    #[test]
    fn test_share_rules_fire_independently() {
        let summary = summary_with(&[
            (BlockingReason::ChannelReceive, 41.0),
            (BlockingReason::LockAcquire, 31.0),
            (BlockingReason::GarbageCollection, 16.0),
            (BlockingReason::ChannelSend, 12.0),
        ]);
        let issues = detect_issues(&summary, &[], &AnalysisConfig::default());

        assert_eq!(issues.len(), 3);
        assert!(matches!(issues[0], Issue::ChannelReceiveBlocking { .. }));
        assert!(matches!(issues[1], Issue::LockContention { .. }));
        assert!(matches!(issues[2], Issue::GcPressure { .. }));
    }

    #[test]
    fn test_threshold_is_strict() {
        let summary = summary_with(&[(BlockingReason::ChannelSend, 40.0)]);
        assert!(detect_issues(&summary, &[], &AnalysisConfig::default()).is_empty());
    }

    #[test]
    fn test_channel_send_rule_fires_in_rule_order() {
        let summary = summary_with(&[
            (BlockingReason::ChannelReceive, 5.0),
            (BlockingReason::ChannelSend, 45.0),
            (BlockingReason::LockAcquire, 35.0),
            (BlockingReason::GarbageCollection, 15.0),
        ]);
        let issues = detect_issues(&summary, &[], &AnalysisConfig::default());

        assert_eq!(issues.len(), 2);
        match &issues[0] {
            Issue::ChannelSendBlocking { percent, threshold } => {
                assert!((percent - 45.0).abs() < 1e-9);
                assert!((threshold - 40.0).abs() < 1e-9);
            }
            other => panic!("unexpected issue {other:?}"),
        }
        assert!(matches!(issues[1], Issue::LockContention { .. }));
    }

    #[test]
    fn test_dominant_task() {
        let summary = summary_with(&[]);
        let heavy = blocked(9, 600);
        let light = blocked(3, 400);
        let issues = detect_issues(&summary, &[&light, &heavy], &AnalysisConfig::default());
        assert_eq!(issues.len(), 1);
        match &issues[0] {
            Issue::DominantTask { task, percent, .. } => {
                assert_eq!(*task, TaskId(9));
                assert!((percent - 60.0).abs() < 1e-9);
            }
            other => panic!("unexpected issue {other:?}"),
        }
    }

    #[test]
    fn test_dominant_task_without_ranking() {
        // No ranked tasks in the summary; the rule still sees every task
        let summary = summary_with(&[]);
        assert!(summary.top_blocked.is_empty());
        let heavy = blocked(1, 900);
        let light = blocked(2, 100);

        let issues = detect_issues(&summary, &[&heavy, &light], &AnalysisConfig::default());
        assert!(matches!(issues.as_slice(), [Issue::DominantTask { task: TaskId(1), .. }]));
    }

    #[test]
    fn test_starvation_reports_first_task_only() {
        let mut starving_a = Task::new(TaskId(1), Timestamp(0));
        starving_a.total_runnable = Duration(80);
        starving_a.total_runtime = Duration(20);
        let mut starving_b = starving_a.clone();
        starving_b.id = TaskId(2);
        let mut healthy = Task::new(TaskId(0), Timestamp(0));
        healthy.total_runnable = Duration(10);
        healthy.total_runtime = Duration(90);

        let tasks = [&healthy, &starving_a, &starving_b];
        let issues = detect_issues(&Summary::default(), &tasks, &AnalysisConfig::default());
        assert_eq!(issues.len(), 1);
        assert!(matches!(issues[0], Issue::Starvation { task: TaskId(1), .. }));
    }

    #[test]
    fn test_never_running_task_is_not_starvation() {
        let mut task = Task::new(TaskId(1), Timestamp(0));
        task.total_runnable = Duration(100);
        let issues = detect_issues(&Summary::default(), &[&task], &AnalysisConfig::default());
        assert!(issues.is_empty());
    }
}
