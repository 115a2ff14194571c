//! Aggregate analysis output

use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::{BlockingReason, Duration, TaskId};

/// One entry of the most-blocked ranking
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BlockedTask {
    pub id: TaskId,
    pub total_blocked: Duration,
    pub dominant_reason: Option<BlockingReason>,
}

/// A detected bottleneck condition
///
/// `Display` yields the human-readable description.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(tag = "kind", rename_all = "snake_case"))]
pub enum Issue {
    ChannelReceiveBlocking { percent: f64, threshold: f64 },
    ChannelSendBlocking { percent: f64, threshold: f64 },
    LockContention { percent: f64, threshold: f64 },
    GcPressure { percent: f64, threshold: f64 },
    DominantTask { task: TaskId, percent: f64, threshold: f64 },
    Starvation { task: TaskId, ratio: f64, threshold: f64 },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::ChannelReceiveBlocking { percent, threshold } => write!(
                f,
                "Excessive channel receive blocking ({percent:.1}% of blocked time, >{threshold}%)"
            ),
            Issue::ChannelSendBlocking { percent, threshold } => write!(
                f,
                "Excessive channel send blocking ({percent:.1}% of blocked time, >{threshold}%)"
            ),
            Issue::LockContention { percent, threshold } => write!(
                f,
                "High contention on a shared lock ({percent:.1}% of blocked time, >{threshold}%)"
            ),
            Issue::GcPressure { percent, threshold } => {
                write!(f, "High GC pressure ({percent:.1}% of blocked time, >{threshold}%)")
            }
            Issue::DominantTask { task, percent, threshold } => write!(
                f,
                "Single task dominates blocking: {task} accounts for {percent:.1}% of blocked time (>{threshold}%)"
            ),
            Issue::Starvation { task, ratio, threshold } => write!(
                f,
                "Starvation detected: {task} spent {:.0}% of its scheduled time runnable but not running (>{:.0}%)",
                ratio * 100.0,
                threshold * 100.0
            ),
        }
    }
}

/// Aggregate metrics for an entire trace
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Summary {
    pub total_tasks: usize,
    /// Equal to `total_tasks`: tasks are never evicted during a run
    pub peak_tasks: usize,
    pub total_blocked_time: Duration,
    pub total_runtime: Duration,
    pub blocking_breakdown: BTreeMap<BlockingReason, Duration>,
    /// Share of `total_blocked_time` per reason (0.0 - 100.0).
    /// Empty when nothing was blocked.
    pub blocking_percent: BTreeMap<BlockingReason, f64>,
    /// Most-blocked tasks, descending
    pub top_blocked: Vec<BlockedTask>,
    pub has_performance_issues: bool,
    pub issues: Vec<Issue>,
}

impl Summary {
    /// Percentage of blocked time attributed to `reason`, if any
    #[must_use]
    pub fn percent(&self, reason: BlockingReason) -> Option<f64> {
        self.blocking_percent.get(&reason).copied()
    }

    /// Human-readable issue descriptions, in detection order
    #[must_use]
    pub fn issue_descriptions(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_descriptions() {
        let issue = Issue::ChannelReceiveBlocking { percent: 45.0, threshold: 40.0 };
        assert_eq!(
            issue.to_string(),
            "Excessive channel receive blocking (45.0% of blocked time, >40%)"
        );

        let issue = Issue::Starvation { task: TaskId(7), ratio: 0.85, threshold: 0.7 };
        assert!(issue.to_string().starts_with("Starvation detected: Task#7"));
        assert!(issue.to_string().contains("85%"));
    }

    #[test]
    fn test_default_summary_is_empty() {
        let summary = Summary::default();
        assert_eq!(summary.total_tasks, 0);
        assert!(summary.blocking_percent.is_empty());
        assert!(summary.issue_descriptions().is_empty());
        assert_eq!(summary.percent(BlockingReason::GarbageCollection), None);
    }
}
