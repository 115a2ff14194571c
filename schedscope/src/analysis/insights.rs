//! Narrative insights derived from a [`Summary`].
//!
//! Each detected issue becomes one observation plus a concrete suggestion.
//! A trace with tasks and no issues gets a single informational insight.

use serde::Serialize;
use std::fmt;

use crate::domain::{Issue, Summary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        })
    }
}

/// A human-readable observation about scheduler behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insight {
    pub title: String,
    pub observation: String,
    pub suggestion: String,
    pub severity: Severity,
}

impl Insight {
    fn new(
        title: &str,
        observation: String,
        suggestion: &str,
        severity: Severity,
    ) -> Self {
        Self { title: title.to_string(), observation, suggestion: suggestion.to_string(), severity }
    }
}

/// Build insights for every issue in `summary`, in detection order.
#[must_use]
pub fn generate_insights(summary: &Summary) -> Vec<Insight> {
    let mut insights: Vec<Insight> = summary.issues.iter().map(|issue| insight_for(issue, summary)).collect();

    if !summary.has_performance_issues && summary.total_tasks > 0 {
        insights.push(Insight::new(
            "Healthy Scheduler State",
            format!(
                "{} tasks analyzed; no significant contention or starvation was detected.",
                summary.total_tasks
            ),
            "Continue monitoring as load grows. The current synchronization strategy is performing well.",
            Severity::Info,
        ));
    }

    insights
}

fn insight_for(issue: &Issue, summary: &Summary) -> Insight {
    match issue {
        Issue::ChannelReceiveBlocking { percent, .. } => Insight::new(
            "Channel Bottleneck Detected",
            format!("{percent:.1}% of all blocked time is spent waiting on channel receives."),
            "This usually means slow producers or unbuffered channels stalling consumers. \
             Consider larger channel buffers or spreading the producing work.",
            Severity::Critical,
        ),
        Issue::ChannelSendBlocking { percent, .. } => Insight::new(
            "Channel Backpressure",
            format!("{percent:.1}% of all blocked time is spent waiting to send on channels."),
            "Consumers are not keeping up with producers. Add consumers, batch messages, \
             or increase buffer capacity.",
            Severity::Warning,
        ),
        Issue::LockContention { percent, .. } => Insight::new(
            "Lock Contention",
            format!("{percent:.1}% of all blocked time is spent acquiring locks."),
            "Shorten critical sections, split the lock by key, or use a read-write lock \
             for read-heavy data.",
            Severity::Critical,
        ),
        Issue::GcPressure { percent, .. } => Insight::new(
            "High GC Pressure",
            format!("Garbage collection accounts for {percent:.1}% of all blocked time."),
            "Reduce short-lived allocations: reuse buffers and pool frequently allocated objects.",
            Severity::Warning,
        ),
        Issue::DominantTask { task, percent, .. } => {
            let reason = summary
                .top_blocked
                .iter()
                .find(|b| b.id == *task)
                .and_then(|b| b.dominant_reason)
                .map_or_else(String::new, |r| format!(", mostly on {r}"));
            Insight::new(
                "Single Task Dominates Blocking",
                format!("{task} holds {percent:.1}% of all blocked time{reason}."),
                "Inspect this task's blocking intervals; one slow dependency is likely \
                 serializing the rest of the program.",
                Severity::Warning,
            )
        }
        Issue::Starvation { task, ratio, .. } => Insight::new(
            "CPU Starvation",
            format!(
                "{task} was ready to run {:.0}% of the time it was not blocked, but was waiting for a processor.",
                ratio * 100.0
            ),
            "Too few processors for the runnable load, or some tasks hog the CPU in tight \
             loops without yielding.",
            Severity::Warning,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BlockedTask, BlockingReason, Duration, TaskId};

    #[test]
    fn test_healthy_insight() {
        let summary = Summary { total_tasks: 4, peak_tasks: 4, ..Summary::default() };
        let insights = generate_insights(&summary);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].severity, Severity::Info);
        assert_eq!(insights[0].title, "Healthy Scheduler State");
    }

    #[test]
    fn test_empty_trace_has_no_insights() {
        assert!(generate_insights(&Summary::default()).is_empty());
    }

    #[test]
    fn test_one_insight_per_issue() {
        let summary = Summary {
            total_tasks: 2,
            peak_tasks: 2,
            has_performance_issues: true,
            top_blocked: vec![BlockedTask {
                id: TaskId(3),
                total_blocked: Duration(90),
                dominant_reason: Some(BlockingReason::LockAcquire),
            }],
            issues: vec![
                Issue::ChannelReceiveBlocking { percent: 45.0, threshold: 40.0 },
                Issue::DominantTask { task: TaskId(3), percent: 90.0, threshold: 50.0 },
            ],
            ..Summary::default()
        };

        let insights = generate_insights(&summary);
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].severity, Severity::Critical);
        assert!(insights[0].observation.contains("45.0%"));
        assert!(insights[1].observation.contains("Task#3"));
        assert!(insights[1].observation.contains("lock acquire"));
    }
}
