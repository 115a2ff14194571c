//! Text and JSON rendering of analysis results

use serde::Serialize;
use std::io::{self, Write};

use crate::analysis::{tasks_by_reason, Insight};
use crate::domain::{BlockingReason, Duration, Summary, Task, TaskId};
use crate::ingest::IngestStats;
use crate::session::Analysis;

/// JSON shape of `analyze --json`
#[derive(Debug, Serialize)]
pub struct AnalysisReport<'a> {
    pub summary: &'a Summary,
    pub stats: &'a IngestStats,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_reason: Option<ReasonListing>,
}

impl<'a> AnalysisReport<'a> {
    #[must_use]
    pub fn new(analysis: &'a Analysis, by_reason: Option<ReasonListing>) -> Self {
        Self {
            summary: &analysis.summary,
            stats: &analysis.stats,
            errors: analysis.errors.iter().map(ToString::to_string).collect(),
            by_reason,
        }
    }
}

/// Tasks ranked by time blocked on a single reason
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasonListing {
    pub reason: BlockingReason,
    pub tasks: Vec<ReasonEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasonEntry {
    pub id: TaskId,
    /// Time blocked on the listing's reason only
    pub blocked: Duration,
}

impl ReasonListing {
    /// The `n` tasks of `analysis` blocked longest on `reason`
    #[must_use]
    pub fn new(analysis: &Analysis, reason: BlockingReason, n: usize) -> Self {
        let tasks = tasks_by_reason(&analysis.tasks, reason, n)
            .into_iter()
            .map(|t| ReasonEntry {
                id: t.id,
                blocked: t.blocking_by_reason().get(&reason).copied().unwrap_or_default(),
            })
            .collect();
        Self { reason, tasks }
    }
}

/// Print the summary: totals, reason breakdown, top offenders, issues.
///
/// # Errors
/// Returns an error if writing to `out` fails.
pub fn write_summary(out: &mut impl Write, analysis: &Analysis) -> io::Result<()> {
    let summary = &analysis.summary;

    writeln!(out, "Tasks:          {} (peak {})", summary.total_tasks, summary.peak_tasks)?;
    writeln!(out, "Total runtime:  {}", summary.total_runtime)?;
    writeln!(out, "Total blocked:  {}", summary.total_blocked_time)?;

    if !summary.blocking_breakdown.is_empty() {
        writeln!(out, "\nBlocking by reason:")?;
        let mut reasons: Vec<_> = summary.blocking_breakdown.iter().collect();
        reasons.sort_by_key(|(reason, duration)| (std::cmp::Reverse(**duration), **reason));
        for (reason, duration) in reasons {
            let percent = summary.percent(*reason).unwrap_or(0.0);
            writeln!(out, "  {:<20} {:>10}  {percent:5.1}%", reason.label(), duration.to_string())?;
        }
    }

    if !summary.top_blocked.is_empty() {
        writeln!(out, "\nMost blocked tasks:")?;
        for blocked in &summary.top_blocked {
            let reason = blocked.dominant_reason.map_or("-", |r| r.label());
            writeln!(
                out,
                "  {:<12} {:>10}  {reason}",
                blocked.id.to_string(),
                blocked.total_blocked.to_string()
            )?;
        }
    }

    if summary.issues.is_empty() {
        writeln!(out, "\nNo performance issues detected")?;
    } else {
        writeln!(out, "\nIssues:")?;
        for issue in &summary.issues {
            writeln!(out, "  ! {issue}")?;
        }
    }

    write_errors(out, analysis)
}

/// Print the tasks blocked longest on one reason.
///
/// # Errors
/// Returns an error if writing to `out` fails.
pub fn write_reason_listing(out: &mut impl Write, listing: &ReasonListing) -> io::Result<()> {
    writeln!(out, "\nBlocked on {}:", listing.reason)?;
    if listing.tasks.is_empty() {
        return writeln!(out, "  no tasks");
    }
    for entry in &listing.tasks {
        writeln!(out, "  {:<12} {:>10}", entry.id.to_string(), entry.blocked.to_string())?;
    }
    Ok(())
}

/// Print the full timeline of one task.
///
/// # Errors
/// Returns an error if writing to `out` fails.
pub fn write_task(out: &mut impl Write, task: &Task) -> io::Result<()> {
    writeln!(out, "{}", task.id)?;
    writeln!(out, "  created:    {}", task.created_at)?;
    match task.terminated_at {
        Some(at) => writeln!(out, "  terminated: {at}")?,
        None => writeln!(out, "  state:      {} since {}", task.current_state, task.last_state_change)?,
    }
    writeln!(out, "  running:    {}", task.total_runtime)?;
    writeln!(out, "  runnable:   {}", task.total_runnable)?;
    writeln!(out, "  blocked:    {}", task.total_blocked())?;
    if task.anomalies > 0 {
        writeln!(out, "  anomalies:  {}", task.anomalies)?;
    }

    if !task.blocking_intervals().is_empty() {
        writeln!(out, "\n  Blocking intervals:")?;
        for interval in task.blocking_intervals() {
            writeln!(
                out,
                "    [{} .. {})  {:>10}  {}",
                interval.start,
                interval.end,
                interval.duration().to_string(),
                interval.reason
            )?;
        }
    }
    if let Some(pending) = task.pending_block() {
        writeln!(out, "    [{} .. )  still blocked  {}", pending.start, pending.reason)?;
    }

    Ok(())
}

/// Print insights grouped by severity, most severe first.
///
/// # Errors
/// Returns an error if writing to `out` fails.
pub fn write_insights(out: &mut impl Write, insights: &[Insight]) -> io::Result<()> {
    if insights.is_empty() {
        return writeln!(out, "No tasks observed");
    }

    let mut ordered: Vec<&Insight> = insights.iter().collect();
    ordered.sort_by_key(|i| std::cmp::Reverse(i.severity));

    for insight in ordered {
        writeln!(out, "[{}] {}", insight.severity, insight.title)?;
        writeln!(out, "  {}", insight.observation)?;
        writeln!(out, "  -> {}\n", insight.suggestion)?;
    }
    Ok(())
}

fn write_errors(out: &mut impl Write, analysis: &Analysis) -> io::Result<()> {
    if analysis.is_partial() {
        writeln!(out, "\nTrace read stopped early; results cover the events before:")?;
        for error in &analysis.errors {
            writeln!(out, "  {error}")?;
        }
    }
    Ok(())
}
