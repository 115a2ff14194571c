//! Per-task timeline records

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::{BlockingReason, Duration, State, TaskId, Timestamp};

/// A closed `[start, end)` range a task spent blocked for one reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BlockingInterval {
    pub start: Timestamp,
    pub end: Timestamp,
    pub reason: BlockingReason,
}

impl BlockingInterval {
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// A blocking interval that has been opened but not yet closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PendingBlock {
    pub start: Timestamp,
    pub reason: BlockingReason,
}

impl PendingBlock {
    /// Close this block at `end`
    #[must_use]
    pub fn close(self, end: Timestamp) -> BlockingInterval {
        BlockingInterval { start: self.start, end, reason: self.reason }
    }
}

/// Complete lifecycle and scheduling behavior of one task
///
/// The running/runnable accumulators and the state fields are written
/// directly by the state tracker. Blocked-time bookkeeping is private: the
/// interval list, the blocked total and the per-reason map only change
/// together through [`Task::add_blocking_interval`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Task {
    pub id: TaskId,
    pub created_at: Timestamp,
    /// Unset while the task is alive
    pub terminated_at: Option<Timestamp>,
    pub total_runtime: Duration,
    pub total_runnable: Duration,
    pub current_state: State,
    pub last_state_change: Timestamp,
    /// Structurally anomalous transitions tolerated for this task
    /// (e.g. leaving Blocked without an open interval)
    pub anomalies: u64,

    total_blocked: Duration,
    blocking_intervals: Vec<BlockingInterval>,
    blocking_by_reason: BTreeMap<BlockingReason, Duration>,
    pending_block: Option<PendingBlock>,
}

impl Task {
    /// Create a task first observed at `created_at`, initially runnable.
    #[must_use]
    pub fn new(id: TaskId, created_at: Timestamp) -> Self {
        Self {
            id,
            created_at,
            terminated_at: None,
            total_runtime: Duration::ZERO,
            total_runnable: Duration::ZERO,
            current_state: State::Runnable,
            last_state_change: created_at,
            anomalies: 0,
            total_blocked: Duration::ZERO,
            blocking_intervals: Vec::new(),
            blocking_by_reason: BTreeMap::new(),
            pending_block: None,
        }
    }

    /// Sum of all closed blocking intervals
    #[must_use]
    pub fn total_blocked(&self) -> Duration {
        self.total_blocked
    }

    /// Closed blocking intervals in the order they ended
    #[must_use]
    pub fn blocking_intervals(&self) -> &[BlockingInterval] {
        &self.blocking_intervals
    }

    /// Cumulative closed blocking time per reason
    #[must_use]
    pub fn blocking_by_reason(&self) -> &BTreeMap<BlockingReason, Duration> {
        &self.blocking_by_reason
    }

    #[must_use]
    pub fn pending_block(&self) -> Option<&PendingBlock> {
        self.pending_block.as_ref()
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated_at.is_some()
    }

    /// Record a closed interval, updating the blocked total and the
    /// per-reason breakdown together.
    pub fn add_blocking_interval(&mut self, interval: BlockingInterval) {
        let duration = interval.duration();
        self.total_blocked += duration;
        *self.blocking_by_reason.entry(interval.reason).or_default() += duration;
        self.blocking_intervals.push(interval);
    }

    /// Open a blocking interval, replacing any interval still open.
    pub fn open_block(&mut self, start: Timestamp, reason: BlockingReason) {
        self.pending_block = Some(PendingBlock { start, reason });
    }

    pub fn take_pending_block(&mut self) -> Option<PendingBlock> {
        self.pending_block.take()
    }

    /// Reason with the largest cumulative blocked time.
    ///
    /// Ties resolve to the reason that sorts first; `None` when the task
    /// never completed a blocking interval.
    #[must_use]
    pub fn dominant_reason(&self) -> Option<BlockingReason> {
        self.blocking_by_reason
            .iter()
            .filter(|(_, d)| !d.is_zero())
            .max_by(|(ra, da), (rb, db)| da.cmp(db).then_with(|| rb.cmp(ra)))
            .map(|(&reason, _)| reason)
    }

    /// Share of scheduled-or-waiting-to-be time spent runnable, in `[0, 1]`.
    ///
    /// `None` unless the task has both runnable and running time.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn runnable_ratio(&self) -> Option<f64> {
        if self.total_runnable.is_zero() || self.total_runtime.is_zero() {
            return None;
        }
        let runnable = self.total_runnable.0 as f64;
        Some(runnable / (runnable + self.total_runtime.0 as f64))
    }
}
