//! # Task State Tracker
//!
//! Folds each task's ordered transition sequence into timing buckets and
//! completed blocking intervals.
//!
//! ## Accounting Rules
//!
//! - Time since the last transition is charged to the task's **current
//!   recorded** state: running or runnable accumulators directly.
//! - Blocked time is never charged directly. It is counted once, when the
//!   blocking interval closes, via [`Task::add_blocking_interval`].
//! - An interval still open at end of stream stays uncounted: its true
//!   duration is unknown.
//!
//! One tracker instance is owned by exactly one ingestion worker, so no
//! locking happens on this path.

use log::trace;
use std::collections::HashMap;

use crate::classification::classify_reason;
use crate::domain::{BlockingReason, Resource, State, Task, TaskId, Timestamp, TraceEvent};

/// Per-shard task state machines
#[derive(Debug, Default)]
pub struct StateTracker {
    tasks: HashMap<TaskId, Task>,
}

impl StateTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one decoder event.
    ///
    /// Returns `false` (and changes nothing) for events attributed to a
    /// resource other than a task.
    pub fn apply(&mut self, event: TraceEvent) -> bool {
        match event {
            TraceEvent::Transition(st) => {
                let Resource::Task(id) = st.resource else {
                    return false;
                };
                // Only a transition into Blocked carries a blocking reason
                let reason = if st.to == State::Blocked {
                    classify_reason(&st.reason)
                } else {
                    BlockingReason::None
                };
                self.record_transition(id, st.timestamp, st.from, st.to, reason);
                true
            }
            TraceEvent::Exit(exit) => {
                self.record_exit(exit.task, exit.timestamp);
                true
            }
        }
    }

    /// Record a state change for `id` at `timestamp`.
    ///
    /// `from` is the decoder's view of the prior state. Elapsed time is
    /// charged to the tracker's own recorded state; `from` only matters for
    /// detecting a close of a block that was never opened (e.g. a task first
    /// seen mid-block), which is tolerated and counted in `Task::anomalies`.
    pub fn record_transition(
        &mut self,
        id: TaskId,
        timestamp: Timestamp,
        from: State,
        to: State,
        reason: BlockingReason,
    ) {
        let task = self.tasks.entry(id).or_insert_with(|| Task::new(id, timestamp));
        charge_elapsed(task, timestamp);

        if task.current_state == State::Blocked || from == State::Blocked {
            match task.take_pending_block() {
                // Also taken on Blocked -> Blocked so the next interval starts
                // where this one ends.
                Some(pending) => task.add_blocking_interval(pending.close(timestamp)),
                None if to != State::Blocked => {
                    task.anomalies += 1;
                    trace!("{id}: left blocked state at {timestamp} with no open interval");
                }
                None => {}
            }
        }

        if to == State::Blocked {
            task.open_block(timestamp, reason);
        }

        task.current_state = to;
        task.last_state_change = timestamp;
    }

    /// Record termination of `id` at `timestamp`.
    ///
    /// A block still open at exit is closed at the exit time.
    pub fn record_exit(&mut self, id: TaskId, timestamp: Timestamp) {
        let task = self.tasks.entry(id).or_insert_with(|| Task::new(id, timestamp));
        charge_elapsed(task, timestamp);

        if let Some(pending) = task.take_pending_block() {
            task.add_blocking_interval(pending.close(timestamp));
        }

        task.terminated_at = Some(timestamp);
        task.last_state_change = timestamp;
    }

    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Hand over every tracked task, including terminated ones.
    #[must_use]
    pub fn into_tasks(self) -> HashMap<TaskId, Task> {
        self.tasks
    }
}

/// Charge time since the last change to the running/runnable bucket.
fn charge_elapsed(task: &mut Task, timestamp: Timestamp) {
    let elapsed = timestamp - task.last_state_change;
    match task.current_state {
        State::Running => task.total_runtime += elapsed,
        State::Runnable => task.total_runnable += elapsed,
        State::Blocked => {}
    }
}
