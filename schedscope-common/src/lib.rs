//! # Shared Data Structures (Ingestion ↔ Analysis)
//!
//! Defines the vocabulary shared by every stage of schedscope: task identity,
//! scheduling states, the blocking-reason taxonomy, per-task timelines and the
//! aggregate [`Summary`]. There is no pipeline logic here, only data and the
//! small mutators that keep a [`Task`]'s blocked-time bookkeeping consistent.
//!
//! ## Key Types
//!
//! - [`TraceEvent`] - Unit consumed from a decoder (transition or exit)
//! - [`Task`] - Timeline of one schedulable unit, built by the state tracker
//! - [`BlockingInterval`] - Closed `[start, end)` range spent blocked
//! - [`Summary`] - Aggregate output of the analyzer
//!
//! Enable the `serde` feature to derive `Serialize`/`Deserialize`.

mod summary;
mod task;

pub use summary::{BlockedTask, Issue, Summary};
pub use task::{BlockingInterval, PendingBlock, Task};

use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Identity and Time
// ============================================================================

/// Process-unique task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task#{}", self.0)
    }
}

/// Timestamp in nanoseconds
///
/// Trace-relative; only differences between timestamps are meaningful.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Elapsed time since `earlier`, zero if `earlier` is later than `self`.
    #[must_use]
    pub fn saturating_since(self, earlier: Timestamp) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }
}

impl Sub for Timestamp {
    type Output = Duration;

    fn sub(self, rhs: Timestamp) -> Duration {
        self.saturating_since(rhs)
    }
}

impl fmt::Display for Timestamp {
    #[allow(clippy::cast_precision_loss)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0 as f64 / 1_000_000_000.0)
    }
}

/// Duration in nanoseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Duration(pub u64);

impl Duration {
    pub const ZERO: Duration = Duration(0);

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Convert to milliseconds (f64)
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_millis(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Convert to seconds (f64)
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_seconds(self) -> f64 {
        self.0 as f64 / 1_000_000_000.0
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Duration) -> Duration {
        Duration(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Duration {
    fn add_assign(&mut self, rhs: Duration) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Duration {
    fn sum<I: Iterator<Item = Duration>>(iter: I) -> Duration {
        iter.fold(Duration::ZERO, Add::add)
    }
}

impl fmt::Display for Duration {
    #[allow(clippy::cast_precision_loss)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 1_000_000 {
            write!(f, "{:.1}µs", self.0 as f64 / 1_000.0)
        } else if self.0 < 1_000_000_000 {
            write!(f, "{:.2}ms", self.as_millis())
        } else {
            write!(f, "{:.2}s", self.as_seconds())
        }
    }
}

// ============================================================================
// Scheduling Vocabulary
// ============================================================================

/// Execution state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "lowercase"))]
pub enum State {
    /// Executing on a processor
    Running,
    /// Ready, waiting for a processor
    Runnable,
    /// Waiting on some external condition
    Blocked,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            State::Running => "running",
            State::Runnable => "runnable",
            State::Blocked => "blocked",
        })
    }
}

/// Coarse category explaining why a task entered [`State::Blocked`]
///
/// Declaration order is the canonical ordering used for breakdown maps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum BlockingReason {
    #[default]
    None,
    ChannelSend,
    ChannelReceive,
    LockAcquire,
    Syscall,
    GarbageCollection,
    NetworkIo,
    MultiplexedWait,
    TimedSleep,
    GenericSync,
}

impl BlockingReason {
    /// Every reason, in canonical order.
    pub const ALL: [BlockingReason; 10] = [
        BlockingReason::None,
        BlockingReason::ChannelSend,
        BlockingReason::ChannelReceive,
        BlockingReason::LockAcquire,
        BlockingReason::Syscall,
        BlockingReason::GarbageCollection,
        BlockingReason::NetworkIo,
        BlockingReason::MultiplexedWait,
        BlockingReason::TimedSleep,
        BlockingReason::GenericSync,
    ];

    /// Human-readable label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            BlockingReason::None => "none",
            BlockingReason::ChannelSend => "channel send",
            BlockingReason::ChannelReceive => "channel receive",
            BlockingReason::LockAcquire => "lock acquire",
            BlockingReason::Syscall => "syscall",
            BlockingReason::GarbageCollection => "GC",
            BlockingReason::NetworkIo => "network I/O",
            BlockingReason::MultiplexedWait => "select",
            BlockingReason::TimedSleep => "sleep",
            BlockingReason::GenericSync => "sync",
        }
    }

    /// Machine-readable name, matching the serialized form
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            BlockingReason::None => "none",
            BlockingReason::ChannelSend => "channel_send",
            BlockingReason::ChannelReceive => "channel_receive",
            BlockingReason::LockAcquire => "lock_acquire",
            BlockingReason::Syscall => "syscall",
            BlockingReason::GarbageCollection => "garbage_collection",
            BlockingReason::NetworkIo => "network_io",
            BlockingReason::MultiplexedWait => "multiplexed_wait",
            BlockingReason::TimedSleep => "timed_sleep",
            BlockingReason::GenericSync => "generic_sync",
        }
    }
}

impl fmt::Display for BlockingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error parsing a [`BlockingReason`] from its name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseReasonError(String);

impl fmt::Display for ParseReasonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown blocking reason '{}', expected one of: ", self.0)?;
        let names: Vec<&str> = BlockingReason::ALL.iter().map(|r| r.name()).collect();
        f.write_str(&names.join(", "))
    }
}

impl std::error::Error for ParseReasonError {}

impl FromStr for BlockingReason {
    type Err = ParseReasonError;

    /// Accepts [`BlockingReason::name`], case-insensitive, with `-` or `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        BlockingReason::ALL
            .into_iter()
            .find(|r| r.name() == normalized)
            .ok_or_else(|| ParseReasonError(s.to_string()))
    }
}

// ============================================================================
// Decoder Events
// ============================================================================

/// Resource an event is attributed to
///
/// Only [`Resource::Task`] events are consumed by the tracker; the rest are
/// counted and discarded during ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum Resource {
    Task(TaskId),
    Processor(u64),
    Thread(u64),
    Other,
}

/// A state change reported by the decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub resource: Resource,
    pub timestamp: Timestamp,
    /// State reported by the decoder before the change (informational)
    pub from: State,
    pub to: State,
    /// Free-text cause, e.g. "chan receive" or "sync.Mutex.Lock"
    pub reason: String,
}

/// Termination of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskExit {
    pub task: TaskId,
    pub timestamp: Timestamp,
}

/// Event yielded by a decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    Transition(StateTransition),
    Exit(TaskExit),
}

impl TraceEvent {
    /// Task this event belongs to, if any
    #[must_use]
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            TraceEvent::Transition(StateTransition { resource: Resource::Task(id), .. }) => {
                Some(*id)
            }
            TraceEvent::Transition(_) => None,
            TraceEvent::Exit(exit) => Some(exit.task),
        }
    }

    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        match self {
            TraceEvent::Transition(t) => t.timestamp,
            TraceEvent::Exit(e) => e.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_difference_saturates() {
        assert_eq!(Timestamp(40) - Timestamp(10), Duration(30));
        assert_eq!(Timestamp(10) - Timestamp(40), Duration::ZERO);
    }

    #[test]
    fn test_duration_display() {
        assert_eq!(Duration(1_500).to_string(), "1.5µs");
        assert_eq!(Duration(5_000_000).to_string(), "5.00ms");
        assert_eq!(Duration(1_500_000_000).to_string(), "1.50s");
    }

    #[test]
    fn test_duration_sum() {
        let total: Duration = [Duration(1), Duration(2), Duration(3)].into_iter().sum();
        assert_eq!(total, Duration(6));
    }

    #[test]
    fn test_reason_order_matches_all() {
        let mut sorted = BlockingReason::ALL;
        sorted.sort();
        assert_eq!(sorted, BlockingReason::ALL);
    }

    #[test]
    fn test_reason_from_name() {
        assert_eq!("channel_receive".parse::<BlockingReason>(), Ok(BlockingReason::ChannelReceive));
        assert_eq!("Lock-Acquire".parse::<BlockingReason>(), Ok(BlockingReason::LockAcquire));
        for reason in BlockingReason::ALL {
            assert_eq!(reason.name().parse::<BlockingReason>(), Ok(reason));
        }

        let err = "deadlock".parse::<BlockingReason>().unwrap_err();
        assert!(err.to_string().contains("garbage_collection"));
    }

    #[test]
    fn test_event_task_id() {
        let transition = TraceEvent::Transition(StateTransition {
            resource: Resource::Processor(3),
            timestamp: Timestamp(5),
            from: State::Running,
            to: State::Runnable,
            reason: String::new(),
        });
        assert_eq!(transition.task_id(), None);

        let exit = TraceEvent::Exit(TaskExit { task: TaskId(9), timestamp: Timestamp(7) });
        assert_eq!(exit.task_id(), Some(TaskId(9)));
        assert_eq!(exit.timestamp(), Timestamp(7));
    }
}
