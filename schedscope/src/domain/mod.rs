//! Domain model for schedscope
//!
//! Re-exports the shared vocabulary from `schedscope-common` alongside the
//! structured errors raised by this crate.

pub mod errors;

// Re-export common types for convenience
pub use schedscope_common::{
    BlockedTask, BlockingInterval, BlockingReason, Duration, Issue, ParseReasonError, PendingBlock,
    Resource, State, StateTransition, Summary, Task, TaskExit, TaskId, Timestamp, TraceEvent,
};

pub use errors::{ConfigError, DecodeError, IngestError};
