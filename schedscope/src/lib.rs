//! # schedscope - Scheduler Trace Analyzer
//!
//! schedscope reconstructs what every task of a concurrent program was doing
//! from a stream of timestamped state-transition events, then surfaces the
//! patterns that point at performance bottlenecks: channel stalls, lock
//! contention, GC pressure, a single dominating task, CPU starvation.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Trace (JSON lines)                          │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ Result<TraceEvent, DecodeError>
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Reader thread: route by task id % W  (bounded queues)          │
//! └───────┬──────────────────────┬──────────────────────┬───────────┘
//!         ▼                      ▼                      ▼
//! ┌──────────────┐       ┌──────────────┐       ┌──────────────┐
//! │  Worker 0    │       │  Worker 1    │  ...  │  Worker W-1  │
//! │ StateTracker │       │ StateTracker │       │ StateTracker │
//! └───────┬──────┘       └───────┬──────┘       └───────┬──────┘
//!         └──────────────────────┼──────────────────────┘
//!                                │ join, merge shard maps
//!                                ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Analysis: breakdown by reason, top offenders, rule checks      │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         ▼
//!                 Summary / Insights / Report
//! ```
//!
//! ## Module Structure
//!
//! - [`source`]: JSON-lines event source (files or stdin)
//! - [`ingest`]: sharded worker pool; per-task ordering is preserved because
//!   every event of a task lands on the same worker's FIFO queue
//! - [`tracker`]: per-task state machine folding transitions into time
//!   buckets and blocking intervals
//! - [`classification`]: free-text blocking reason to [`domain::BlockingReason`]
//! - [`analysis`]: aggregation, ranking, threshold rules and insights
//! - [`session`]: one end-to-end run producing an owned [`session::Analysis`]
//! - [`report`]: text and JSON rendering
//! - [`config`]: TOML configuration of the pool and rule thresholds
//! - [`cli`]: command-line argument parsing
//! - [`domain`]: shared types re-exported from `schedscope-common`, plus errors
//!
//! ## Typical Usage
//!
//! ```bash
//! schedscope analyze trace.jsonl
//! schedscope analyze --json --workers 8 trace.jsonl
//! schedscope inspect --task 42 trace.jsonl
//! ```

pub mod analysis;
pub mod classification;
pub mod cli;
pub mod config;
pub mod domain;
pub mod ingest;
pub mod report;
pub mod session;
pub mod source;
pub mod tracker;
