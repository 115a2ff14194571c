//! Trace ingestion
//!
//! Turns a lazy, fallible event sequence into per-task timelines using a
//! pool of shard workers. See [`pipeline`] for the routing and ordering
//! guarantees.

pub mod pipeline;

pub use pipeline::{IngestResult, IngestStats, Pipeline};
