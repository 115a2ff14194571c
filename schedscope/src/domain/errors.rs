//! Structured error types for schedscope
//!
//! Using thiserror for automatic Display implementation and error chaining.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to produce the next event from a trace source.
///
/// Non-fatal for ingestion: the pipeline records it, stops reading and keeps
/// the results of every event already consumed.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to read trace input at line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed event at line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid event at line {line}: {message}")]
    InvalidEvent { line: usize, message: String },
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Worker pool must have at least one worker")]
    NoWorkers,

    #[error("Queue capacity must be at least 1")]
    ZeroQueueCapacity,

    #[error("Shard worker {0} panicked")]
    WorkerPanicked(usize),

    #[error("Event reader thread panicked")]
    ReaderPanicked,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid threshold {name}: {value} (expected {expected})")]
    InvalidThreshold { name: &'static str, value: f64, expected: &'static str },

    #[error("top_n must be at least 1")]
    ZeroTopN,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::InvalidEvent { line: 12, message: "missing task".to_string() };
        assert_eq!(err.to_string(), "Invalid event at line 12: missing task");
    }

    #[test]
    fn test_ingest_error_display() {
        assert_eq!(IngestError::WorkerPanicked(3).to_string(), "Shard worker 3 panicked");
    }

    #[test]
    fn test_invalid_threshold_error() {
        let err = ConfigError::InvalidThreshold {
            name: "gc_percent",
            value: 150.0,
            expected: "a percentage in [0, 100]",
        };
        assert!(err.to_string().contains("gc_percent"));
        assert!(err.to_string().contains("150"));
    }
}
