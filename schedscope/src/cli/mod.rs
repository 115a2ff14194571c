//! Command-line interface for schedscope
//!
//! Argument parsing plus the mapping from flags onto [`crate::config::Config`].

pub mod args;

pub use args::{Args, Command, TraceArgs};
