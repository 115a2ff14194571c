//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::domain::{BlockingReason, ConfigError};

#[derive(Parser, Debug)]
#[command(
    name = "schedscope",
    version,
    about = "Reconstruct task timelines from a scheduler trace and flag bottlenecks",
    after_help = "\
EXAMPLES:
    schedscope analyze trace.jsonl                 Summary and detected issues
    schedscope analyze --json trace.jsonl          Summary as JSON
    schedscope analyze --reason lock_acquire t.jsonl  Longest lock waits
    schedscope insights - < trace.jsonl            Read the trace from stdin
    schedscope inspect --task 42 trace.jsonl       Timeline of a single task

EXIT STATUS:
    0  no issues detected
    1  error
    2  performance issues detected (analyze only)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Number of shard workers (default: available parallelism)
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Bounded queue size per shard worker
    #[arg(long, global = true, value_name = "EVENTS")]
    pub queue_capacity: Option<usize>,

    /// TOML file with pipeline settings and rule thresholds
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the aggregate summary and detected issues
    Analyze {
        #[command(flatten)]
        trace: TraceArgs,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,

        /// Number of most-blocked tasks to list (overrides the config file)
        #[arg(long, value_name = "N")]
        top: Option<usize>,

        /// Also list the tasks blocked longest on this reason (e.g. `lock_acquire`)
        #[arg(long, value_name = "REASON")]
        reason: Option<BlockingReason>,
    },

    /// Explain detected issues with suggestions
    Insights {
        #[command(flatten)]
        trace: TraceArgs,
    },

    /// Show the full timeline of one task
    Inspect {
        #[command(flatten)]
        trace: TraceArgs,

        /// Task id to show
        #[arg(short, long, value_name = "ID")]
        task: u64,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug)]
pub struct TraceArgs {
    /// JSON-lines trace file, or `-` for stdin
    #[arg(value_name = "TRACE")]
    pub path: PathBuf,
}

impl TraceArgs {
    #[must_use]
    pub fn is_stdin(&self) -> bool {
        self.path.as_os_str() == "-"
    }
}

impl Command {
    #[must_use]
    pub fn trace(&self) -> &TraceArgs {
        match self {
            Command::Analyze { trace, .. }
            | Command::Insights { trace }
            | Command::Inspect { trace, .. } => trace,
        }
    }
}

impl Args {
    /// Apply command-line overrides on top of `config` and validate the
    /// result.
    ///
    /// # Errors
    /// Returns an error if an override leaves the config out of range.
    pub fn apply_overrides(&self, config: &mut Config) -> Result<(), ConfigError> {
        if let Some(workers) = self.workers {
            config.pipeline.workers = workers;
        }
        if let Some(capacity) = self.queue_capacity {
            config.pipeline.queue_capacity = capacity;
        }
        if let Command::Analyze { top: Some(top), .. } = self.command {
            config.analysis.top_n = top;
        }
        config.analysis.validate()
    }
}
