//! # schedscope - Main Entry Point
//!
//! Three subcommands over the same run:
//! - **analyze**: summary, top offenders and detected issues (text or JSON)
//! - **insights**: one explained observation per issue
//! - **inspect**: the full timeline of a single task

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::io::{self, BufRead, BufReader, Write};

use schedscope::analysis::generate_insights;
use schedscope::classification::diagnostics;
use schedscope::cli::{Args, Command, TraceArgs};
use schedscope::config::Config;
use schedscope::domain::TaskId;
use schedscope::report::{self, AnalysisReport, ReasonListing};
use schedscope::session::{self, Analysis};
use schedscope::source::JsonLinesSource;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_ISSUES: i32 = 2;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_ERROR
        }
    });
}

fn run() -> Result<i32> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    args.apply_overrides(&mut config)?;

    let analysis = analyze_trace(args.command.trace(), &config)?;
    let mut stdout = io::stdout().lock();

    let code = match &args.command {
        Command::Analyze { json, reason, .. } => {
            let listing =
                reason.map(|r| ReasonListing::new(&analysis, r, config.analysis.top_n));
            if *json {
                serde_json::to_writer_pretty(&mut stdout, &AnalysisReport::new(&analysis, listing))
                    .context("Failed to write JSON report")?;
                writeln!(stdout)?;
            } else {
                report::write_summary(&mut stdout, &analysis)?;
                if let Some(listing) = &listing {
                    report::write_reason_listing(&mut stdout, listing)?;
                }
            }
            if analysis.summary.has_performance_issues {
                EXIT_ISSUES
            } else {
                EXIT_SUCCESS
            }
        }
        Command::Insights { .. } => {
            report::write_insights(&mut stdout, &generate_insights(&analysis.summary))?;
            EXIT_SUCCESS
        }
        Command::Inspect { task, json, .. } => {
            let task = analysis
                .task(TaskId(*task))
                .with_context(|| format!("{} does not appear in the trace", TaskId(*task)))?;
            if *json {
                serde_json::to_writer_pretty(&mut stdout, task)
                    .context("Failed to write JSON task")?;
                writeln!(stdout)?;
            } else {
                report::write_task(&mut stdout, task)?;
            }
            EXIT_SUCCESS
        }
    };

    stdout.flush()?;
    Ok(code)
}

fn analyze_trace(trace: &TraceArgs, config: &Config) -> Result<Analysis> {
    let reader: Box<dyn BufRead + Send> = if trace.is_stdin() {
        info!("Reading trace from stdin");
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = std::fs::File::open(&trace.path)
            .with_context(|| format!("Failed to open trace: {}", trace.path.display()))?;
        Box::new(BufReader::new(file))
    };

    let analysis = session::run(JsonLinesSource::new(reader), config)
        .context("Failed to ingest trace")?;

    for error in &analysis.errors {
        warn!("{error}");
    }
    let unclassified = diagnostics().unclassified_count();
    if unclassified > 0 {
        info!(
            "{unclassified} blocking reasons were not recognized ({:.1}% classified)",
            diagnostics().coverage()
        );
    }

    Ok(analysis)
}
