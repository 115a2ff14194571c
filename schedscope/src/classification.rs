//! Blocking-reason classification for free-text decoder reasons.
//!
//! Decoders report why a task blocked as free text ("chan receive",
//! "sync.Mutex.Lock", "GC assist wait", ...). This module maps that text onto
//! the coarse [`BlockingReason`] taxonomy so blocked time can be aggregated.
//!
//! # Classification Strategy
//!
//! Case-insensitive substring match against ordered pattern tables. The first
//! table with a matching pattern wins, so more specific categories come first:
//!
//! 1. **Channels** - `chan receive`, `chan send`
//! 2. **Locks** - `mutex`, `lock`, `semacquire`
//! 3. **Syscalls**, **GC**, **select**, **network/poll**, **sleep/timer**
//! 4. **Generic sync** - `sync`, `cond`, `wait` (broadest, checked last)
//!
//! Anything else is [`BlockingReason::None`].

use log::debug;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

use crate::domain::BlockingReason;

// =============================================================================
// CLASSIFICATION TABLES
// =============================================================================

/// Pattern tables in priority order
const REASON_PATTERNS: &[(&[&str], BlockingReason)] = &[
    (&["chan receive", "channel receive", "chan recv"], BlockingReason::ChannelReceive),
    (&["chan send", "channel send"], BlockingReason::ChannelSend),
    (&["mutex", "lock", "semacquire"], BlockingReason::LockAcquire),
    (&["syscall"], BlockingReason::Syscall),
    (&["gc"], BlockingReason::GarbageCollection),
    (&["select"], BlockingReason::MultiplexedWait),
    (&["network", "poll"], BlockingReason::NetworkIo),
    (&["sleep", "timer"], BlockingReason::TimedSleep),
    (&["sync", "cond", "wait"], BlockingReason::GenericSync),
];

/// Classify a decoder's free-text blocking reason.
///
/// # Examples
///
/// ```
/// use schedscope::classification::classify_reason;
/// use schedscope::domain::BlockingReason;
///
/// assert_eq!(classify_reason("chan receive"), BlockingReason::ChannelReceive);
/// assert_eq!(classify_reason("sync.(*Mutex).Lock"), BlockingReason::LockAcquire);
/// assert_eq!(classify_reason("GC assist wait"), BlockingReason::GarbageCollection);
/// assert_eq!(classify_reason(""), BlockingReason::None);
/// ```
#[must_use]
pub fn classify_reason(reason: &str) -> BlockingReason {
    if reason.is_empty() {
        return BlockingReason::None;
    }

    let lowered = reason.to_lowercase();
    let classified = REASON_PATTERNS
        .iter()
        .find(|(patterns, _)| patterns.iter().any(|p| lowered.contains(p)))
        .map(|(_, category)| *category);

    diagnostics().record_classification(reason, classified.is_some());
    classified.unwrap_or(BlockingReason::None)
}

// =============================================================================
// CLASSIFICATION DIAGNOSTICS
// =============================================================================

/// Tracks how many decoder reasons fell through to [`BlockingReason::None`],
/// so an unfamiliar decoder vocabulary shows up in the logs.
pub struct ReasonDiagnostics {
    /// Reasons already logged (to avoid log spam)
    reported: Mutex<HashSet<String>>,
    classified: AtomicU64,
    unclassified: AtomicU64,
}

impl ReasonDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            reported: Mutex::new(HashSet::new()),
            classified: AtomicU64::new(0),
            unclassified: AtomicU64::new(0),
        }
    }

    /// Record one classification, logging each unrecognized reason once.
    pub fn record_classification(&self, reason: &str, recognized: bool) {
        if recognized {
            self.classified.fetch_add(1, Ordering::Relaxed);
            return;
        }

        self.unclassified.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut reported) = self.reported.lock() {
            if reported.insert(reason.to_owned()) {
                debug!("Unrecognized blocking reason '{reason}' - counted as 'none'");
            }
        }
    }

    /// Percentage of non-empty reasons that mapped to a known category.
    ///
    /// Returns 100.0 if nothing has been classified yet.
    #[allow(clippy::cast_precision_loss)]
    pub fn coverage(&self) -> f64 {
        let classified = self.classified.load(Ordering::Relaxed);
        let total = classified + self.unclassified.load(Ordering::Relaxed);
        if total > 0 {
            (classified as f64 / total as f64) * 100.0
        } else {
            100.0
        }
    }

    pub fn unclassified_count(&self) -> u64 {
        self.unclassified.load(Ordering::Relaxed)
    }
}

impl Default for ReasonDiagnostics {
    fn default() -> Self {
        Self::new()
    }
}

static DIAGNOSTICS: OnceLock<ReasonDiagnostics> = OnceLock::new();

/// Get the global reason classification diagnostics.
pub fn diagnostics() -> &'static ReasonDiagnostics {
    DIAGNOSTICS.get_or_init(ReasonDiagnostics::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_reasons() {
        assert_eq!(classify_reason("chan receive"), BlockingReason::ChannelReceive);
        assert_eq!(classify_reason("chan receive (nil chan)"), BlockingReason::ChannelReceive);
        assert_eq!(classify_reason("chan send"), BlockingReason::ChannelSend);
        assert_eq!(classify_reason("Chan Send"), BlockingReason::ChannelSend);
    }

    #[test]
    fn test_lock_reasons() {
        assert_eq!(classify_reason("sync.Mutex.Lock"), BlockingReason::LockAcquire);
        assert_eq!(classify_reason("semacquire"), BlockingReason::LockAcquire);
        assert_eq!(classify_reason("RWMutex"), BlockingReason::LockAcquire);
    }

    #[test]
    fn test_runtime_reasons() {
        assert_eq!(classify_reason("syscall"), BlockingReason::Syscall);
        assert_eq!(classify_reason("GC mark assist wait for work"), BlockingReason::GarbageCollection);
        assert_eq!(classify_reason("select"), BlockingReason::MultiplexedWait);
        assert_eq!(classify_reason("network"), BlockingReason::NetworkIo);
        assert_eq!(classify_reason("netpoll"), BlockingReason::NetworkIo);
        assert_eq!(classify_reason("sleep"), BlockingReason::TimedSleep);
        assert_eq!(classify_reason("timer goroutine (idle)"), BlockingReason::TimedSleep);
        assert_eq!(classify_reason("sync.(*Cond).Wait"), BlockingReason::GenericSync);
    }

    #[test]
    fn test_priority_channel_before_generic_wait() {
        // contains both "chan receive" and "wait"
        assert_eq!(classify_reason("wait on chan receive"), BlockingReason::ChannelReceive);
    }

    #[test]
    fn test_unknown_reason() {
        assert_eq!(classify_reason("preempted"), BlockingReason::None);
        assert_eq!(classify_reason(""), BlockingReason::None);
    }

    #[test]
    fn test_diagnostics_coverage() {
        let diag = ReasonDiagnostics::new();
        assert!((diag.coverage() - 100.0).abs() < f64::EPSILON);

        diag.record_classification("chan send", true);
        diag.record_classification("mystery", false);
        diag.record_classification("mystery", false);
        assert!((diag.coverage() - 33.333).abs() < 0.01);
        assert_eq!(diag.unclassified_count(), 2);
    }
}
