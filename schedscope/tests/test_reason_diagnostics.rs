//! Reason classification counters are process-global, so this file holds a
//! single test to keep other tests from touching them concurrently.

use schedscope::classification::diagnostics;
use schedscope::domain::{BlockingReason, Resource, State, StateTransition, TaskId, Timestamp, TraceEvent};
use schedscope::tracker::StateTracker;

fn transition(ts: u64, from: State, to: State, reason: &str) -> TraceEvent {
    TraceEvent::Transition(StateTransition {
        resource: Resource::Task(TaskId(1)),
        timestamp: Timestamp(ts),
        from,
        to,
        reason: reason.to_string(),
    })
}

#[test]
fn test_only_blocking_transitions_are_classified() {
    let mut tracker = StateTracker::new();

    tracker.apply(transition(0, State::Runnable, State::Running, "scheduled"));
    tracker.apply(transition(10, State::Running, State::Runnable, "preempted"));
    tracker.apply(transition(20, State::Runnable, State::Running, ""));
    assert_eq!(diagnostics().unclassified_count(), 0);

    tracker.apply(transition(30, State::Running, State::Blocked, "parked by runtime"));
    tracker.apply(transition(45, State::Blocked, State::Runnable, "woken by peer"));
    assert_eq!(diagnostics().unclassified_count(), 1);

    let task = tracker.task(TaskId(1)).unwrap();
    assert_eq!(task.total_blocked().0, 15);
    assert_eq!(task.blocking_intervals()[0].reason, BlockingReason::None);
}
