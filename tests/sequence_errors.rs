// tests/sequence_errors.rs

use std::time::{Duration, Instant};

use seqrun::{Sequence, SequenceEvent, Step};
use seqrun_test_utils::recorder::EventLog;
use seqrun_test_utils::steps::{Probe, failing_step, panicking_step};
use seqrun_test_utils::{init_tracing, settle};

#[derive(Debug)]
struct QuotaExceeded {
    used: u32,
}

impl std::fmt::Display for QuotaExceeded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "quota exceeded ({} used)", self.used)
    }
}

impl std::error::Error for QuotaExceeded {}

#[tokio::test]
async fn failing_step_emits_error_and_halts() {
    init_tracing();

    let probe = Probe::new();
    let seq = Sequence::new();
    seq.next(probe.step("ok"))
        .next(probe.failing("bad", "foo"))
        .next(probe.step("unreached"));

    let log = EventLog::attach(&seq);
    seq.start();

    let event = log.wait_for("error").await;
    settle().await;

    match event {
        SequenceEvent::Error(reason) => assert_eq!(reason.to_string(), "foo"),
        other => panic!("expected error, got {other:?}"),
    }
    assert_eq!(probe.calls(), vec!["ok", "bad"]);
    assert_eq!(log.names(), vec!["started", "error"]);
    assert_eq!(seq.position(), 1);
    assert!(!seq.is_running());
}

#[tokio::test]
async fn delayed_rejection_surfaces_after_the_delay() {
    init_tracing();

    let seq = Sequence::new();
    let begin = Instant::now();
    seq.delay(Duration::from_millis(50))
        .next(failing_step("foo"))
        .start();

    let log = EventLog::attach(&seq);
    let event = log.wait_for("error").await;

    assert!(begin.elapsed() >= Duration::from_millis(50));
    let SequenceEvent::Error(reason) = event else {
        panic!("expected error event");
    };
    assert_eq!(reason.to_string(), "foo");

    settle().await;
    assert_eq!(log.count("finished"), 0);
}

#[tokio::test]
async fn panicking_step_is_reported_as_failure() {
    init_tracing();

    let probe = Probe::new();
    let seq = Sequence::new();
    seq.next(panicking_step("kaboom")).next(probe.step("unreached"));

    let log = EventLog::attach(&seq);
    seq.start();

    let SequenceEvent::Error(reason) = log.wait_for("error").await else {
        panic!("expected error event");
    };
    assert!(reason.to_string().contains("kaboom"));
    settle().await;
    assert!(probe.calls().is_empty());
}

#[tokio::test]
async fn typed_failure_reason_is_forwarded_unchanged() {
    init_tracing();

    let seq = Sequence::new();
    seq.next(Step::new(|| async {
        Err(anyhow::Error::new(QuotaExceeded { used: 7 }))
    }));

    let mut rx = seq.subscribe();
    seq.start();

    let mut reason = None;
    while let Ok(event) = rx.recv().await {
        if let SequenceEvent::Error(r) = event {
            reason = Some(r);
            break;
        }
    }

    let reason = reason.expect("error event");
    let quota = reason
        .downcast_ref::<QuotaExceeded>()
        .expect("reason keeps its concrete type");
    assert_eq!(quota.used, 7);
}

#[tokio::test]
async fn start_after_failure_retries_the_failed_step() {
    init_tracing();

    let probe = Probe::new();
    let seq = Sequence::new();
    seq.next(probe.failing("flaky", "first attempt"));

    let log = EventLog::attach(&seq);
    seq.start();
    log.wait_for("error").await;

    seq.start();
    settle().await;

    assert_eq!(probe.calls(), vec!["flaky", "flaky"]);
    assert_eq!(log.names(), vec!["started", "error", "progress", "error"]);
}
