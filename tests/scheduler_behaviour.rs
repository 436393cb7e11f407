// tests/scheduler_behaviour.rs

use std::time::{Duration, Instant};

use seqrun::errors::SeqrunError;
use seqrun::{Scheduler, SchedulerEvent, Sequence, SequenceEvent};
use seqrun_test_utils::recorder::EventLog;
use seqrun_test_utils::steps::{Gate, Probe, failing_step};
use seqrun_test_utils::{init_tracing, settle, with_timeout};

#[tokio::test]
async fn empty_scheduler_finishes_on_start() {
    init_tracing();

    let sch = Scheduler::new();
    sch.start();

    let log = EventLog::attach_scheduler(&sch);
    log.wait_for("finished").await;
    settle().await;

    assert_eq!(log.names(), vec!["started", "finished"]);
    assert_eq!(sch.completed(), 0);
}

#[tokio::test]
async fn empty_sequences_finish_the_scheduler() {
    init_tracing();

    let sch = Scheduler::new();
    let seq1 = Sequence::new();
    let seq2 = Sequence::new();

    sch.add(&seq1).add(&seq2).start();

    let log = EventLog::attach_scheduler(&sch);
    log.wait_for("finished").await;

    assert_eq!(sch.completed(), 2);
    assert_eq!(sch.len(), 2);
}

#[tokio::test]
async fn named_sequences_are_reachable() {
    init_tracing();

    let sch = Scheduler::new();
    let seq = Sequence::new();
    sch.set("seq", &seq);

    let named = sch.get("seq").expect("named sequence");
    let log = EventLog::attach(&seq);
    named.start();
    log.wait_for("finished").await;

    assert!(sch.get("missing").is_none());
    assert_eq!(sch.names(), vec!["seq".to_string()]);
}

#[tokio::test]
async fn waits_for_all_sequences() {
    init_tracing();

    let sch = Scheduler::new();
    let seq1 = Sequence::new();
    let seq2 = Sequence::new();
    seq1.delay(Duration::from_millis(100));
    seq2.delay(Duration::from_millis(300));

    let begin = Instant::now();
    sch.add(&seq1).set("seq2", &seq2).start();

    let log = EventLog::attach_scheduler(&sch);
    log.wait_for("finished").await;
    let elapsed = begin.elapsed();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(elapsed >= Duration::from_millis(300), "finished after {elapsed:?}");
    assert_eq!(log.count("finished"), 1);
    assert!(!sch.has_failed());
}

#[tokio::test]
async fn finished_fires_once_regardless_of_completion_order() {
    init_tracing();

    let probe = Probe::new();
    let gates: Vec<Gate> = (0..3).map(|_| Gate::new()).collect();
    let sch = Scheduler::new();
    let seqs: Vec<Sequence> = gates
        .iter()
        .enumerate()
        .map(|(i, gate)| {
            let seq = Sequence::new();
            seq.next(probe.gated(&format!("s{i}"), gate));
            sch.add(&seq);
            seq
        })
        .collect();

    let log = EventLog::attach_scheduler(&sch);
    sch.start();
    settle().await;

    for i in [2, 0] {
        gates[i].open();
        settle().await;
        assert_eq!(log.count("finished"), 0);
    }
    gates[1].open();
    log.wait_for("finished").await;
    settle().await;

    assert_eq!(log.count("finished"), 1);
    assert_eq!(sch.completed(), 3);
    assert!(seqs.iter().all(|s| s.is_finished()));
}

#[tokio::test]
async fn restarted_sequence_is_counted_once() {
    init_tracing();

    let gate = Gate::new();
    let probe = Probe::new();
    let sch = Scheduler::new();
    let quick = Sequence::named("quick");
    let slow = Sequence::named("slow");
    slow.next(probe.gated("slow", &gate));
    sch.add(&quick).add(&slow);

    let quick_log = EventLog::attach(&quick);
    let log = EventLog::attach_scheduler(&sch);
    sch.start();
    quick_log.wait_for("finished").await;

    quick.start();
    quick.start();
    settle().await;

    assert_eq!(quick_log.count("finished"), 3);
    assert_eq!(sch.completed(), 1);
    assert_eq!(log.count("finished"), 0);

    gate.open();
    log.wait_for("finished").await;
    settle().await;
    assert_eq!(log.count("finished"), 1);
    assert_eq!(sch.completed(), 2);
}

#[tokio::test]
async fn stops_globally() {
    init_tracing();

    let sch = Scheduler::new();
    let seq1 = Sequence::new();
    let seq2 = Sequence::new();
    seq1.delay(Duration::from_millis(100));
    seq2.delay(Duration::from_millis(300));

    sch.add(&seq1).set("seq2", &seq2).start();

    let stopper = sch.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(70)).await;
        stopper.stop();
    });

    let log = EventLog::attach_scheduler(&sch);
    log.wait_for("stopped").await;

    assert!(seq1.is_stopped());
    assert!(seq2.is_stopped());

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(log.count("finished"), 0);
}

#[tokio::test]
async fn forwards_the_failure_reason() {
    init_tracing();

    let sch = Scheduler::new();
    let seq = Sequence::new();
    seq.delay(Duration::from_millis(50)).next(failing_step("foo"));

    let seq_log = EventLog::attach(&seq);
    sch.add(&seq).start();

    let log = EventLog::attach_scheduler(&sch);
    let SchedulerEvent::Error(forwarded) = log.wait_for("error").await else {
        panic!("expected scheduler error");
    };
    assert_eq!(forwarded.to_string(), "foo");

    let SequenceEvent::Error(original) = seq_log.wait_for("error").await else {
        panic!("expected sequence error");
    };
    assert!(forwarded.ptr_eq(&original));
}

#[tokio::test]
async fn failure_does_not_stop_siblings() {
    init_tracing();

    let probe = Probe::new();
    let sch = Scheduler::new();
    let failing = Sequence::new();
    failing.next(failing_step("boom"));
    let sibling = Sequence::new();
    sibling
        .delay(Duration::from_millis(30))
        .next(probe.step("sibling-done"));

    sch.add(&failing).add(&sibling);
    let log = EventLog::attach_scheduler(&sch);
    let sibling_log = EventLog::attach(&sibling);
    sch.start();

    log.wait_for("error").await;
    sibling_log.wait_for("finished").await;
    settle().await;

    assert_eq!(probe.calls(), vec!["sibling-done"]);
    assert!(!sibling.is_stopped());
    assert_eq!(log.count("finished"), 0);
}

#[tokio::test]
async fn only_the_first_failure_is_forwarded() {
    init_tracing();

    let sch = Scheduler::new();
    let first = Sequence::new();
    first.next(failing_step("first"));
    let second = Sequence::new();
    second
        .delay(Duration::from_millis(30))
        .next(failing_step("second"));
    let second_log = EventLog::attach(&second);

    sch.add(&first).add(&second);
    let log = EventLog::attach_scheduler(&sch);
    sch.start();

    second_log.wait_for("error").await;
    settle().await;

    assert_eq!(log.count("error"), 1);
    assert!(sch.has_failed());
    let SchedulerEvent::Error(reason) = log.wait_for("error").await else {
        panic!("expected scheduler error");
    };
    assert_eq!(reason.to_string(), "first");
}

#[tokio::test]
async fn run_resolves_with_the_outcome() {
    init_tracing();

    let ok = Scheduler::new();
    let seq = Sequence::new();
    seq.delay(Duration::from_millis(10));
    ok.add(&seq);
    with_timeout(ok.run()).await.expect("scheduler finishes");

    let failing = Scheduler::new();
    let bad = Sequence::new();
    bad.next(failing_step("nope"));
    failing.add(&bad);
    match with_timeout(failing.run()).await {
        Err(SeqrunError::StepFailed(reason)) => assert_eq!(reason.to_string(), "nope"),
        other => panic!("expected StepFailed, got {other:?}"),
    }

    let stopped = Scheduler::new();
    let long = Sequence::new();
    long.delay(Duration::from_secs(2));
    stopped.add(&long);
    stopped.stop();
    // `stop` is deferred, so it lands after `run` subscribed.
    match with_timeout(stopped.run()).await {
        Err(SeqrunError::Stopped) => {}
        other => panic!("expected Stopped, got {other:?}"),
    }
}

#[tokio::test]
async fn dropped_scheduler_leaves_sequences_usable() {
    init_tracing();

    let seq = Sequence::new();
    {
        let sch = Scheduler::new();
        sch.add(&seq);
    }

    let log = EventLog::attach(&seq);
    seq.start();
    log.wait_for("finished").await;
}
