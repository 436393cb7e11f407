// tests/plan_execution.rs

use std::time::Duration;

use seqrun::errors::SeqrunError;
use seqrun::exec::{build_scheduler, command_step};
use seqrun::{SchedulerEvent, Sequence, SequenceEvent};
use seqrun_test_utils::builders::{PlanBuilder, SequenceConfigBuilder};
use seqrun_test_utils::recorder::EventLog;
use seqrun_test_utils::{init_tracing, with_timeout};

#[tokio::test]
async fn registers_only_runnable_sequences_by_name() {
    init_tracing();

    let plan = PlanBuilder::new()
        .with_sequence("a", SequenceConfigBuilder::new().delay_ms(5).build())
        .with_sequence("b", SequenceConfigBuilder::new().delay_ms(5).build())
        .with_sequence(
            "helper",
            SequenceConfigBuilder::new().run(false).delay_ms(5).build(),
        )
        .build();

    let sch = build_scheduler(&plan, None).unwrap();

    assert_eq!(sch.names(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(sch.get("a").and_then(|s| s.name().map(str::to_string)), Some("a".into()));
    with_timeout(sch.run()).await.unwrap();
    assert_eq!(sch.completed(), 2);
}

#[tokio::test]
async fn include_splices_the_target_steps() {
    init_tracing();

    let plan = PlanBuilder::new()
        .with_sequence(
            "main",
            SequenceConfigBuilder::new()
                .delay_ms(1)
                .include("shared")
                .delay_ms(1)
                .build(),
        )
        .with_sequence(
            "shared",
            SequenceConfigBuilder::new()
                .run(false)
                .delay_ms(1)
                .delay_ms(1)
                .build(),
        )
        .build();

    let sch = build_scheduler(&plan, None).unwrap();
    let main = sch.get("main").unwrap();
    assert_eq!(main.len(), 4);
    assert!(sch.get("shared").is_none());
}

#[tokio::test]
async fn only_selects_a_single_sequence() {
    init_tracing();

    let plan = PlanBuilder::new()
        .with_sequence("a", SequenceConfigBuilder::new().delay_ms(1).build())
        .with_sequence("b", SequenceConfigBuilder::new().fail("b fails").build())
        .build();

    let sch = build_scheduler(&plan, Some("a")).unwrap();
    assert_eq!(sch.len(), 1);
    with_timeout(sch.run()).await.unwrap();

    match build_scheduler(&plan, Some("zzz")) {
        Err(SeqrunError::UnknownSequence(name)) => assert_eq!(name, "zzz"),
        other => panic!("expected UnknownSequence, got {other:?}"),
    }
}

#[tokio::test]
async fn fail_step_fails_the_scheduler() {
    init_tracing();

    let plan = PlanBuilder::new()
        .with_sequence("doomed", SequenceConfigBuilder::new().delay_ms(5).fail("planned failure").build())
        .with_sequence("fine", SequenceConfigBuilder::new().delay_ms(5).build())
        .build();

    let sch = build_scheduler(&plan, None).unwrap();
    let log = EventLog::attach_scheduler(&sch);

    match with_timeout(sch.run()).await {
        Err(SeqrunError::StepFailed(reason)) => assert_eq!(reason.to_string(), "planned failure"),
        other => panic!("expected StepFailed, got {other:?}"),
    }
    assert!(matches!(log.wait_for("error").await, SchedulerEvent::Error(_)));
}

#[tokio::test]
async fn stop_after_style_stop_interrupts_a_long_plan() {
    init_tracing();

    let plan = PlanBuilder::new()
        .with_stop_after(Duration::from_millis(20))
        .with_sequence("long", SequenceConfigBuilder::new().delay_ms(2_000).build())
        .build();

    let sch = build_scheduler(&plan, None).unwrap();
    let stopper = sch.clone();
    let after = plan.config().stop_after.unwrap().as_duration();
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        stopper.stop();
    });

    assert!(matches!(with_timeout(sch.run()).await, Err(SeqrunError::Stopped)));
}

#[cfg(unix)]
#[tokio::test]
async fn command_steps_succeed_and_fail_on_exit_status() {
    init_tracing();

    let ok = Sequence::new();
    ok.next(command_step("echo hello")).next(command_step("true"));
    let ok_log = EventLog::attach(&ok);
    ok.start();
    ok_log.wait_for("finished").await;

    let bad = Sequence::new();
    bad.next(command_step("exit 3")).next(command_step("echo unreachable"));
    let bad_log = EventLog::attach(&bad);
    bad.start();

    let SequenceEvent::Error(reason) = bad_log.wait_for("error").await else {
        panic!("expected error event");
    };
    let message = reason.to_string();
    assert!(message.contains("exit 3"), "{message}");
    assert!(message.contains("status 3"), "{message}");
    assert_eq!(bad.position(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn plan_with_commands_runs_end_to_end() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran");
    let cmd = format!("touch {}", marker.display());

    let plan = PlanBuilder::new()
        .with_sequence("touch", SequenceConfigBuilder::new().cmd(&cmd).build())
        .build();

    let sch = build_scheduler(&plan, None).unwrap();
    with_timeout(sch.run()).await.unwrap();

    assert!(marker.exists());
}
