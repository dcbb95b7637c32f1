//! Boundary cases called out alongside the six named scenarios: empty task
//! lists, degenerate serial sizes, one-sided block branches, two-deep
//! nesting, and handler notify edge cases.

mod common;

use std::sync::Arc;

use rustible::prelude::*;

use common::{manager_with, play_from_blocks, simple_play, RecordingCallback, Script, ScriptedExecutor};

#[tokio::test]
async fn empty_task_list_completes_with_no_results() {
    let executor = Arc::new(ScriptedExecutor::new());
    let callback = Arc::new(RecordingCallback::new());
    let manager = manager_with(Arc::clone(&executor), Arc::clone(&callback), 4);

    let play = simple_play("empty", &["A", "B"], vec![]);

    manager.run_play(play).await.unwrap();
    manager.shutdown().await;

    assert!(executor.calls().is_empty());
    assert!(callback.results_for("A").is_empty());
    assert!(callback.results_for("B").is_empty());
}

#[tokio::test]
async fn single_host_runs_to_completion() {
    let executor = Arc::new(ScriptedExecutor::new());
    let callback = Arc::new(RecordingCallback::new());
    let manager = manager_with(Arc::clone(&executor), Arc::clone(&callback), 4);

    let play = simple_play("single", &["only"], vec![Task::new("T1", "debug")]);

    manager.run_play(play).await.unwrap();
    manager.shutdown().await;

    assert_eq!(
        callback.results_for("only"),
        vec![("T1".to_string(), TaskStatus::Ok)]
    );
}

#[test]
fn serial_100_percent_is_one_batch_of_everything() {
    let mut play_arc = play_from_blocks(
        "serial-100",
        &["h1", "h2", "h3"],
        vec![BlockSpec {
            block: vec![Task::new("T1", "debug")],
            ..Default::default()
        }],
        false,
    );
    Arc::get_mut(&mut play_arc).unwrap().serial = Some(Serial::Percent(100.0));

    let batches = play_arc.host_batches().unwrap();
    assert_eq!(
        batches,
        vec![vec!["h1".to_string(), "h2".to_string(), "h3".to_string()]]
    );
}

#[test]
fn serial_1_is_one_host_per_batch() {
    let mut play_arc = play_from_blocks(
        "serial-1",
        &["h1", "h2", "h3"],
        vec![BlockSpec {
            block: vec![Task::new("T1", "debug")],
            ..Default::default()
        }],
        false,
    );
    Arc::get_mut(&mut play_arc).unwrap().serial = Some(Serial::Count(1));

    let batches = play_arc.host_batches().unwrap();
    assert_eq!(
        batches,
        vec![
            vec!["h1".to_string()],
            vec!["h2".to_string()],
            vec!["h3".to_string()],
        ]
    );
}

#[tokio::test]
async fn rescue_with_no_always_runs_rescue_only_on_failure() {
    let executor = Arc::new(ScriptedExecutor::new());
    executor.script("A", "T1", Script::Failed("boom".into()));

    let callback = Arc::new(RecordingCallback::new());
    let manager = manager_with(Arc::clone(&executor), Arc::clone(&callback), 4);

    let play = play_from_blocks(
        "rescue-only",
        &["A", "B"],
        vec![BlockSpec {
            block: vec![Task::new("T1", "debug")],
            rescue: vec![Task::new("T2", "debug")],
            ..Default::default()
        }],
        false,
    );

    manager.run_play(play).await.unwrap();
    manager.shutdown().await;

    let a_calls: Vec<_> = executor
        .calls()
        .into_iter()
        .filter(|(h, _)| h == "A")
        .map(|(_, t)| t)
        .collect();
    assert_eq!(a_calls, vec!["T1".to_string(), "T2".to_string()]);

    let b_calls: Vec<_> = executor
        .calls()
        .into_iter()
        .filter(|(h, _)| h == "B")
        .map(|(_, t)| t)
        .collect();
    assert_eq!(b_calls, vec!["T1".to_string()]);
}

#[tokio::test]
async fn always_with_no_rescue_runs_unconditionally() {
    let executor = Arc::new(ScriptedExecutor::new());
    executor.script("A", "T1", Script::Failed("boom".into()));

    let callback = Arc::new(RecordingCallback::new());
    let manager = manager_with(Arc::clone(&executor), Arc::clone(&callback), 4);

    let play = play_from_blocks(
        "always-only",
        &["A", "B"],
        vec![BlockSpec {
            block: vec![Task::new("T1", "debug")],
            always: vec![Task::new("T2", "debug")],
            ..Default::default()
        }],
        false,
    );

    manager.run_play(play).await.unwrap();
    manager.shutdown().await;

    // Both hosts reach the always branch: A despite failing, B despite not.
    for host in ["A", "B"] {
        let calls: Vec<_> = executor
            .calls()
            .into_iter()
            .filter(|(h, _)| h == host)
            .map(|(_, t)| t)
            .collect();
        assert_eq!(calls, vec!["T1".to_string(), "T2".to_string()]);
    }
}

#[tokio::test]
async fn failed_host_never_enters_a_later_sibling_block() {
    let executor = Arc::new(ScriptedExecutor::new());
    executor.script("A", "T1", Script::Failed("boom".into()));

    let callback = Arc::new(RecordingCallback::new());
    let manager = manager_with(Arc::clone(&executor), Arc::clone(&callback), 4);

    let play = play_from_blocks(
        "no-later-sibling-after-failure",
        &["A", "B"],
        vec![
            BlockSpec {
                block: vec![Task::new("T1", "debug")],
                rescue: vec![Task::new("T2", "debug")],
                always: vec![Task::new("T3", "debug")],
                ..Default::default()
            },
            BlockSpec {
                block: vec![Task::new("T4", "debug")],
                ..Default::default()
            },
        ],
        false,
    );

    manager.run_play(play).await.unwrap();
    manager.shutdown().await;

    // A fails the first block's body, runs its rescue then always, and must
    // stop there — it never sees the second block's T4.
    let a_calls: Vec<_> = executor
        .calls()
        .into_iter()
        .filter(|(h, _)| h == "A")
        .map(|(_, t)| t)
        .collect();
    assert_eq!(a_calls, vec!["T1".to_string(), "T2".to_string(), "T3".to_string()]);

    // B never fails, so it runs straight through both blocks.
    let b_calls: Vec<_> = executor
        .calls()
        .into_iter()
        .filter(|(h, _)| h == "B")
        .map(|(_, t)| t)
        .collect();
    assert_eq!(
        b_calls,
        vec!["T1".to_string(), "T3".to_string(), "T4".to_string()]
    );
}

#[tokio::test]
async fn nested_blocks_two_deep_all_run_in_order() {
    let executor = Arc::new(ScriptedExecutor::new());
    let callback = Arc::new(RecordingCallback::new());
    let manager = manager_with(Arc::clone(&executor), Arc::clone(&callback), 4);

    let play = play_from_blocks(
        "nested",
        &["A"],
        vec![BlockSpec {
            nested: vec![
                BlockSpec {
                    block: vec![Task::new("outer1", "debug")],
                    ..Default::default()
                },
                BlockSpec {
                    nested: vec![BlockSpec {
                        block: vec![Task::new("inner1", "debug"), Task::new("inner2", "debug")],
                        ..Default::default()
                    }],
                    ..Default::default()
                },
            ],
            ..Default::default()
        }],
        false,
    );

    manager.run_play(play).await.unwrap();
    manager.shutdown().await;

    let names: Vec<_> = executor.calls().into_iter().map(|(_, t)| t).collect();
    assert_eq!(
        names,
        vec!["outer1".to_string(), "inner1".to_string(), "inner2".to_string()]
    );
}

#[tokio::test]
async fn handler_notified_by_a_failed_host_does_not_fire_for_it() {
    let executor = Arc::new(ScriptedExecutor::new());
    executor.script("A", "T2", Script::Failed("boom".into()));

    let callback = Arc::new(RecordingCallback::new());
    let manager = manager_with(Arc::clone(&executor), Arc::clone(&callback), 4);

    let t1 = Task::new("T1", "debug").with_notify(["H1"]);
    let t2 = Task::new("T2", "debug");

    let mut roles = Vec::new();
    let (tasks, blocks) = compile(
        vec![BlockSpec {
            block: vec![t1, t2],
            ..Default::default()
        }],
        &mut roles,
    );
    let handlers: Vec<Handler> = vec![Handler::new(Task::new("H1", "debug"))];

    let play = Arc::new(Play {
        name: "handler vs failure".into(),
        hosts: vec!["A".into(), "B".into()],
        gather_facts: false,
        serial: None,
        tasks: tasks.into(),
        blocks: blocks.into(),
        roles: roles.into(),
        handlers: Arc::from(handlers),
    });

    manager.run_play(play).await.unwrap();
    manager.shutdown().await;

    // Both A and B notify H1 via T1, but A then fails T2 and must not
    // receive the handler even though it's in the notified list.
    let h1_hosts: Vec<_> = executor
        .calls()
        .into_iter()
        .filter(|(_, t)| t == "H1")
        .map(|(h, _)| h)
        .collect();
    assert_eq!(h1_hosts, vec!["B".to_string()]);
}

#[tokio::test]
async fn duplicate_notifications_from_one_host_fire_the_handler_once() {
    let executor = Arc::new(ScriptedExecutor::new());
    let callback = Arc::new(RecordingCallback::new());
    let manager = manager_with(Arc::clone(&executor), Arc::clone(&callback), 4);

    let t1 = Task::new("T1", "debug").with_notify(["H1"]);
    let t2 = Task::new("T2", "debug").with_notify(["H1"]);

    let mut roles = Vec::new();
    let (tasks, blocks) = compile(
        vec![BlockSpec {
            block: vec![t1, t2],
            ..Default::default()
        }],
        &mut roles,
    );
    let handlers: Vec<Handler> = vec![Handler::new(Task::new("H1", "debug"))];

    let play = Arc::new(Play {
        name: "duplicate notify".into(),
        hosts: vec!["A".into()],
        gather_facts: false,
        serial: None,
        tasks: tasks.into(),
        blocks: blocks.into(),
        roles: roles.into(),
        handlers: Arc::from(handlers),
    });

    manager.run_play(play).await.unwrap();
    manager.shutdown().await;

    let h1_calls = executor
        .calls()
        .into_iter()
        .filter(|(h, t)| h == "A" && t == "H1")
        .count();
    assert_eq!(h1_calls, 1, "a host notifying twice still runs the handler once");
    assert_eq!(callback.handler_starts(), vec!["H1".to_string()]);
}
