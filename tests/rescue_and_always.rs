//! Scenario 2 (rescue fires): one block, T1 fails on A and succeeds on B;
//! A must run rescue then always, B must skip rescue and run only always.

mod common;

use std::sync::Arc;

use rustible::prelude::*;

use common::{manager_with, play_from_blocks, RecordingCallback, Script, ScriptedExecutor};

#[tokio::test]
async fn failing_host_runs_rescue_then_always_others_skip_rescue() {
    let executor = Arc::new(ScriptedExecutor::new());
    executor.script("A", "T1", Script::Failed("boom".into()));

    let callback = Arc::new(RecordingCallback::new());
    let manager = manager_with(Arc::clone(&executor), Arc::clone(&callback), 4);

    let play = play_from_blocks(
        "rescue fires",
        &["A", "B"],
        vec![BlockSpec {
            block: vec![Task::new("T1", "debug")],
            rescue: vec![Task::new("T2", "debug")],
            always: vec![Task::new("T3", "debug")],
            ..Default::default()
        }],
        false,
    );

    manager.run_play(play).await.unwrap();
    manager.shutdown().await;

    let a_calls: Vec<String> = executor
        .calls()
        .into_iter()
        .filter(|(h, _)| h == "A")
        .map(|(_, t)| t)
        .collect();
    assert_eq!(a_calls, vec!["T1", "T2", "T3"]);

    let b_calls: Vec<String> = executor
        .calls()
        .into_iter()
        .filter(|(h, _)| h == "B")
        .map(|(_, t)| t)
        .collect();
    assert_eq!(b_calls, vec!["T1", "T3"]);

    let a_results = callback.results_for("A");
    assert_eq!(a_results[0], ("T1".to_string(), TaskStatus::Failed));
    assert_eq!(a_results[1], ("T2".to_string(), TaskStatus::Ok));
    assert_eq!(a_results[2], ("T3".to_string(), TaskStatus::Ok));
}
