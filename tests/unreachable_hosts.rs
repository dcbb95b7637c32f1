//! Scenario 3 (unreachable removes host): a host unreachable on T1 is
//! excluded from every task that follows, and never revisited by cleanup.

mod common;

use std::sync::Arc;

use rustible::prelude::*;

use common::{manager_with, simple_play, RecordingCallback, Script, ScriptedExecutor};

#[tokio::test]
async fn unreachable_host_is_excluded_from_later_tasks() {
    let executor = Arc::new(ScriptedExecutor::new());
    executor.script("B", "T1", Script::Unreachable("no route to host".into()));

    let callback = Arc::new(RecordingCallback::new());
    let manager = manager_with(Arc::clone(&executor), Arc::clone(&callback), 4);

    let play = simple_play(
        "unreachable",
        &["A", "B", "C"],
        vec![Task::new("T1", "debug"), Task::new("T2", "debug")],
    );

    manager.run_play(play).await.unwrap();
    manager.shutdown().await;

    let b_results = callback.results_for("B");
    assert_eq!(b_results.len(), 1);
    assert_eq!(b_results[0], ("T1".to_string(), TaskStatus::Unreachable));

    assert_eq!(callback.results_for("A").len(), 2);
    assert_eq!(callback.results_for("C").len(), 2);

    let b_calls = executor
        .calls()
        .into_iter()
        .filter(|(h, _)| h == "B")
        .count();
    assert_eq!(b_calls, 1, "B must never be asked to run T2 or rescue/always");
}
