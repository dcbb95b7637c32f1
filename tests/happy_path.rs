//! Scenario 1 (happy path): two hosts, two plain tasks, no failures.

mod common;

use std::sync::Arc;

use rustible::prelude::*;

use common::{manager_with, simple_play, RecordingCallback, ScriptedExecutor};

#[tokio::test]
async fn both_hosts_complete_with_no_failures() {
    let executor = Arc::new(ScriptedExecutor::new());
    let callback = Arc::new(RecordingCallback::new());
    let manager = manager_with(Arc::clone(&executor), Arc::clone(&callback), 4);

    let play = simple_play(
        "happy path",
        &["A", "B"],
        vec![Task::new("T1", "debug"), Task::new("T2", "debug")],
    );

    manager.run_play(play).await.unwrap();
    manager.shutdown().await;

    assert_eq!(callback.results_for("A").len(), 2);
    assert_eq!(callback.results_for("B").len(), 2);
    for (_, status) in callback.results_for("A").into_iter().chain(callback.results_for("B")) {
        assert_eq!(status, TaskStatus::Ok);
    }

    // Four task-jobs total: one T1 and one T2 per host.
    assert_eq!(executor.calls().len(), 4);
}
