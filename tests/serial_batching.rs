//! Scenario 5 (serial batching): five hosts with serial=2 run in batches
//! of [h1,h2], [h3,h4], [h5]; a later batch's hosts must not be touched
//! before every host in the current batch has finished.

mod common;

use std::sync::Arc;

use rustible::prelude::*;

use common::{manager_with, play_from_blocks, RecordingCallback, ScriptedExecutor};

#[tokio::test]
async fn batches_partition_hosts_and_run_in_order() {
    let hosts = ["h1", "h2", "h3", "h4", "h5"];
    let executor = Arc::new(ScriptedExecutor::new());
    let callback = Arc::new(RecordingCallback::new());
    let manager = manager_with(Arc::clone(&executor), Arc::clone(&callback), 4);

    let mut play_arc = play_from_blocks(
        "serial",
        &hosts,
        vec![BlockSpec {
            block: vec![Task::new("T1", "debug")],
            ..Default::default()
        }],
        false,
    );
    Arc::get_mut(&mut play_arc).unwrap().serial = Some(Serial::Count(2));

    let batches = play_arc.host_batches().unwrap();
    assert_eq!(
        batches,
        vec![
            vec!["h1".to_string(), "h2".to_string()],
            vec!["h3".to_string(), "h4".to_string()],
            vec!["h5".to_string()],
        ]
    );

    manager.run_play(play_arc).await.unwrap();
    manager.shutdown().await;

    for host in hosts {
        assert_eq!(callback.results_for(host).len(), 1, "host {host} must run exactly once");
    }

    // Every host in an earlier batch must have been called before any host
    // in a later batch.
    let calls = executor.calls();
    let position_of = |h: &str| calls.iter().position(|(ch, _)| ch == h).unwrap();
    assert!(position_of("h1") < position_of("h3"));
    assert!(position_of("h2") < position_of("h3"));
    assert!(position_of("h3") < position_of("h5"));
    assert!(position_of("h4") < position_of("h5"));
}
