use jsonline_logger::{FutureExt, LogContext};
use pretty_assertions::assert_eq;
use serde_json::json;

pub mod common;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn scopes_follow_their_task_across_polls() {
    let tasks: Vec<_> = (0..4)
        .map(|task_id| {
            let context = LogContext::new().record("task_id", task_id);
            tokio::spawn(
                async move {
                    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                    // Whatever worker thread resumed us, the scope is ours.
                    LogContext::current()
                }
                .in_scope(context),
            )
        })
        .collect();

    for (task_id, task) in tasks.into_iter().enumerate() {
        let snapshot = task.await.unwrap();
        assert_eq!(snapshot, json!({"task_id": task_id}));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sibling_tasks_never_observe_each_other() {
    let loud = tokio::spawn(
        async {
            for _ in 0..50 {
                LogContext::add_record("noise", "yes");
                tokio::task::yield_now().await;
            }
            LogContext::current()
        }
        .in_scope(LogContext::new().record("owner", "loud")),
    );
    let quiet = tokio::spawn(
        async {
            for _ in 0..50 {
                tokio::task::yield_now().await;
            }
            LogContext::current()
        }
        .in_scope(LogContext::new().record("owner", "quiet")),
    );

    let loud_snapshot = loud.await.unwrap();
    let quiet_snapshot = quiet.await.unwrap();
    assert_eq!(loud_snapshot["owner"], "loud");
    assert_eq!(loud_snapshot["noise"], "yes");
    assert_eq!(quiet_snapshot, json!({"owner": "quiet"}));
}

#[test]
fn record_emission_sees_the_future_scope() {
    let (logger, sink, _clock) = common::frozen_logger();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();

    runtime.block_on(
        async move {
            logger.info("inside the scope");
        }
        .in_scope(LogContext::new().record("request_id", "req-42")),
    );

    let record: serde_json::Value = serde_json::from_str(&sink.lines()[0]).unwrap();
    assert_eq!(record["request_id"], "req-42");
}
