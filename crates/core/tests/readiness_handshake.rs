//! Readiness handshake integration tests.
//!
//! Time is paused, so dispatch instants recorded by the mock coordinator are
//! exact multiples of the poll interval.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use holosync_core::{
    testing::MockCoordinator, CoordinatorError, ReadinessConfig, ReadinessCoordinator,
    ReadinessError, ReadinessPhase, ReadinessStatus, POLL_INTERVAL,
};

fn coordinator(mock: &Arc<MockCoordinator>) -> ReadinessCoordinator {
    ReadinessCoordinator::new(mock.clone(), ReadinessConfig::default())
}

#[tokio::test(start_paused = true)]
async fn test_scenario_three_polls_until_begin() {
    let mock = Arc::new(MockCoordinator::new());
    mock.push_status(ReadinessStatus::waiting(1)).await;
    mock.push_status(ReadinessStatus::waiting(2)).await;
    mock.push_status(ReadinessStatus::started(3)).await;

    let mut readiness = coordinator(&mock);
    let outcome = readiness
        .run(&CancellationToken::new())
        .await
        .expect("handshake failed");

    assert_eq!(outcome.polls, 3);
    assert_eq!(outcome.ready_devices, 3);
    assert_eq!(readiness.phase(), ReadinessPhase::Started);
    assert_eq!(mock.announce_count().await, 1);

    let dispatches = mock.status_dispatches().await;
    assert_eq!(dispatches.len(), 3);
    for pair in dispatches.windows(2) {
        assert!(pair[1] - pair[0] >= POLL_INTERVAL);
    }
}

#[tokio::test(start_paused = true)]
async fn test_transient_poll_failures_are_retried() {
    let mock = Arc::new(MockCoordinator::new());
    mock.push_status_error(CoordinatorError::Network("reset".into()))
        .await;
    mock.push_status_error(CoordinatorError::Timeout("/getStatus".into()))
        .await;
    mock.push_status(ReadinessStatus::started(5)).await;

    let outcome = coordinator(&mock)
        .run(&CancellationToken::new())
        .await
        .expect("handshake failed");
    assert_eq!(outcome.polls, 3);
    assert_eq!(outcome.ready_devices, 5);
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_status_service_gives_up() {
    let mock = Arc::new(MockCoordinator::new());
    let policy = ReadinessConfig {
        max_consecutive_failures: 3,
        ..Default::default()
    };
    for _ in 0..3 {
        mock.push_status_error(CoordinatorError::Network("refused".into()))
            .await;
    }

    let mut readiness = ReadinessCoordinator::new(mock.clone(), policy);
    let err = readiness.run(&CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, ReadinessError::PollFailed { attempts: 3, .. }));
    assert_eq!(readiness.phase(), ReadinessPhase::Aborted);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_from_another_task() {
    let mock = Arc::new(MockCoordinator::new());
    let cancel = CancellationToken::new();

    let mut readiness = coordinator(&mock);
    let task = {
        let cancel = cancel.clone();
        tokio::spawn(async move { readiness.run(&cancel).await })
    };

    tokio::time::sleep(Duration::from_secs(2)).await;
    cancel.cancel();

    let result = task.await.expect("task panicked");
    assert!(matches!(result, Err(ReadinessError::Cancelled)));
    // Never completes on "waiting" responses alone.
    assert!(mock.status_dispatches().await.len() >= 8);
}
