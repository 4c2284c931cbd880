use super::*;

use shared::{
    error::{ErrorCode, SIMULATED_FAILURE_MESSAGE},
    protocol::NoticeLevel,
};
use tokio::sync::broadcast::error::RecvError;

struct FixedOutcome(TransferOutcome);

impl OutcomeSource for FixedOutcome {
    fn draw(&self) -> TransferOutcome {
        self.0
    }
}

fn orchestrator(outcome: TransferOutcome) -> Arc<TransferOrchestrator> {
    TransferOrchestrator::new_with_outcome_source(
        RunTimings::default(),
        Arc::new(FixedOutcome(outcome)),
        256,
    )
}

fn source() -> SourceConfig {
    SourceConfig {
        db_name: "Sales".into(),
        schema_name: "dbo".into(),
        table_name: "Orders".into(),
        host_url: "sqlserver://db.internal:1433".into(),
        username: Some("etl".into()),
        password: None,
    }
}

fn destination() -> DestinationConfig {
    DestinationConfig {
        project_id: "analytics-prod".into(),
        dataset_id: "sales".into(),
        table_id: "orders_raw".into(),
        auth_json: None,
    }
}

async fn events_until_completed(
    rx: &mut broadcast::Receiver<TransferEvent>,
) -> (Vec<TransferEvent>, HistoryEntry) {
    let mut seen = Vec::new();
    loop {
        let event = rx.recv().await.expect("event stream");
        if let TransferEvent::Completed { entry } = &event {
            let entry = entry.clone();
            seen.push(event);
            return (seen, entry);
        }
        seen.push(event);
    }
}

#[tokio::test(start_paused = true)]
async fn incomplete_source_leaves_state_untouched() {
    let orchestrator = orchestrator(TransferOutcome::Success);
    let mut rx = orchestrator.subscribe();
    let partial = SourceConfig {
        schema_name: String::new(),
        ..source()
    };

    let err = orchestrator
        .start(
            &partial,
            &destination(),
            Some(TransferDirection::SourceToDestination),
        )
        .await
        .expect_err("should reject");

    match &err {
        TransferError::ConfigurationIncomplete { missing } => {
            assert_eq!(missing, &vec!["source.schema_name".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.code(), ErrorCode::Validation);
    assert_eq!(orchestrator.snapshot().await, TransferSnapshot::default());
    assert!(orchestrator.history().await.is_empty());

    match rx.recv().await.expect("rejected event") {
        TransferEvent::Rejected { error } => assert_eq!(error.code, ErrorCode::Validation),
        other => panic!("unexpected event: {other:?}"),
    }
    match rx.recv().await.expect("notice") {
        TransferEvent::Notice(notice) => {
            assert_eq!(notice.level, NoticeLevel::Destructive);
            assert_eq!(notice.title, "Configuration Incomplete");
        }
        other => panic!("unexpected event: {other:?}"),
    }

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(orchestrator.history().await.is_empty());
    assert!(!orchestrator.is_active().await);
}

#[tokio::test(start_paused = true)]
async fn unset_direction_is_rejected() {
    let orchestrator = orchestrator(TransferOutcome::Success);
    let err = orchestrator
        .start(&source(), &destination(), None)
        .await
        .expect_err("should reject");
    assert_eq!(
        err,
        TransferError::ConfigurationIncomplete {
            missing: vec!["direction".to_string()]
        }
    );
    assert_eq!(orchestrator.snapshot().await.status, TransferStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn successful_run_walks_every_state_and_progress_step() {
    let orchestrator = orchestrator(TransferOutcome::Success);
    let mut rx = orchestrator.subscribe();

    let run_id = orchestrator
        .start(
            &source(),
            &destination(),
            Some(TransferDirection::SourceToDestination),
        )
        .await
        .expect("start");
    assert_eq!(orchestrator.snapshot().await.status, TransferStatus::Pending);

    let (events, entry) = events_until_completed(&mut rx).await;

    let statuses = events
        .iter()
        .filter_map(|event| match event {
            TransferEvent::StatusChanged { status, .. } => Some(*status),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(
        statuses,
        vec![
            TransferStatus::Pending,
            TransferStatus::Transferring,
            TransferStatus::Success
        ]
    );

    let progress = events
        .iter()
        .filter_map(|event| match event {
            TransferEvent::ProgressUpdated { progress, .. } => Some(*progress),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(progress, (1..=10).map(|step| step * 10).collect::<Vec<u8>>());
    assert!(events.iter().all(|event| event.run_id() == Some(run_id)));

    assert_eq!(entry.id, run_id);
    assert_eq!(entry.outcome, TransferOutcome::Success);
    assert_eq!(entry.error, None);

    let snapshot = orchestrator.snapshot().await;
    assert_eq!(snapshot.status, TransferStatus::Success);
    assert_eq!(snapshot.progress, 100);
    assert!(!orchestrator.is_active().await);

    match rx.recv().await.expect("notice") {
        TransferEvent::Notice(notice) => assert_eq!(notice.title, "Transfer Successful"),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn run_follows_fixed_cadence() {
    let orchestrator = orchestrator(TransferOutcome::Success);
    let mut rx = orchestrator.subscribe();
    let started = Instant::now();

    orchestrator
        .start(
            &source(),
            &destination(),
            Some(TransferDirection::SourceToDestination),
        )
        .await
        .expect("start");
    events_until_completed(&mut rx).await;

    // 1000ms preparation, ten 300ms progress ticks, one resolving tick.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(4300), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(4400), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn failed_run_records_fixed_error() {
    let orchestrator = orchestrator(TransferOutcome::Failure);
    let mut rx = orchestrator.subscribe();

    orchestrator
        .start(
            &source(),
            &destination(),
            Some(TransferDirection::DestinationToSource),
        )
        .await
        .expect("start");
    let (_, entry) = events_until_completed(&mut rx).await;

    assert_eq!(entry.outcome, TransferOutcome::Failure);
    assert_eq!(entry.error.as_deref(), Some(SIMULATED_FAILURE_MESSAGE));
    assert_eq!(TransferError::simulated_failure().code(), ErrorCode::Transfer);

    let snapshot = orchestrator.snapshot().await;
    assert_eq!(snapshot.status, TransferStatus::Error);
    assert_eq!(snapshot.error.as_deref(), Some(SIMULATED_FAILURE_MESSAGE));
    assert_eq!(
        snapshot.status_message(),
        "Transfer failed: Simulated transfer error: Network issue."
    );

    match rx.recv().await.expect("notice") {
        TransferEvent::Notice(notice) => {
            assert_eq!(notice.level, NoticeLevel::Destructive);
            assert_eq!(notice.description, SIMULATED_FAILURE_MESSAGE);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn history_is_prepended_with_direction_labels() {
    let orchestrator = orchestrator(TransferOutcome::Success);
    let mut rx = orchestrator.subscribe();

    for direction in [
        TransferDirection::SourceToDestination,
        TransferDirection::DestinationToSource,
        TransferDirection::SourceToDestination,
    ] {
        orchestrator
            .start(&source(), &destination(), Some(direction))
            .await
            .expect("start");
        events_until_completed(&mut rx).await;
    }

    let history = orchestrator.history().await;
    let ids = history.iter().map(|entry| entry.id.0).collect::<Vec<_>>();
    assert_eq!(ids, vec![3, 2, 1]);

    assert_eq!(history[0].source, "dbo.Orders");
    assert_eq!(history[0].destination, "sales.orders_raw");
    assert_eq!(history[1].source, "sales.orders_raw");
    assert_eq!(history[1].destination, "dbo.Orders");
    assert_eq!(history[1].direction, TransferDirection::DestinationToSource);
    assert!(history[0].timestamp >= history[1].timestamp);
}

#[tokio::test(start_paused = true)]
async fn start_while_active_is_rejected() {
    let orchestrator = orchestrator(TransferOutcome::Success);
    let run_id = orchestrator
        .start(
            &source(),
            &destination(),
            Some(TransferDirection::SourceToDestination),
        )
        .await
        .expect("start");

    let err = orchestrator
        .start(
            &source(),
            &destination(),
            Some(TransferDirection::SourceToDestination),
        )
        .await
        .expect_err("second start");
    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(orchestrator.snapshot().await.run_id, Some(run_id));
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_run_without_history() {
    let orchestrator = orchestrator(TransferOutcome::Success);
    let mut rx = orchestrator.subscribe();
    orchestrator
        .start(
            &source(),
            &destination(),
            Some(TransferDirection::SourceToDestination),
        )
        .await
        .expect("start");

    tokio::time::sleep(Duration::from_millis(1700)).await;
    let mid_run = orchestrator.snapshot().await;
    assert_eq!(mid_run.status, TransferStatus::Transferring);
    assert!(mid_run.progress > 0 && mid_run.progress < 100);

    assert!(orchestrator.cancel().await);
    assert!(!orchestrator.cancel().await);
    assert_eq!(orchestrator.snapshot().await, TransferSnapshot::default());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(orchestrator.history().await.is_empty());
    assert_eq!(orchestrator.snapshot().await.status, TransferStatus::Idle);

    let mut last_status = None;
    while let Ok(event) = rx.try_recv() {
        assert!(!matches!(event, TransferEvent::Completed { .. }));
        if let TransferEvent::StatusChanged { status, .. } = event {
            last_status = Some(status);
        }
    }
    assert_eq!(last_status, Some(TransferStatus::Idle));
}

#[tokio::test(start_paused = true)]
async fn restart_after_terminal_state_resets_run() {
    let orchestrator = orchestrator(TransferOutcome::Failure);
    let mut rx = orchestrator.subscribe();
    orchestrator
        .start(
            &source(),
            &destination(),
            Some(TransferDirection::SourceToDestination),
        )
        .await
        .expect("first start");
    events_until_completed(&mut rx).await;
    assert_eq!(orchestrator.snapshot().await.status, TransferStatus::Error);

    let second = orchestrator
        .start(
            &source(),
            &destination(),
            Some(TransferDirection::SourceToDestination),
        )
        .await
        .expect("second start");
    let snapshot = orchestrator.snapshot().await;
    assert_eq!(snapshot.status, TransferStatus::Pending);
    assert_eq!(snapshot.progress, 0);
    assert_eq!(snapshot.error, None);
    assert_eq!(snapshot.run_id, Some(second));
}

#[tokio::test(start_paused = true)]
async fn dropping_orchestrator_stops_pending_run() {
    let orchestrator = orchestrator(TransferOutcome::Success);
    let mut rx = orchestrator.subscribe();
    orchestrator
        .start(
            &source(),
            &destination(),
            Some(TransferDirection::SourceToDestination),
        )
        .await
        .expect("start");
    drop(orchestrator);

    loop {
        match rx.recv().await {
            Ok(TransferEvent::Completed { .. }) => panic!("dropped run must not complete"),
            Ok(_) => continue,
            Err(RecvError::Closed) => break,
            Err(RecvError::Lagged(_)) => continue,
        }
    }
}

#[test]
fn timings_never_stall() {
    let timings = RunTimings::new(Duration::ZERO, Duration::ZERO, 0);
    assert!(timings.tick_interval > Duration::ZERO);
    assert_eq!(timings.progress_step, 1);

    let oversized = RunTimings::new(Duration::ZERO, Duration::from_millis(5), 250);
    assert_eq!(oversized.progress_step, 100);
}
