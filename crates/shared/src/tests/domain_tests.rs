use super::*;

fn source() -> SourceConfig {
    SourceConfig {
        db_name: "Sales".into(),
        schema_name: "dbo".into(),
        table_name: "Orders".into(),
        host_url: "sqlserver://db.internal".into(),
        ..SourceConfig::default()
    }
}

fn destination() -> DestinationConfig {
    DestinationConfig {
        project_id: "analytics".into(),
        dataset_id: "sales".into(),
        table_id: "orders_raw".into(),
        auth_json: None,
    }
}

#[test]
fn endpoint_labels_follow_direction() {
    let (read, write) =
        TransferDirection::SourceToDestination.endpoint_labels(&source(), &destination());
    assert_eq!(read, "dbo.Orders");
    assert_eq!(write, "sales.orders_raw");

    let (read, write) =
        TransferDirection::DestinationToSource.endpoint_labels(&source(), &destination());
    assert_eq!(read, "sales.orders_raw");
    assert_eq!(write, "dbo.Orders");
}

#[test]
fn missing_fields_lists_only_required_ones() {
    let partial = SourceConfig {
        schema_name: String::new(),
        host_url: String::new(),
        password: None,
        ..source()
    };
    assert_eq!(partial.missing_fields(), vec!["schema_name", "host_url"]);
    assert!(!partial.is_configured());

    let warehouse = DestinationConfig {
        auth_json: None,
        ..destination()
    };
    assert!(warehouse.is_configured());
}

#[test]
fn readiness_requires_all_three_inputs() {
    let ready = Readiness::evaluate(
        &source(),
        &destination(),
        Some(TransferDirection::SourceToDestination),
    );
    assert!(ready.is_ready());

    let no_direction = Readiness::evaluate(&source(), &destination(), None);
    assert!(!no_direction.is_ready());
    assert!(no_direction.source_configured);
    assert!(!no_direction.direction_selected);
}

#[test]
fn parses_direction_aliases() {
    assert_eq!(
        "source-to-destination".parse::<TransferDirection>(),
        Ok(TransferDirection::SourceToDestination)
    );
    assert_eq!(
        "BQ_TO_MSSQL".parse::<TransferDirection>(),
        Ok(TransferDirection::DestinationToSource)
    );
    assert!("sideways".parse::<TransferDirection>().is_err());
}

#[test]
fn status_messages_match_controls() {
    assert_eq!(TransferStatus::Idle.message(None), "Ready to start transfer.");
    assert_eq!(
        TransferStatus::Error.message(Some("boom")),
        "Transfer failed: boom"
    );
    assert_eq!(
        TransferStatus::Error.message(None),
        "Transfer failed: Unknown error"
    );
}

#[test]
fn start_control_disabled_while_active() {
    let readiness = Readiness::evaluate(
        &source(),
        &destination(),
        Some(TransferDirection::DestinationToSource),
    );
    let mut snapshot = TransferSnapshot::default();
    assert!(snapshot.can_start(&readiness));

    snapshot.status = TransferStatus::Transferring;
    assert!(!snapshot.can_start(&readiness));

    snapshot.status = TransferStatus::Error;
    assert!(snapshot.can_start(&readiness));
}

#[test]
fn history_entry_serializes_snake_case() {
    let entry = HistoryEntry {
        id: RunId(7),
        source: "dbo.Orders".into(),
        destination: "sales.orders_raw".into(),
        timestamp: chrono::DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .expect("timestamp")
            .with_timezone(&Utc),
        outcome: TransferOutcome::Failure,
        error: Some("Simulated transfer error: Network issue.".into()),
        direction: TransferDirection::SourceToDestination,
    };
    let json = serde_json::to_value(&entry).expect("serialize");
    assert_eq!(json["outcome"], "failure");
    assert_eq!(json["direction"], "source_to_destination");
    assert_eq!(json["id"], 7);
}
