use clearance_core::{
    db::StepResolution, workflow, BusinessCalendar, Database, Division, Shipment, ShipmentFilter,
    ShipmentStatus, StepNumber, StepStatus, TrackerError,
};
use jiff::{civil::date, Timestamp};
use tempfile::NamedTempFile;

/// Helper function to create a temporary database for testing
fn create_test_db() -> (NamedTempFile, Database) {
    let temp_file = NamedTempFile::new().expect("Failed to create temporary file");
    let db = Database::new(temp_file.path()).expect("Failed to create test database");
    (temp_file, db)
}

fn sample_shipment(number: &str) -> Shipment {
    let now = Timestamp::now();
    Shipment {
        id: 0,
        shipment_number: number.to_string(),
        principal: "Denso International".to_string(),
        brand: "Denso".to_string(),
        lc_number: None,
        invoice_amount: Some(10_000.0),
        eta: date(2026, 3, 4),
        eta_edit_count: 0,
        division: Division::Automotive,
        status: ShipmentStatus::Active,
        created_at: now,
        updated_at: now,
    }
}

fn insert_with_steps(db: &mut Database, number: &str) -> Shipment {
    let shipment = sample_shipment(number);
    let calendar = BusinessCalendar::default();
    let steps = workflow::instantiate_steps(&shipment, &calendar, shipment.created_at);
    db.create_shipment(&shipment, &steps)
        .expect("Failed to create shipment")
}

#[test]
fn test_database_initialization() {
    let (temp_file, _db) = create_test_db();
    assert!(temp_file.path().exists());

    // reopening an existing database applies migrations without error
    let _reopened = Database::new(temp_file.path()).expect("Failed to reopen database");
}

#[test]
fn test_create_shipment_assigns_ids() {
    let (_temp_file, mut db) = create_test_db();

    let shipment = insert_with_steps(&mut db, "SHP-DB-001");
    assert!(shipment.id > 0);

    let steps = db.get_steps(shipment.id).expect("Failed to get steps");
    assert_eq!(steps.len(), 34);
    assert!(steps.iter().all(|s| s.shipment_id == shipment.id));
    assert!(steps.iter().all(|s| s.status == StepStatus::Pending));
}

#[test]
fn test_duplicate_shipment_number_constraint() {
    let (_temp_file, mut db) = create_test_db();

    insert_with_steps(&mut db, "SHP-DB-002");
    let shipment = sample_shipment("SHP-DB-002");
    let err = db
        .create_shipment(&shipment, &[])
        .expect_err("duplicate number should violate the unique constraint");
    assert!(matches!(err, TrackerError::InvalidInput { .. }));
}

#[test]
fn test_get_shipment_roundtrip() {
    let (_temp_file, mut db) = create_test_db();

    let created = insert_with_steps(&mut db, "SHP-DB-003");
    let fetched = db
        .get_shipment(created.id)
        .expect("Failed to get shipment")
        .expect("Shipment should exist");

    assert_eq!(fetched.shipment_number, "SHP-DB-003");
    assert_eq!(fetched.eta, date(2026, 3, 4));
    assert_eq!(fetched.invoice_amount, Some(10_000.0));
    assert_eq!(fetched.division, Division::Automotive);

    let by_number = db
        .get_shipment_by_number("SHP-DB-003")
        .expect("Failed to look up by number")
        .expect("Shipment should exist");
    assert_eq!(by_number.id, created.id);

    assert!(db.get_shipment(9999).expect("query failed").is_none());
}

#[test]
fn test_list_shipments_filtering() {
    let (_temp_file, mut db) = create_test_db();

    insert_with_steps(&mut db, "SHP-DB-004");
    let mut other = sample_shipment("SHP-DB-005");
    other.division = Division::Machinery;
    other.principal = "Komatsu Ltd".to_string();
    db.create_shipment(&other, &[])
        .expect("Failed to create shipment");

    let all = db
        .list_shipments(&ShipmentFilter::default())
        .expect("Failed to list");
    assert_eq!(all.len(), 2);

    let machinery = db
        .list_shipments(&ShipmentFilter {
            division: Some(Division::Machinery),
            ..ShipmentFilter::default()
        })
        .expect("Failed to list");
    assert_eq!(machinery.len(), 1);
    assert_eq!(machinery[0].shipment_number, "SHP-DB-005");

    let by_principal = db
        .list_shipments(&ShipmentFilter {
            principal: Some("komatsu".to_string()),
            ..ShipmentFilter::default()
        })
        .expect("Failed to list");
    assert_eq!(by_principal.len(), 1);
}

#[test]
fn test_resolve_step_writes_audit_entry() {
    let (_temp_file, mut db) = create_test_db();

    let shipment = insert_with_steps(&mut db, "SHP-DB-006");
    let number = StepNumber::new(1, 3);
    let now = Timestamp::now();

    let resolved = db
        .resolve_step(
            shipment.id,
            number,
            StepResolution {
                status: StepStatus::Completed,
                actual_date: date(2026, 3, 2),
                performed_by: "admin",
                notes: Some("received"),
                fields_json: Some(r#"{"document_ref":"PI-1"}"#.to_string()),
                log_action: "complete",
                log_data: None,
            },
            now,
        )
        .expect("Failed to resolve step");

    assert_eq!(resolved.status, StepStatus::Completed);
    assert_eq!(resolved.actual_date, Some(date(2026, 3, 2)));
    assert_eq!(resolved.completed_by.as_deref(), Some("admin"));
    assert_eq!(
        resolved.fields.get("document_ref").and_then(|v| v.as_str()),
        Some("PI-1")
    );

    let logs = db.get_logs(shipment.id).expect("Failed to get logs");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, "complete");
    assert_eq!(logs[0].step_number, Some(number));
    assert_eq!(logs[0].performed_by, "admin");
}

#[test]
fn test_resolve_unknown_step_fails() {
    let (_temp_file, mut db) = create_test_db();

    let shipment = insert_with_steps(&mut db, "SHP-DB-007");
    let err = db
        .resolve_step(
            shipment.id + 1,
            StepNumber::new(1, 3),
            StepResolution {
                status: StepStatus::Completed,
                actual_date: date(2026, 3, 2),
                performed_by: "admin",
                notes: None,
                fields_json: None,
                log_action: "complete",
                log_data: None,
            },
            Timestamp::now(),
        )
        .expect_err("missing step should be reported");
    assert!(matches!(err, TrackerError::StepNotFound { .. }));
}

#[test]
fn test_reopen_step_clears_completion() {
    let (_temp_file, mut db) = create_test_db();

    let shipment = insert_with_steps(&mut db, "SHP-DB-008");
    let number = StepNumber::new(1, 3);
    let now = Timestamp::now();

    db.resolve_step(
        shipment.id,
        number,
        StepResolution {
            status: StepStatus::Completed,
            actual_date: date(2026, 3, 2),
            performed_by: "admin",
            notes: None,
            fields_json: None,
            log_action: "complete",
            log_data: None,
        },
        now,
    )
    .expect("Failed to resolve step");

    db.reopen_step(shipment.id, number, "admin", now)
        .expect("Failed to reopen step");

    let step = db
        .get_step(shipment.id, number)
        .expect("Failed to get step")
        .expect("Step should exist");
    assert_eq!(step.status, StepStatus::Pending);
    assert!(step.actual_date.is_none());
    assert!(step.completed_by.is_none());

    let logs = db.get_logs(shipment.id).expect("Failed to get logs");
    assert_eq!(logs.last().unwrap().action, "reopen");
}

#[test]
fn test_update_shipment_eta_moves_targets() {
    let (_temp_file, mut db) = create_test_db();

    let shipment = insert_with_steps(&mut db, "SHP-DB-009");
    let number = StepNumber::new(12, 3);
    let new_target = date(2026, 4, 2);

    db.update_shipment_eta(
        shipment.id,
        date(2026, 3, 18),
        1,
        &[(number, new_target)],
        Timestamp::now(),
    )
    .expect("Failed to update ETA");

    let updated = db
        .get_shipment(shipment.id)
        .expect("Failed to get shipment")
        .expect("Shipment should exist");
    assert_eq!(updated.eta, date(2026, 3, 18));
    assert_eq!(updated.eta_edit_count, 1);

    let step = db
        .get_step(shipment.id, number)
        .expect("Failed to get step")
        .expect("Step should exist");
    assert_eq!(step.target_date, new_target);
}

#[test]
fn test_update_eta_of_missing_shipment_fails() {
    let (_temp_file, mut db) = create_test_db();

    let err = db
        .update_shipment_eta(42, date(2026, 3, 18), 1, &[], Timestamp::now())
        .expect_err("missing shipment should be reported");
    assert!(matches!(err, TrackerError::ShipmentNotFound { id: 42 }));
}

#[test]
fn test_delete_cascades_to_steps_and_logs() {
    let (_temp_file, mut db) = create_test_db();

    let shipment = insert_with_steps(&mut db, "SHP-DB-010");
    db.append_log(
        shipment.id,
        None,
        "register",
        "admin",
        None,
        Timestamp::now(),
    )
    .expect("Failed to append log");

    assert!(db.delete_shipment(shipment.id).expect("delete failed"));
    assert!(db
        .get_shipment(shipment.id)
        .expect("query failed")
        .is_none());
    assert!(db.get_steps(shipment.id).expect("query failed").is_empty());
    assert!(db.get_logs(shipment.id).expect("query failed").is_empty());

    // idempotence: deleting again reports nothing deleted
    assert!(!db.delete_shipment(shipment.id).expect("delete failed"));
}

#[test]
fn test_logs_preserve_insertion_order() {
    let (_temp_file, mut db) = create_test_db();

    let shipment = insert_with_steps(&mut db, "SHP-DB-011");
    let now = Timestamp::now();
    for action in ["register", "complete", "eta_update"] {
        db.append_log(shipment.id, None, action, "admin", None, now)
            .expect("Failed to append log");
    }

    let logs = db.get_logs(shipment.id).expect("Failed to get logs");
    let actions: Vec<&str> = logs.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, ["register", "complete", "eta_update"]);
}
