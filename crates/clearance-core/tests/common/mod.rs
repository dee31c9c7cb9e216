use clearance_core::{params::RegisterShipment, Division, Tracker, TrackerBuilder};
use jiff::civil::{date, Date};
use tempfile::TempDir;

/// Helper function to create a tracker backed by a temporary database
pub async fn create_test_tracker() -> (TempDir, Tracker) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let tracker = TrackerBuilder::new()
        .with_database_path(Some(&db_path))
        .build()
        .await
        .expect("Failed to create tracker");
    (temp_dir, tracker)
}

/// A Wednesday; two full work days either side before the weekend
pub fn test_eta() -> Date {
    date(2026, 3, 4)
}

pub fn register_params(number: &str) -> RegisterShipment {
    RegisterShipment {
        shipment_number: number.to_string(),
        principal: "Denso International".to_string(),
        brand: "Denso".to_string(),
        eta: test_eta(),
        division: Division::Automotive,
        lc_number: Some("LC-2026-17".to_string()),
        invoice_amount: Some(10_000.0),
        registered_by: "admin".to_string(),
    }
}
