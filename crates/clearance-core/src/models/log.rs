use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::StepNumber;

/// One row of the append-only audit trail. Entries are never updated
/// or deleted; corrections get their own entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionLogEntry {
    pub id: u64,
    pub shipment_id: u64,
    /// Absent for shipment-level actions such as registration
    pub step_number: Option<StepNumber>,
    pub action: String,
    pub performed_by: String,
    pub performed_at: Timestamp,
    pub data: Option<Value>,
}
