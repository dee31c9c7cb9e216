use jiff::civil::Date;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::{Department, StepNumber};
use crate::models::status::StepStatus;

/// A workflow step instantiated for a particular shipment.
///
/// Definition-side attributes (name, department, criticality) are
/// denormalized from the catalog so a step row renders without a second
/// lookup; `status` and `is_blocked` carry the values derived for the
/// date the instance was materialized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepInstance {
    pub id: u64,
    pub shipment_id: u64,
    pub step_number: StepNumber,
    pub name: String,
    pub department: Department,
    /// Deadline derived from the shipment ETA and the step offset
    pub target_date: Date,
    /// Date the step was actually completed, if it was
    pub actual_date: Option<Date>,
    pub status: StepStatus,
    /// True when an incomplete dependency prevents starting this step
    pub is_blocked: bool,
    pub completed_by: Option<String>,
    pub notes: Option<String>,
    /// Form field values captured at completion
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
    pub is_critical: bool,
    pub is_optional: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl StepInstance {
    /// Whether the step still counts against progress and alerts.
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }
}
