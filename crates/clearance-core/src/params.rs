//! Parameter types for tracker operations.
//!
//! These structs carry the input of each public [`crate::Tracker`]
//! operation. Keeping them serde-friendly and free of CLI concerns lets
//! outer layers wrap them with their own argument parsing.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::{Division, StepNumber};
use crate::models::{ShipmentFilter, StepFilter};
use crate::triggers::TriggerAction;

/// Parameters for registering a new shipment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterShipment {
    pub shipment_number: String,
    pub principal: String,
    pub brand: String,
    /// Estimated time of arrival, ISO date
    pub eta: Date,
    #[serde(default)]
    pub division: Division,
    pub lc_number: Option<String>,
    pub invoice_amount: Option<f64>,
    /// Username performing the registration
    pub registered_by: String,
}

/// Parameters for listing shipments.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListShipments {
    #[serde(flatten)]
    pub filter: ShipmentFilter,
}

/// Parameters for listing a shipment's steps.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListSteps {
    pub shipment_id: u64,
    #[serde(flatten)]
    pub filter: StepFilter,
}

/// Parameters for completing a workflow step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteStep {
    pub shipment_id: u64,
    pub step_number: StepNumber,
    pub completed_by: String,
    /// Completion date; defaults to today, future dates rejected
    pub actual_date: Option<Date>,
    pub notes: Option<String>,
    /// Values for the step's form fields
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// Parameters for skipping an optional step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkipStep {
    pub shipment_id: u64,
    pub step_number: StepNumber,
    pub skipped_by: String,
    pub notes: Option<String>,
}

/// Parameters for revising a shipment's ETA.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEta {
    pub shipment_id: u64,
    pub new_eta: Date,
    pub updated_by: String,
}

/// An inbound business event to run through the automation triggers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionEvent {
    pub shipment_id: u64,
    pub action: TriggerAction,
    pub performed_by: String,
    /// Event payload; `event` names the document or payment kind
    #[serde(default)]
    pub data: Map<String, Value>,
}
