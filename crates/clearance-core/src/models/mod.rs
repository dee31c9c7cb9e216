//! Domain models shared across persistence, the tracker and display.

mod filters;
mod log;
mod shipment;
mod status;
mod step;
mod summary;

pub use filters::{ShipmentFilter, StepFilter};
pub use log::ActionLogEntry;
pub use shipment::{Shipment, MAX_ETA_EDITS};
pub use status::{DemurrageRisk, ShipmentStatus, StepStatus};
pub use step::StepInstance;
pub use summary::{EtaChangeReport, ShipmentDetail, TargetDateChange, WorkflowProgress};
