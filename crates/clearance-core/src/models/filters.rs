use serde::{Deserialize, Serialize};

use crate::catalog::{Department, Division};
use crate::models::status::{ShipmentStatus, StepStatus};

/// Filter criteria for listing shipments.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ShipmentFilter {
    pub status: Option<ShipmentStatus>,
    pub division: Option<Division>,
    /// Case-insensitive substring match on the principal name
    pub principal: Option<String>,
}

impl ShipmentFilter {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.division.is_none() && self.principal.is_none()
    }
}

/// Filter criteria for listing a shipment's workflow steps.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StepFilter {
    pub department: Option<Department>,
    pub status: Option<StepStatus>,
    pub critical_only: bool,
}

impl StepFilter {
    pub fn matches(&self, step: &crate::models::step::StepInstance) -> bool {
        if let Some(department) = self.department {
            if step.department != department {
                return false;
            }
        }
        if let Some(status) = self.status {
            if step.status != status {
                return false;
            }
        }
        if self.critical_only && !step.is_critical {
            return false;
        }
        true
    }
}
