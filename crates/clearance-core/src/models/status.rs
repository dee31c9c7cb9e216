//! Status enumerations for shipments and workflow steps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Type-safe enumeration of shipment statuses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShipmentStatus {
    /// Shipment is moving through the clearance workflow
    #[default]
    Active,

    /// All workflow steps have been closed out
    Completed,

    /// Shipment was cancelled before clearance finished
    Cancelled,
}

impl FromStr for ShipmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(ShipmentStatus::Active),
            "completed" => Ok(ShipmentStatus::Completed),
            "cancelled" => Ok(ShipmentStatus::Cancelled),
            _ => Err(format!("Invalid shipment status: {s}")),
        }
    }
}

impl ShipmentStatus {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Active => "active",
            ShipmentStatus::Completed => "completed",
            ShipmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-safe enumeration of workflow step statuses.
///
/// Only `Pending`, `Completed`, and `Skipped` are ever persisted; the
/// remaining variants are derived from target dates and dependency state
/// each time steps are materialized for a shipment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Step has not started and its window is still open
    Pending,

    /// All dependencies are complete and the step can begin
    Ready,

    /// The target date is close enough that work should be underway
    InProgress,

    /// Within one business day of the target date
    AtRisk,

    /// Target date has passed without completion
    Overdue,

    /// At least one dependency step is not yet completed
    Blocked,

    /// Step has been completed (actual date recorded)
    Completed,

    /// Optional step that was deliberately skipped
    Skipped,
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(StepStatus::Pending),
            "ready" => Ok(StepStatus::Ready),
            "inprogress" | "in_progress" => Ok(StepStatus::InProgress),
            "at_risk" | "atrisk" => Ok(StepStatus::AtRisk),
            "overdue" => Ok(StepStatus::Overdue),
            "blocked" => Ok(StepStatus::Blocked),
            "completed" => Ok(StepStatus::Completed),
            "skipped" => Ok(StepStatus::Skipped),
            _ => Err(format!("Invalid step status: {s}")),
        }
    }
}

impl StepStatus {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Ready => "ready",
            StepStatus::InProgress => "in_progress",
            StepStatus::AtRisk => "at_risk",
            StepStatus::Overdue => "overdue",
            StepStatus::Blocked => "blocked",
            StepStatus::Completed => "completed",
            StepStatus::Skipped => "skipped",
        }
    }

    /// True for the two terminal states of the step state machine.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Skipped)
    }

    /// Get status with consistent icon formatting for display.
    pub fn with_icon(&self) -> &'static str {
        match self {
            StepStatus::Pending => "○ Pending",
            StepStatus::Ready => "◎ Ready",
            StepStatus::InProgress => "➤ In Progress",
            StepStatus::AtRisk => "◆ At Risk",
            StepStatus::Overdue => "✗ Overdue",
            StepStatus::Blocked => "⊘ Blocked",
            StepStatus::Completed => "✓ Completed",
            StepStatus::Skipped => "– Skipped",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Demurrage exposure for a shipment, derived from the ETA and the free
/// storage window at the port.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum DemurrageRisk {
    /// More than two business days of free storage remain
    None,
    /// Two business days remain
    Low,
    /// One business day remains
    Medium,
    /// The free window ends today
    High,
    /// The free window has passed; demurrage is accruing
    Critical,
}

impl DemurrageRisk {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DemurrageRisk::None => "none",
            DemurrageRisk::Low => "low",
            DemurrageRisk::Medium => "medium",
            DemurrageRisk::High => "high",
            DemurrageRisk::Critical => "critical",
        }
    }
}

impl fmt::Display for DemurrageRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
