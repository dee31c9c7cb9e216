use serde::{Deserialize, Serialize};

use crate::models::status::{DemurrageRisk, StepStatus};
use crate::models::step::StepInstance;

/// Aggregate completion figures for one shipment's workflow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct WorkflowProgress {
    pub total: usize,
    pub completed: usize,
    pub overdue: usize,
    /// Whole-number percentage, 0 when there are no steps
    pub percentage: u8,
}

impl WorkflowProgress {
    /// Tallies progress over a shipment's step instances. Skipped steps
    /// count as completed; they no longer require work.
    pub fn from_steps(steps: &[StepInstance]) -> Self {
        let total = steps.len();
        let completed = steps.iter().filter(|s| s.status.is_terminal()).count();
        let overdue = steps
            .iter()
            .filter(|s| s.status == StepStatus::Overdue)
            .count();
        let percentage = if total == 0 {
            0
        } else {
            // Round to the nearest whole percent
            ((completed * 100 + total / 2) / total) as u8
        };
        Self {
            total,
            completed,
            overdue,
            percentage,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

/// A shipment's detail view: steps plus derived aggregates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShipmentDetail {
    pub shipment: crate::models::shipment::Shipment,
    pub steps: Vec<StepInstance>,
    pub progress: WorkflowProgress,
    pub demurrage_risk: DemurrageRisk,
}

/// One step's target date before and after an ETA revision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetDateChange {
    pub step_number: crate::catalog::StepNumber,
    pub previous_target: jiff::civil::Date,
    pub new_target: jiff::civil::Date,
}

/// Report of target dates moved by an ETA revision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EtaChangeReport {
    pub previous_eta: jiff::civil::Date,
    pub new_eta: jiff::civil::Date,
    /// Revisions still available after this change
    pub edits_remaining: u32,
    /// Steps whose target dates were recalculated (completed steps keep theirs)
    pub affected_steps: Vec<TargetDateChange>,
}

impl EtaChangeReport {
    /// Whether a step's target moved in this revision.
    pub fn moved(&self, step: crate::catalog::StepNumber) -> bool {
        self.affected_steps.iter().any(|c| c.step_number == step)
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use jiff::Timestamp;
    use serde_json::Map;

    use super::*;
    use crate::catalog::{Department, StepNumber};

    fn step(number: StepNumber, status: StepStatus) -> StepInstance {
        StepInstance {
            id: 0,
            shipment_id: 1,
            step_number: number,
            name: "test".to_string(),
            department: Department::BusinessUnit,
            target_date: date(2026, 3, 1),
            actual_date: None,
            status,
            is_blocked: false,
            completed_by: None,
            notes: None,
            fields: Map::new(),
            is_critical: false,
            is_optional: false,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        }
    }

    #[test]
    fn progress_counts_skipped_as_done() {
        let steps = vec![
            step(StepNumber::new(1, 1), StepStatus::Completed),
            step(StepNumber::new(1, 2), StepStatus::Skipped),
            step(StepNumber::new(1, 3), StepStatus::Overdue),
            step(StepNumber::new(1, 4), StepStatus::Pending),
        ];
        let progress = WorkflowProgress::from_steps(&steps);
        assert_eq!(progress.total, 4);
        assert_eq!(progress.completed, 2);
        assert_eq!(progress.overdue, 1);
        assert_eq!(progress.percentage, 50);
        assert!(!progress.is_complete());
    }

    #[test]
    fn percentage_rounds_to_the_nearest_whole_number() {
        // 2 of 34 is 5.88%, which reads as 6
        let mut steps: Vec<_> = (0..34u8)
            .map(|i| step(StepNumber::new(1, i), StepStatus::Pending))
            .collect();
        steps[0].status = StepStatus::Completed;
        steps[1].status = StepStatus::Completed;
        let progress = WorkflowProgress::from_steps(&steps);
        assert_eq!(progress.percentage, 6);
    }

    #[test]
    fn empty_workflow_reports_zero_percent() {
        let progress = WorkflowProgress::from_steps(&[]);
        assert_eq!(progress.percentage, 0);
        assert!(!progress.is_complete());
    }
}
