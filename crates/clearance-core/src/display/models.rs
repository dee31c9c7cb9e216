//! Display implementations for domain models.
//!
//! All output is markdown, rendered by outer layers either verbatim or
//! through a terminal skin. Shipments format as a header plus metadata
//! bullets; steps format as compact subsections with status icons.

use std::fmt;

use super::datetime::LocalDateTime;
use crate::models::{
    ActionLogEntry, EtaChangeReport, Shipment, ShipmentDetail, StepInstance, StepStatus,
    WorkflowProgress, MAX_ETA_EDITS,
};
use crate::{triggers, workflow};

impl fmt::Display for Shipment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {}. {}", self.id, self.shipment_number)?;
        writeln!(f)?;

        writeln!(f, "- Principal: {}", self.principal)?;
        writeln!(f, "- Brand: {}", self.brand)?;
        writeln!(f, "- Division: {}", self.division)?;
        writeln!(f, "- Status: {}", self.status)?;
        writeln!(f, "- ETA: {}", self.eta)?;
        if self.eta_edit_count > 0 {
            writeln!(
                f,
                "- ETA revisions: {} of {}",
                self.eta_edit_count, MAX_ETA_EDITS
            )?;
        }
        if let Some(lc) = &self.lc_number {
            writeln!(f, "- LC number: {lc}")?;
        }
        if let Some(amount) = self.invoice_amount {
            writeln!(f, "- Invoice amount: OMR {amount:.3}")?;
            if let (Some(duty), Some(vat), Some(insurance)) =
                (self.customs_duty(), self.vat(), self.insurance())
            {
                writeln!(f, "- Customs duty (5%): OMR {duty:.3}")?;
                writeln!(f, "- VAT (5%): OMR {vat:.3}")?;
                writeln!(f, "- Insurance (1%): OMR {insurance:.3}")?;
            }
        }
        writeln!(f, "- Created: {}", LocalDateTime(&self.created_at))?;
        writeln!(f, "- Updated: {}", LocalDateTime(&self.updated_at))?;

        Ok(())
    }
}

impl StepInstance {
    /// Compact step rendering shared by standalone and in-detail views.
    fn fmt_step(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "### {} {} ({})",
            self.step_number,
            self.name,
            self.status.with_icon()
        )?;
        writeln!(f)?;

        writeln!(f, "- Department: {}", self.department)?;
        writeln!(f, "- Target: {}", self.target_date)?;
        if let Some(actual) = self.actual_date {
            writeln!(f, "- Actual: {actual}")?;
        }
        if let Some(by) = &self.completed_by {
            let verb = if self.status == StepStatus::Skipped {
                "Skipped by"
            } else {
                "Completed by"
            };
            writeln!(f, "- {verb}: {by}")?;
        }
        if self.is_critical {
            writeln!(f, "- Critical: yes")?;
        }
        if !self.status.is_terminal() {
            writeln!(
                f,
                "- Automation: {}",
                triggers::trigger_description(self.step_number)
            )?;
        }

        if let Some(notes) = &self.notes {
            writeln!(f)?;
            writeln!(f, "{notes}")?;
        }

        if !self.fields.is_empty() {
            writeln!(f)?;
            writeln!(f, "#### Fields")?;
            writeln!(f)?;
            for (name, value) in &self.fields {
                writeln!(f, "- {name}: {value}")?;
            }
        }
        writeln!(f)?;

        Ok(())
    }
}

impl fmt::Display for StepInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_step(f)
    }
}

impl fmt::Display for WorkflowProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} steps completed ({}%)",
            self.completed, self.total, self.percentage
        )?;
        if self.overdue > 0 {
            write!(f, ", {} overdue", self.overdue)?;
        }
        Ok(())
    }
}

impl fmt::Display for ShipmentDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.shipment)?;
        writeln!(f)?;
        writeln!(f, "- Progress: {}", self.progress)?;
        writeln!(f, "- Demurrage risk: {}", self.demurrage_risk)?;

        writeln!(f)?;
        writeln!(f, "## Workflow")?;
        writeln!(f)?;
        for (department, steps) in workflow::group_by_department(&self.steps) {
            writeln!(f, "## {department}")?;
            writeln!(f)?;
            for step in steps {
                write!(f, "{step}")?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for EtaChangeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ETA revised from {} to {}",
            self.previous_eta, self.new_eta
        )?;
        writeln!(f, "- Revisions remaining: {}", self.edits_remaining)?;
        if self.affected_steps.is_empty() {
            writeln!(f, "- No target dates changed")?;
        } else {
            writeln!(f, "- Recalculated target dates:")?;
            for change in &self.affected_steps {
                writeln!(
                    f,
                    "    - {}: {} -> {}",
                    change.step_number, change.previous_target, change.new_target
                )?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ActionLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "- {} `{}`",
            LocalDateTime(&self.performed_at),
            self.action
        )?;
        if let Some(step) = self.step_number {
            write!(f, " step {step}")?;
        }
        write!(f, " by {}", self.performed_by)?;
        if let Some(data) = &self.data {
            write!(f, " {data}")?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use jiff::Timestamp;
    use serde_json::Map;

    use crate::catalog::{Department, Division, StepNumber};
    use crate::models::{
        EtaChangeReport, Shipment, ShipmentStatus, StepInstance, StepStatus, TargetDateChange,
    };

    fn sample_shipment() -> Shipment {
        Shipment {
            id: 7,
            shipment_number: "SHP-2026-007".to_string(),
            principal: "Komatsu Ltd".to_string(),
            brand: "Komatsu".to_string(),
            lc_number: Some("LC-11".to_string()),
            invoice_amount: Some(50_000.0),
            eta: date(2026, 4, 1),
            eta_edit_count: 1,
            division: Division::Machinery,
            status: ShipmentStatus::Active,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        }
    }

    #[test]
    fn shipment_display_includes_financials() {
        let output = format!("{}", sample_shipment());
        assert!(output.contains("# 7. SHP-2026-007"));
        assert!(output.contains("- Customs duty (5%): OMR 2500.000"));
        assert!(output.contains("- ETA revisions: 1 of 3"));
    }

    #[test]
    fn step_display_carries_icon_and_target() {
        let step = StepInstance {
            id: 1,
            shipment_id: 7,
            step_number: StepNumber::new(9, 0),
            name: "Bayan submission".to_string(),
            department: Department::CustomsClearance,
            target_date: date(2026, 4, 2),
            actual_date: None,
            status: StepStatus::AtRisk,
            is_blocked: false,
            completed_by: None,
            notes: None,
            fields: Map::new(),
            is_critical: true,
            is_optional: false,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        };
        let output = format!("{step}");
        assert!(output.contains("### 9.0 Bayan submission (◆ At Risk)"));
        assert!(output.contains("- Target: 2026-04-02"));
        assert!(output.contains("- Critical: yes"));
        assert!(output.contains("- Automation: Auto-completed by submit event `bayan-submission`"));
    }

    #[test]
    fn eta_report_shows_each_moved_target() {
        let report = EtaChangeReport {
            previous_eta: date(2026, 4, 1),
            new_eta: date(2026, 4, 8),
            edits_remaining: 1,
            affected_steps: vec![TargetDateChange {
                step_number: StepNumber::new(12, 3),
                previous_target: date(2026, 4, 6),
                new_target: date(2026, 4, 13),
            }],
        };
        let output = format!("{report}");
        assert!(output.contains("ETA revised from 2026-04-01 to 2026-04-08"));
        assert!(output.contains("- Revisions remaining: 1"));
        assert!(output.contains("    - 12.3: 2026-04-06 -> 2026-04-13"));
    }
}
