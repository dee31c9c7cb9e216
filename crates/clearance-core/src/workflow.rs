//! Pure workflow mechanics: instantiating the catalog for a shipment,
//! deriving step statuses from dates and dependencies, and recomputing
//! target dates after an ETA change.
//!
//! Only `Pending`, `Completed` and `Skipped` are ever persisted; the
//! remaining statuses are derived here every time steps are loaded, so
//! a workflow never goes stale in storage.

use std::collections::BTreeSet;

use jiff::civil::Date;
use jiff::{Span, Timestamp};
use serde_json::{Map, Value};

use crate::calendar::BusinessCalendar;
use crate::catalog::{self, Department, StepNumber};
use crate::models::{Shipment, StepInstance, StepStatus};
use crate::triggers::{self, TriggerAction};

/// Calendar days ahead of the target date at which an open step is
/// shown as in progress.
const IN_PROGRESS_WINDOW_DAYS: i64 = 3;

/// Builds the 34 step instances for a freshly registered shipment.
/// Every step starts `Pending`; ids are assigned by the store.
pub fn instantiate_steps(
    shipment: &Shipment,
    calendar: &BusinessCalendar,
    now: Timestamp,
) -> Vec<StepInstance> {
    catalog::all_steps()
        .iter()
        .map(|def| StepInstance {
            id: 0,
            shipment_id: shipment.id,
            step_number: def.number,
            name: def.name.to_string(),
            department: def.department,
            target_date: calendar.target_date(shipment.eta, def.eta_offset),
            actual_date: None,
            status: StepStatus::Pending,
            is_blocked: false,
            completed_by: None,
            notes: None,
            fields: Map::new(),
            is_critical: def.is_critical,
            is_optional: def.is_optional,
            created_at: now,
            updated_at: now,
        })
        .collect()
}

/// Status of a single open step given its deadline and dependencies.
fn derive_one(
    target: Date,
    today: Date,
    has_dependencies: bool,
    dependencies_met: bool,
    calendar: &BusinessCalendar,
) -> (StepStatus, bool) {
    if !dependencies_met {
        return (StepStatus::Blocked, true);
    }
    if calendar.is_overdue(target, None, today) {
        return (StepStatus::Overdue, false);
    }
    if calendar.is_due_soon(target, today) {
        return (StepStatus::AtRisk, false);
    }
    if target <= today.saturating_add(Span::new().days(IN_PROGRESS_WINDOW_DAYS)) {
        return (StepStatus::InProgress, false);
    }
    if has_dependencies && dependencies_met {
        return (StepStatus::Ready, false);
    }
    (StepStatus::Pending, false)
}

/// Rewrites derived statuses in place. Terminal steps are left alone;
/// everything else is classified from scratch against `today`.
pub fn refresh_statuses(steps: &mut [StepInstance], calendar: &BusinessCalendar, today: Date) {
    let completed: BTreeSet<StepNumber> = steps
        .iter()
        .filter(|s| s.status.is_terminal())
        .map(|s| s.step_number)
        .collect();
    for step in steps.iter_mut() {
        if step.status.is_terminal() {
            step.is_blocked = false;
            continue;
        }
        let deps = catalog::definition(step.step_number)
            .map(|def| def.dependencies)
            .unwrap_or(&[]);
        let met = deps.iter().all(|d| completed.contains(d));
        let (status, blocked) =
            derive_one(step.target_date, today, !deps.is_empty(), met, calendar);
        step.status = status;
        step.is_blocked = blocked;
    }
}

/// Recomputes target dates for a new ETA. Completed and skipped steps
/// keep the dates they were finished under; returns the step numbers
/// that moved.
pub fn recalculate_targets(
    steps: &mut [StepInstance],
    new_eta: Date,
    calendar: &BusinessCalendar,
) -> Vec<StepNumber> {
    let mut affected = Vec::new();
    for step in steps.iter_mut() {
        if step.status.is_terminal() {
            continue;
        }
        if let Some(def) = catalog::definition(step.step_number) {
            let target = calendar.target_date(new_eta, def.eta_offset);
            if target != step.target_date {
                step.target_date = target;
                affected.push(step.step_number);
            }
        }
    }
    affected
}

/// Groups steps by department, departments in first-appearance order,
/// steps in catalog order within each group.
pub fn group_by_department(steps: &[StepInstance]) -> Vec<(Department, Vec<&StepInstance>)> {
    let mut groups: Vec<(Department, Vec<&StepInstance>)> = Vec::new();
    for step in steps {
        match groups.iter_mut().find(|(dept, _)| *dept == step.department) {
            Some((_, members)) => members.push(step),
            None => groups.push((step.department, vec![step])),
        }
    }
    groups
}

/// Critical steps that still need work, in catalog order.
pub fn critical_incomplete(steps: &[StepInstance]) -> Vec<&StepInstance> {
    steps
        .iter()
        .filter(|s| s.is_critical && s.is_open())
        .collect()
}

/// Steps this event would actually complete: triggered by the payload,
/// still open, and with every dependency met.
pub fn auto_completable_steps(
    steps: &[StepInstance],
    action: TriggerAction,
    data: &Map<String, Value>,
) -> Vec<StepNumber> {
    let completed: BTreeSet<StepNumber> = steps
        .iter()
        .filter(|s| s.status.is_terminal())
        .map(|s| s.step_number)
        .collect();
    triggers::triggered_steps(action, data)
        .into_iter()
        .filter(|number| {
            let open = steps
                .iter()
                .any(|s| s.step_number == *number && !s.status.is_terminal());
            let deps = catalog::definition(*number)
                .map(|def| def.dependencies)
                .unwrap_or(&[]);
            open && deps.iter().all(|d| completed.contains(d))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;
    use crate::catalog::Division;
    use crate::models::{ShipmentStatus, WorkflowProgress};

    fn shipment(eta: Date) -> Shipment {
        Shipment {
            id: 1,
            shipment_number: "SHP-2026-001".to_string(),
            principal: "Toyota Motor Corporation".to_string(),
            brand: "Toyota".to_string(),
            lc_number: None,
            invoice_amount: Some(10_000.0),
            eta,
            eta_edit_count: 0,
            division: Division::Automotive,
            status: ShipmentStatus::Active,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        }
    }

    fn find<'a>(steps: &'a [StepInstance], number: StepNumber) -> &'a StepInstance {
        steps
            .iter()
            .find(|s| s.step_number == number)
            .expect("step should exist")
    }

    fn complete(steps: &mut [StepInstance], number: StepNumber, on: Date) {
        let step = steps
            .iter_mut()
            .find(|s| s.step_number == number)
            .expect("step should exist");
        step.status = StepStatus::Completed;
        step.actual_date = Some(on);
    }

    #[test]
    fn instantiation_covers_the_whole_catalog() {
        let cal = BusinessCalendar::default();
        let steps = instantiate_steps(&shipment(date(2026, 3, 1)), &cal, Timestamp::UNIX_EPOCH);
        assert_eq!(steps.len(), 34);
        assert!(steps.iter().all(|s| s.status == StepStatus::Pending));
        // ETA-day steps share the ETA date
        assert_eq!(find(&steps, StepNumber::new(7, 0)).target_date, date(2026, 3, 1));
        // registration runs 30 business days before the ETA
        assert!(find(&steps, StepNumber::new(1, 1)).target_date < date(2026, 2, 1));
    }

    #[test]
    fn unmet_dependencies_block_a_step() {
        let cal = BusinessCalendar::default();
        let eta = date(2026, 6, 1);
        let mut steps = instantiate_steps(&shipment(eta), &cal, Timestamp::UNIX_EPOCH);
        refresh_statuses(&mut steps, &cal, date(2026, 1, 5));
        let bayan = find(&steps, StepNumber::new(9, 0));
        assert_eq!(bayan.status, StepStatus::Blocked);
        assert!(bayan.is_blocked);
    }

    #[test]
    fn satisfied_dependencies_make_a_future_step_ready() {
        let cal = BusinessCalendar::default();
        let eta = date(2026, 6, 1);
        let mut steps = instantiate_steps(&shipment(eta), &cal, Timestamp::UNIX_EPOCH);
        let today = date(2026, 1, 5);
        for dep in [StepNumber::new(6, 1)] {
            complete(&mut steps, dep, today);
        }
        refresh_statuses(&mut steps, &cal, today);
        let release = find(&steps, StepNumber::new(6, 2));
        assert_eq!(release.status, StepStatus::Ready);
        assert!(!release.is_blocked);
    }

    #[test]
    fn deadlines_drive_overdue_and_at_risk() {
        let cal = BusinessCalendar::default();
        let eta = date(2026, 3, 4); // Wednesday
        let mut steps = instantiate_steps(&shipment(eta), &cal, Timestamp::UNIX_EPOCH);
        // port arrival targets the ETA day and has no dependencies
        refresh_statuses(&mut steps, &cal, date(2026, 3, 5));
        assert_eq!(find(&steps, StepNumber::new(7, 1)).status, StepStatus::Overdue);
        refresh_statuses(&mut steps, &cal, date(2026, 3, 3));
        assert_eq!(find(&steps, StepNumber::new(7, 1)).status, StepStatus::AtRisk);
        refresh_statuses(&mut steps, &cal, date(2026, 3, 1));
        assert_eq!(find(&steps, StepNumber::new(7, 1)).status, StepStatus::InProgress);
        refresh_statuses(&mut steps, &cal, date(2026, 2, 20));
        assert_eq!(find(&steps, StepNumber::new(7, 1)).status, StepStatus::Pending);
    }

    #[test]
    fn completed_steps_never_turn_overdue() {
        let cal = BusinessCalendar::default();
        let eta = date(2026, 3, 1);
        let mut steps = instantiate_steps(&shipment(eta), &cal, Timestamp::UNIX_EPOCH);
        complete(&mut steps, StepNumber::new(7, 1), date(2026, 3, 1));
        refresh_statuses(&mut steps, &cal, date(2026, 4, 1));
        let arrival = find(&steps, StepNumber::new(7, 1));
        assert_eq!(arrival.status, StepStatus::Completed);
        assert!(!arrival.is_blocked);
    }

    #[test]
    fn eta_change_moves_only_open_steps() {
        let cal = BusinessCalendar::default();
        let eta = date(2026, 3, 1);
        let mut steps = instantiate_steps(&shipment(eta), &cal, Timestamp::UNIX_EPOCH);
        complete(&mut steps, StepNumber::new(1, 1), date(2026, 1, 10));
        let old_target = find(&steps, StepNumber::new(1, 1)).target_date;
        let affected = recalculate_targets(&mut steps, date(2026, 3, 15), &cal);
        assert!(!affected.contains(&StepNumber::new(1, 1)));
        assert_eq!(find(&steps, StepNumber::new(1, 1)).target_date, old_target);
        assert!(affected.contains(&StepNumber::new(9, 0)));
        assert_eq!(
            find(&steps, StepNumber::new(7, 0)).target_date,
            date(2026, 3, 15)
        );
    }

    #[test]
    fn department_groups_keep_catalog_order() {
        let cal = BusinessCalendar::default();
        let steps = instantiate_steps(&shipment(date(2026, 3, 1)), &cal, Timestamp::UNIX_EPOCH);
        let groups = group_by_department(&steps);
        let departments: Vec<_> = groups.iter().map(|(d, _)| *d).collect();
        assert_eq!(
            departments,
            vec![
                Department::BusinessUnit,
                Department::Finance,
                Department::CustomsClearance,
                Department::Stores,
            ]
        );
        let total: usize = groups.iter().map(|(_, members)| members.len()).sum();
        assert_eq!(total, 34);
    }

    #[test]
    fn critical_steps_surface_until_completed() {
        let cal = BusinessCalendar::default();
        let mut steps = instantiate_steps(&shipment(date(2026, 3, 1)), &cal, Timestamp::UNIX_EPOCH);
        assert_eq!(critical_incomplete(&steps).len(), 6);
        complete(&mut steps, StepNumber::new(9, 0), date(2026, 3, 2));
        assert_eq!(critical_incomplete(&steps).len(), 5);
    }

    #[test]
    fn events_only_complete_open_unblocked_steps() {
        let cal = BusinessCalendar::default();
        let mut steps = instantiate_steps(&shipment(date(2026, 3, 1)), &cal, Timestamp::UNIX_EPOCH);
        let mut data = Map::new();
        data.insert("event".to_string(), Value::from("proforma-invoice"));
        data.insert("document_ref".to_string(), Value::from("PI-1"));

        assert_eq!(
            auto_completable_steps(&steps, TriggerAction::Upload, &data),
            vec![StepNumber::new(1, 3)]
        );

        // already terminal: nothing left for the event to do
        complete(&mut steps, StepNumber::new(1, 3), date(2026, 1, 10));
        assert!(auto_completable_steps(&steps, TriggerAction::Upload, &data).is_empty());

        // approval trigger for 3.2 is held back by its open dependency 3.1
        let mut approval = Map::new();
        approval.insert("approved".to_string(), Value::from(true));
        approval.insert("approved_by".to_string(), Value::from("fin.apr"));
        assert!(auto_completable_steps(&steps, TriggerAction::Approve, &approval).is_empty());
    }

    #[test]
    fn progress_tracks_terminal_steps() {
        let cal = BusinessCalendar::default();
        let mut steps = instantiate_steps(&shipment(date(2026, 3, 1)), &cal, Timestamp::UNIX_EPOCH);
        complete(&mut steps, StepNumber::new(1, 1), date(2026, 1, 10));
        complete(&mut steps, StepNumber::new(1, 2), date(2026, 1, 10));
        let progress = WorkflowProgress::from_steps(&steps);
        assert_eq!(progress.total, 34);
        assert_eq!(progress.completed, 2);
        assert_eq!(progress.percentage, 6);
    }
}
