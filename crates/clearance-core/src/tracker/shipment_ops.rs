//! Shipment operations for the Tracker.

use jiff::civil::Date;
use jiff::Timestamp;
use serde_json::{json, Map, Value};
use tokio::task;

use super::Tracker;
use crate::{
    calendar::BusinessCalendar,
    catalog::StepNumber,
    db::{step_queries::StepResolution, Database},
    error::{Result, ResultExt, TrackerError},
    models::{
        ActionLogEntry, EtaChangeReport, Shipment, ShipmentDetail, ShipmentStatus, StepStatus,
        TargetDateChange, WorkflowProgress,
    },
    params::{ListShipments, RegisterShipment, UpdateEta},
    triggers::{self, TriggerAction},
    workflow,
};

/// Builds the detail view of a shipment: steps with freshly derived
/// statuses, progress and demurrage exposure.
pub(super) fn load_detail(
    db: &Database,
    shipment: Shipment,
    calendar: &BusinessCalendar,
    today: Date,
) -> Result<ShipmentDetail> {
    let mut steps = db.get_steps(shipment.id)?;
    workflow::refresh_statuses(&mut steps, calendar, today);
    let progress = WorkflowProgress::from_steps(&steps);
    // goods collection (11.1) closes the demurrage clock
    let collected = steps
        .iter()
        .find(|s| s.step_number == StepNumber::new(11, 1))
        .and_then(|s| match s.status {
            StepStatus::Completed => s.actual_date,
            _ => None,
        });
    let demurrage_risk = calendar.demurrage_risk(shipment.eta, collected, today);
    Ok(ShipmentDetail {
        shipment,
        steps,
        progress,
        demurrage_risk,
    })
}

impl Tracker {
    /// Registers a new shipment, materializing all 34 workflow steps
    /// and auto-completing the registration steps.
    pub async fn register_shipment(&self, params: &RegisterShipment) -> Result<ShipmentDetail> {
        for (field, value) in [
            ("shipment_number", &params.shipment_number),
            ("principal", &params.principal),
            ("brand", &params.brand),
        ] {
            if value.trim().is_empty() {
                return Err(TrackerError::invalid_input(field, "must not be empty"));
            }
        }

        let db_path = self.db_path.clone();
        let calendar = self.calendar.clone();
        let params = params.clone();
        let today = Self::today();

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            let now = Timestamp::now();
            let shipment = Shipment {
                id: 0,
                shipment_number: params.shipment_number.clone(),
                principal: params.principal.clone(),
                brand: params.brand.clone(),
                lc_number: params.lc_number.clone(),
                invoice_amount: params.invoice_amount,
                eta: params.eta,
                eta_edit_count: 0,
                division: params.division,
                status: ShipmentStatus::Active,
                created_at: now,
                updated_at: now,
            };
            let steps = workflow::instantiate_steps(&shipment, &calendar, now);
            let shipment = db.create_shipment(&shipment, &steps)?;

            db.append_log(
                shipment.id,
                None,
                "register",
                &params.registered_by,
                Some(&json!({
                    "shipment_number": shipment.shipment_number,
                    "eta": shipment.eta.to_string(),
                })),
                now,
            )?;

            // registration itself is the trigger for the first two steps
            let mut data = Map::new();
            data.insert("principal".to_string(), Value::from(params.principal.clone()));
            data.insert("brand".to_string(), Value::from(params.brand.clone()));
            let fields_json = serde_json::to_string(&data)?;
            for number in triggers::triggered_steps(TriggerAction::Create, &data) {
                db.resolve_step(
                    shipment.id,
                    number,
                    StepResolution {
                        status: StepStatus::Completed,
                        actual_date: today,
                        performed_by: &params.registered_by,
                        notes: None,
                        fields_json: Some(fields_json.clone()),
                        log_action: "auto_complete",
                        log_data: None,
                    },
                    now,
                )?;
            }

            load_detail(&db, shipment, &calendar, today)
        })
        .await
        .with_context("Task join error")?
    }

    /// Lists shipments matching the filter, soonest ETA first.
    pub async fn list_shipments(&self, params: &ListShipments) -> Result<Vec<Shipment>> {
        let db_path = self.db_path.clone();
        let filter = params.filter.clone();

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            db.list_shipments(&filter)
        })
        .await
        .with_context("Task join error")?
    }

    /// Retrieves a shipment's full detail view.
    pub async fn get_shipment(&self, shipment_id: u64) -> Result<ShipmentDetail> {
        let db_path = self.db_path.clone();
        let calendar = self.calendar.clone();
        let today = Self::today();

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            let shipment = db
                .get_shipment(shipment_id)?
                .ok_or(TrackerError::ShipmentNotFound { id: shipment_id })?;
            load_detail(&db, shipment, &calendar, today)
        })
        .await
        .with_context("Task join error")?
    }

    /// Resolves a shipment from either its database id or its business
    /// reference.
    pub async fn find_shipment(&self, reference: &str) -> Result<Shipment> {
        let db_path = self.db_path.clone();
        let reference = reference.to_string();

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            if let Ok(id) = reference.parse::<u64>() {
                if let Some(shipment) = db.get_shipment(id)? {
                    return Ok(shipment);
                }
            }
            db.get_shipment_by_number(&reference)?
                .ok_or_else(|| TrackerError::invalid_input(
                    "shipment",
                    format!("no shipment matches `{reference}`"),
                ))
        })
        .await
        .with_context("Task join error")?
    }

    /// Revises a shipment's ETA and recalculates target dates of all
    /// open steps. At most three revisions are allowed per shipment.
    pub async fn update_eta(&self, params: &UpdateEta) -> Result<EtaChangeReport> {
        let db_path = self.db_path.clone();
        let calendar = self.calendar.clone();
        let params = params.clone();

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            let shipment = db
                .get_shipment(params.shipment_id)?
                .ok_or(TrackerError::ShipmentNotFound {
                    id: params.shipment_id,
                })?;
            if !shipment.can_edit_eta() {
                return Err(TrackerError::invalid_input(
                    "new_eta",
                    format!(
                        "ETA of shipment `{}` has already been revised {} times",
                        shipment.shipment_number, shipment.eta_edit_count
                    ),
                ));
            }
            if params.new_eta == shipment.eta {
                return Err(TrackerError::invalid_input(
                    "new_eta",
                    "new ETA equals the current ETA",
                ));
            }

            let mut steps = db.get_steps(params.shipment_id)?;
            let old_targets: Vec<(StepNumber, Date)> = steps
                .iter()
                .map(|s| (s.step_number, s.target_date))
                .collect();
            let affected = workflow::recalculate_targets(&mut steps, params.new_eta, &calendar);
            let moved: Vec<TargetDateChange> = steps
                .iter()
                .filter(|s| affected.contains(&s.step_number))
                .map(|s| TargetDateChange {
                    step_number: s.step_number,
                    previous_target: old_targets
                        .iter()
                        .find(|(n, _)| *n == s.step_number)
                        .map(|(_, d)| *d)
                        .unwrap_or(s.target_date),
                    new_target: s.target_date,
                })
                .collect();
            let targets: Vec<_> = moved
                .iter()
                .map(|c| (c.step_number, c.new_target))
                .collect();

            let now = Timestamp::now();
            let edit_count = shipment.eta_edit_count + 1;
            db.update_shipment_eta(params.shipment_id, params.new_eta, edit_count, &targets, now)?;
            db.append_log(
                params.shipment_id,
                None,
                "eta_update",
                &params.updated_by,
                Some(&json!({
                    "previous_eta": shipment.eta.to_string(),
                    "new_eta": params.new_eta.to_string(),
                })),
                now,
            )?;

            Ok(EtaChangeReport {
                previous_eta: shipment.eta,
                new_eta: params.new_eta,
                edits_remaining: crate::models::MAX_ETA_EDITS - edit_count,
                affected_steps: moved,
            })
        })
        .await
        .with_context("Task join error")?
    }

    /// Deletes a shipment with its steps and audit trail.
    pub async fn delete_shipment(&self, shipment_id: u64) -> Result<()> {
        let db_path = self.db_path.clone();

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            if db.delete_shipment(shipment_id)? {
                Ok(())
            } else {
                Err(TrackerError::ShipmentNotFound { id: shipment_id })
            }
        })
        .await
        .with_context("Task join error")?
    }

    /// Full audit trail of a shipment, oldest entry first.
    pub async fn action_log(&self, shipment_id: u64) -> Result<Vec<ActionLogEntry>> {
        let db_path = self.db_path.clone();

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            if db.get_shipment(shipment_id)?.is_none() {
                return Err(TrackerError::ShipmentNotFound { id: shipment_id });
            }
            db.get_logs(shipment_id)
        })
        .await
        .with_context("Task join error")?
    }
}
