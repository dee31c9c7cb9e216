//! Workflow step operations for the Tracker.

use jiff::Timestamp;
use serde_json::{Map, Value};
use tokio::task;

use super::Tracker;
use crate::{
    catalog::{self, FieldKind, StepDefinition, StepNumber},
    db::{step_queries::StepResolution, Database},
    error::{Result, ResultExt, TrackerError},
    models::{ShipmentStatus, StepInstance, StepStatus, WorkflowProgress},
    params::{ActionEvent, CompleteStep, ListSteps, SkipStep},
    triggers::TriggerAction,
    workflow,
};

fn field_present(fields: &Map<String, Value>, name: &str) -> bool {
    match fields.get(name) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

/// Enforces required fields and fills in calculated ones. The invoice
/// amount known on the shipment backs calculations when the payload
/// does not carry one.
fn validated_fields(
    def: &StepDefinition,
    mut fields: Map<String, Value>,
    invoice_amount: Option<f64>,
) -> Result<Map<String, Value>> {
    for spec in def.fields {
        match spec.kind {
            FieldKind::Calculated(formula) => {
                let base = fields
                    .get("invoice_amount")
                    .and_then(Value::as_f64)
                    .or(invoice_amount);
                if let Some(base) = base {
                    fields.insert(spec.name.to_string(), Value::from(formula.apply(base)));
                }
            }
            _ => {
                if spec.required && !field_present(&fields, spec.name) {
                    return Err(TrackerError::invalid_input(
                        spec.name,
                        format!("required for step {}", def.number),
                    ));
                }
            }
        }
    }
    Ok(fields)
}

/// Dependencies of `number` that are not yet completed or skipped.
fn unmet_dependencies(steps: &[StepInstance], number: StepNumber) -> Vec<StepNumber> {
    let deps = catalog::definition(number)
        .map(|def| def.dependencies)
        .unwrap_or(&[]);
    deps.iter()
        .filter(|dep| {
            !steps
                .iter()
                .any(|s| s.step_number == **dep && s.status.is_terminal())
        })
        .copied()
        .collect()
}

/// Marks the shipment completed once every step has reached a terminal
/// state.
fn close_shipment_if_done(db: &mut Database, shipment_id: u64, now: Timestamp) -> Result<()> {
    let steps = db.get_steps(shipment_id)?;
    if !steps.is_empty() && steps.iter().all(|s| s.status.is_terminal()) {
        db.set_shipment_status(shipment_id, ShipmentStatus::Completed, now)?;
    }
    Ok(())
}

impl Tracker {
    /// Retrieves a shipment's steps with derived statuses, honoring the
    /// filter.
    pub async fn get_steps(&self, params: &ListSteps) -> Result<Vec<StepInstance>> {
        let db_path = self.db_path.clone();
        let calendar = self.calendar.clone();
        let params = params.clone();
        let today = Self::today();

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            if db.get_shipment(params.shipment_id)?.is_none() {
                return Err(TrackerError::ShipmentNotFound {
                    id: params.shipment_id,
                });
            }
            let mut steps = db.get_steps(params.shipment_id)?;
            workflow::refresh_statuses(&mut steps, &calendar, today);
            steps.retain(|s| params.filter.matches(s));
            Ok(steps)
        })
        .await
        .with_context("Task join error")?
    }

    /// Retrieves a single step with its derived status.
    pub async fn get_step(&self, shipment_id: u64, number: StepNumber) -> Result<StepInstance> {
        let db_path = self.db_path.clone();
        let calendar = self.calendar.clone();
        let today = Self::today();

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            let mut steps = db.get_steps(shipment_id)?;
            if steps.is_empty() {
                return Err(TrackerError::ShipmentNotFound { id: shipment_id });
            }
            workflow::refresh_statuses(&mut steps, &calendar, today);
            steps
                .into_iter()
                .find(|s| s.step_number == number)
                .ok_or(TrackerError::StepNotFound {
                    shipment_id,
                    step_number: number.to_string(),
                })
        })
        .await
        .with_context("Task join error")?
    }

    /// Completes a workflow step. Rejects future completion dates,
    /// terminal steps and steps with unmet dependencies.
    pub async fn complete_step(&self, params: &CompleteStep) -> Result<StepInstance> {
        let def = catalog::definition(params.step_number)
            .ok_or_else(|| TrackerError::UnknownStep(params.step_number.to_string()))?;

        let db_path = self.db_path.clone();
        let params = params.clone();
        let today = Self::today();

        task::spawn_blocking(move || {
            let actual_date = params.actual_date.unwrap_or(today);
            if actual_date > today {
                return Err(TrackerError::invalid_input(
                    "actual_date",
                    "completion date cannot be in the future",
                ));
            }

            let mut db = Database::new(&db_path)?;
            let shipment = db
                .get_shipment(params.shipment_id)?
                .ok_or(TrackerError::ShipmentNotFound {
                    id: params.shipment_id,
                })?;
            let steps = db.get_steps(params.shipment_id)?;
            let step = steps
                .iter()
                .find(|s| s.step_number == params.step_number)
                .ok_or_else(|| TrackerError::StepNotFound {
                    shipment_id: params.shipment_id,
                    step_number: params.step_number.to_string(),
                })?;
            if step.status.is_terminal() {
                return Err(TrackerError::invalid_input(
                    "step_number",
                    format!("step {} is already {}", step.step_number, step.status),
                ));
            }
            let unmet = unmet_dependencies(&steps, params.step_number);
            if !unmet.is_empty() {
                let list: Vec<String> = unmet.iter().map(ToString::to_string).collect();
                return Err(TrackerError::invalid_input(
                    "step_number",
                    format!(
                        "step {} is blocked by incomplete steps {}",
                        params.step_number,
                        list.join(", ")
                    ),
                ));
            }

            let fields = validated_fields(def, params.fields.clone(), shipment.invoice_amount)?;
            let now = Timestamp::now();
            if shipment.invoice_amount.is_none() {
                if let Some(amount) = fields.get("invoice_amount").and_then(Value::as_f64) {
                    db.set_invoice_amount(shipment.id, amount, now)?;
                }
            }

            let fields_json = if fields.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&fields)?)
            };
            let completed = db.resolve_step(
                params.shipment_id,
                params.step_number,
                StepResolution {
                    status: StepStatus::Completed,
                    actual_date,
                    performed_by: &params.completed_by,
                    notes: params.notes.as_deref(),
                    fields_json,
                    log_action: "complete",
                    log_data: params.notes.as_ref().map(|n| {
                        serde_json::json!({ "notes": n }).to_string()
                    }),
                },
                now,
            )?;
            close_shipment_if_done(&mut db, params.shipment_id, now)?;
            Ok(completed)
        })
        .await
        .with_context("Task join error")?
    }

    /// Skips an optional step. Mandatory steps can not be skipped.
    pub async fn skip_step(&self, params: &SkipStep) -> Result<StepInstance> {
        let def = catalog::definition(params.step_number)
            .ok_or_else(|| TrackerError::UnknownStep(params.step_number.to_string()))?;
        if !def.is_optional {
            return Err(TrackerError::invalid_input(
                "step_number",
                format!("step {} is mandatory and cannot be skipped", def.number),
            ));
        }

        let db_path = self.db_path.clone();
        let params = params.clone();
        let today = Self::today();

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            let step = db
                .get_step(params.shipment_id, params.step_number)?
                .ok_or_else(|| TrackerError::StepNotFound {
                    shipment_id: params.shipment_id,
                    step_number: params.step_number.to_string(),
                })?;
            if step.status.is_terminal() {
                return Err(TrackerError::invalid_input(
                    "step_number",
                    format!("step {} is already {}", step.step_number, step.status),
                ));
            }

            let now = Timestamp::now();
            let skipped = db.resolve_step(
                params.shipment_id,
                params.step_number,
                StepResolution {
                    status: StepStatus::Skipped,
                    actual_date: today,
                    performed_by: &params.skipped_by,
                    notes: params.notes.as_deref(),
                    fields_json: None,
                    log_action: "skip",
                    log_data: None,
                },
                now,
            )?;
            close_shipment_if_done(&mut db, params.shipment_id, now)?;
            Ok(skipped)
        })
        .await
        .with_context("Task join error")?
    }

    /// Reverts a completed or skipped step back to pending.
    pub async fn reopen_step(
        &self,
        shipment_id: u64,
        number: StepNumber,
        performed_by: &str,
    ) -> Result<()> {
        let db_path = self.db_path.clone();
        let performed_by = performed_by.to_string();

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            db.reopen_step(shipment_id, number, &performed_by, Timestamp::now())
        })
        .await
        .with_context("Task join error")?
    }

    /// Aggregate completion figures for a shipment.
    pub async fn progress(&self, shipment_id: u64) -> Result<WorkflowProgress> {
        let db_path = self.db_path.clone();
        let calendar = self.calendar.clone();
        let today = Self::today();

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            let mut steps = db.get_steps(shipment_id)?;
            if steps.is_empty() {
                return Err(TrackerError::ShipmentNotFound { id: shipment_id });
            }
            workflow::refresh_statuses(&mut steps, &calendar, today);
            Ok(WorkflowProgress::from_steps(&steps))
        })
        .await
        .with_context("Task join error")?
    }

    /// Critical steps still requiring work, in catalog order.
    pub async fn critical_incomplete(&self, shipment_id: u64) -> Result<Vec<StepInstance>> {
        let db_path = self.db_path.clone();
        let calendar = self.calendar.clone();
        let today = Self::today();

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            let mut steps = db.get_steps(shipment_id)?;
            if steps.is_empty() {
                return Err(TrackerError::ShipmentNotFound { id: shipment_id });
            }
            workflow::refresh_statuses(&mut steps, &calendar, today);
            steps.retain(|s| s.is_critical && s.is_open());
            Ok(steps)
        })
        .await
        .with_context("Task join error")?
    }

    /// Runs a business event through the automation triggers and
    /// completes every matching open step whose dependencies are met.
    /// Returns the steps that were completed.
    pub async fn apply_event(&self, params: &ActionEvent) -> Result<Vec<StepNumber>> {
        let db_path = self.db_path.clone();
        let params = params.clone();
        let today = Self::today();

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            let shipment = db
                .get_shipment(params.shipment_id)?
                .ok_or(TrackerError::ShipmentNotFound {
                    id: params.shipment_id,
                })?;

            let now = Timestamp::now();
            db.append_log(
                params.shipment_id,
                None,
                params.action.as_str(),
                &params.performed_by,
                Some(&Value::Object(params.data.clone())),
                now,
            )?;

            if params.action == TriggerAction::Calculate && shipment.invoice_amount.is_none() {
                if let Some(amount) = params.data.get("invoice_amount").and_then(Value::as_f64) {
                    db.set_invoice_amount(shipment.id, amount, now)?;
                }
            }

            let steps = db.get_steps(params.shipment_id)?;
            let fields_json = serde_json::to_string(&params.data)?;
            let mut completed = Vec::new();
            for number in workflow::auto_completable_steps(&steps, params.action, &params.data) {
                db.resolve_step(
                    params.shipment_id,
                    number,
                    StepResolution {
                        status: StepStatus::Completed,
                        actual_date: today,
                        performed_by: &params.performed_by,
                        notes: None,
                        fields_json: Some(fields_json.clone()),
                        log_action: "auto_complete",
                        log_data: None,
                    },
                    now,
                )?;
                completed.push(number);
            }
            close_shipment_if_done(&mut db, params.shipment_id, now)?;
            Ok(completed)
        })
        .await
        .with_context("Task join error")?
    }
}
