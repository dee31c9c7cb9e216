//! Command-line interface definitions using clap
//!
//! This module defines the CLI structure using clap's derive API,
//! implementing the parameter wrapper pattern: each command gets a
//! clap-specific argument struct that converts into the framework-free
//! parameter types of the core crate.
//!
//! ```text
//! User Input → CLI Args (clap) → Core Params → Business Logic
//! ```
//!
//! CLI concerns (help text, aliases, key=value parsing) stay here; the
//! core parameter types remain interface-agnostic.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use jiff::civil::Date;
use serde_json::{Map, Value};

use clearance_core::{
    access::{seed_accounts, UserAccount},
    display::{ActionLog, CreateResult, DeleteResult, OperationStatus, Shipments, Steps},
    params::{
        ActionEvent, CompleteStep, ListShipments, ListSteps, RegisterShipment, SkipStep, UpdateEta,
    },
    Department, Division, ShipmentFilter, ShipmentStatus, StepFilter, StepNumber, StepStatus,
    Tracker, TriggerAction,
};

use crate::renderer::TerminalRenderer;

/// Parses a `key=value` argument. Values that parse as JSON (numbers,
/// booleans, null) are stored typed; everything else stays a string.
fn parse_key_val(s: &str) -> std::result::Result<(String, Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{s}`"))?;
    let value = match serde_json::from_str::<Value>(value) {
        Ok(v @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => v,
        _ => Value::from(value),
    };
    Ok((key.to_string(), value))
}

fn to_map(pairs: Vec<(String, Value)>) -> Map<String, Value> {
    pairs.into_iter().collect()
}

/// Register a new shipment
#[derive(Args)]
pub struct RegisterShipmentArgs {
    /// Business reference, e.g. SHP-2026-001
    pub shipment_number: String,
    /// Principal the goods are bought from
    #[arg(short, long)]
    pub principal: String,
    /// Brand carried by the shipment
    #[arg(short, long)]
    pub brand: String,
    /// Estimated time of arrival (ISO date)
    #[arg(short, long)]
    pub eta: Date,
    /// Business division (automotive, machinery, spares)
    #[arg(long, default_value = "automotive")]
    pub division: Division,
    /// Letter of credit reference
    #[arg(long)]
    pub lc_number: Option<String>,
    /// Commercial invoice value in OMR
    #[arg(long)]
    pub invoice_amount: Option<f64>,
}

impl RegisterShipmentArgs {
    fn into_params(self, registered_by: &str) -> RegisterShipment {
        RegisterShipment {
            shipment_number: self.shipment_number,
            principal: self.principal,
            brand: self.brand,
            eta: self.eta,
            division: self.division,
            lc_number: self.lc_number,
            invoice_amount: self.invoice_amount,
            registered_by: registered_by.to_string(),
        }
    }
}

/// List shipments
#[derive(Args)]
pub struct ListShipmentsArgs {
    /// Filter by shipment status (active, completed, cancelled)
    #[arg(long)]
    pub status: Option<ShipmentStatus>,
    /// Filter by division
    #[arg(long)]
    pub division: Option<Division>,
    /// Filter by principal name (substring match)
    #[arg(long)]
    pub principal: Option<String>,
}

impl From<ListShipmentsArgs> for ListShipments {
    fn from(val: ListShipmentsArgs) -> Self {
        ListShipments {
            filter: ShipmentFilter {
                status: val.status,
                division: val.division,
                principal: val.principal,
            },
        }
    }
}

/// Show details of a specific shipment
#[derive(Args)]
pub struct ShowShipmentArgs {
    /// Shipment id or business reference
    pub reference: String,
}

/// Revise a shipment's ETA
#[derive(Args)]
pub struct UpdateEtaArgs {
    /// Shipment id or business reference
    pub reference: String,
    /// The revised ETA (ISO date)
    pub new_eta: Date,
}

/// Delete a shipment permanently
#[derive(Args)]
pub struct DeleteShipmentArgs {
    /// Shipment id or business reference
    pub reference: String,
    /// Confirm the deletion (required to prevent accidental deletion)
    #[arg(long)]
    pub confirm: bool,
}

/// Show a shipment's audit trail
#[derive(Args)]
pub struct LogArgs {
    /// Shipment id or business reference
    pub reference: String,
}

#[derive(Subcommand)]
pub enum ShipmentCommands {
    /// Register a new shipment with its 34 workflow steps
    #[command(alias = "r")]
    Register(RegisterShipmentArgs),
    /// List shipments
    #[command(aliases = ["l", "ls"])]
    List(ListShipmentsArgs),
    /// Show details of a specific shipment
    #[command(alias = "s")]
    Show(ShowShipmentArgs),
    /// Revise a shipment's ETA (at most three times)
    #[command(alias = "eta")]
    UpdateEta(UpdateEtaArgs),
    /// Delete a shipment permanently
    #[command(aliases = ["d", "rm"])]
    Delete(DeleteShipmentArgs),
    /// Show a shipment's audit trail
    Log(LogArgs),
}

/// List the workflow steps of a shipment
#[derive(Args)]
pub struct ListStepsArgs {
    /// Shipment id or business reference
    pub reference: String,
    /// Filter by owning department (e.g. "Finance", "C&C")
    #[arg(long)]
    pub department: Option<Department>,
    /// Filter by derived status (pending, ready, at_risk, overdue, ...)
    #[arg(long)]
    pub status: Option<StepStatus>,
    /// Show only critical steps
    #[arg(long)]
    pub critical: bool,
}

/// Show a single workflow step
#[derive(Args)]
pub struct ShowStepArgs {
    /// Shipment id or business reference
    pub reference: String,
    /// Step number, e.g. 9.0
    pub step: StepNumber,
}

/// Complete a workflow step
#[derive(Args)]
pub struct CompleteStepArgs {
    /// Shipment id or business reference
    pub reference: String,
    /// Step number, e.g. 9.0
    pub step: StepNumber,
    /// Completion date; defaults to today, future dates rejected
    #[arg(short, long)]
    pub date: Option<Date>,
    /// Free-form notes recorded on the step
    #[arg(short, long)]
    pub notes: Option<String>,
    /// Step form field as key=value (repeatable)
    #[arg(short = 'f', long = "field", value_parser = parse_key_val)]
    pub fields: Vec<(String, Value)>,
}

/// Skip an optional workflow step
#[derive(Args)]
pub struct SkipStepArgs {
    /// Shipment id or business reference
    pub reference: String,
    /// Step number, e.g. 12.3
    pub step: StepNumber,
    /// Free-form notes recorded on the step
    #[arg(short, long)]
    pub notes: Option<String>,
}

/// Revert a completed or skipped step back to pending
#[derive(Args)]
pub struct ReopenStepArgs {
    /// Shipment id or business reference
    pub reference: String,
    /// Step number, e.g. 9.0
    pub step: StepNumber,
}

/// Show critical steps that still need work
#[derive(Args)]
pub struct CriticalArgs {
    /// Shipment id or business reference
    pub reference: String,
}

/// Show workflow completion progress
#[derive(Args)]
pub struct ProgressArgs {
    /// Shipment id or business reference
    pub reference: String,
}

#[derive(Subcommand)]
pub enum StepCommands {
    /// List the workflow steps of a shipment
    #[command(aliases = ["l", "ls"])]
    List(ListStepsArgs),
    /// Show a single workflow step
    #[command(alias = "s")]
    Show(ShowStepArgs),
    /// Complete a workflow step
    #[command(alias = "c")]
    Complete(CompleteStepArgs),
    /// Skip an optional workflow step
    Skip(SkipStepArgs),
    /// Revert a completed or skipped step back to pending
    Reopen(ReopenStepArgs),
    /// Show critical steps that still need work
    Critical(CriticalArgs),
    /// Show workflow completion progress
    #[command(alias = "p")]
    Progress(ProgressArgs),
}

/// Apply a business event to a shipment's workflow
///
/// Events run through the automation trigger table and complete every
/// open step whose conditions are satisfied. Examples:
///
///   clearance event SHP-2026-001 upload --event bill-of-lading -d document_ref=BL-99
///   clearance event SHP-2026-001 payment --event customs-duty -d payment_reference=PAY-7
#[derive(Args)]
pub struct EventArgs {
    /// Shipment id or business reference
    pub reference: String,
    /// Action kind (create, update, upload, submit, approve, payment, calculate)
    pub action: TriggerAction,
    /// Named event within the action, e.g. bill-of-lading
    #[arg(long)]
    pub event: Option<String>,
    /// Event payload entry as key=value (repeatable)
    #[arg(short = 'd', long = "data", value_parser = parse_key_val)]
    pub data: Vec<(String, Value)>,
}

/// CLI command handler that connects parsed arguments, the tracker and
/// the terminal renderer.
pub struct Cli {
    tracker: Tracker,
    renderer: TerminalRenderer,
    user: UserAccount,
}

impl Cli {
    pub fn new(tracker: Tracker, renderer: TerminalRenderer, user: UserAccount) -> Self {
        Self {
            tracker,
            renderer,
            user,
        }
    }

    fn require_edit(&self) -> Result<()> {
        if !self.user.can_edit() {
            bail!(
                "user `{}` has {} access and cannot make changes",
                self.user.username,
                self.user.level
            );
        }
        Ok(())
    }

    pub async fn handle_shipment_command(self, command: ShipmentCommands) -> Result<()> {
        match command {
            ShipmentCommands::Register(args) => {
                self.require_edit()?;
                let params = args.into_params(&self.user.username);
                let detail = self.tracker.register_shipment(&params).await?;
                self.renderer.render(&CreateResult::new(detail).to_string())
            }
            ShipmentCommands::List(args) => self.list_shipments(&args.into()).await,
            ShipmentCommands::Show(args) => {
                let shipment = self.tracker.find_shipment(&args.reference).await?;
                let detail = self.tracker.get_shipment(shipment.id).await?;
                self.renderer.render(&detail.to_string())
            }
            ShipmentCommands::UpdateEta(args) => {
                self.require_edit()?;
                let shipment = self.tracker.find_shipment(&args.reference).await?;
                let report = self
                    .tracker
                    .update_eta(&UpdateEta {
                        shipment_id: shipment.id,
                        new_eta: args.new_eta,
                        updated_by: self.user.username.clone(),
                    })
                    .await?;
                self.renderer.render(&report.to_string())
            }
            ShipmentCommands::Delete(args) => {
                if !self.user.can_delete() {
                    bail!(
                        "user `{}` is not allowed to delete shipments",
                        self.user.username
                    );
                }
                if !args.confirm {
                    let status = OperationStatus::failure(
                        "Deletion requires the --confirm flag".to_string(),
                    );
                    return self.renderer.render(&status.to_string());
                }
                let shipment = self.tracker.find_shipment(&args.reference).await?;
                self.tracker.delete_shipment(shipment.id).await?;
                self.renderer
                    .render(&DeleteResult::new(shipment).to_string())
            }
            ShipmentCommands::Log(args) => {
                let shipment = self.tracker.find_shipment(&args.reference).await?;
                let log = self.tracker.action_log(shipment.id).await?;
                self.renderer.render(&ActionLog(log).to_string())
            }
        }
    }

    pub async fn list_shipments(&self, params: &ListShipments) -> Result<()> {
        let shipments = self.tracker.list_shipments(params).await?;
        self.renderer.render(&Shipments(shipments).to_string())
    }

    pub async fn handle_step_command(self, command: StepCommands) -> Result<()> {
        match command {
            StepCommands::List(args) => {
                let shipment = self.tracker.find_shipment(&args.reference).await?;
                let mut steps = self
                    .tracker
                    .get_steps(&ListSteps {
                        shipment_id: shipment.id,
                        filter: StepFilter {
                            department: args.department,
                            status: args.status,
                            critical_only: args.critical,
                        },
                    })
                    .await?;
                steps.retain(|s| self.user.can_access_step(s.step_number));
                self.renderer.render(&Steps(steps).to_string())
            }
            StepCommands::Show(args) => {
                if !self.user.can_access_step(args.step) {
                    bail!(
                        "step {} is outside the scope of user `{}`",
                        args.step,
                        self.user.username
                    );
                }
                let shipment = self.tracker.find_shipment(&args.reference).await?;
                let step = self.tracker.get_step(shipment.id, args.step).await?;
                self.renderer.render(&step.to_string())
            }
            StepCommands::Complete(args) => {
                self.user.authorize_step_edit(args.step)?;
                let shipment = self.tracker.find_shipment(&args.reference).await?;
                let step = self
                    .tracker
                    .complete_step(&CompleteStep {
                        shipment_id: shipment.id,
                        step_number: args.step,
                        completed_by: self.user.username.clone(),
                        actual_date: args.date,
                        notes: args.notes,
                        fields: to_map(args.fields),
                    })
                    .await?;
                self.renderer.render(&CreateResult::new(step).to_string())
            }
            StepCommands::Skip(args) => {
                self.user.authorize_step_edit(args.step)?;
                let shipment = self.tracker.find_shipment(&args.reference).await?;
                let step = self
                    .tracker
                    .skip_step(&SkipStep {
                        shipment_id: shipment.id,
                        step_number: args.step,
                        skipped_by: self.user.username.clone(),
                        notes: args.notes,
                    })
                    .await?;
                self.renderer.render(&CreateResult::new(step).to_string())
            }
            StepCommands::Reopen(args) => {
                self.user.authorize_step_edit(args.step)?;
                let shipment = self.tracker.find_shipment(&args.reference).await?;
                self.tracker
                    .reopen_step(shipment.id, args.step, &self.user.username)
                    .await?;
                let status = OperationStatus::success(format!(
                    "Step {} of shipment {} is pending again",
                    args.step, shipment.shipment_number
                ));
                self.renderer.render(&status.to_string())
            }
            StepCommands::Critical(args) => {
                let shipment = self.tracker.find_shipment(&args.reference).await?;
                let steps = self.tracker.critical_incomplete(shipment.id).await?;
                self.renderer.render(&Steps(steps).to_string())
            }
            StepCommands::Progress(args) => {
                let shipment = self.tracker.find_shipment(&args.reference).await?;
                let progress = self.tracker.progress(shipment.id).await?;
                self.renderer.render(&format!("Progress: {progress}\n"))
            }
        }
    }

    pub async fn handle_event(self, args: EventArgs) -> Result<()> {
        self.require_edit()?;
        let shipment = self.tracker.find_shipment(&args.reference).await?;
        let mut data = to_map(args.data);
        if let Some(event) = args.event {
            data.insert("event".to_string(), Value::from(event));
        }
        let completed = self
            .tracker
            .apply_event(&ActionEvent {
                shipment_id: shipment.id,
                action: args.action,
                performed_by: self.user.username.clone(),
                data,
            })
            .await?;
        let status = if completed.is_empty() {
            OperationStatus::success("Event recorded; no steps auto-completed".to_string())
        } else {
            let steps: Vec<String> = completed.iter().map(ToString::to_string).collect();
            OperationStatus::success(format!("Auto-completed steps: {}", steps.join(", ")))
        };
        self.renderer.render(&status.to_string())
    }

    pub fn list_users(&self) -> Result<()> {
        let mut output = String::from("# User accounts\n\n");
        for account in seed_accounts() {
            output.push_str(&format!(
                "- `{}`: {} ({}, {}, {} access)\n",
                account.username,
                account.display_name,
                account.department,
                account.role.as_str(),
                account.level
            ));
        }
        self.renderer.render(&output)
    }
}
