use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::{EventArgs, ShipmentCommands, StepCommands};

/// Main command-line interface for the clearance tracking tool
///
/// Clearance tracks inbound shipments through the 34-step customs
/// clearance workflow: document collection, clearance funds, Bayan
/// submission, duty payments and warehouse receipt. Target dates are
/// derived from the vessel ETA on a Sunday-to-Thursday work week.
#[derive(Parser)]
#[command(version, about, name = "clearance")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/clearance/clearance.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Act as this user account (controls step access)
    #[arg(long, global = true, default_value = "admin")]
    pub user: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for the clearance CLI
///
/// The CLI is organized into four command categories:
/// - `shipment`: Register, list and manage shipments
/// - `step`: Inspect and complete workflow steps
/// - `event`: Feed business events through the automation triggers
/// - `users`: List the known user accounts
#[derive(Subcommand)]
pub enum Commands {
    /// Manage shipments
    #[command(alias = "sh")]
    Shipment {
        #[command(subcommand)]
        command: ShipmentCommands,
    },
    /// Manage workflow steps
    #[command(alias = "s")]
    Step {
        #[command(subcommand)]
        command: StepCommands,
    },
    /// Apply a business event to a shipment's workflow
    #[command(alias = "e")]
    Event(EventArgs),
    /// List the known user accounts
    Users,
}
