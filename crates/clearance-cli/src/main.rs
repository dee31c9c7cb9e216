//! Clearance CLI Application
//!
//! Command-line interface for the customs clearance workflow tracker.

mod args;
mod cli;
mod renderer;

use anyhow::{anyhow, Context, Result};
use args::{Args, Commands};
use clap::Parser;
use clearance_core::{access::seed_account, params::ListShipments, TrackerBuilder};
use cli::Cli;
use log::info;
use renderer::TerminalRenderer;
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        no_color,
        user,
        command,
    } = Args::parse();

    let tracker = TrackerBuilder::new()
        .with_database_path(database_file)
        .build()
        .await
        .context("Failed to initialize tracker")?;

    let renderer = TerminalRenderer::new(!no_color);

    let account = seed_account(&user)
        .ok_or_else(|| anyhow!("unknown user `{user}`; run `clearance users` for the list"))?;

    info!("Clearance started as {}", account.username);

    match command {
        Some(Shipment { command }) => {
            Cli::new(tracker, renderer, account)
                .handle_shipment_command(command)
                .await
        }
        Some(Step { command }) => {
            Cli::new(tracker, renderer, account)
                .handle_step_command(command)
                .await
        }
        Some(Event(args)) => Cli::new(tracker, renderer, account).handle_event(args).await,
        Some(Users) => Cli::new(tracker, renderer, account).list_users(),
        None => {
            Cli::new(tracker, renderer, account)
                .list_shipments(&ListShipments::default())
                .await
        }
    }
}
