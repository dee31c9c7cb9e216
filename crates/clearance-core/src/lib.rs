//! Core library for the clearance shipment tracking application.
//!
//! This crate models the customs clearance workflow for inbound
//! shipments: a fixed catalog of 34 steps across four departments,
//! business-day target dates derived from the vessel ETA, automation
//! triggers that complete steps from business events, and a
//! department-scoped access model.
//!
//! # Display Architecture
//!
//! The crate implements a Display-based architecture for formatting
//! output:
//!
//! - **Domain Models** ([`models`]): Implement [`std::fmt::Display`] for
//!   direct formatting
//! - **Display Wrappers** ([`display`]): Provide contextual and
//!   specialized formatting
//! - **Terminal Rendering**: Rich markdown output via the CLI's terminal
//!   renderer
//!
//! # Quick Start
//!
//! ```rust
//! use clearance_core::{params::RegisterShipment, TrackerBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tracker = TrackerBuilder::new()
//!     .with_database_path(Some("clearance.db"))
//!     .build()
//!     .await?;
//!
//! let params = RegisterShipment {
//!     shipment_number: "SHP-2026-001".to_string(),
//!     principal: "Toyota Motor Corporation".to_string(),
//!     brand: "Toyota".to_string(),
//!     eta: "2026-03-15".parse()?,
//!     division: Default::default(),
//!     lc_number: None,
//!     invoice_amount: Some(25_000.0),
//!     registered_by: "bu.ppr".to_string(),
//! };
//!
//! let detail = tracker.register_shipment(&params).await?;
//! println!("{detail}");
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod calendar;
pub mod catalog;
pub mod db;
pub mod display;
pub mod error;
pub mod models;
pub mod params;
pub mod tracker;
pub mod triggers;
pub mod workflow;

// Re-export commonly used types
pub use access::{
    AccessScope, CredentialStore, InMemoryCredentialStore, PermissionLevel, UserAccount, UserRole,
    WorkbookAccess,
};
pub use calendar::{BusinessCalendar, WorkWeek};
pub use catalog::{Department, Division, StepDefinition, StepNumber};
pub use db::Database;
pub use display::{ActionLog, CreateResult, DeleteResult, OperationStatus, Shipments, Steps};
pub use error::{Result, TrackerError};
pub use models::{
    ActionLogEntry, DemurrageRisk, EtaChangeReport, Shipment, ShipmentDetail, ShipmentFilter,
    ShipmentStatus, StepFilter, StepInstance, StepStatus, TargetDateChange, WorkflowProgress,
};
pub use params::{
    ActionEvent, CompleteStep, ListShipments, ListSteps, RegisterShipment, SkipStep, UpdateEta,
};
pub use tracker::{Tracker, TrackerBuilder};
pub use triggers::{DocumentEvent, TriggerAction};
