//! High-level tracker API for shipments and their clearance workflows.
//!
//! [`Tracker`] is the central coordinator between callers and the
//! database. It owns no connection; every operation opens one on a
//! blocking task, so the tracker itself stays cheap to share across an
//! async runtime.
//!
//! # Usage
//!
//! ```rust,no_run
//! use clearance_core::{params::RegisterShipment, TrackerBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tracker = TrackerBuilder::new().build().await?;
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
//! let detail = tracker.register_shipment(&params).await?;
//! println!("{} steps created", detail.steps.len());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use jiff::civil::Date;
use jiff::Zoned;

use crate::calendar::BusinessCalendar;

pub mod builder;
pub mod shipment_ops;
pub mod step_ops;

pub use builder::TrackerBuilder;

/// Main tracker interface for shipments and workflow steps.
pub struct Tracker {
    pub(crate) db_path: PathBuf,
    pub(crate) calendar: BusinessCalendar,
}

impl Tracker {
    /// Creates a new tracker with the specified database path.
    pub(crate) fn new(db_path: PathBuf, calendar: BusinessCalendar) -> Self {
        Self { db_path, calendar }
    }

    /// The calendar all date derivations run against.
    pub fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    pub(crate) fn today() -> Date {
        Zoned::now().date()
    }
}
