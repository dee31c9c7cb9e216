//! SQLite storage for shipments, workflow steps and the action log.
//!
//! Connections are synchronous rusqlite handles; the tracker layer
//! wraps every call in `spawn_blocking` so async callers never touch
//! the connection directly.

use std::path::Path;

use rusqlite::Connection;

use crate::error::{DatabaseResultExt, Result};

pub mod log_queries;
pub mod migrations;
pub mod shipment_queries;
pub mod step_queries;

pub use step_queries::StepResolution;

/// Database connection and operations handler.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Creates a new database connection and initializes the schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = Connection::open(path).db_context("Failed to open database connection")?;

        let db = Self { connection };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Opens a transient in-memory database. Used by tests and
    /// anywhere persistence is not wanted.
    pub fn open_in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().db_context("Failed to open in-memory database")?;

        let db = Self { connection };
        db.initialize_schema()?;
        Ok(db)
    }
}
