//! Builder for creating and configuring Tracker instances.

use std::path::{Path, PathBuf};

use tokio::task;

use super::Tracker;
use crate::{
    calendar::BusinessCalendar,
    db::Database,
    error::{Result, ResultExt, TrackerError},
};

/// Builder for creating and configuring Tracker instances.
#[derive(Debug, Clone)]
pub struct TrackerBuilder {
    database_path: Option<PathBuf>,
    calendar: BusinessCalendar,
}

impl TrackerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            database_path: None,
            calendar: BusinessCalendar::default(),
        }
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/clearance/clearance.db` or
    /// `~/.local/share/clearance/clearance.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Replaces the default Sunday-to-Thursday calendar.
    pub fn with_calendar(mut self, calendar: BusinessCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    /// Builds the configured tracker instance.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::FileSystem` if the database path is invalid
    /// Returns `TrackerError::Database` if database initialization fails
    pub async fn build(self) -> Result<Tracker> {
        let db_path = if let Some(path) = self.database_path {
            path
        } else {
            Self::default_database_path()?
        };

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TrackerError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let db_path_clone = db_path.clone();
        task::spawn_blocking(move || {
            let _db = Database::new(&db_path_clone)?;
            Ok::<(), TrackerError>(())
        })
        .await
        .with_context("Task join error")??;

        Ok(Tracker::new(db_path, self.calendar))
    }

    /// Returns the default database path following XDG Base Directory
    /// specification.
    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("clearance")
            .place_data_file("clearance.db")
            .map_err(|e| TrackerError::XdgDirectory(e.to_string()))
    }
}

impl Default for TrackerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
