//! Database schema initialization and migrations.

use crate::error::{DatabaseResultExt, Result, TrackerError};

impl super::Database {
    /// Initializes the database schema using the embedded SQL file.
    pub(super) fn initialize_schema(&self) -> Result<()> {
        // Enable foreign keys for this connection
        self.connection
            .execute("PRAGMA foreign_keys = ON", [])
            .db_context("Failed to enable foreign keys")?;

        // Execute the schema SQL
        let schema_sql = include_str!("../../assets/schema.sql");
        self.connection
            .execute_batch(schema_sql)
            .db_context("Failed to initialize database schema")?;

        // Apply migrations for existing databases
        self.apply_migrations()?;

        Ok(())
    }

    /// Apply database migrations for existing databases
    fn apply_migrations(&self) -> Result<()> {
        // eta_edit_count arrived after the first release; older
        // databases lack the column
        let has_edit_count: bool = self
            .connection
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('shipments') WHERE name = 'eta_edit_count'",
                [],
                |row| row.get(0),
            )
            .map(|count: i64| count > 0)
            .unwrap_or(false);

        if !has_edit_count {
            self.connection
                .execute(
                    "ALTER TABLE shipments ADD COLUMN eta_edit_count INTEGER NOT NULL DEFAULT 0",
                    [],
                )
                .map_err(|e| {
                    TrackerError::database("Failed to add eta_edit_count column to shipments", e)
                })?;
        }

        // fields column on workflow_steps predates step forms
        let has_fields: bool = self
            .connection
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('workflow_steps') WHERE name = 'fields'",
                [],
                |row| row.get(0),
            )
            .map(|count: i64| count > 0)
            .unwrap_or(false);

        if !has_fields {
            self.connection
                .execute("ALTER TABLE workflow_steps ADD COLUMN fields TEXT", [])
                .map_err(|e| {
                    TrackerError::database("Failed to add fields column to workflow_steps", e)
                })?;
        }

        Ok(())
    }
}
