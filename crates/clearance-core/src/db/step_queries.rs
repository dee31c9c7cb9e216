//! Workflow step queries and terminal-state updates.

use jiff::civil::Date;
use jiff::Timestamp;
use rusqlite::{params, types::Type, OptionalExtension};

use crate::{
    catalog::{Department, StepNumber},
    error::{DatabaseResultExt, Result, TrackerError},
    models::{StepInstance, StepStatus},
};

const SELECT_STEP_COLUMNS: &str = "id, shipment_id, step_number, name, department, target_date, actual_date, status, completed_by, notes, fields, is_critical, is_optional, created_at, updated_at";
const UPDATE_STEP_TERMINAL_SQL: &str = "UPDATE workflow_steps SET status = ?1, actual_date = ?2, completed_by = ?3, notes = ?4, fields = ?5, updated_at = ?6 WHERE shipment_id = ?7 AND step_number = ?8";
const UPDATE_SHIPMENT_TIMESTAMP_SQL: &str = "UPDATE shipments SET updated_at = ?1 WHERE id = ?2";
const INSERT_LOG_SQL: &str = "INSERT INTO action_logs (shipment_id, step_number, action, performed_by, performed_at, data) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
const REOPEN_STEP_SQL: &str = "UPDATE workflow_steps SET status = 'pending', actual_date = NULL, completed_by = NULL, updated_at = ?1 WHERE shipment_id = ?2 AND step_number = ?3";

/// Everything recorded when a step reaches a terminal state. Bundled
/// into one struct so completion and skipping share a code path and a
/// transaction shape.
pub struct StepResolution<'a> {
    pub status: StepStatus,
    pub actual_date: Date,
    pub performed_by: &'a str,
    pub notes: Option<&'a str>,
    /// JSON-encoded form field values
    pub fields_json: Option<String>,
    /// Action name written to the audit log
    pub log_action: &'a str,
    /// JSON payload written to the audit log
    pub log_data: Option<String>,
}

impl super::Database {
    /// Helper function to construct a StepInstance from a database row
    fn build_step_from_row(row: &rusqlite::Row) -> rusqlite::Result<StepInstance> {
        let number_str: String = row.get(2)?;
        let step_number = number_str.parse::<StepNumber>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, Type::Text, e.into())
        })?;
        let department_str: String = row.get(4)?;
        let department = department_str.parse::<Department>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, Type::Text, e.into())
        })?;
        let status_str: String = row.get(7)?;
        let status = status_str.parse::<StepStatus>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, Type::Text, e.into())
        })?;
        let fields = match row.get::<_, Option<String>>(10)? {
            Some(json) => serde_json::from_str(&json).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e))
            })?,
            None => serde_json::Map::new(),
        };

        Ok(StepInstance {
            id: row.get::<_, i64>(0)? as u64,
            shipment_id: row.get::<_, i64>(1)? as u64,
            step_number,
            name: row.get(3)?,
            department,
            target_date: super::shipment_queries::parse_date(5, row.get::<_, String>(5)?)?,
            actual_date: row
                .get::<_, Option<String>>(6)?
                .map(|s| super::shipment_queries::parse_date(6, s))
                .transpose()?,
            status,
            is_blocked: false,
            completed_by: row.get(8)?,
            notes: row.get(9)?,
            fields,
            is_critical: row.get(11)?,
            is_optional: row.get(12)?,
            created_at: super::shipment_queries::parse_timestamp(13, row.get::<_, String>(13)?)?,
            updated_at: super::shipment_queries::parse_timestamp(14, row.get::<_, String>(14)?)?,
        })
    }

    /// Retrieves all steps for a shipment in catalog order.
    pub fn get_steps(&self, shipment_id: u64) -> Result<Vec<StepInstance>> {
        let sql = format!(
            "SELECT {SELECT_STEP_COLUMNS} FROM workflow_steps WHERE shipment_id = ?1 ORDER BY id"
        );
        let mut stmt = self
            .connection
            .prepare(&sql)
            .map_err(|e| TrackerError::database("Failed to prepare query", e))?;

        let steps = stmt
            .query_map(params![shipment_id as i64], Self::build_step_from_row)
            .map_err(|e| TrackerError::database("Failed to query steps", e))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| TrackerError::database("Failed to fetch steps", e))?;

        Ok(steps)
    }

    /// Retrieves a single step of a shipment.
    pub fn get_step(&self, shipment_id: u64, number: StepNumber) -> Result<Option<StepInstance>> {
        let sql = format!(
            "SELECT {SELECT_STEP_COLUMNS} FROM workflow_steps WHERE shipment_id = ?1 AND step_number = ?2"
        );
        let mut stmt = self
            .connection
            .prepare(&sql)
            .map_err(|e| TrackerError::database("Failed to prepare query", e))?;

        let step = stmt
            .query_row(
                params![shipment_id as i64, number.to_string()],
                Self::build_step_from_row,
            )
            .optional()
            .map_err(|e| TrackerError::database("Failed to get step", e))?;

        Ok(step)
    }

    /// Moves a step to a terminal state and writes the matching audit
    /// log entry in the same transaction.
    pub fn resolve_step(
        &mut self,
        shipment_id: u64,
        number: StepNumber,
        resolution: StepResolution<'_>,
        now: Timestamp,
    ) -> Result<StepInstance> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let now_str = now.to_string();
        let changed = tx
            .execute(
                UPDATE_STEP_TERMINAL_SQL,
                params![
                    resolution.status.as_str(),
                    resolution.actual_date.to_string(),
                    resolution.performed_by,
                    resolution.notes,
                    resolution.fields_json,
                    &now_str,
                    shipment_id as i64,
                    number.to_string()
                ],
            )
            .map_err(|e| TrackerError::database("Failed to update step", e))?;
        if changed == 0 {
            return Err(TrackerError::StepNotFound {
                shipment_id,
                step_number: number.to_string(),
            });
        }

        tx.execute(
            UPDATE_SHIPMENT_TIMESTAMP_SQL,
            params![&now_str, shipment_id as i64],
        )
        .map_err(|e| TrackerError::database("Failed to update shipment timestamp", e))?;

        tx.execute(
            INSERT_LOG_SQL,
            params![
                shipment_id as i64,
                number.to_string(),
                resolution.log_action,
                resolution.performed_by,
                &now_str,
                resolution.log_data
            ],
        )
        .map_err(|e| TrackerError::database("Failed to append action log", e))?;

        let sql = format!(
            "SELECT {SELECT_STEP_COLUMNS} FROM workflow_steps WHERE shipment_id = ?1 AND step_number = ?2"
        );
        let step = tx
            .query_row(
                &sql,
                params![shipment_id as i64, number.to_string()],
                Self::build_step_from_row,
            )
            .map_err(|e| TrackerError::database("Failed to read back step", e))?;

        tx.commit().db_context("Failed to commit transaction")?;
        Ok(step)
    }

    /// Reverts a terminal step back to pending, keeping notes and field
    /// values, and logs the reversal.
    pub fn reopen_step(
        &mut self,
        shipment_id: u64,
        number: StepNumber,
        performed_by: &str,
        now: Timestamp,
    ) -> Result<()> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let now_str = now.to_string();
        let changed = tx
            .execute(
                REOPEN_STEP_SQL,
                params![&now_str, shipment_id as i64, number.to_string()],
            )
            .map_err(|e| TrackerError::database("Failed to reopen step", e))?;
        if changed == 0 {
            return Err(TrackerError::StepNotFound {
                shipment_id,
                step_number: number.to_string(),
            });
        }

        tx.execute(
            INSERT_LOG_SQL,
            params![
                shipment_id as i64,
                number.to_string(),
                "reopen",
                performed_by,
                &now_str,
                None::<String>
            ],
        )
        .map_err(|e| TrackerError::database("Failed to append action log", e))?;

        tx.commit().db_context("Failed to commit transaction")?;
        Ok(())
    }
}
