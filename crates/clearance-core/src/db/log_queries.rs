//! Append and query the audit trail.

use jiff::Timestamp;
use rusqlite::{params, types::Type};
use serde_json::Value;

use crate::{
    catalog::StepNumber,
    error::{Result, TrackerError},
    models::ActionLogEntry,
};

const INSERT_LOG_SQL: &str = "INSERT INTO action_logs (shipment_id, step_number, action, performed_by, performed_at, data) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
const SELECT_LOGS_SQL: &str = "SELECT id, shipment_id, step_number, action, performed_by, performed_at, data FROM action_logs WHERE shipment_id = ?1 ORDER BY id";

impl super::Database {
    fn build_log_from_row(row: &rusqlite::Row) -> rusqlite::Result<ActionLogEntry> {
        let step_number = row
            .get::<_, Option<String>>(2)?
            .map(|s| {
                s.parse::<StepNumber>().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(2, Type::Text, e.into())
                })
            })
            .transpose()?;
        let data = row
            .get::<_, Option<String>>(6)?
            .map(|s| {
                serde_json::from_str::<Value>(&s).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e))
                })
            })
            .transpose()?;

        Ok(ActionLogEntry {
            id: row.get::<_, i64>(0)? as u64,
            shipment_id: row.get::<_, i64>(1)? as u64,
            step_number,
            action: row.get(3)?,
            performed_by: row.get(4)?,
            performed_at: super::shipment_queries::parse_timestamp(5, row.get::<_, String>(5)?)?,
            data,
        })
    }

    /// Appends one entry to the audit trail.
    pub fn append_log(
        &mut self,
        shipment_id: u64,
        step_number: Option<StepNumber>,
        action: &str,
        performed_by: &str,
        data: Option<&Value>,
        now: Timestamp,
    ) -> Result<u64> {
        let data_json = data.map(serde_json::to_string).transpose()?;
        self.connection
            .execute(
                INSERT_LOG_SQL,
                params![
                    shipment_id as i64,
                    step_number.map(|n| n.to_string()),
                    action,
                    performed_by,
                    now.to_string(),
                    data_json
                ],
            )
            .map_err(|e| TrackerError::database("Failed to append action log", e))?;
        Ok(self.connection.last_insert_rowid() as u64)
    }

    /// Full audit trail of a shipment, oldest first.
    pub fn get_logs(&self, shipment_id: u64) -> Result<Vec<ActionLogEntry>> {
        let mut stmt = self
            .connection
            .prepare(SELECT_LOGS_SQL)
            .map_err(|e| TrackerError::database("Failed to prepare query", e))?;

        let logs = stmt
            .query_map(params![shipment_id as i64], Self::build_log_from_row)
            .map_err(|e| TrackerError::database("Failed to query action logs", e))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| TrackerError::database("Failed to fetch action logs", e))?;

        Ok(logs)
    }
}
