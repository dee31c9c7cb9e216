//! Shipment CRUD operations and queries.

use jiff::civil::Date;
use jiff::Timestamp;
use rusqlite::{params, types::Type, OptionalExtension};

use crate::{
    catalog::{Division, StepNumber},
    error::{DatabaseResultExt, Result, TrackerError},
    models::{Shipment, ShipmentFilter, ShipmentStatus, StepInstance},
};

const INSERT_SHIPMENT_SQL: &str = "INSERT INTO shipments (shipment_number, principal, brand, lc_number, invoice_amount, eta, eta_edit_count, division, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)";
const INSERT_STEP_SQL: &str = "INSERT INTO workflow_steps (shipment_id, step_number, name, department, target_date, actual_date, status, completed_by, notes, fields, is_critical, is_optional, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)";
const SELECT_SHIPMENT_COLUMNS: &str = "id, shipment_number, principal, brand, lc_number, invoice_amount, eta, eta_edit_count, division, status, created_at, updated_at";
const UPDATE_SHIPMENT_ETA_SQL: &str =
    "UPDATE shipments SET eta = ?1, eta_edit_count = ?2, updated_at = ?3 WHERE id = ?4";
const UPDATE_STEP_TARGET_SQL: &str = "UPDATE workflow_steps SET target_date = ?1, updated_at = ?2 WHERE shipment_id = ?3 AND step_number = ?4";
const UPDATE_SHIPMENT_STATUS_SQL: &str =
    "UPDATE shipments SET status = ?1, updated_at = ?2 WHERE id = ?3";
const UPDATE_INVOICE_AMOUNT_SQL: &str =
    "UPDATE shipments SET invoice_amount = ?1, updated_at = ?2 WHERE id = ?3";
const DELETE_SHIPMENT_SQL: &str = "DELETE FROM shipments WHERE id = ?1";

pub(super) fn parse_date(index: usize, value: String) -> rusqlite::Result<Date> {
    value.parse::<Date>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e))
    })
}

pub(super) fn parse_timestamp(index: usize, value: String) -> rusqlite::Result<Timestamp> {
    value.parse::<Timestamp>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e))
    })
}

impl super::Database {
    /// Helper function to construct a Shipment from a database row
    fn build_shipment_from_row(row: &rusqlite::Row) -> rusqlite::Result<Shipment> {
        let division_str: String = row.get(8)?;
        let division = division_str.parse::<Division>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(8, Type::Text, e.into())
        })?;
        let status_str: String = row.get(9)?;
        let status = status_str.parse::<ShipmentStatus>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(9, Type::Text, e.into())
        })?;

        Ok(Shipment {
            id: row.get::<_, i64>(0)? as u64,
            shipment_number: row.get(1)?,
            principal: row.get(2)?,
            brand: row.get(3)?,
            lc_number: row.get(4)?,
            invoice_amount: row.get(5)?,
            eta: parse_date(6, row.get::<_, String>(6)?)?,
            eta_edit_count: row.get::<_, i64>(7)? as u32,
            division,
            status,
            created_at: parse_timestamp(10, row.get::<_, String>(10)?)?,
            updated_at: parse_timestamp(11, row.get::<_, String>(11)?)?,
        })
    }

    /// Inserts a shipment together with its workflow steps in a single
    /// transaction. The step instances carry a placeholder shipment id;
    /// the freshly assigned id is patched in here.
    pub fn create_shipment(
        &mut self,
        shipment: &Shipment,
        steps: &[StepInstance],
    ) -> Result<Shipment> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let now_str = shipment.created_at.to_string();
        tx.execute(
            INSERT_SHIPMENT_SQL,
            params![
                &shipment.shipment_number,
                &shipment.principal,
                &shipment.brand,
                shipment.lc_number.as_deref(),
                shipment.invoice_amount,
                shipment.eta.to_string(),
                shipment.eta_edit_count as i64,
                shipment.division.as_str(),
                shipment.status.as_str(),
                &now_str,
                &now_str
            ],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                TrackerError::invalid_input(
                    "shipment_number",
                    format!("shipment `{}` already exists", shipment.shipment_number),
                )
            }
            other => TrackerError::database("Failed to insert shipment", other),
        })?;

        let id = tx.last_insert_rowid() as u64;

        for step in steps {
            let fields_json = if step.fields.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&step.fields)?)
            };
            tx.execute(
                INSERT_STEP_SQL,
                params![
                    id as i64,
                    step.step_number.to_string(),
                    &step.name,
                    step.department.as_str(),
                    step.target_date.to_string(),
                    step.actual_date.map(|d| d.to_string()),
                    step.status.as_str(),
                    step.completed_by.as_deref(),
                    step.notes.as_deref(),
                    fields_json,
                    step.is_critical,
                    step.is_optional,
                    &now_str,
                    &now_str
                ],
            )
            .map_err(|e| TrackerError::database("Failed to insert workflow step", e))?;
        }

        tx.commit().db_context("Failed to commit transaction")?;

        let mut created = shipment.clone();
        created.id = id;
        Ok(created)
    }

    /// Retrieves a single shipment by its ID.
    pub fn get_shipment(&self, id: u64) -> Result<Option<Shipment>> {
        let sql = format!("SELECT {SELECT_SHIPMENT_COLUMNS} FROM shipments WHERE id = ?1");
        let mut stmt = self
            .connection
            .prepare(&sql)
            .map_err(|e| TrackerError::database("Failed to prepare query", e))?;

        stmt.query_row(params![id as i64], Self::build_shipment_from_row)
            .optional()
            .map_err(|e| TrackerError::database("Failed to get shipment", e))
    }

    /// Retrieves a shipment by its business reference.
    pub fn get_shipment_by_number(&self, number: &str) -> Result<Option<Shipment>> {
        let sql =
            format!("SELECT {SELECT_SHIPMENT_COLUMNS} FROM shipments WHERE shipment_number = ?1");
        let mut stmt = self
            .connection
            .prepare(&sql)
            .map_err(|e| TrackerError::database("Failed to prepare query", e))?;

        stmt.query_row(params![number], Self::build_shipment_from_row)
            .optional()
            .map_err(|e| TrackerError::database("Failed to get shipment", e))
    }

    /// Lists shipments, newest first, honoring the filter.
    pub fn list_shipments(&self, filter: &ShipmentFilter) -> Result<Vec<Shipment>> {
        let mut sql = format!("SELECT {SELECT_SHIPMENT_COLUMNS} FROM shipments WHERE 1=1");
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            args.push(Box::new(status.as_str().to_string()));
        }
        if let Some(division) = filter.division {
            sql.push_str(" AND division = ?");
            args.push(Box::new(division.as_str().to_string()));
        }
        if let Some(principal) = &filter.principal {
            sql.push_str(" AND LOWER(principal) LIKE ?");
            args.push(Box::new(format!("%{}%", principal.to_lowercase())));
        }
        sql.push_str(" ORDER BY eta, id");

        let mut stmt = self
            .connection
            .prepare(&sql)
            .map_err(|e| TrackerError::database("Failed to prepare query", e))?;

        let params_refs: Vec<&dyn rusqlite::ToSql> = args.iter().map(|a| a.as_ref()).collect();
        let shipments = stmt
            .query_map(params_refs.as_slice(), Self::build_shipment_from_row)
            .map_err(|e| TrackerError::database("Failed to query shipments", e))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| TrackerError::database("Failed to fetch shipments", e))?;

        Ok(shipments)
    }

    /// Applies an ETA revision and the recalculated step target dates
    /// in a single transaction.
    pub fn update_shipment_eta(
        &mut self,
        id: u64,
        new_eta: Date,
        edit_count: u32,
        targets: &[(StepNumber, Date)],
        now: Timestamp,
    ) -> Result<()> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let now_str = now.to_string();
        let changed = tx
            .execute(
                UPDATE_SHIPMENT_ETA_SQL,
                params![new_eta.to_string(), edit_count as i64, &now_str, id as i64],
            )
            .map_err(|e| TrackerError::database("Failed to update shipment ETA", e))?;
        if changed == 0 {
            return Err(TrackerError::ShipmentNotFound { id });
        }

        for (step_number, target) in targets {
            tx.execute(
                UPDATE_STEP_TARGET_SQL,
                params![
                    target.to_string(),
                    &now_str,
                    id as i64,
                    step_number.to_string()
                ],
            )
            .map_err(|e| TrackerError::database("Failed to update step target date", e))?;
        }

        tx.commit().db_context("Failed to commit transaction")?;
        Ok(())
    }

    /// Changes the lifecycle status of a shipment.
    pub fn set_shipment_status(
        &mut self,
        id: u64,
        status: ShipmentStatus,
        now: Timestamp,
    ) -> Result<()> {
        let changed = self
            .connection
            .execute(
                UPDATE_SHIPMENT_STATUS_SQL,
                params![status.as_str(), now.to_string(), id as i64],
            )
            .map_err(|e| TrackerError::database("Failed to update shipment status", e))?;
        if changed == 0 {
            return Err(TrackerError::ShipmentNotFound { id });
        }
        Ok(())
    }

    /// Records the commercial invoice value once it becomes known.
    pub fn set_invoice_amount(&mut self, id: u64, amount: f64, now: Timestamp) -> Result<()> {
        let changed = self
            .connection
            .execute(
                UPDATE_INVOICE_AMOUNT_SQL,
                params![amount, now.to_string(), id as i64],
            )
            .map_err(|e| TrackerError::database("Failed to update invoice amount", e))?;
        if changed == 0 {
            return Err(TrackerError::ShipmentNotFound { id });
        }
        Ok(())
    }

    /// Deletes a shipment; steps and logs go with it via cascade.
    /// Returns false when no such shipment existed.
    pub fn delete_shipment(&mut self, id: u64) -> Result<bool> {
        let deleted = self
            .connection
            .execute(DELETE_SHIPMENT_SQL, params![id as i64])
            .map_err(|e| TrackerError::database("Failed to delete shipment", e))?;
        Ok(deleted > 0)
    }
}
