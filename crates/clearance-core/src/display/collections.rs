//! Collection wrapper types for displaying groups of domain objects.
//!
//! Each wrapper owns its items, formats them through their own Display
//! implementations and handles the empty case with a short message.

use std::{fmt, ops::Index};

use crate::models::{ActionLogEntry, Shipment, StepInstance};

/// Newtype wrapper for displaying collections of shipments.
pub struct Shipments(pub Vec<Shipment>);

impl Shipments {
    /// Check if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of shipments in the collection.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Get an iterator over the shipments.
    pub fn iter(&self) -> std::slice::Iter<'_, Shipment> {
        self.0.iter()
    }
}

impl Index<usize> for Shipments {
    type Output = Shipment;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IntoIterator for Shipments {
    type Item = Shipment;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Shipments {
    type Item = &'a Shipment;
    type IntoIter = std::slice::Iter<'a, Shipment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Shipments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            writeln!(f, "No shipments found.")
        } else {
            for shipment in &self.0 {
                write!(f, "{shipment}")?;
                writeln!(f)?;
            }
            Ok(())
        }
    }
}

/// Newtype wrapper for displaying collections of workflow steps.
pub struct Steps(pub Vec<StepInstance>);

impl Steps {
    /// Check if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of steps in the collection.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Get an iterator over the steps.
    pub fn iter(&self) -> std::slice::Iter<'_, StepInstance> {
        self.0.iter()
    }
}

impl Index<usize> for Steps {
    type Output = StepInstance;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IntoIterator for Steps {
    type Item = StepInstance;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Steps {
    type Item = &'a StepInstance;
    type IntoIter = std::slice::Iter<'a, StepInstance>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Steps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            writeln!(f, "No steps found.")
        } else {
            for step in &self.0 {
                write!(f, "{step}")?;
            }
            Ok(())
        }
    }
}

/// Newtype wrapper for displaying an audit trail.
pub struct ActionLog(pub Vec<ActionLogEntry>);

impl ActionLog {
    /// Check if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of log entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for ActionLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            writeln!(f, "No actions recorded.")
        } else {
            for entry in &self.0 {
                write!(f, "{entry}")?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use jiff::Timestamp;

    use super::*;
    use crate::catalog::Division;
    use crate::models::ShipmentStatus;

    fn sample_shipment(id: u64, number: &str) -> Shipment {
        Shipment {
            id,
            shipment_number: number.to_string(),
            principal: "Toyota Motor Corporation".to_string(),
            brand: "Toyota".to_string(),
            lc_number: None,
            invoice_amount: None,
            eta: date(2026, 4, 1),
            eta_edit_count: 0,
            division: Division::Automotive,
            status: ShipmentStatus::Active,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        }
    }

    #[test]
    fn empty_collections_say_so() {
        assert_eq!(format!("{}", Shipments(vec![])), "No shipments found.\n");
        assert_eq!(format!("{}", Steps(vec![])), "No steps found.\n");
        assert_eq!(format!("{}", ActionLog(vec![])), "No actions recorded.\n");
    }

    #[test]
    fn shipments_render_each_entry() {
        let list = Shipments(vec![
            sample_shipment(1, "SHP-2026-001"),
            sample_shipment(2, "SHP-2026-002"),
        ]);
        let output = format!("{list}");
        assert!(output.contains("# 1. SHP-2026-001"));
        assert!(output.contains("# 2. SHP-2026-002"));
    }
}
