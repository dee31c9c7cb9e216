use jiff::civil::Date;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::catalog::Division;
use crate::models::status::ShipmentStatus;

/// Maximum number of times the ETA of a shipment may be revised.
pub const MAX_ETA_EDITS: u32 = 3;

/// An inbound shipment moving through the clearance workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Shipment {
    pub id: u64,
    /// Business reference, e.g. `SHP-2026-001`
    pub shipment_number: String,
    pub principal: String,
    pub brand: String,
    /// Letter of credit reference, when the shipment is LC-financed
    pub lc_number: Option<String>,
    /// Commercial invoice value in OMR
    pub invoice_amount: Option<f64>,
    /// Estimated time of arrival at the port
    pub eta: Date,
    /// Number of ETA revisions applied so far (capped at [`MAX_ETA_EDITS`])
    pub eta_edit_count: u32,
    pub division: Division,
    pub status: ShipmentStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Shipment {
    /// Customs duty at 5% of the invoice amount.
    pub fn customs_duty(&self) -> Option<f64> {
        self.invoice_amount.map(|v| v * 0.05)
    }

    /// VAT at 5% of the invoice amount.
    pub fn vat(&self) -> Option<f64> {
        self.invoice_amount.map(|v| v * 0.05)
    }

    /// Insurance premium at 1% of the invoice amount.
    pub fn insurance(&self) -> Option<f64> {
        self.invoice_amount.map(|v| v * 0.01)
    }

    /// Total clearance funds to reserve: duty, VAT and insurance.
    pub fn clearance_funds(&self) -> Option<f64> {
        self.invoice_amount.map(|v| v * 0.11)
    }

    /// Whether another ETA revision is still allowed.
    pub fn can_edit_eta(&self) -> bool {
        self.eta_edit_count < MAX_ETA_EDITS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    fn shipment(invoice: Option<f64>) -> Shipment {
        Shipment {
            id: 1,
            shipment_number: "SHP-2026-001".to_string(),
            principal: "Toyota Motor Corporation".to_string(),
            brand: "Toyota".to_string(),
            lc_number: None,
            invoice_amount: invoice,
            eta: date(2026, 3, 15),
            eta_edit_count: 0,
            division: Division::Automotive,
            status: ShipmentStatus::Active,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        }
    }

    #[test]
    fn financials_derive_from_invoice_amount() {
        let s = shipment(Some(20_000.0));
        assert_eq!(s.customs_duty(), Some(1_000.0));
        assert_eq!(s.vat(), Some(1_000.0));
        assert_eq!(s.insurance(), Some(200.0));
        assert_eq!(s.clearance_funds(), Some(2_200.0));
    }

    #[test]
    fn financials_absent_without_invoice() {
        let s = shipment(None);
        assert_eq!(s.customs_duty(), None);
        assert_eq!(s.clearance_funds(), None);
    }

    #[test]
    fn eta_edits_cap_at_three() {
        let mut s = shipment(None);
        assert!(s.can_edit_eta());
        s.eta_edit_count = MAX_ETA_EDITS;
        assert!(!s.can_edit_eta());
    }
}
