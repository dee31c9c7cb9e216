//! Outcome messages for shipment and step operations.

use std::fmt;

/// One-line outcome of a tracker operation, e.g. a registration
/// confirmation or a refused deletion. Failures rendered through this
/// type are user-facing refusals, not errors; hard errors propagate as
/// [`crate::TrackerError`] instead.
pub struct OperationStatus {
    pub message: String,
    pub success: bool,
}

impl OperationStatus {
    pub fn success(message: String) -> Self {
        Self {
            message,
            success: true,
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            message,
            success: false,
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {}",
            if self.success { "Success:" } else { "Error:" },
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_status_prefixes_outcome() {
        let success = OperationStatus::success("Recorded step 1.3".to_string());
        assert!(format!("{success}").starts_with("Success:"));

        let failure = OperationStatus::failure("Deletion requires the --confirm flag".to_string());
        assert!(format!("{failure}").starts_with("Error:"));
    }
}
