//! Display formatting for tracker output.
//!
//! Domain models render themselves as markdown through `Display`
//! implementations; newtype wrappers add collection handling and
//! operation feedback so every output context (plain terminal, rich
//! terminal) goes through the same formatting.
//!
//! ## Module Organization
//!
//! - [`collections`]: Collection wrapper types (Shipments, Steps, ActionLog)
//! - [`results`]: Operation result types (CreateResult, DeleteResult)
//! - [`status`]: Status and confirmation messages (OperationStatus)
//! - [`datetime`]: Date/time formatting utilities
//! - [`models`]: Display implementations for domain models

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;
pub mod status;

// Re-export commonly used types for convenience
pub use collections::{ActionLog, Shipments, Steps};
pub use datetime::LocalDateTime;
pub use results::{CreateResult, DeleteResult};
pub use status::OperationStatus;
