//! Care-Facility Medication Administration Domain

/// Shared medication/consumable inventory ledger
pub mod inventory;

/// Medication order aggregate
pub mod orders;

/// Access policy gate and caregiver-resident assignments
pub mod policy;

/// Administration scheduling (dose cycles, overdue detection)
pub mod schedule;

/// In-memory view repository
pub mod store;

/// Domain errors
pub mod errors;

pub use errors::Error;
