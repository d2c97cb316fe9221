/// Medication order aggregate
pub mod aggregate;

/// Commands
pub mod commands;

/// Events
pub mod events;

/// Input DTOs
pub mod inputs;

/// View (read model)
pub mod view;

/// CQRS setup
pub mod cqrs;

pub use aggregate::{DoseStatus, MedicationOrder, Services, AGGREGATE_TYPE};
pub use commands::Command;
pub use cqrs::OrderCqrs;
pub use events::Event;
pub use view::{list_by_resident, OrderViewRepository, Query, View};
