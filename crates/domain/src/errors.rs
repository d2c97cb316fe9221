use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Entity not found: {entity}")]
    NotFound { entity: String },

    #[error("Uniqueness conflict: {field}")]
    Uniqueness { field: String },

    #[error("Forbidden action")]
    Forbidden,

    #[error("Insufficient stock for inventory item {item_id}")]
    InsufficientStock { item_id: String },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Unrecognized schedule: {value}")]
    InvalidSchedule { value: String },

    #[error("Invalid quantity: {value}")]
    InvalidQuantity { value: i64 },

    #[error("Unknown inventory item: {id}")]
    UnknownInventoryItem { id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}
