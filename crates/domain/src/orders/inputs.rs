//! Input DTOs crossing the transport boundary. Schedule and status
//! arrive as their vocabulary strings and are parsed at the edge so a
//! typo fails with the matching validation error, not a decode error.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateOrderInput {
    pub inventory_item_id: Option<String>,
    pub dosage: Option<String>,
    pub schedule: String,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateOrderInput {
    pub dosage: Option<String>,
    pub schedule: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionInput {
    pub target: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateItemInput {
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub dose_mg: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdjustInventoryInput {
    pub delta: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetQuantityInput {
    pub quantity: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssignmentInput {
    pub caregiver_id: String,
    pub resident_id: String,
}
