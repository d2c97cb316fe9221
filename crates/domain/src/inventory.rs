//! Shared inventory ledger.
//!
//! Quantities only change through [`InventoryLedger::adjust`] and
//! [`InventoryLedger::set_quantity`]. Both take the ledger write lock,
//! so a check-and-adjust on one item is a single critical section and
//! two concurrent administrations cannot both consume the last dose.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::errors::Error;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Medication,
    Consumable,
}

impl std::str::FromStr for ItemCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "medication" => Ok(ItemCategory::Medication),
            "consumable" => Ok(ItemCategory::Consumable),
            other => Err(Error::Validation {
                message: format!("unknown item category: {other}"),
            }),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub category: ItemCategory,
    pub quantity: u32,
    /// Per-serving strength in milligrams, used to derive an order's
    /// dosage string when the caller omits one.
    pub dose_mg: Option<u32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct InventoryLedger {
    items: RwLock<HashMap<String, InventoryItem>>,
}

impl InventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_item(
        &self,
        name: &str,
        category: ItemCategory,
        quantity: u32,
        dose_mg: Option<u32>,
    ) -> Result<InventoryItem, Error> {
        if name.trim().is_empty() {
            return Err(Error::Validation {
                message: "item name must not be empty".to_string(),
            });
        }
        let item = InventoryItem {
            id: Ulid::new().to_string(),
            name: name.trim().to_string(),
            category,
            quantity,
            dose_mg,
            created_at: Utc::now(),
        };
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.insert(item.id.clone(), item.clone());
        Ok(item)
    }

    pub fn get(&self, item_id: &str) -> Result<InventoryItem, Error> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        items
            .get(item_id)
            .cloned()
            .ok_or_else(|| Error::UnknownInventoryItem {
                id: item_id.to_string(),
            })
    }

    pub fn list(&self) -> Vec<InventoryItem> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<InventoryItem> = items.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn remove(&self, item_id: &str) -> Result<(), Error> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items
            .remove(item_id)
            .map(|_| ())
            .ok_or_else(|| Error::UnknownInventoryItem {
                id: item_id.to_string(),
            })
    }

    /// Atomically applies `delta` to the item's quantity and returns the
    /// new value. Rejected with [`Error::InsufficientStock`] when the
    /// result would be negative; the quantity is left untouched.
    pub fn adjust(&self, item_id: &str, delta: i64) -> Result<u32, Error> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let item = items
            .get_mut(item_id)
            .ok_or_else(|| Error::UnknownInventoryItem {
                id: item_id.to_string(),
            })?;
        let next = i64::from(item.quantity) + delta;
        if next < 0 {
            return Err(Error::InsufficientStock {
                item_id: item_id.to_string(),
            });
        }
        item.quantity = u32::try_from(next).map_err(|_| Error::InvalidQuantity { value: next })?;
        Ok(item.quantity)
    }

    /// Direct admin edit of the counter.
    pub fn set_quantity(&self, item_id: &str, value: i64) -> Result<u32, Error> {
        if value < 0 {
            return Err(Error::InvalidQuantity { value });
        }
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let item = items
            .get_mut(item_id)
            .ok_or_else(|| Error::UnknownInventoryItem {
                id: item_id.to_string(),
            })?;
        item.quantity = u32::try_from(value).map_err(|_| Error::InvalidQuantity { value })?;
        Ok(item.quantity)
    }
}
