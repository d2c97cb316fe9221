//! Access policy gate.
//!
//! One rule table keyed by (role, relation to the resident), consulted
//! at every operation boundary. Denials never consult whether the
//! resident exists, so a `Forbidden` cannot leak existence.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Caregiver,
    Resident,
}

impl std::str::FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "caregiver" => Ok(Role::Caregiver),
            "resident" => Ok(Role::Resident),
            other => Err(Error::Validation {
                message: format!("unknown role: {other}"),
            }),
        }
    }
}

/// Authenticated caller identity, passed explicitly into every
/// operation. Never held as ambient state.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, new)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

/// A caregiver-resident pairing. Owned by the registry, not by either
/// party.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct Assignment {
    pub caregiver_id: String,
    pub resident_id: String,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct Assignments {
    pairs: RwLock<HashMap<(String, String), DateTime<Utc>>>,
}

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the pairing, stamping `assigned_at`. Idempotent: an
    /// existing pairing keeps its original timestamp.
    pub fn assign(&self, caregiver_id: &str, resident_id: &str) -> Assignment {
        let mut pairs = self.pairs.write().unwrap_or_else(PoisonError::into_inner);
        let assigned_at = *pairs
            .entry((caregiver_id.to_string(), resident_id.to_string()))
            .or_insert_with(Utc::now);
        Assignment {
            caregiver_id: caregiver_id.to_string(),
            resident_id: resident_id.to_string(),
            assigned_at,
        }
    }

    pub fn unassign(&self, caregiver_id: &str, resident_id: &str) -> Result<(), Error> {
        let mut pairs = self.pairs.write().unwrap_or_else(PoisonError::into_inner);
        pairs
            .remove(&(caregiver_id.to_string(), resident_id.to_string()))
            .map(|_| ())
            .ok_or_else(|| Error::NotFound {
                entity: "Assignment".to_string(),
            })
    }

    pub fn is_assigned(&self, caregiver_id: &str, resident_id: &str) -> bool {
        let pairs = self.pairs.read().unwrap_or_else(PoisonError::into_inner);
        pairs.contains_key(&(caregiver_id.to_string(), resident_id.to_string()))
    }

    pub fn for_caregiver(&self, caregiver_id: &str) -> Vec<Assignment> {
        let pairs = self.pairs.read().unwrap_or_else(PoisonError::into_inner);
        let mut found: Vec<Assignment> = pairs
            .iter()
            .filter(|((caregiver, _), _)| caregiver == caregiver_id)
            .map(|((caregiver, resident), assigned_at)| Assignment {
                caregiver_id: caregiver.clone(),
                resident_id: resident.clone(),
                assigned_at: *assigned_at,
            })
            .collect();
        found.sort_by(|a, b| a.resident_id.cmp(&b.resident_id));
        found
    }
}

#[derive(Clone, new)]
pub struct AccessPolicy {
    assignments: Arc<Assignments>,
}

impl AccessPolicy {
    pub fn can_view_orders(&self, actor: &Actor, resident_id: &str) -> bool {
        match actor.role {
            Role::Admin => true,
            Role::Caregiver => self.assignments.is_assigned(&actor.id, resident_id),
            Role::Resident => actor.id == resident_id,
        }
    }

    /// Residents can never mutate: they read their own orders but cannot
    /// self-administer.
    pub fn can_mutate_orders(&self, actor: &Actor, resident_id: &str) -> bool {
        match actor.role {
            Role::Admin => true,
            Role::Caregiver => self.assignments.is_assigned(&actor.id, resident_id),
            Role::Resident => false,
        }
    }

    pub fn can_manage_inventory(&self, actor: &Actor) -> bool {
        matches!(actor.role, Role::Admin | Role::Caregiver)
    }

    /// Facility-wide read-only resident summary visibility.
    pub fn can_view_summaries(&self, actor: &Actor) -> bool {
        matches!(actor.role, Role::Admin | Role::Caregiver)
    }

    pub fn can_manage_assignments(&self, actor: &Actor) -> bool {
        matches!(actor.role, Role::Admin)
    }

    pub fn authorize_view_orders(&self, actor: &Actor, resident_id: &str) -> Result<(), Error> {
        if self.can_view_orders(actor, resident_id) {
            Ok(())
        } else {
            Err(Error::Forbidden)
        }
    }

    pub fn authorize_mutate_orders(&self, actor: &Actor, resident_id: &str) -> Result<(), Error> {
        if self.can_mutate_orders(actor, resident_id) {
            Ok(())
        } else {
            Err(Error::Forbidden)
        }
    }
}
