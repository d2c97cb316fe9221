use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cqrs_es::Aggregate;
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::inventory::{InventoryItem, InventoryLedger};
use crate::schedule::{self, IntakeStatus, Schedule};

use super::{Command, Event};

/// A resident's prescribed medication record.
///
/// The resident link and the inventory link are fixed at creation;
/// everything else changes through commands. Deletion is soft so the
/// event log stays a complete audit trail.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct MedicationOrder {
    pub id: String,
    pub resident_id: String,
    pub inventory_item_id: Option<String>,
    pub dosage: String,
    pub schedule: Schedule,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,

    pub intake_status: IntakeStatus,
    pub last_administered_at: Option<DateTime<Utc>>,
    pub status_changed_at: Option<DateTime<Utc>>,
}

/// Current dose status, derived on read and never stored.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct DoseStatus {
    pub order_id: String,
    pub intake_status: IntakeStatus,
    pub last_administered_at: Option<DateTime<Utc>>,
    pub next_dose_time: Option<DateTime<Utc>>,
    pub is_overdue: bool,
}

pub const AGGREGATE_TYPE: &str = "MedicationOrder";

/// Collaborators available to command handling. The ledger is shared
/// with the rest of the process so an `Administer` command reserves
/// stock from the same counters every caregiver sees.
#[derive(Clone, new)]
pub struct Services {
    pub inventory: Arc<InventoryLedger>,
}

#[async_trait]
impl Aggregate for MedicationOrder {
    type Command = Command;
    type Event = Event;
    type Error = Error;
    type Services = Services;

    fn aggregate_type() -> String {
        AGGREGATE_TYPE.to_string()
    }

    async fn handle(
        &self,
        command: Self::Command,
        services: &Self::Services,
    ) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            Command::Create {
                id,
                resident_id,
                inventory_item_id,
                dosage,
                schedule,
                notes,
            } => {
                self.validate_new()?;
                if resident_id.trim().is_empty() {
                    return Err(Error::Validation {
                        message: "resident id must not be empty".to_string(),
                    });
                }
                let item = match &inventory_item_id {
                    Some(item_id) => Some(services.inventory.get(item_id)?),
                    None => None,
                };
                let dosage = normalize_dosage(dosage.as_deref(), item.as_ref())?;

                Ok(vec![Event::Created {
                    id,
                    resident_id,
                    inventory_item_id,
                    dosage,
                    schedule,
                    notes,
                    created_at: Utc::now(),
                }])
            }

            Command::Update {
                dosage,
                schedule,
                notes,
            } => {
                self.validate_existing()?;
                self.validate_mutable("updated")?;
                if dosage.is_none() && schedule.is_none() && notes.is_none() {
                    return Ok(vec![]);
                }
                let dosage = match dosage {
                    Some(raw) => Some(normalize_dosage(Some(&raw), None)?),
                    None => None,
                };

                Ok(vec![Event::Updated {
                    id: self.id.clone(),
                    dosage,
                    schedule,
                    notes,
                    updated_at: Utc::now(),
                }])
            }

            Command::Delete => {
                self.validate_existing()?;
                if self.deleted_at.is_some() {
                    return Ok(vec![]);
                }

                Ok(vec![Event::Deleted {
                    id: self.id.clone(),
                    deleted_at: Utc::now(),
                }])
            }

            Command::Transition { target, actor_id } => {
                self.validate_existing()?;
                self.validate_mutable(target.as_str())?;
                self.transition(target, actor_id, services)
            }
        }
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            Event::Created {
                id,
                resident_id,
                inventory_item_id,
                dosage,
                schedule,
                notes,
                created_at,
            } => {
                self.id = id;
                self.resident_id = resident_id;
                self.inventory_item_id = inventory_item_id;
                self.dosage = dosage;
                self.schedule = schedule;
                self.notes = notes;
                self.created_at = created_at;
                self.updated_at = created_at;
                self.intake_status = IntakeStatus::Pending;
            }

            Event::Updated {
                dosage,
                schedule,
                notes,
                updated_at,
                ..
            } => {
                if let Some(dosage) = dosage {
                    self.dosage = dosage;
                }
                if let Some(schedule) = schedule {
                    self.schedule = schedule;
                }
                if let Some(notes) = notes {
                    self.notes = Some(notes);
                }
                self.updated_at = updated_at;
            }

            Event::Deleted { deleted_at, .. } => {
                self.deleted_at = Some(deleted_at);
                self.updated_at = deleted_at;
            }

            Event::DoseAdministered {
                administered_at, ..
            } => {
                self.intake_status = IntakeStatus::Administered;
                self.last_administered_at = Some(administered_at);
                self.status_changed_at = Some(administered_at);
                self.updated_at = administered_at;
            }

            Event::DoseWithheld { recorded_at, .. } => {
                self.intake_status = IntakeStatus::Withheld;
                self.status_changed_at = Some(recorded_at);
                self.updated_at = recorded_at;
            }

            Event::DoseMissed { recorded_at, .. } => {
                self.intake_status = IntakeStatus::Missed;
                self.status_changed_at = Some(recorded_at);
                self.updated_at = recorded_at;
            }
        }
    }
}

impl MedicationOrder {
    fn validate_new(&self) -> Result<(), Error> {
        if !self.id.is_empty() {
            return Err(Error::Uniqueness {
                field: "id".to_string(),
            });
        }
        Ok(())
    }

    fn validate_existing(&self) -> Result<(), Error> {
        if self.id.is_empty() {
            return Err(Error::NotFound {
                entity: AGGREGATE_TYPE.to_string(),
            });
        }
        Ok(())
    }

    fn validate_mutable(&self, attempted: &str) -> Result<(), Error> {
        if self.deleted_at.is_some() {
            return Err(Error::InvalidTransition {
                from: "deleted".to_string(),
                to: attempted.to_string(),
            });
        }
        Ok(())
    }

    /// Dose-status transitions for the current cycle.
    ///
    /// `Pending` is never a caller target: it only comes back implicitly
    /// when the scheduler observes the next cycle. Re-requesting the
    /// current status is a no-op. An administration reserves stock
    /// before any event is emitted, so a stockout leaves the order
    /// exactly as it was.
    fn transition(
        &self,
        target: IntakeStatus,
        actor_id: String,
        services: &Services,
    ) -> Result<Vec<Event>, Error> {
        let now = Utc::now();
        let current = self.effective_status(now);

        if target == IntakeStatus::Pending {
            return Err(Error::InvalidTransition {
                from: current.to_string(),
                to: target.to_string(),
            });
        }
        if current == target {
            return Ok(vec![]);
        }
        if current != IntakeStatus::Pending {
            return Err(Error::InvalidTransition {
                from: current.to_string(),
                to: target.to_string(),
            });
        }

        match target {
            IntakeStatus::Administered => {
                if let Some(item_id) = &self.inventory_item_id {
                    services.inventory.adjust(item_id, -1)?;
                }
                Ok(vec![Event::DoseAdministered {
                    id: self.id.clone(),
                    administered_by: actor_id,
                    administered_at: now,
                }])
            }
            IntakeStatus::Withheld => Ok(vec![Event::DoseWithheld {
                id: self.id.clone(),
                recorded_by: actor_id,
                recorded_at: now,
            }]),
            IntakeStatus::Missed => Ok(vec![Event::DoseMissed {
                id: self.id.clone(),
                recorded_by: actor_id,
                recorded_at: now,
            }]),
            IntakeStatus::Pending => unreachable!(),
        }
    }

    pub fn effective_status(&self, now: DateTime<Utc>) -> IntakeStatus {
        schedule::effective_status(
            self.schedule,
            self.intake_status,
            self.last_administered_at,
            self.status_changed_at,
            now,
        )
    }

    pub fn dose_status(&self, now: DateTime<Utc>) -> DoseStatus {
        let status = self.effective_status(now);
        DoseStatus {
            order_id: self.id.clone(),
            intake_status: status,
            last_administered_at: self.last_administered_at,
            next_dose_time: schedule::next_dose_time(
                self.schedule,
                self.created_at,
                self.last_administered_at,
            ),
            is_overdue: schedule::is_overdue(
                self.schedule,
                status,
                self.created_at,
                self.last_administered_at,
                now,
            ),
        }
    }
}

/// Dosage strings always carry a unit. A bare number (typically copied
/// from the item's per-serving strength) gets the " mg" suffix; a
/// missing dosage falls back to the linked item's strength.
fn normalize_dosage(raw: Option<&str>, item: Option<&InventoryItem>) -> Result<String, Error> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) if text.parse::<f64>().is_ok() => Ok(format!("{text} mg")),
        Some(text) => Ok(text.to_string()),
        None => item
            .and_then(|item| item.dose_mg)
            .map(|mg| format!("{mg} mg"))
            .ok_or_else(|| Error::Validation {
                message: "dosage is required when the item has no per-serving strength"
                    .to_string(),
            }),
    }
}
