use chrono::{DateTime, Utc};
use cqrs_es::DomainEvent;
use serde::{Deserialize, Serialize};

use crate::schedule::Schedule;

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(tag = "type")]
pub enum Event {
    Created {
        id: String,
        resident_id: String,
        inventory_item_id: Option<String>,
        dosage: String,
        schedule: Schedule,
        notes: Option<String>,
        created_at: DateTime<Utc>,
    },

    Updated {
        id: String,
        dosage: Option<String>,
        schedule: Option<Schedule>,
        notes: Option<String>,
        updated_at: DateTime<Utc>,
    },

    Deleted {
        id: String,
        deleted_at: DateTime<Utc>,
    },

    DoseAdministered {
        id: String,
        administered_by: String,
        administered_at: DateTime<Utc>,
    },

    DoseWithheld {
        id: String,
        recorded_by: String,
        recorded_at: DateTime<Utc>,
    },

    DoseMissed {
        id: String,
        recorded_by: String,
        recorded_at: DateTime<Utc>,
    },
}

impl DomainEvent for Event {
    fn event_type(&self) -> String {
        match self {
            Event::Created { .. } => "MedicationOrder:Created".to_string(),
            Event::Updated { .. } => "MedicationOrder:Updated".to_string(),
            Event::Deleted { .. } => "MedicationOrder:Deleted".to_string(),
            Event::DoseAdministered { .. } => "MedicationOrder:DoseAdministered".to_string(),
            Event::DoseWithheld { .. } => "MedicationOrder:DoseWithheld".to_string(),
            Event::DoseMissed { .. } => "MedicationOrder:DoseMissed".to_string(),
        }
    }

    fn event_version(&self) -> String {
        "1.0".to_string()
    }
}
