use serde::{Deserialize, Serialize};

use crate::schedule::{IntakeStatus, Schedule};

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub enum Command {
    /// Create a medication order for a resident. The resident and
    /// inventory links never change afterwards.
    Create {
        id: String,
        resident_id: String,
        inventory_item_id: Option<String>,
        dosage: Option<String>,
        schedule: Schedule,
        notes: Option<String>,
    },

    /// Partial patch of dosage, schedule and notes.
    Update {
        dosage: Option<String>,
        schedule: Option<Schedule>,
        notes: Option<String>,
    },

    /// Soft delete; the order stays in the log for audit.
    Delete,

    /// Record the dose outcome for the current cycle.
    Transition {
        target: IntakeStatus,
        actor_id: String,
    },
}
