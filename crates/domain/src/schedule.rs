//! Administration scheduling.
//!
//! Pure functions over stored timestamps. Nothing here is persisted:
//! `next_dose_time`, `is_overdue` and the effective intake status are
//! recomputed on every read so no background job is needed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Fixed administration-schedule vocabulary. Anything outside this list
/// is rejected with [`Error::InvalidSchedule`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub enum Schedule {
    #[serde(rename = "Once daily")]
    OnceDaily,
    #[serde(rename = "Twice daily")]
    TwiceDaily,
    #[serde(rename = "Three times daily")]
    ThreeTimesDaily,
    #[serde(rename = "Four times daily")]
    FourTimesDaily,
    #[serde(rename = "Every 4 hours")]
    Every4Hours,
    #[serde(rename = "Every 6 hours")]
    Every6Hours,
    #[serde(rename = "Every 8 hours")]
    Every8Hours,
    #[serde(rename = "Every 12 hours")]
    Every12Hours,
    #[serde(rename = "Morning only")]
    MorningOnly,
    #[serde(rename = "Evening only")]
    EveningOnly,
    #[serde(rename = "Bedtime")]
    Bedtime,
    #[serde(rename = "Before meals")]
    BeforeMeals,
    #[serde(rename = "After meals")]
    AfterMeals,
    #[serde(rename = "As needed (PRN)")]
    AsNeeded,
}

impl Schedule {
    pub const ALL: [Schedule; 14] = [
        Schedule::OnceDaily,
        Schedule::TwiceDaily,
        Schedule::ThreeTimesDaily,
        Schedule::FourTimesDaily,
        Schedule::Every4Hours,
        Schedule::Every6Hours,
        Schedule::Every8Hours,
        Schedule::Every12Hours,
        Schedule::MorningOnly,
        Schedule::EveningOnly,
        Schedule::Bedtime,
        Schedule::BeforeMeals,
        Schedule::AfterMeals,
        Schedule::AsNeeded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Schedule::OnceDaily => "Once daily",
            Schedule::TwiceDaily => "Twice daily",
            Schedule::ThreeTimesDaily => "Three times daily",
            Schedule::FourTimesDaily => "Four times daily",
            Schedule::Every4Hours => "Every 4 hours",
            Schedule::Every6Hours => "Every 6 hours",
            Schedule::Every8Hours => "Every 8 hours",
            Schedule::Every12Hours => "Every 12 hours",
            Schedule::MorningOnly => "Morning only",
            Schedule::EveningOnly => "Evening only",
            Schedule::Bedtime => "Bedtime",
            Schedule::BeforeMeals => "Before meals",
            Schedule::AfterMeals => "After meals",
            Schedule::AsNeeded => "As needed (PRN)",
        }
    }

    /// Length of one dose cycle, `None` for as-needed orders (no cycle,
    /// no overdue concept).
    ///
    /// Hour-of-day tags (Morning only, Evening only, Bedtime) are daily
    /// schedules; meal tags cover three meal windows per day.
    pub fn dose_interval(&self) -> Option<Duration> {
        let hours = match self {
            Schedule::OnceDaily
            | Schedule::MorningOnly
            | Schedule::EveningOnly
            | Schedule::Bedtime => 24,
            Schedule::TwiceDaily | Schedule::Every12Hours => 12,
            Schedule::ThreeTimesDaily
            | Schedule::Every8Hours
            | Schedule::BeforeMeals
            | Schedule::AfterMeals => 8,
            Schedule::FourTimesDaily | Schedule::Every6Hours => 6,
            Schedule::Every4Hours => 4,
            Schedule::AsNeeded => return None,
        };
        Some(Duration::hours(hours))
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::AsNeeded
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Schedule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Schedule::ALL
            .iter()
            .find(|schedule| schedule.as_str() == s.trim())
            .copied()
            .ok_or_else(|| Error::InvalidSchedule {
                value: s.to_string(),
            })
    }
}

/// Current per-cycle dose status of a medication order.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum IntakeStatus {
    #[default]
    Pending,
    Administered,
    Withheld,
    Missed,
}

impl IntakeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntakeStatus::Pending => "pending",
            IntakeStatus::Administered => "administered",
            IntakeStatus::Withheld => "withheld",
            IntakeStatus::Missed => "missed",
        }
    }
}

impl fmt::Display for IntakeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntakeStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(IntakeStatus::Pending),
            "administered" => Ok(IntakeStatus::Administered),
            "withheld" => Ok(IntakeStatus::Withheld),
            "missed" => Ok(IntakeStatus::Missed),
            other => Err(Error::Validation {
                message: format!("unknown intake status: {other}"),
            }),
        }
    }
}

/// Next expected dose time.
///
/// A never-administered order falls due at creation time so that new
/// orders are immediately actionable. As-needed orders have no expected
/// dose time.
pub fn next_dose_time(
    schedule: Schedule,
    created_at: DateTime<Utc>,
    last_administered_at: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    let interval = schedule.dose_interval()?;
    Some(match last_administered_at {
        Some(last) => last + interval,
        None => created_at,
    })
}

/// Status as observed at `now`, folding in the implicit reset to
/// `Pending` once the cycle that produced a terminal status has ended.
///
/// As-needed orders reset immediately: the recorded outcome lives in the
/// event log and the order is at once eligible again.
pub fn effective_status(
    schedule: Schedule,
    stored: IntakeStatus,
    last_administered_at: Option<DateTime<Utc>>,
    status_changed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> IntakeStatus {
    if stored == IntakeStatus::Pending {
        return IntakeStatus::Pending;
    }
    let Some(interval) = schedule.dose_interval() else {
        return IntakeStatus::Pending;
    };
    let anchor = match stored {
        IntakeStatus::Administered => last_administered_at,
        IntakeStatus::Withheld | IntakeStatus::Missed => status_changed_at,
        IntakeStatus::Pending => unreachable!(),
    };
    match anchor {
        Some(at) if now < at + interval => stored,
        _ => IntakeStatus::Pending,
    }
}

/// Overdue iff the order is (effectively) pending and its next dose time
/// has passed.
pub fn is_overdue(
    schedule: Schedule,
    status: IntakeStatus,
    created_at: DateTime<Utc>,
    last_administered_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    if status != IntakeStatus::Pending {
        return false;
    }
    match next_dose_time(schedule, created_at, last_administered_at) {
        Some(next) => next <= now,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_vocabulary_entry() {
        for schedule in Schedule::ALL {
            assert_eq!(schedule.as_str().parse::<Schedule>().unwrap(), schedule);
        }
    }

    #[test]
    fn rejects_free_text_schedules() {
        let err = "Whenever convenient".parse::<Schedule>().unwrap_err();
        assert!(matches!(err, Error::InvalidSchedule { .. }));
    }

    #[test]
    fn intervals_divide_the_day() {
        assert_eq!(
            Schedule::TwiceDaily.dose_interval(),
            Some(Duration::hours(12))
        );
        assert_eq!(
            Schedule::Every4Hours.dose_interval(),
            Some(Duration::hours(4))
        );
        assert_eq!(Schedule::AsNeeded.dose_interval(), None);
    }

    #[test]
    fn never_administered_order_is_due_at_creation() {
        let created = Utc::now() - Duration::minutes(5);
        let next = next_dose_time(Schedule::OnceDaily, created, None);
        assert_eq!(next, Some(created));
        assert!(is_overdue(
            Schedule::OnceDaily,
            IntakeStatus::Pending,
            created,
            None,
            Utc::now()
        ));
    }

    #[test]
    fn next_dose_follows_last_administration() {
        let created = Utc::now() - Duration::days(3);
        let last = Utc::now() - Duration::hours(2);
        let next = next_dose_time(Schedule::TwiceDaily, created, Some(last));
        assert_eq!(next, Some(last + Duration::hours(12)));
        assert!(!is_overdue(
            Schedule::TwiceDaily,
            IntakeStatus::Pending,
            created,
            Some(last),
            Utc::now()
        ));
    }

    #[test]
    fn as_needed_has_no_overdue_concept() {
        let created = Utc::now() - Duration::days(1);
        assert_eq!(next_dose_time(Schedule::AsNeeded, created, None), None);
        assert!(!is_overdue(
            Schedule::AsNeeded,
            IntakeStatus::Pending,
            created,
            None,
            Utc::now()
        ));
    }

    #[test]
    fn terminal_status_holds_within_the_cycle() {
        let now = Utc::now();
        let administered = now - Duration::hours(3);
        let status = effective_status(
            Schedule::TwiceDaily,
            IntakeStatus::Administered,
            Some(administered),
            Some(administered),
            now,
        );
        assert_eq!(status, IntakeStatus::Administered);
    }

    #[test]
    fn terminal_status_resets_when_the_next_cycle_begins() {
        let now = Utc::now();
        let administered = now - Duration::hours(13);
        let status = effective_status(
            Schedule::TwiceDaily,
            IntakeStatus::Administered,
            Some(administered),
            Some(administered),
            now,
        );
        assert_eq!(status, IntakeStatus::Pending);
    }

    #[test]
    fn withheld_resets_from_its_own_timestamp() {
        let now = Utc::now();
        let withheld_at = now - Duration::hours(25);
        let status = effective_status(
            Schedule::OnceDaily,
            IntakeStatus::Withheld,
            None,
            Some(withheld_at),
            now,
        );
        assert_eq!(status, IntakeStatus::Pending);

        let recent = now - Duration::hours(1);
        let status = effective_status(
            Schedule::OnceDaily,
            IntakeStatus::Withheld,
            None,
            Some(recent),
            now,
        );
        assert_eq!(status, IntakeStatus::Withheld);
    }

    #[test]
    fn as_needed_resets_immediately() {
        let now = Utc::now();
        let status = effective_status(
            Schedule::AsNeeded,
            IntakeStatus::Administered,
            Some(now),
            Some(now),
            now,
        );
        assert_eq!(status, IntakeStatus::Pending);
    }
}
