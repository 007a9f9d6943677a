use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::day::DayKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(pub i64);

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayStatus {
    Completed,
    Skipped,
    Unrecorded,
}

impl DayStatus {
    fn from_entry(entry: Option<bool>) -> Self {
        match entry {
            Some(true) => DayStatus::Completed,
            Some(false) => DayStatus::Skipped,
            None => DayStatus::Unrecorded,
        }
    }

    fn as_entry(self) -> Option<bool> {
        match self {
            DayStatus::Completed => Some(true),
            DayStatus::Skipped => Some(false),
            DayStatus::Unrecorded => None,
        }
    }
}

/// Sparse per-day record. A present key is an explicit completed/skipped
/// mark; an absent key is unrecorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailyStatus {
    entries: BTreeMap<DayKey, bool>,
}

impl DailyStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact-key lookup. Callers pass canonical keys; stored keys with any
    /// other shape are never matched and read as unrecorded.
    pub fn status(&self, day: DayKey) -> DayStatus {
        DayStatus::from_entry(self.entries.get(&day).copied())
    }

    /// Returns a copy with `day` set to `status`. `Unrecorded` removes the key.
    pub fn with_status(&self, day: DayKey, status: DayStatus) -> Self {
        let mut entries = self.entries.clone();
        match status.as_entry() {
            Some(done) => {
                entries.insert(day, done);
            }
            None => {
                entries.remove(&day);
            }
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DayKey, DayStatus)> + '_ {
        self.entries
            .iter()
            .map(|(day, done)| (*day, DayStatus::from_entry(Some(*done))))
    }
}

impl FromIterator<(DayKey, bool)> for DailyStatus {
    fn from_iter<I: IntoIterator<Item = (DayKey, bool)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Read-only habit snapshot handed to the calculators by the storage layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_day: DayKey,
    #[serde(default)]
    pub deadline_day: Option<DayKey>,
    #[serde(default)]
    pub daily_status: DailyStatus,
}

impl Habit {
    pub fn new(id: HabitId, name: impl Into<String>, created_day: DayKey) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            created_day,
            deadline_day: None,
            daily_status: DailyStatus::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_deadline(mut self, deadline: DayKey) -> Self {
        self.deadline_day = Some(deadline);
        self
    }

    pub fn with_daily_status(mut self, daily_status: DailyStatus) -> Self {
        self.daily_status = daily_status;
        self
    }

    /// New snapshot with one day's mark changed; `self` is left untouched.
    pub fn with_day_status(&self, day: DayKey, status: DayStatus) -> Self {
        Self {
            daily_status: self.daily_status.with_status(day, status),
            ..self.clone()
        }
    }

    pub fn status_on(&self, day: DayKey) -> DayStatus {
        self.daily_status.status(day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 86_400_000;

    #[test]
    fn status_updates_return_new_snapshots() {
        let habit = Habit::new(HabitId(1), "Read", DayKey::from_millis(0));
        let marked = habit.with_day_status(DayKey::from_millis(DAY), DayStatus::Completed);
        assert!(habit.daily_status.is_empty());
        assert_eq!(marked.status_on(DayKey::from_millis(DAY)), DayStatus::Completed);

        let skipped = marked.with_day_status(DayKey::from_millis(DAY), DayStatus::Skipped);
        assert_eq!(skipped.status_on(DayKey::from_millis(DAY)), DayStatus::Skipped);
        assert_eq!(skipped.daily_status.len(), 1);

        let cleared = skipped.with_day_status(DayKey::from_millis(DAY), DayStatus::Unrecorded);
        assert!(cleared.daily_status.is_empty());
        assert_eq!(marked.status_on(DayKey::from_millis(DAY)), DayStatus::Completed);
    }

    #[test]
    fn lookups_only_match_exact_keys() {
        let status: DailyStatus = [(DayKey::from_millis(DAY + 5), true)].into_iter().collect();
        assert_eq!(status.status(DayKey::from_millis(DAY)), DayStatus::Unrecorded);
        assert_eq!(status.status(DayKey::from_millis(DAY + 5)), DayStatus::Completed);
    }

    #[test]
    fn daily_status_serializes_as_millisecond_keyed_object() {
        let status: DailyStatus = [
            (DayKey::from_millis(0), true),
            (DayKey::from_millis(DAY), false),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, r#"{"0":true,"86400000":false}"#);
        let decoded: DailyStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, status);
    }
}
