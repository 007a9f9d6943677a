use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::day::{DayKey, ReferenceZone};
use crate::error::{HabitError, Result};
use crate::habit::{DailyStatus, DayStatus, Habit, HabitId};

/// Habit row as the storage layer persists it: raw millisecond instants and a
/// `dailyStatus` object keyed by stringified day keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub timestamp: i64,
    #[serde(default)]
    pub deadline: Option<i64>,
    #[serde(default)]
    pub daily_status: BTreeMap<i64, bool>,
}

impl HabitRecord {
    /// Buckets the creation and deadline instants into day keys. Status keys
    /// are carried over as stored.
    pub fn into_habit(self, zone: &ReferenceZone) -> Habit {
        let to_day = |millis: i64| {
            let raw = DayKey::from_millis(millis);
            zone.canonicalize(raw).unwrap_or(raw)
        };
        let daily_status: DailyStatus = self
            .daily_status
            .into_iter()
            .map(|(millis, done)| (DayKey::from_millis(millis), done))
            .collect();
        let stray = daily_status
            .iter()
            .filter(|(day, _)| !zone.is_canonical(*day))
            .count();
        if stray > 0 {
            tracing::warn!(
                habit = self.id,
                stray,
                zone = zone.name(),
                "status keys are not day starts and will read as unrecorded"
            );
        }
        Habit {
            id: HabitId(self.id),
            name: self.name,
            description: self.description,
            created_day: to_day(self.timestamp),
            deadline_day: self.deadline.map(to_day),
            daily_status,
        }
    }

    pub fn from_habit(habit: &Habit) -> Self {
        Self {
            id: habit.id.0,
            name: habit.name.clone(),
            description: habit.description.clone(),
            timestamp: habit.created_day.millis(),
            deadline: habit.deadline_day.map(DayKey::millis),
            daily_status: habit
                .daily_status
                .iter()
                .filter_map(|(day, status)| match status {
                    DayStatus::Completed => Some((day.millis(), true)),
                    DayStatus::Skipped => Some((day.millis(), false)),
                    DayStatus::Unrecorded => None,
                })
                .collect(),
        }
    }
}

pub fn parse_snapshot(raw: &str, zone: &ReferenceZone) -> Result<Vec<Habit>> {
    let records: Vec<HabitRecord> = serde_json::from_str(raw)?;
    Ok(records
        .into_iter()
        .map(|record| record.into_habit(zone))
        .collect())
}

pub fn load_snapshot(path: impl AsRef<Path>, zone: &ReferenceZone) -> Result<Vec<Habit>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| HabitError::SnapshotRead {
        path: path.to_path_buf(),
        source,
    })?;
    let habits = parse_snapshot(&raw, zone)?;
    tracing::info!(path = %path.display(), habits = habits.len(), "loaded habit snapshot");
    Ok(habits)
}

pub fn snapshot_json(habits: &[Habit]) -> Result<String> {
    let records: Vec<HabitRecord> = habits.iter().map(HabitRecord::from_habit).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}
