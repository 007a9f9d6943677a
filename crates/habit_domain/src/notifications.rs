use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::day::ReferenceZone;
use crate::habit::Habit;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub scheduled_for: DateTime<Utc>,
}

/// Receives the daily habit reminder. `schedule` replaces any pending
/// reminder; `clear_for_habit` drops one for a deleted or finished habit.
pub trait NotificationSink: Send + Sync {
    fn schedule(&self, notification: NotificationRequest);
    fn clear_for_habit(&self, habit: &Habit);
}

/// Next local `hour:00` in `zone` strictly after `now`.
///
/// Returns `None` only for an hour outside `0..24`.
pub fn next_reminder_at(now: DateTime<Utc>, zone: &ReferenceZone, hour: u32) -> Option<DateTime<Utc>> {
    let at = NaiveTime::from_hms_opt(hour, 0, 0)?;
    let tz = zone.tz();
    let local_today = now.with_timezone(&tz).date_naive();
    // Two days ahead covers a reminder hour that DST removes from tomorrow.
    (0..=2u64)
        .filter_map(|offset| local_today.checked_add_days(Days::new(offset)))
        .filter_map(|date| tz.from_local_datetime(&date.and_time(at)).earliest())
        .map(|local| local.with_timezone(&Utc))
        .find(|candidate| *candidate > now)
}
