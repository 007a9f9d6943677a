use std::fmt;

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{HabitError, Result};

/// Milliseconds since the Unix epoch of the first instant of a calendar day
/// in the reference zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(i64);

impl DayKey {
    /// Wraps a raw instant. The value is not checked; pass it through
    /// [`ReferenceZone::canonicalize`] before comparing it with computed keys.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn millis(self) -> i64 {
        self.0
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The single timezone every day key in the system is bucketed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceZone {
    tz: Tz,
}

impl Default for ReferenceZone {
    fn default() -> Self {
        Self::UTC
    }
}

impl ReferenceZone {
    pub const UTC: Self = Self { tz: chrono_tz::UTC };

    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Parses an IANA zone id such as `Europe/Moscow`.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        match trimmed.parse::<Tz>() {
            Ok(tz) => Ok(Self { tz }),
            Err(err) => {
                tracing::debug!(timezone = %trimmed, error = %err, "invalid timezone id");
                Err(HabitError::UnknownTimezone(trimmed.to_string()))
            }
        }
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn name(&self) -> &'static str {
        self.tz.name()
    }

    /// Truncates `instant` to the start of its calendar day in this zone.
    pub fn normalize(&self, instant: DateTime<Utc>) -> DayKey {
        self.start_of(instant.with_timezone(&self.tz).date_naive())
    }

    /// Alias of [`normalize`](Self::normalize) that reads better at call sites
    /// turning a caller-supplied clock value into the current day.
    pub fn today(&self, now: DateTime<Utc>) -> DayKey {
        self.normalize(now)
    }

    /// Re-normalizes a raw key. `None` when the instant is outside chrono's range.
    pub fn canonicalize(&self, key: DayKey) -> Option<DayKey> {
        let instant = Utc.timestamp_millis_opt(key.millis()).single()?;
        Some(self.normalize(instant))
    }

    pub fn is_canonical(&self, key: DayKey) -> bool {
        self.canonicalize(key) == Some(key)
    }

    /// First instant of `date`. When DST skips local midnight the day starts
    /// at the first valid local time on that date.
    pub fn start_of(&self, date: NaiveDate) -> DayKey {
        let midnight = date.and_time(NaiveTime::MIN);
        let instant = self
            .tz
            .from_local_datetime(&midnight)
            .earliest()
            .or_else(|| {
                (1..=3).find_map(|hours| {
                    self.tz
                        .from_local_datetime(&(midnight + Duration::hours(hours)))
                        .earliest()
                })
            })
            .unwrap_or_else(|| self.tz.from_utc_datetime(&midnight));
        DayKey(instant.timestamp_millis())
    }

    /// Calendar date a key falls on in this zone.
    pub fn date_of(&self, key: DayKey) -> Option<NaiveDate> {
        let instant = Utc.timestamp_millis_opt(key.millis()).single()?;
        Some(instant.with_timezone(&self.tz).date_naive())
    }

    /// Moves `key` by whole calendar days. Negative values go back in time.
    pub fn offset_days(&self, key: DayKey, days: i64) -> Option<DayKey> {
        let date = self.date_of(key)?;
        let shifted = if days >= 0 {
            date.checked_add_days(Days::new(days.unsigned_abs()))?
        } else {
            date.checked_sub_days(Days::new(days.unsigned_abs()))?
        };
        Some(self.start_of(shifted))
    }
}

/// Free-function form of [`ReferenceZone::normalize`].
pub fn normalize_day(instant: DateTime<Utc>, zone: &ReferenceZone) -> DayKey {
    zone.normalize(instant)
}
