use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::{
    day::{DayKey, ReferenceZone},
    error::{HabitError, Result},
    habit::{DayStatus, Habit, HabitId},
    notifications::{self, NotificationRequest, NotificationSink},
    progress::{self, DayCell, ProgressResult},
    stats::{AggregateStats, StatsAggregator, StatsPeriod},
};

pub const DEFAULT_REMINDER_HOUR: u32 = 9;
pub const DEFAULT_DISPLAY_DAYS: usize = 7;

/// Entry point for storage and UI layers. Holds no habit state: every call
/// receives its own snapshot and clock reading.
pub struct HabitService {
    zone: ReferenceZone,
    reminder_hour: u32,
    display_days: usize,
    aggregator: StatsAggregator,
    notification_sink: Option<Box<dyn NotificationSink>>,
}

pub struct HabitServiceBuilder {
    zone: ReferenceZone,
    timezone_name: Option<String>,
    reminder_hour: u32,
    display_days: usize,
    notification_sink: Option<Box<dyn NotificationSink>>,
}

impl Default for HabitServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HabitServiceBuilder {
    pub fn new() -> Self {
        Self {
            zone: ReferenceZone::default(),
            timezone_name: None,
            reminder_hour: DEFAULT_REMINDER_HOUR,
            display_days: DEFAULT_DISPLAY_DAYS,
            notification_sink: None,
        }
    }

    pub fn reference_zone(mut self, zone: ReferenceZone) -> Self {
        self.zone = zone;
        self.timezone_name = None;
        self
    }

    /// IANA zone id, resolved in [`build`](Self::build).
    pub fn timezone(mut self, name: impl Into<String>) -> Self {
        self.timezone_name = Some(name.into());
        self
    }

    pub fn reminder_hour(mut self, hour: u32) -> Self {
        self.reminder_hour = hour;
        self
    }

    pub fn display_days(mut self, days: usize) -> Self {
        self.display_days = days;
        self
    }

    pub fn with_notification_sink(mut self, sink: Box<dyn NotificationSink>) -> Self {
        self.notification_sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<HabitService> {
        let zone = match &self.timezone_name {
            Some(name) => ReferenceZone::parse(name)?,
            None => self.zone,
        };
        if self.reminder_hour >= 24 {
            return Err(HabitError::InvalidReminderHour(self.reminder_hour));
        }
        if self.display_days == 0 {
            return Err(HabitError::EmptyDisplayWindow);
        }
        tracing::debug!(zone = zone.name(), reminder_hour = self.reminder_hour, "habit service ready");
        Ok(HabitService {
            zone,
            reminder_hour: self.reminder_hour,
            display_days: self.display_days,
            aggregator: StatsAggregator::new(),
            notification_sink: self.notification_sink,
        })
    }
}

impl HabitService {
    pub fn builder() -> HabitServiceBuilder {
        HabitServiceBuilder::new()
    }

    pub fn zone(&self) -> &ReferenceZone {
        &self.zone
    }

    pub fn display_days(&self) -> usize {
        self.display_days
    }

    pub fn today(&self, now: DateTime<Utc>) -> DayKey {
        self.zone.today(now)
    }

    pub fn progress(&self, habit: &Habit, now: DateTime<Utc>) -> ProgressResult {
        progress::compute_progress(habit, &self.zone, self.today(now))
    }

    pub fn day_cells(&self, habit: &Habit, now: DateTime<Utc>) -> Vec<DayCell> {
        progress::day_cells(habit, &self.zone, self.today(now), self.display_days)
    }

    /// Returns an updated copy of `habit` with the day containing `instant`
    /// set to `status`. Persisting it is the caller's job.
    pub fn record_status(&self, habit: &Habit, instant: DateTime<Utc>, status: DayStatus) -> Habit {
        let day = self.zone.normalize(instant);
        tracing::debug!(habit = %habit.id, %day, ?status, "recording day status");
        habit.with_day_status(day, status)
    }

    #[instrument(skip(self, habits), fields(habits = habits.len()))]
    pub fn aggregate(&self, habits: &[Habit], period: StatsPeriod, now: DateTime<Utc>) -> AggregateStats {
        self.aggregator
            .compute_aggregate(habits, period, &self.zone, self.today(now))
    }

    /// Per-habit breakdown from the latest [`aggregate`](Self::aggregate) call.
    pub fn cached_progress(&self, id: HabitId) -> Option<ProgressResult> {
        self.aggregator.cached(id)
    }

    /// Builds the daily reminder and hands it to the configured sink.
    #[instrument(skip(self, habits), fields(habits = habits.len()))]
    pub fn schedule_reminder(&self, habits: &[Habit], now: DateTime<Utc>) -> Option<NotificationRequest> {
        let scheduled_for = notifications::next_reminder_at(now, &self.zone, self.reminder_hour)?;
        let reminder_day = self.zone.normalize(scheduled_for);
        let open = habits
            .iter()
            .filter(|habit| {
                let started = self
                    .zone
                    .canonicalize(habit.created_day)
                    .is_some_and(|created| created <= reminder_day);
                let active = habit
                    .deadline_day
                    .and_then(|deadline| self.zone.canonicalize(deadline))
                    .map_or(true, |deadline| deadline >= reminder_day);
                started && active && habit.status_on(reminder_day) == DayStatus::Unrecorded
            })
            .count();
        let body = match open {
            0 => "All habits are marked for today.".to_string(),
            1 => "1 habit is waiting to be marked today.".to_string(),
            n => format!("{n} habits are waiting to be marked today."),
        };
        let request = NotificationRequest {
            title: "Daily habits".to_string(),
            body,
            scheduled_for,
        };
        if let Some(sink) = &self.notification_sink {
            sink.schedule(request.clone());
        }
        Some(request)
    }

    /// Tells the sink to drop anything pending for a habit that is going away.
    pub fn forget_habit(&self, habit: &Habit) {
        if let Some(sink) = &self.notification_sink {
            sink.clear_for_habit(habit);
        }
    }
}
