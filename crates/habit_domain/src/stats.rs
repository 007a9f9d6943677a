//! Aggregate statistics over a reporting period.
//!
//! The per-habit breakdown computed alongside each aggregate is kept in a
//! memo cache for drill-down views. It is replaced as a whole on every
//! [`StatsAggregator::compute_aggregate`] call and is never authoritative.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::day::{DayKey, ReferenceZone};
use crate::error::HabitError;
use crate::habit::{Habit, HabitId};
use crate::progress::{DayTally, ProgressResult};
use crate::range::DayRange;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatsPeriod {
    #[default]
    Week,
    Month,
    Year,
    Custom(u32),
}

impl StatsPeriod {
    pub fn days(self) -> u32 {
        match self {
            StatsPeriod::Week => 7,
            StatsPeriod::Month => 30,
            StatsPeriod::Year => 365,
            StatsPeriod::Custom(days) => days,
        }
    }
}

impl fmt::Display for StatsPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsPeriod::Week => f.write_str("Week"),
            StatsPeriod::Month => f.write_str("Month"),
            StatsPeriod::Year => f.write_str("Year"),
            StatsPeriod::Custom(days) => write!(f, "{days} days"),
        }
    }
}

impl FromStr for StatsPeriod {
    type Err = HabitError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "week" => Ok(StatsPeriod::Week),
            "month" => Ok(StatsPeriod::Month),
            "year" => Ok(StatsPeriod::Year),
            other => other
                .parse::<u32>()
                .map(StatsPeriod::Custom)
                .map_err(|_| HabitError::InvalidPeriod(trimmed.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Percentage in `[0, 100]`.
    pub average_completion: f64,
    pub longest_streak: u32,
    pub missed_days: u32,
    pub total_habits: usize,
    pub completed_days: u32,
    pub total_days: u32,
}

impl AggregateStats {
    pub fn rounded_average(&self) -> f64 {
        self.average_completion.round()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AggregateReport {
    pub stats: AggregateStats,
    pub per_habit: HashMap<HabitId, ProgressResult>,
}

/// Folds every habit over `[today - period.days(), today]`, each clipped to
/// its own creation day and deadline. Pure; see [`StatsAggregator`] for
/// the cached form.
pub fn aggregate(
    habits: &[Habit],
    period: StatsPeriod,
    zone: &ReferenceZone,
    today: DayKey,
) -> AggregateReport {
    let mut report = AggregateReport {
        stats: AggregateStats {
            total_habits: habits.len(),
            ..AggregateStats::default()
        },
        per_habit: HashMap::with_capacity(habits.len()),
    };
    let Some(today) = zone.canonicalize(today) else {
        return report;
    };
    let window_start = zone
        .offset_days(today, -i64::from(period.days()))
        .unwrap_or(today);

    for habit in habits {
        let tally = match active_window(habit, zone, window_start, today) {
            Some(days) => DayTally::fold(&days, &habit.daily_status, today),
            None => DayTally::default(),
        };
        report.stats.completed_days += tally.completed;
        report.stats.total_days += tally.total;
        report.stats.missed_days += tally.skipped;
        report.stats.longest_streak = report.stats.longest_streak.max(tally.longest_streak);
        report.per_habit.insert(habit.id, tally.into_progress());
    }

    if report.stats.total_days > 0 {
        report.stats.average_completion =
            100.0 * f64::from(report.stats.completed_days) / f64::from(report.stats.total_days);
    }
    report
}

/// The habit's own active window intersected with the reporting window.
fn active_window(
    habit: &Habit,
    zone: &ReferenceZone,
    window_start: DayKey,
    today: DayKey,
) -> Option<DayRange> {
    let start = zone.canonicalize(habit.created_day)?.max(window_start);
    let end = match habit.deadline_day {
        Some(deadline) => zone.canonicalize(deadline)?.min(today),
        None => today,
    };
    Some(DayRange::new(*zone, start, end))
}

#[derive(Debug, Default)]
pub struct StatsAggregator {
    cache: RwLock<Arc<HashMap<HabitId, ProgressResult>>>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the aggregate and swaps in a fresh per-habit cache in one write.
    pub fn compute_aggregate(
        &self,
        habits: &[Habit],
        period: StatsPeriod,
        zone: &ReferenceZone,
        today: DayKey,
    ) -> AggregateStats {
        let report = aggregate(habits, period, zone, today);
        tracing::debug!(
            habits = report.stats.total_habits,
            %period,
            average = report.stats.average_completion,
            "aggregate statistics computed"
        );
        *self.cache.write() = Arc::new(report.per_habit);
        report.stats
    }

    /// Breakdown for `id` from the most recent aggregate, if it included that habit.
    pub fn cached(&self, id: HabitId) -> Option<ProgressResult> {
        self.cache.read().get(&id).copied()
    }

    /// The whole cache as of the most recent aggregate.
    pub fn cache_snapshot(&self) -> Arc<HashMap<HabitId, ProgressResult>> {
        Arc::clone(&self.cache.read())
    }

    pub fn clear(&self) {
        *self.cache.write() = Arc::default();
    }
}
