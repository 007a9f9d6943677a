//! Habit progress engine: day bucketing, per-habit progress and period
//! statistics computed from read-only habit snapshots.

pub mod day;
pub mod error;
pub mod habit;
pub mod notifications;
pub mod progress;
pub mod range;
pub mod service;
pub mod snapshot;
pub mod stats;

pub use crate::day::{normalize_day, DayKey, ReferenceZone};
pub use crate::error::{HabitError, Result};
pub use crate::habit::{DailyStatus, DayStatus, Habit, HabitId};
pub use crate::progress::{compute_progress, day_cells, DayCell, ProgressResult};
pub use crate::range::{days_in_range, display_window, DayRange};
pub use crate::service::{HabitService, HabitServiceBuilder};
pub use crate::stats::{aggregate, AggregateReport, AggregateStats, StatsAggregator, StatsPeriod};
