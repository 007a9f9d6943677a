use serde::{Deserialize, Serialize};

use crate::day::{DayKey, ReferenceZone};
use crate::habit::{DailyStatus, DayStatus, Habit};
use crate::range::{display_window, DayRange};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressResult {
    pub completion_ratio: f64,
    pub skipped_days: u32,
    pub longest_streak: u32,
}

impl ProgressResult {
    /// Completion as a whole percentage, for display.
    pub fn percent(&self) -> f64 {
        (self.completion_ratio * 100.0).round()
    }
}

/// Running counts from folding one window against a habit's status map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct DayTally {
    pub completed: u32,
    pub skipped: u32,
    pub total: u32,
    pub longest_streak: u32,
}

impl DayTally {
    /// Walks `days` in order. Unrecorded days strictly before `today` count as
    /// skipped; unrecorded days on or after `today` count toward neither and
    /// leave the current streak alone.
    pub(crate) fn fold(days: &DayRange, status: &DailyStatus, today: DayKey) -> Self {
        let mut tally = DayTally::default();
        let mut current_streak = 0u32;
        for day in days {
            tally.total += 1;
            match status.status(day) {
                DayStatus::Completed => {
                    tally.completed += 1;
                    current_streak += 1;
                    tally.longest_streak = tally.longest_streak.max(current_streak);
                }
                DayStatus::Skipped => {
                    tally.skipped += 1;
                    current_streak = 0;
                }
                DayStatus::Unrecorded if day < today => {
                    tally.skipped += 1;
                    current_streak = 0;
                }
                DayStatus::Unrecorded => {}
            }
        }
        tally
    }

    pub(crate) fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (f64::from(self.completed) / f64::from(self.total)).clamp(0.0, 1.0)
    }

    pub(crate) fn into_progress(self) -> ProgressResult {
        ProgressResult {
            completion_ratio: self.ratio(),
            skipped_days: self.skipped,
            longest_streak: self.longest_streak,
        }
    }
}

/// Progress over `[created_day, min(deadline or today, today)]`.
///
/// `today` is supplied by the caller; every bound is re-normalized in `zone`
/// so raw creation timestamps are bucketed the same way as status keys.
pub fn compute_progress(habit: &Habit, zone: &ReferenceZone, today: DayKey) -> ProgressResult {
    let Some(today) = zone.canonicalize(today) else {
        return ProgressResult::default();
    };
    let Some(start) = zone.canonicalize(habit.created_day) else {
        return ProgressResult::default();
    };
    let end = match habit.deadline_day.map(|deadline| zone.canonicalize(deadline)) {
        Some(Some(deadline)) => deadline.min(today),
        Some(None) => return ProgressResult::default(),
        None => today,
    };

    let days = DayRange::new(*zone, start, end);
    if days.is_empty() {
        return ProgressResult::default();
    }
    DayTally::fold(&days, &habit.daily_status, today).into_progress()
}

/// One slot of a habit's progress strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub day: DayKey,
    /// What the habit has on file for the day.
    pub recorded: DayStatus,
    /// What the day counts as: unrecorded past days read as skipped.
    pub effective: DayStatus,
    pub is_today: bool,
    pub is_past: bool,
}

pub fn day_cells(habit: &Habit, zone: &ReferenceZone, today: DayKey, limit: usize) -> Vec<DayCell> {
    let Some(today) = zone.canonicalize(today) else {
        return Vec::new();
    };
    let deadline = habit
        .deadline_day
        .and_then(|deadline| zone.canonicalize(deadline));
    display_window(zone, today, deadline, limit)
        .iter()
        .map(|day| {
            let recorded = habit.status_on(day);
            let is_past = day < today;
            let effective = match recorded {
                DayStatus::Unrecorded if is_past => DayStatus::Skipped,
                other => other,
            };
            DayCell {
                day,
                recorded,
                effective,
                is_today: day == today,
                is_past,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::HabitId;
    use chrono::NaiveDate;

    fn day(zone: &ReferenceZone, y: i32, m: u32, d: u32) -> DayKey {
        zone.start_of(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn habit_from(created: DayKey) -> Habit {
        Habit::new(HabitId(7), "Stretch", created)
    }

    fn mark(habit: Habit, zone: &ReferenceZone, start: DayKey, marks: &[Option<bool>]) -> Habit {
        marks.iter().enumerate().fold(habit, |habit, (offset, mark)| {
            let key = zone.offset_days(start, offset as i64).unwrap();
            let status = match mark {
                Some(true) => DayStatus::Completed,
                Some(false) => DayStatus::Skipped,
                None => DayStatus::Unrecorded,
            };
            habit.with_day_status(key, status)
        })
    }

    #[test]
    fn deadline_before_creation_is_all_zero() {
        let zone = ReferenceZone::UTC;
        let habit = habit_from(day(&zone, 2025, 3, 10)).with_deadline(day(&zone, 2025, 3, 1));
        let result = compute_progress(&habit, &zone, day(&zone, 2025, 3, 20));
        assert_eq!(result, ProgressResult::default());
    }

    #[test]
    fn habit_created_in_the_future_is_all_zero() {
        let zone = ReferenceZone::UTC;
        let habit = habit_from(day(&zone, 2025, 4, 2));
        assert_eq!(
            compute_progress(&habit, &zone, day(&zone, 2025, 4, 1)),
            ProgressResult::default()
        );
    }

    #[test]
    fn created_today_without_deadline_spans_one_day() {
        let zone = ReferenceZone::UTC;
        let today = day(&zone, 2025, 4, 1);
        let done = habit_from(today).with_day_status(today, DayStatus::Completed);
        let result = compute_progress(&done, &zone, today);
        assert_eq!(result.completion_ratio, 1.0);
        assert_eq!(result.longest_streak, 1);

        let untouched = compute_progress(&habit_from(today), &zone, today);
        assert_eq!(untouched.completion_ratio, 0.0);
        assert_eq!(untouched.skipped_days, 0);
    }

    #[test]
    fn skipped_day_breaks_streak() {
        let zone = ReferenceZone::UTC;
        let d0 = day(&zone, 2025, 1, 1);
        let d3 = day(&zone, 2025, 1, 4);
        let habit = mark(
            habit_from(d0).with_deadline(d3),
            &zone,
            d0,
            &[Some(true), Some(true), Some(false), Some(true)],
        );
        let result = compute_progress(&habit, &zone, d3);
        assert_eq!(result.longest_streak, 2);
        assert_eq!(result.skipped_days, 1);
        assert_eq!(result.completion_ratio, 0.75);
    }

    #[test]
    fn unrecorded_past_days_count_as_skipped() {
        let zone = ReferenceZone::UTC;
        let start = day(&zone, 2025, 2, 1);
        let habit = mark(
            habit_from(start),
            &zone,
            start,
            &[Some(true), None, None, Some(true), None, None, None, Some(true), None, None],
        );
        // Ten-day window, the last day still in the past.
        let today = day(&zone, 2025, 2, 11);
        let habit = habit.with_deadline(day(&zone, 2025, 2, 10));
        let result = compute_progress(&habit, &zone, today);
        assert!((result.completion_ratio - 0.3).abs() < 1e-9);
        assert_eq!(result.skipped_days, 7);
        assert_eq!(result.longest_streak, 1);
        assert_eq!(result.percent(), 30.0);
    }

    #[test]
    fn unrecorded_today_is_neither_done_nor_missed() {
        let zone = ReferenceZone::UTC;
        let start = day(&zone, 2025, 2, 1);
        let today = day(&zone, 2025, 2, 3);
        let habit = mark(habit_from(start), &zone, start, &[Some(true), Some(true)]);
        let result = compute_progress(&habit, &zone, today);
        assert_eq!(result.skipped_days, 0);
        assert_eq!(result.longest_streak, 2);
        assert!((result.completion_ratio - 2.0 / 3.0).abs() < 1e-9);

        let finished = habit.with_day_status(today, DayStatus::Completed);
        assert_eq!(compute_progress(&finished, &zone, today).longest_streak, 3);
    }

    #[test]
    fn future_deadline_is_capped_at_today() {
        let zone = ReferenceZone::UTC;
        let start = day(&zone, 2025, 5, 1);
        let today = day(&zone, 2025, 5, 2);
        let tomorrow = day(&zone, 2025, 5, 3);
        let habit = habit_from(start)
            .with_deadline(day(&zone, 2025, 6, 1))
            .with_day_status(start, DayStatus::Completed)
            .with_day_status(tomorrow, DayStatus::Completed);
        let result = compute_progress(&habit, &zone, today);
        assert_eq!(result.completion_ratio, 0.5);
        assert_eq!(result.longest_streak, 1);
    }

    #[test]
    fn raw_creation_instant_is_bucketed_to_its_day() {
        let zone = ReferenceZone::parse("Asia/Tokyo").unwrap();
        let created = day(&zone, 2025, 7, 1);
        let raw = DayKey::from_millis(created.millis() + 15 * 3_600_000);
        let habit = habit_from(raw).with_day_status(created, DayStatus::Completed);
        let result = compute_progress(&habit, &zone, day(&zone, 2025, 7, 2));
        assert_eq!(result.completion_ratio, 0.5);
        assert_eq!(result.longest_streak, 1);
    }

    #[test]
    fn non_canonical_status_keys_read_as_unrecorded() {
        let zone = ReferenceZone::UTC;
        let start = day(&zone, 2025, 8, 1);
        let habit = habit_from(start)
            .with_day_status(DayKey::from_millis(start.millis() + 60_000), DayStatus::Completed);
        let result = compute_progress(&habit, &zone, day(&zone, 2025, 8, 2));
        assert_eq!(result.completion_ratio, 0.0);
        assert_eq!(result.skipped_days, 1);
    }

    #[test]
    fn identical_inputs_give_identical_results() {
        let zone = ReferenceZone::UTC;
        let start = day(&zone, 2025, 1, 1);
        let habit = mark(habit_from(start), &zone, start, &[Some(true), None, Some(false)]);
        let today = day(&zone, 2025, 1, 9);
        assert_eq!(
            compute_progress(&habit, &zone, today),
            compute_progress(&habit, &zone, today)
        );
    }

    #[test]
    fn day_cells_start_today_and_stop_at_deadline() {
        let zone = ReferenceZone::UTC;
        let today = day(&zone, 2025, 3, 10);
        let yesterday = day(&zone, 2025, 3, 9);
        let habit = habit_from(day(&zone, 2025, 3, 1))
            .with_day_status(day(&zone, 2025, 3, 11), DayStatus::Completed);
        let cells = day_cells(&habit, &zone, today, 7);
        assert_eq!(cells.len(), 7);
        assert!(cells[0].is_today);
        assert_eq!(cells[0].effective, DayStatus::Unrecorded);
        assert_eq!(cells[1].recorded, DayStatus::Completed);
        assert!(cells.iter().all(|cell| !cell.is_past));

        let overdue = habit_from(day(&zone, 2025, 3, 1)).with_deadline(yesterday);
        assert!(day_cells(&overdue, &zone, today, 7).is_empty());
    }
}
