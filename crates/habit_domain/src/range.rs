use chrono::NaiveDate;

use crate::day::{DayKey, ReferenceZone};

/// Inclusive run of calendar days. Cheap to copy and iterate any number of times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    zone: ReferenceZone,
    bounds: Option<(NaiveDate, NaiveDate)>,
}

impl DayRange {
    pub fn empty(zone: ReferenceZone) -> Self {
        Self { zone, bounds: None }
    }

    /// Days from `start` through `end`. Both keys are re-normalized, so the
    /// range never depends on the intra-day part of its inputs.
    pub fn new(zone: ReferenceZone, start: DayKey, end: DayKey) -> Self {
        let bounds = zone
            .date_of(start)
            .zip(zone.date_of(end))
            .filter(|(first, last)| first <= last);
        Self { zone, bounds }
    }

    pub fn first(&self) -> Option<DayKey> {
        self.bounds.map(|(first, _)| self.zone.start_of(first))
    }

    pub fn last(&self) -> Option<DayKey> {
        self.bounds.map(|(_, last)| self.zone.start_of(last))
    }

    pub fn len(&self) -> usize {
        self.bounds
            .map(|(first, last)| (last - first).num_days() as usize + 1)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    pub fn contains(&self, day: DayKey) -> bool {
        match (self.bounds, self.zone.date_of(day)) {
            (Some((first, last)), Some(date)) => first <= date && date <= last,
            _ => false,
        }
    }

    /// Keeps at most the first `limit` days.
    pub fn take_days(self, limit: usize) -> Self {
        let bounds = match (self.bounds, limit) {
            (_, 0) | (None, _) => None,
            (Some((first, last)), limit) => {
                let capped = first
                    .checked_add_days(chrono::Days::new(limit as u64 - 1))
                    .map_or(last, |candidate| candidate.min(last));
                Some((first, capped))
            }
        };
        Self {
            zone: self.zone,
            bounds,
        }
    }

    pub fn iter(&self) -> DayIter {
        DayIter {
            zone: self.zone,
            next: self.bounds.map(|(first, _)| first),
            last: self.bounds.map(|(_, last)| last),
        }
    }
}

impl IntoIterator for DayRange {
    type Item = DayKey;
    type IntoIter = DayIter;

    fn into_iter(self) -> DayIter {
        self.iter()
    }
}

impl IntoIterator for &DayRange {
    type Item = DayKey;
    type IntoIter = DayIter;

    fn into_iter(self) -> DayIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct DayIter {
    zone: ReferenceZone,
    next: Option<NaiveDate>,
    last: Option<NaiveDate>,
}

impl Iterator for DayIter {
    type Item = DayKey;

    fn next(&mut self) -> Option<DayKey> {
        let current = self.next?;
        let last = self.last?;
        if current > last {
            self.next = None;
            return None;
        }
        self.next = current.succ_opt();
        Some(self.zone.start_of(current))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match (self.next, self.last) {
            (Some(next), Some(last)) if next <= last => (last - next).num_days() as usize + 1,
            _ => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DayIter {}

/// Inclusive day sequence from `start` to `end`; empty when `end < start`.
pub fn days_in_range(zone: &ReferenceZone, start: DayKey, end: DayKey) -> DayRange {
    DayRange::new(*zone, start, end)
}

/// Days shown in a habit's progress strip: today up to the deadline (or a
/// week ahead without one), never more than `limit` days.
pub fn display_window(
    zone: &ReferenceZone,
    today: DayKey,
    deadline: Option<DayKey>,
    limit: usize,
) -> DayRange {
    let horizon = limit.saturating_sub(1) as i64;
    let end = match deadline {
        Some(deadline) => Some(deadline),
        None => zone.offset_days(today, horizon),
    };
    match end {
        Some(end) => DayRange::new(*zone, today, end).take_days(limit),
        None => DayRange::empty(*zone),
    }
}
