use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use habit_domain::{
    service::{DEFAULT_DISPLAY_DAYS, DEFAULT_REMINDER_HOUR},
    snapshot, DayCell, DayStatus, Habit, HabitService, StatsPeriod,
};
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) snapshot: Option<PathBuf>,
    pub(crate) timezone: String,
    pub(crate) period: StatsPeriod,
    pub(crate) reminder_hour: u32,
    pub(crate) display_days: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("HABIT_SNAPSHOT") {
            config.snapshot = Some(PathBuf::from(path));
        }
        if let Ok(zone) = std::env::var("HABIT_TIMEZONE") {
            if !zone.trim().is_empty() {
                config.timezone = zone.trim().to_string();
            }
        }
        if let Ok(period) = std::env::var("HABIT_STATS_PERIOD") {
            match period.parse::<StatsPeriod>() {
                Ok(value) => config = config.with_period(value),
                Err(err) => warn!(%err, "keeping default statistics period"),
            }
        }
        if let Ok(hour) = std::env::var("HABIT_REMINDER_HOUR") {
            if let Ok(value) = hour.trim().parse::<u32>() {
                if value < 24 {
                    config.reminder_hour = value;
                }
            }
        }
        if let Ok(days) = std::env::var("HABIT_DISPLAY_DAYS") {
            if let Ok(value) = days.trim().parse::<usize>() {
                if value > 0 {
                    config.display_days = value;
                }
            }
        }
        debug!(?config, "configuration resolved");
        Ok(config)
    }

    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot = Some(path.into());
        self
    }

    pub fn with_timezone(mut self, zone: impl Into<String>) -> Self {
        self.timezone = zone.into();
        self
    }

    pub fn with_period(mut self, period: StatsPeriod) -> Self {
        self.period = period;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            snapshot: None,
            timezone: "UTC".to_string(),
            period: StatsPeriod::Week,
            reminder_hour: DEFAULT_REMINDER_HOUR,
            display_days: DEFAULT_DISPLAY_DAYS,
        }
    }
}

pub fn run(config: AppConfig) -> Result<()> {
    let report = build_report(&config, Utc::now())?;
    print!("{report}");
    Ok(())
}

/// Loads the configured snapshot and renders the full text report as of `now`.
pub fn build_report(config: &AppConfig, now: DateTime<Utc>) -> Result<String> {
    let started = Instant::now();
    let service = HabitService::builder()
        .timezone(config.timezone.clone())
        .reminder_hour(config.reminder_hour)
        .display_days(config.display_days)
        .build()
        .context("invalid habit engine configuration")?;

    let path = config
        .snapshot
        .as_ref()
        .context("no snapshot given; set HABIT_SNAPSHOT")?;
    let habits = snapshot::load_snapshot(path, service.zone())
        .with_context(|| format!("failed to load {}", path.display()))?;

    let report = render_report(&service, &habits, config.period, now)?;
    info!(
        habits = habits.len(),
        elapsed_ms = %started.elapsed().as_millis(),
        "report rendered"
    );
    Ok(report)
}

fn render_report(
    service: &HabitService,
    habits: &[Habit],
    period: StatsPeriod,
    now: DateTime<Utc>,
) -> Result<String> {
    let mut out = String::new();
    let today = service.today(now);
    let today_label = service
        .zone()
        .date_of(today)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| today.to_string());
    writeln!(out, "Habits as of {today_label} ({})", service.zone().name())?;

    for habit in habits {
        let progress = service.progress(habit, now);
        writeln!(
            out,
            "  #{} {:<24} {:>3.0}%  streak {:>3}  missed {:>3}  {}",
            habit.id,
            habit.name,
            progress.percent(),
            progress.longest_streak,
            progress.skipped_days,
            strip(service, &service.day_cells(habit, now)),
        )?;
    }

    let stats = service.aggregate(habits, period, now);
    writeln!(out, "{period}: {} habits", stats.total_habits)?;
    writeln!(out, "  average completion {:.0}%", stats.rounded_average())?;
    writeln!(out, "  longest streak     {}", stats.longest_streak)?;
    writeln!(out, "  missed days        {}", stats.missed_days)?;
    writeln!(out, "  completed days     {}/{}", stats.completed_days, stats.total_days)?;

    if let Some(reminder) = service.schedule_reminder(habits, now) {
        writeln!(
            out,
            "Next reminder {}: {}",
            reminder.scheduled_for.with_timezone(&service.zone().tz()).format("%Y-%m-%d %H:%M"),
            reminder.body
        )?;
    }
    Ok(out)
}

/// One glyph per displayed day: `x` done, `-` skipped, `.` open, today bracketed.
fn strip(service: &HabitService, cells: &[DayCell]) -> String {
    let mut glyphs = String::with_capacity(cells.len() + 2);
    for cell in cells {
        let glyph = match cell.effective {
            DayStatus::Completed => 'x',
            DayStatus::Skipped => '-',
            DayStatus::Unrecorded => '.',
        };
        if cell.is_today {
            glyphs.push('[');
            glyphs.push(glyph);
            glyphs.push(']');
        } else {
            glyphs.push(glyph);
        }
    }
    if cells.len() < service.display_days() {
        glyphs.push('|');
    }
    glyphs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::{tempdir, TempDir};

    // Created 2025-01-01 UTC, done on 01-01 and 01-02, deadline 01-05.
    fn floss_snapshot() -> (TempDir, PathBuf) {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("habits.json");
        std::fs::write(
            &path,
            r#"[{"id":3,"name":"Floss","timestamp":1735689600000,"deadline":1736035200000,
                "dailyStatus":{"1735689600000":true,"1735776000000":true}}]"#,
        )
        .expect("write fixture");
        (temp, path)
    }

    #[test]
    fn renders_report_for_snapshot() {
        let (_temp, path) = floss_snapshot();
        let config = AppConfig::default().with_snapshot(&path);
        let now = Utc.with_ymd_and_hms(2025, 1, 3, 12, 0, 0).unwrap();
        let report = build_report(&config, now).unwrap();

        assert!(report.starts_with("Habits as of 2025-01-03 (UTC)"));
        assert!(report.contains("Floss"));
        assert!(report.contains(" 67%"));
        assert!(report.contains("[.]..|"));
        assert!(report.contains("Week: 1 habits"));
        assert!(report.contains("longest streak     2"));
        assert!(report.contains("Next reminder 2025-01-04 09:00"));
    }

    #[test]
    fn snapshot_directory_is_removed_with_its_guard() {
        let (temp, path) = floss_snapshot();
        let dir = temp.path().to_path_buf();
        assert!(path.exists());
        drop(temp);
        assert!(!dir.exists());
    }

    #[test]
    fn configured_period_heads_the_summary() {
        let (_temp, path) = floss_snapshot();
        let config = AppConfig::default()
            .with_snapshot(&path)
            .with_period(StatsPeriod::Custom(3));
        let now = Utc.with_ymd_and_hms(2025, 1, 3, 12, 0, 0).unwrap();
        let report = build_report(&config, now).unwrap();

        assert!(report.contains("3 days: 1 habits"));
        assert!(!report.contains("Week:"));
    }

    #[test]
    fn missing_snapshot_is_reported() {
        let err = build_report(&AppConfig::default(), Utc::now()).unwrap_err();
        assert!(err.to_string().contains("HABIT_SNAPSHOT"));
    }

    #[test]
    fn bad_timezone_fails_before_loading() {
        let config = AppConfig::default()
            .with_snapshot("/unused.json")
            .with_timezone("Atlantis/Capital");
        let err = build_report(&config, Utc::now()).unwrap_err();
        assert!(format!("{err:#}").contains("Atlantis/Capital"));
    }
}
