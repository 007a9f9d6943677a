use std::path::PathBuf;

use thiserror::Error;

/// Failures at the edges of the engine. The calculators themselves never fail.
#[derive(Debug, Error)]
pub enum HabitError {
    #[error("unknown timezone `{0}`")]
    UnknownTimezone(String),

    #[error("reminder hour must be below 24, got {0}")]
    InvalidReminderHour(u32),

    #[error("unknown statistics period `{0}`")]
    InvalidPeriod(String),

    #[error("display window must contain at least one day")]
    EmptyDisplayWindow,

    #[error("unable to read snapshot at {path}: {source}")]
    SnapshotRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HabitError>;
