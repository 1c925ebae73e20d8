//! Persisted records produced by the timer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One saved interval of Work time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroSessionRecord {
    pub id: String,
    pub task_id: Option<String>,
    /// Denormalized task label at save time.
    pub task_title: String,
    pub start_time: DateTime<Utc>,
    pub duration_secs: u64,
    /// True if the Work phase ran down to zero rather than being stopped early.
    pub completed: bool,
}

impl PomodoroSessionRecord {
    pub fn new(
        task_id: Option<String>,
        task_title: String,
        start_time: DateTime<Utc>,
        duration_secs: u64,
        completed: bool,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            task_id,
            task_title,
            start_time,
            duration_secs,
            completed,
        }
    }
}

/// A task row as the accumulator sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub time_spent_secs: u64,
}

/// Aggregates over saved sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub total_work_secs: u64,
    pub today_sessions: u64,
    pub today_work_secs: u64,
}
