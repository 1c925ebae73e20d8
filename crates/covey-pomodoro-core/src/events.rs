use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{TimerMode, TimerSnapshot};

/// Every state change of the timer produces an Event.
/// UI observers subscribe to them through the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        time_left_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: TimerMode,
        time_left_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: TimerMode,
        at: DateTime<Utc>,
    },
    TimerSkipped {
        from: TimerMode,
        to: TimerMode,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero and the engine moved to the next phase.
    PhaseCompleted {
        mode: TimerMode,
        next_mode: TimerMode,
        completed_work_sessions: u32,
        at: DateTime<Utc>,
    },
    TaskChanged {
        task_id: Option<String>,
        task_title: Option<String>,
        at: DateTime<Utc>,
    },
    SessionSaved {
        record_id: String,
        task_id: Option<String>,
        duration_secs: u64,
        completed: bool,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        #[serde(flatten)]
        snapshot: TimerSnapshot,
        at: DateTime<Utc>,
    },
}

/// What a notification sink is asked to announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PhaseCompleted,
}
