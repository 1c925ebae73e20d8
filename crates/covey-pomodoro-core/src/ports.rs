//! Collaborators the timer controller talks to.
//!
//! Storage ports are async because the hosted backend is remote; the SQLite
//! and in-memory adapters in [`crate::storage`] answer immediately.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{DatabaseError, NotifyError, SchedulerError};
use crate::events::NotificationKind;
use crate::session::PomodoroSessionRecord;
use crate::timer::TimerMode;

/// Where saved Work intervals go.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist `record` and return its id.
    async fn create_session_record(
        &self,
        record: &PomodoroSessionRecord,
    ) -> Result<String, DatabaseError>;
}

/// Cumulative time-spent counter per task, used as a read-then-add pair.
#[async_trait]
pub trait TaskTimeStore: Send + Sync {
    async fn get_task_time_spent(&self, task_id: &str) -> Result<u64, DatabaseError>;

    async fn set_task_time_spent(&self, task_id: &str, secs: u64) -> Result<(), DatabaseError>;
}

/// Fire-and-forget user notifications (sound, toast, bell).
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotificationKind, mode: TimerMode) -> Result<(), NotifyError>;
}

/// Callback invoked on every scheduled wake-up.
pub type TickCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Identifies one armed periodic wake-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CancelHandle(pub u64);

/// Periodic wake-up source driving `tick()`.
pub trait Scheduler: Send + Sync {
    fn schedule_tick(
        &self,
        callback: TickCallback,
        interval: Duration,
    ) -> Result<CancelHandle, SchedulerError>;

    /// Cancel a wake-up. Unknown or already cancelled handles are ignored.
    fn cancel(&self, handle: CancelHandle);
}
