//! # Covey Pomodoro Core Library
//!
//! Core logic for the Pomodoro timer of a Covey-style productivity app
//! (quadrants, roles, big rocks). The library is consumed by UI layers and by
//! the standalone `covey-pomodoro` CLI; every presentation of the timer, full
//! view or mini widget, drives the same engine.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine that requires the caller
//!   to periodically invoke `tick()` for progress updates
//! - **Timer Controller**: Shared handle that arms ticks through a `Scheduler`,
//!   fans out events to observers and persists Work time
//! - **Ports**: Traits for the session store, task-time accumulator,
//!   notification sink and scheduler
//! - **Storage**: SQLite and in-memory adapters, TOML-based configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerController`]: Scheduling, observers and stop-and-save
//! - [`Database`]: Session, task and statistics persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod notify;
pub mod ports;
pub mod scheduler;
pub mod session;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, NotifyError, SchedulerError, TimerError};
pub use events::{Event, NotificationKind};
pub use notify::LogNotifier;
pub use ports::{CancelHandle, Notifier, Scheduler, SessionStore, TaskTimeStore, TickCallback};
pub use scheduler::{ManualScheduler, TokioScheduler};
pub use session::{PomodoroSessionRecord, Stats, Task};
pub use storage::{Config, Database, MemoryStore};
pub use timer::{
    Clock, CompletedWork, ControllerOptions, ManualClock, PhaseDurations, SaveOutcome,
    SubscriptionId, SystemClock, TimerController, TimerEngine, TimerMode, TimerSnapshot,
};
