use std::sync::Arc;

use clap::{Subcommand, ValueEnum};
use covey_pomodoro_core::error::Result;
use covey_pomodoro_core::storage::Database;
use covey_pomodoro_core::{
    Config, Event, NotificationKind, Notifier, NotifyError, TimerController, TimerEngine,
    TimerError, TimerMode, TokioScheduler,
};
use tracing::{debug, warn};

use super::print_json;

const ENGINE_KEY: &str = "timer_engine";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start or resume the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Restart the current phase from its full duration
    Reset,
    /// Print current timer state as JSON
    Status,
    /// Stop and save the Work time of the bound task
    Stop,
    /// Jump to another phase without recording
    Skip {
        /// Phase to jump to (default: the natural next phase)
        #[arg(long, value_enum)]
        to: Option<SkipTarget>,
    },
    /// Bind the timer to a task (no flags unbinds)
    Task {
        /// Task ID
        #[arg(long)]
        id: Option<String>,
        /// Task title (default: the stored task's title)
        #[arg(long)]
        title: Option<String>,
    },
    /// Run the countdown in the foreground until the phase ends or Ctrl-C
    Watch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SkipTarget {
    Work,
    ShortBreak,
    LongBreak,
}

impl From<SkipTarget> for TimerMode {
    fn from(target: SkipTarget) -> Self {
        match target {
            SkipTarget::Work => TimerMode::Work,
            SkipTarget::ShortBreak => TimerMode::ShortBreak,
            SkipTarget::LongBreak => TimerMode::LongBreak,
        }
    }
}

/// Phase-end notice on stderr, with an optional terminal bell.
struct TerminalNotifier {
    enabled: bool,
    bell: bool,
}

impl Notifier for TerminalNotifier {
    fn notify(&self, kind: NotificationKind, mode: TimerMode) -> Result<(), NotifyError> {
        if !self.enabled {
            return Ok(());
        }
        let bell = if self.bell { "\x07" } else { "" };
        match kind {
            NotificationKind::PhaseCompleted => eprintln!("{bell}{mode} finished"),
        }
        Ok(())
    }
}

fn load_engine(db: &Database, config: &Config) -> TimerEngine {
    let durations = config.durations();
    let stored = match db.kv_get(ENGINE_KEY) {
        Ok(Some(json)) => match serde_json::from_str::<TimerEngine>(&json) {
            Ok(engine) => Some(engine),
            Err(e) => {
                warn!(error = %e, "discarding unreadable timer state");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "could not read timer state");
            None
        }
    };
    match stored {
        Some(mut engine) => {
            if engine.durations() != &durations && !engine.is_running() {
                debug!("config durations changed, restarting phase");
                engine.set_durations(durations);
            }
            engine
        }
        None => TimerEngine::new(durations),
    }
}

fn save_engine(db: &Database, engine: &TimerEngine) -> Result<()> {
    let json = serde_json::to_string(engine)?;
    db.kv_set(ENGINE_KEY, &json)?;
    Ok(())
}

pub async fn run(action: TimerAction, config: &Config) -> Result<()> {
    let db = Arc::new(Database::open()?);
    let engine = load_engine(&db, config);
    let controller = TimerController::new(
        engine,
        db.clone(),
        db.clone(),
        Arc::new(TerminalNotifier {
            enabled: config.notifications.enabled,
            bell: config.notifications.bell,
        }),
        Arc::new(TokioScheduler::current().map_err(TimerError::from)?),
        config.controller_options(),
    );

    let result = dispatch(&controller, &db, action).await;
    if controller.pending_completed() > 0 {
        if let Err(e) = controller.flush_completed().await {
            warn!(error = %e, "completed sessions not saved");
        }
    }
    save_engine(&db, &controller.engine())?;
    result
}

async fn dispatch(
    controller: &TimerController,
    db: &Database,
    action: TimerAction,
) -> Result<()> {
    match action {
        TimerAction::Start => match controller.start()? {
            Some(event) => print_json(&event)?,
            None => print_json(&controller.snapshot())?,
        },
        TimerAction::Pause => match controller.pause() {
            Some(event) => print_json(&event)?,
            None => print_json(&controller.snapshot())?,
        },
        TimerAction::Reset => print_json(&controller.reset())?,
        TimerAction::Skip { to } => print_json(&controller.skip(to.map(TimerMode::from)))?,
        TimerAction::Task { id, title } => {
            let title = match (&id, title) {
                (Some(id), None) => Some(db.require_task(id)?.title),
                (_, title) => title,
            };
            print_json(&controller.set_current_task(id, title))?
        }
        TimerAction::Status => {
            // Catch up with the time spent since the last invocation
            let completed = controller.tick_now();
            print_json(&controller.snapshot())?;
            if let Some(event) = completed {
                print_json(&event)?;
            }
        }
        TimerAction::Stop => stop(controller).await?,
        TimerAction::Watch => watch(controller).await?,
    }
    Ok(())
}

async fn stop(controller: &TimerController) -> Result<()> {
    match controller.stop_and_save().await {
        Ok(outcome) => print_json(&outcome),
        Err(TimerError::TaskTimeUpdate {
            record_id,
            task_id,
            seconds,
            source,
        }) => {
            warn!(error = %source, %record_id, "retrying task time update");
            let total = controller.add_task_time(&task_id, seconds).await?;
            print_json(&serde_json::json!({
                "record_id": record_id,
                "task_id": task_id,
                "task_time_secs": total,
            }))
        }
        Err(e) => Err(e.into()),
    }
}

async fn watch(controller: &TimerController) -> Result<()> {
    if !controller.snapshot().running && controller.start()?.is_none() {
        return Ok(());
    }

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Event>();
    let subscription = controller.subscribe(move |event| {
        let _ = tx.send(event.clone());
    });
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                if let Err(e) = serde_json::to_string(&event).map(|line| println!("{line}")) {
                    break Err(e.into());
                }
                if matches!(event, Event::PhaseCompleted { .. }) {
                    break Ok(());
                }
            }
            _ = &mut ctrl_c => {
                if let Some(event) = controller.pause() {
                    print_json(&event)?;
                }
                break Ok(());
            }
        }
    };
    controller.unsubscribe(subscription);
    result
}
