//! Shared handle around one [`TimerEngine`] and its collaborators.
//!
//! The controller owns the tick schedule, forwards every state change to
//! subscribed observers and performs the async stop-and-save. Clones share
//! the same engine, so a full timer view and a mini widget can hold one each.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::engine::{CompletedWork, TimerEngine, TimerSnapshot};
use super::schedule::TimerMode;
use crate::error::{DatabaseError, SchedulerError, TimerError};
use crate::events::{Event, NotificationKind};
use crate::ports::{CancelHandle, Notifier, Scheduler, SessionStore, TaskTimeStore, TickCallback};
use crate::session::PomodoroSessionRecord;

type Observer = Arc<dyn Fn(&Event) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub tick_interval: Duration,
    /// Record Work phases that run down to zero, not only explicit saves.
    pub save_on_completion: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            save_on_completion: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Result of [`TimerController::stop_and_save`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    /// Record written for the interrupted Work phase, if any.
    pub record: Option<PomodoroSessionRecord>,
    /// Task total after adding this record's time.
    pub task_time_secs: Option<u64>,
    /// Queued completed-phase records written along the way.
    pub flushed_completed: usize,
}

#[derive(Clone)]
pub struct TimerController {
    inner: Arc<Inner>,
}

struct Inner {
    engine: Mutex<TimerEngine>,
    sessions: Arc<dyn SessionStore>,
    tasks: Arc<dyn TaskTimeStore>,
    notifier: Arc<dyn Notifier>,
    scheduler: Arc<dyn Scheduler>,
    options: ControllerOptions,
    ticker: Mutex<Option<CancelHandle>>,
    saving: AtomicBool,
    completed_queue: Mutex<Vec<PomodoroSessionRecord>>,
    /// Held while queued records are written, so flushes run one at a time.
    queue_writer: tokio::sync::Mutex<()>,
    observers: Mutex<Vec<(SubscriptionId, Observer)>>,
    next_subscription: AtomicU64,
}

struct SaveGuard<'a>(&'a AtomicBool);

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl TimerController {
    pub fn new(
        engine: TimerEngine,
        sessions: Arc<dyn SessionStore>,
        tasks: Arc<dyn TaskTimeStore>,
        notifier: Arc<dyn Notifier>,
        scheduler: Arc<dyn Scheduler>,
        options: ControllerOptions,
    ) -> Self {
        let controller = Self {
            inner: Arc::new(Inner {
                engine: Mutex::new(engine),
                sessions,
                tasks,
                notifier,
                scheduler,
                options,
                ticker: Mutex::new(None),
                saving: AtomicBool::new(false),
                completed_queue: Mutex::new(Vec::new()),
                queue_writer: tokio::sync::Mutex::new(()),
                observers: Mutex::new(Vec::new()),
                next_subscription: AtomicU64::new(1),
            }),
        };
        // A restored engine may still be marked running.
        let running = controller.inner.lock_engine().is_running();
        if running {
            let epoch = controller.inner.lock_engine().epoch();
            if let Err(err) = controller.inner.arm_ticker(epoch) {
                warn!(error = %err, "could not resume ticking restored timer");
                controller.apply(|engine| engine.pause());
            }
        }
        controller
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn snapshot(&self) -> TimerSnapshot {
        self.inner.lock_engine().snapshot()
    }

    /// Copy of the engine, e.g. to persist it between runs.
    pub fn engine(&self) -> TimerEngine {
        self.inner.lock_engine().clone()
    }

    pub fn is_saving(&self) -> bool {
        self.inner.saving.load(Ordering::Acquire)
    }

    pub fn pending_completed(&self) -> usize {
        self.inner.lock_queue().len()
    }

    // ── Observers ────────────────────────────────────────────────────

    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.inner.lock_observers().push((id, Arc::new(observer)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.inner.lock_observers();
        let before = observers.len();
        observers.retain(|(sid, _)| *sid != id);
        observers.len() != before
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start or resume the countdown and arm the tick schedule.
    ///
    /// If the scheduler refuses, the timer is stopped again with its state
    /// intact and the failure is returned.
    pub fn start(&self) -> Result<Option<Event>, TimerError> {
        let mut engine = self.inner.lock_engine();
        let Some(event) = engine.start() else {
            return Ok(None);
        };
        if let Err(err) = self.inner.arm_ticker(engine.epoch()) {
            engine.pause();
            drop(engine);
            error!(error = %err, "timer stopped: tick scheduling failed");
            return Err(TimerError::Scheduler(err));
        }
        drop(engine);
        self.inner.publish(&event);
        Ok(Some(event))
    }

    pub fn pause(&self) -> Option<Event> {
        self.apply(|engine| engine.pause())
    }

    pub fn reset(&self) -> Event {
        self.apply(|engine| Some(engine.reset()))
            .unwrap_or_else(|| self.inner.lock_engine().state_event())
    }

    pub fn skip(&self, target: Option<TimerMode>) -> Event {
        self.apply(|engine| Some(engine.skip(target)))
            .unwrap_or_else(|| self.inner.lock_engine().state_event())
    }

    pub fn set_current_task(&self, task_id: Option<String>, task_title: Option<String>) -> Event {
        self.apply(|engine| Some(engine.set_current_task(task_id, task_title)))
            .unwrap_or_else(|| self.inner.lock_engine().state_event())
    }

    /// Catch up with wall-clock time now instead of waiting for the next
    /// scheduled wake-up.
    pub fn tick_now(&self) -> Option<Event> {
        self.apply(|engine| engine.tick())
    }

    /// Stop the timer and persist the unsaved Work time of the bound task.
    ///
    /// Nothing is written when no task is bound or less than a second has
    /// elapsed. If the record write fails the elapsed time stays in the
    /// engine for a retry. Once the record is written the elapsed time is
    /// cleared, so a failure adding it to the task is reported as
    /// [`TimerError::TaskTimeUpdate`] and retried with [`Self::add_task_time`].
    ///
    /// Only a second concurrent `stop_and_save` is rejected; a background
    /// flush of completed sessions is waited for.
    pub async fn stop_and_save(&self) -> Result<SaveOutcome, TimerError> {
        let _guard = self.inner.begin_save()?;
        self.apply(|engine| engine.pause());

        let flushed_completed = self.inner.write_completed_queue().await?;

        let pending = self.inner.lock_engine().pending_record();
        let Some(record) = pending else {
            debug!("stop without save: no task bound or no elapsed work");
            return Ok(SaveOutcome {
                flushed_completed,
                ..SaveOutcome::default()
            });
        };

        let record_id = self.inner.create_record(&record).await?;
        self.inner.lock_engine().mark_saved(record.duration_secs);
        let task_time_secs = self.inner.credit_task(&record_id, &record).await?;

        Ok(SaveOutcome {
            record: Some(record),
            task_time_secs,
            flushed_completed,
        })
    }

    /// Write queued completed-phase records without stopping the timer.
    ///
    /// Waits for a flush already in progress instead of failing.
    pub async fn flush_completed(&self) -> Result<usize, TimerError> {
        self.inner.write_completed_queue().await
    }

    /// Read-then-add `secs` to a task's time spent. Returns the new total.
    pub async fn add_task_time(&self, task_id: &str, secs: u64) -> Result<u64, DatabaseError> {
        self.inner.add_task_time(task_id, secs).await
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Run one engine command, stop ticking if it left the timer stopped,
    /// and fan out the resulting event.
    fn apply(&self, op: impl FnOnce(&mut TimerEngine) -> Option<Event>) -> Option<Event> {
        let (event, completed) = {
            let mut engine = self.inner.lock_engine();
            let event = op(&mut engine)?;
            if !engine.is_running() {
                self.inner.disarm_ticker();
            }
            (event, engine.take_completed_work())
        };
        self.inner.on_completed(&event, completed);
        self.inner.publish(&event);
        Some(event)
    }
}

impl Inner {
    fn lock_engine(&self) -> MutexGuard<'_, TimerEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_queue(&self) -> MutexGuard<'_, Vec<PomodoroSessionRecord>> {
        self.completed_queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_observers(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Observer)>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_save(&self) -> Result<SaveGuard<'_>, TimerError> {
        self.saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| TimerError::ConcurrentSaveRejected)?;
        Ok(SaveGuard(&self.saving))
    }

    fn arm_ticker(self: &Arc<Self>, epoch: u64) -> Result<(), SchedulerError> {
        let weak: Weak<Inner> = Arc::downgrade(self);
        let callback: TickCallback = Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_tick(epoch);
            }
        });
        let mut ticker = self.ticker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = ticker.take() {
            self.scheduler.cancel(old);
        }
        *ticker = Some(
            self.scheduler
                .schedule_tick(callback, self.options.tick_interval)?,
        );
        Ok(())
    }

    fn disarm_ticker(&self) {
        let handle = self
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            self.scheduler.cancel(handle);
        }
    }

    fn on_tick(self: &Arc<Self>, epoch: u64) {
        let mut events = Vec::with_capacity(2);
        let completed = {
            let mut engine = self.lock_engine();
            if engine.epoch() != epoch || !engine.is_running() {
                debug!(armed = epoch, current = engine.epoch(), "dropping stale wake-up");
                return;
            }
            let completed = match engine.tick_for(epoch) {
                Some(event) => {
                    self.disarm_ticker();
                    events.push(event);
                    engine.take_completed_work()
                }
                None => None,
            };
            events.push(engine.state_event());
            completed
        };

        if let Some(event) = events.first() {
            self.on_completed(event, completed);
        }
        let queued = !self.lock_queue().is_empty();
        // Without a runtime the queue waits for the next stop_and_save.
        if let (true, Ok(runtime)) = (queued, tokio::runtime::Handle::try_current()) {
            let inner = Arc::clone(self);
            runtime.spawn(async move {
                if let Err(err) = inner.write_completed_queue().await {
                    warn!(error = %err, "completed session left queued");
                }
            });
        }
        for event in &events {
            self.publish(event);
        }
    }

    /// Notification and optional recording for a finished phase.
    fn on_completed(&self, event: &Event, completed: Option<CompletedWork>) {
        let Event::PhaseCompleted { mode, .. } = event else {
            return;
        };
        if let Err(err) = self.notifier.notify(NotificationKind::PhaseCompleted, *mode) {
            debug!(error = %err, "notification failed");
        }
        if !self.options.save_on_completion {
            return;
        }
        if let Some(record) = completed.and_then(CompletedWork::into_record) {
            debug!(record_id = %record.id, "queued completed work session");
            self.lock_queue().push(record);
        }
    }

    fn publish(&self, event: &Event) {
        let observers: Vec<Observer> = self
            .lock_observers()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer(event);
        }
    }

    /// Write queued records in order. On failure every record not yet
    /// written goes back to the front of the queue.
    async fn write_completed_queue(&self) -> Result<usize, TimerError> {
        let _writer = self.queue_writer.lock().await;
        let pending = std::mem::take(&mut *self.lock_queue());
        let mut written = 0;
        let mut iter = pending.into_iter();
        while let Some(record) = iter.next() {
            let record_id = match self.create_record(&record).await {
                Ok(record_id) => record_id,
                Err(err) => {
                    self.requeue(std::iter::once(record).chain(iter));
                    return Err(err);
                }
            };
            written += 1;
            if let Err(err) = self.credit_task(&record_id, &record).await {
                self.requeue(iter);
                return Err(err);
            }
        }
        Ok(written)
    }

    fn requeue(&self, records: impl IntoIterator<Item = PomodoroSessionRecord>) {
        let mut queue = self.lock_queue();
        let mut front: Vec<_> = records.into_iter().collect();
        if front.is_empty() {
            return;
        }
        debug!(count = front.len(), "requeued completed sessions");
        front.append(&mut queue);
        *queue = front;
    }

    async fn create_record(&self, record: &PomodoroSessionRecord) -> Result<String, TimerError> {
        match self.sessions.create_session_record(record).await {
            Ok(record_id) => {
                info!(
                    %record_id,
                    task_id = record.task_id.as_deref().unwrap_or_default(),
                    duration_secs = record.duration_secs,
                    completed = record.completed,
                    "session saved"
                );
                let at = self.lock_engine().clock().now();
                self.publish(&Event::SessionSaved {
                    record_id: record_id.clone(),
                    task_id: record.task_id.clone(),
                    duration_secs: record.duration_secs,
                    completed: record.completed,
                    at,
                });
                Ok(record_id)
            }
            Err(err) => {
                warn!(error = %err, "session record write failed");
                Err(TimerError::Persistence(err))
            }
        }
    }

    async fn credit_task(
        &self,
        record_id: &str,
        record: &PomodoroSessionRecord,
    ) -> Result<Option<u64>, TimerError> {
        let Some(task_id) = record.task_id.as_deref() else {
            return Ok(None);
        };
        match self.add_task_time(task_id, record.duration_secs).await {
            Ok(total) => Ok(Some(total)),
            Err(source) => {
                warn!(error = %source, %task_id, "task time update failed");
                Err(TimerError::TaskTimeUpdate {
                    record_id: record_id.to_string(),
                    task_id: task_id.to_string(),
                    seconds: record.duration_secs,
                    source,
                })
            }
        }
    }

    async fn add_task_time(&self, task_id: &str, secs: u64) -> Result<u64, DatabaseError> {
        let current = self.tasks.get_task_time_spent(task_id).await?;
        let total = current.saturating_add(secs);
        self.tasks.set_task_time_spent(task_id, total).await?;
        Ok(total)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let handle = self
            .ticker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            self.scheduler.cancel(handle);
        }
    }
}
