//! Tick schedulers.
//!
//! [`TokioScheduler`] spawns one interval task per armed handle and aborts it
//! on cancel. [`ManualScheduler`] delivers wake-ups only when its owner calls
//! [`ManualScheduler::fire`], for hosts with their own frame loop and for
//! tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::SchedulerError;
use crate::ports::{CancelHandle, Scheduler, TickCallback};

pub struct TokioScheduler {
    runtime: Handle,
    next_id: AtomicU64,
    tickers: Mutex<HashMap<u64, JoinHandle<()>>>,
}

impl TokioScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            next_id: AtomicU64::new(1),
            tickers: Mutex::new(HashMap::new()),
        }
    }

    /// Use the runtime the caller is running on.
    pub fn current() -> Result<Self, SchedulerError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| SchedulerError::NoRuntime)
    }

    pub fn active_count(&self) -> usize {
        self.tickers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_tick(
        &self,
        callback: TickCallback,
        interval: Duration,
    ) -> Result<CancelHandle, SchedulerError> {
        if interval.is_zero() {
            return Err(SchedulerError::Other("tick interval must be positive".into()));
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let task = self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                callback();
            }
        });
        self.tickers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, task);
        debug!(handle = id, ?interval, "tick scheduled");
        Ok(CancelHandle(id))
    }

    fn cancel(&self, handle: CancelHandle) {
        let task = self
            .tickers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle.0);
        if let Some(task) = task {
            task.abort();
            debug!(handle = handle.0, "tick cancelled");
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        let tickers = self.tickers.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, task) in tickers.drain() {
            task.abort();
        }
    }
}

#[derive(Default)]
struct ManualState {
    next_id: u64,
    live: Vec<(u64, TickCallback)>,
    cancelled: Vec<(u64, TickCallback)>,
}

/// Scheduler whose wake-ups are delivered by hand.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one wake-up to every live handle. Returns how many fired.
    pub fn fire(&self) -> usize {
        let callbacks: Vec<TickCallback> = self
            .lock()
            .live
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        // Callbacks may re-enter the scheduler, so run them unlocked.
        for cb in &callbacks {
            cb();
        }
        callbacks.len()
    }

    /// Deliver a wake-up to handles that were already cancelled, as a host
    /// with a late timer queue would.
    pub fn fire_cancelled(&self) -> usize {
        let callbacks: Vec<TickCallback> = self
            .lock()
            .cancelled
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for cb in &callbacks {
            cb();
        }
        callbacks.len()
    }

    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_tick(
        &self,
        callback: TickCallback,
        _interval: Duration,
    ) -> Result<CancelHandle, SchedulerError> {
        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.live.push((id, callback));
        Ok(CancelHandle(id))
    }

    fn cancel(&self, handle: CancelHandle) {
        let mut state = self.lock();
        if let Some(pos) = state.live.iter().position(|(id, _)| *id == handle.0) {
            let entry = state.live.remove(pos);
            state.cancelled.push(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, TickCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let cb: TickCallback = Arc::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (count, cb)
    }

    #[test]
    fn manual_scheduler_fires_until_cancelled() {
        let scheduler = ManualScheduler::new();
        let (count, cb) = counter();
        let handle = scheduler.schedule_tick(cb, Duration::from_secs(1)).unwrap();

        assert_eq!(scheduler.fire(), 1);
        assert_eq!(scheduler.fire(), 1);
        scheduler.cancel(handle);
        assert_eq!(scheduler.fire(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 2);

        assert_eq!(scheduler.fire_cancelled(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_scheduler_ticks_and_stops_on_cancel() {
        let scheduler = TokioScheduler::current().unwrap();
        let (count, cb) = counter();
        let handle = scheduler.schedule_tick(cb, Duration::from_secs(1)).unwrap();
        assert_eq!(scheduler.active_count(), 1);

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        let fired = count.load(Ordering::SeqCst);
        assert!(fired >= 2, "expected ticks, got {fired}");

        scheduler.cancel(handle);
        assert_eq!(scheduler.active_count(), 0);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), fired);
    }

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let scheduler = TokioScheduler::current().unwrap();
        let (_, cb) = counter();
        assert!(scheduler.schedule_tick(cb, Duration::ZERO).is_err());
    }

    #[test]
    fn tokio_scheduler_needs_a_runtime() {
        assert!(matches!(
            TokioScheduler::current(),
            Err(SchedulerError::NoRuntime)
        ));
    }
}
