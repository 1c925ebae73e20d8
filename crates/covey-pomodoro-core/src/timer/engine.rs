//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine. It does not use
//! internal threads - the caller (usually [`crate::TimerController`]) is
//! responsible for calling `tick()` periodically. Each tick folds the real
//! time elapsed since the previous one, so a delayed or suspended host loses
//! no time and counts none twice.
//!
//! ## Phase Transitions
//!
//! ```text
//! Work -> ShortBreak | LongBreak -> Work -> ...
//! ```
//!
//! Every n-th finished Work phase (n = `sessions_before_long_break`) is
//! followed by a long break.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(PhaseDurations::default());
//! engine.start();
//! // In a loop:
//! engine.tick(); // Returns Some(Event::PhaseCompleted) when the phase ends
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::clock::{system_clock, Clock};
use super::schedule::{PhaseDurations, TimerMode};
use crate::events::Event;
use crate::session::PomodoroSessionRecord;

/// Serializable view of the engine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub mode: TimerMode,
    pub time_left_secs: u64,
    pub duration_secs: u64,
    pub running: bool,
    pub completed_work_sessions: u32,
    pub current_session_elapsed_secs: u64,
    pub total_work_secs: u64,
    pub task_id: Option<String>,
    pub task_title: Option<String>,
}

/// A Work phase that ran down to zero, kept until the owner decides
/// whether to record it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedWork {
    pub task_id: Option<String>,
    pub task_title: Option<String>,
    pub elapsed_secs: u64,
    pub ended_at: DateTime<Utc>,
}

impl CompletedWork {
    /// Record for this phase, if it was bound to a task and did any work.
    pub fn into_record(self) -> Option<PomodoroSessionRecord> {
        let task_id = self.task_id?;
        if self.elapsed_secs == 0 {
            return None;
        }
        let start_time = self.ended_at - Duration::seconds(self.elapsed_secs as i64);
        Some(PomodoroSessionRecord::new(
            Some(task_id),
            self.task_title.unwrap_or_default(),
            start_time,
            self.elapsed_secs,
            true,
        ))
    }
}

/// Core timer engine.
///
/// Operates on wall-clock deltas -- no internal thread.
/// Time is kept in milliseconds; the second-valued accessors are views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    durations: PhaseDurations,
    mode: TimerMode,
    /// Remaining time in milliseconds for the current phase.
    remaining_ms: u64,
    running: bool,
    completed_work_sessions: u32,
    /// Work time accumulated since the phase was last started fresh, reset or saved.
    session_elapsed_ms: u64,
    /// All-time Work counter. Survives reset and skip.
    #[serde(default)]
    total_work_ms: u64,
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    task_title: Option<String>,
    /// Timestamp (ms since epoch) of the last tick while running.
    #[serde(default)]
    last_tick_epoch_ms: Option<u64>,
    /// Bumped whenever a running countdown is stopped or replaced. Ticks
    /// armed under an older epoch are ignored.
    #[serde(default)]
    epoch: u64,
    #[serde(default)]
    completed_work: Option<CompletedWork>,
    #[serde(skip, default = "system_clock")]
    clock: Arc<dyn Clock>,
}

impl TimerEngine {
    /// Create a new engine in Work mode, stopped, with a full countdown.
    pub fn new(durations: PhaseDurations) -> Self {
        Self::with_clock(durations, system_clock())
    }

    pub fn with_clock(durations: PhaseDurations, clock: Arc<dyn Clock>) -> Self {
        Self {
            durations,
            mode: TimerMode::Work,
            remaining_ms: durations.duration_ms(TimerMode::Work),
            running: false,
            completed_work_sessions: 0,
            session_elapsed_ms: 0,
            total_work_ms: 0,
            task_id: None,
            task_title: None,
            last_tick_epoch_ms: None,
            epoch: 0,
            completed_work: None,
            clock,
        }
    }

    /// Swap the clock, e.g. after deserializing a snapshot.
    pub fn set_clock(&mut self, clock: Arc<dyn Clock>) {
        self.clock = clock;
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    /// Whole seconds left, rounded up so a running timer never shows 0.
    pub fn time_left_secs(&self) -> u64 {
        self.remaining_ms.div_ceil(1000)
    }

    pub fn completed_work_sessions(&self) -> u32 {
        self.completed_work_sessions
    }

    pub fn current_session_elapsed_ms(&self) -> u64 {
        self.session_elapsed_ms
    }

    pub fn current_session_elapsed_secs(&self) -> u64 {
        self.session_elapsed_ms / 1000
    }

    pub fn total_work_secs(&self) -> u64 {
        self.total_work_ms / 1000
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn task_title(&self) -> Option<&str> {
        self.task_title.as_deref()
    }

    pub fn durations(&self) -> &PhaseDurations {
        &self.durations
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            mode: self.mode,
            time_left_secs: self.time_left_secs(),
            duration_secs: self.durations.duration_secs(self.mode),
            running: self.running,
            completed_work_sessions: self.completed_work_sessions,
            current_session_elapsed_secs: self.current_session_elapsed_secs(),
            total_work_secs: self.total_work_secs(),
            task_id: self.task_id.clone(),
            task_title: self.task_title.clone(),
        }
    }

    /// Build a full state snapshot event.
    pub fn state_event(&self) -> Event {
        Event::StateSnapshot {
            snapshot: self.snapshot(),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start or resume the countdown. No-op when already running or when
    /// no time is left.
    pub fn start(&mut self) -> Option<Event> {
        if self.running {
            debug!(mode = %self.mode, "start ignored: already running");
            return None;
        }
        if self.remaining_ms == 0 {
            debug!(mode = %self.mode, "start ignored: no time left");
            return None;
        }
        self.running = true;
        self.last_tick_epoch_ms = Some(self.clock.now_ms());
        debug!(mode = %self.mode, remaining_ms = self.remaining_ms, "timer started");
        Some(Event::TimerStarted {
            mode: self.mode,
            time_left_secs: self.time_left_secs(),
            at: self.clock.now(),
        })
    }

    /// Stop the countdown, keeping the time elapsed up to now.
    ///
    /// Returns `PhaseCompleted` instead of `TimerPaused` if the folded time
    /// finishes the phase.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        if let Some(completed) = self.flush_elapsed() {
            return Some(completed);
        }
        self.halt();
        debug!(mode = %self.mode, remaining_ms = self.remaining_ms, "timer paused");
        Some(Event::TimerPaused {
            mode: self.mode,
            time_left_secs: self.time_left_secs(),
            at: self.clock.now(),
        })
    }

    /// Restart the current phase from its full duration.
    pub fn reset(&mut self) -> Event {
        self.halt();
        self.enter_mode(self.mode);
        debug!(mode = %self.mode, "timer reset");
        Event::TimerReset {
            mode: self.mode,
            at: self.clock.now(),
        }
    }

    /// Jump to `target`, or to the phase that would naturally come next.
    ///
    /// Never counts as a completed Work phase.
    pub fn skip(&mut self, target: Option<TimerMode>) -> Event {
        let from = self.mode;
        let to = target.unwrap_or_else(|| match from {
            TimerMode::Work => self
                .durations
                .break_after(self.completed_work_sessions.saturating_add(1)),
            TimerMode::ShortBreak | TimerMode::LongBreak => TimerMode::Work,
        });
        self.halt();
        self.enter_mode(to);
        debug!(%from, %to, "timer skipped");
        Event::TimerSkipped {
            from,
            to,
            at: self.clock.now(),
        }
    }

    /// Bind the timer to a task. Does not touch the countdown; unsaved
    /// elapsed time goes to whichever task is bound when it is saved.
    pub fn set_current_task(&mut self, task_id: Option<String>, task_title: Option<String>) -> Event {
        self.task_id = task_id;
        self.task_title = task_title;
        Event::TaskChanged {
            task_id: self.task_id.clone(),
            task_title: self.task_title.clone(),
            at: self.clock.now(),
        }
    }

    /// Call periodically. Returns `Some(Event::PhaseCompleted)` when the
    /// phase finishes.
    pub fn tick(&mut self) -> Option<Event> {
        self.tick_for(self.epoch)
    }

    /// Tick on behalf of a wake-up armed under `epoch`. Stale wake-ups from
    /// before a pause, reset, skip or completion do nothing.
    pub fn tick_for(&mut self, epoch: u64) -> Option<Event> {
        if epoch != self.epoch {
            debug!(stale = epoch, current = self.epoch, "ignoring stale tick");
            return None;
        }
        if !self.running {
            return None;
        }
        self.flush_elapsed()
    }

    /// Session record for the unsaved Work time, if a task is bound and at
    /// least one whole second has elapsed.
    pub fn pending_record(&self) -> Option<PomodoroSessionRecord> {
        let task_id = self.task_id.clone()?;
        let elapsed = self.current_session_elapsed_secs();
        if elapsed == 0 {
            return None;
        }
        let start_time = self.clock.now() - Duration::seconds(elapsed as i64);
        Some(PomodoroSessionRecord::new(
            Some(task_id),
            self.task_title.clone().unwrap_or_default(),
            start_time,
            elapsed,
            self.remaining_ms == 0,
        ))
    }

    /// Drop `secs` of elapsed time after it was persisted.
    pub fn mark_saved(&mut self, secs: u64) {
        self.session_elapsed_ms = self
            .session_elapsed_ms
            .saturating_sub(secs.saturating_mul(1000));
    }

    /// Take the Work phase that last ran to zero, if any.
    pub fn take_completed_work(&mut self) -> Option<CompletedWork> {
        self.completed_work.take()
    }

    pub fn set_durations(&mut self, durations: PhaseDurations) {
        self.durations = durations;
        self.halt();
        self.enter_mode(self.mode);
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn flush_elapsed(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        let last = self.last_tick_epoch_ms.unwrap_or(now);
        let elapsed = now.saturating_sub(last);
        self.last_tick_epoch_ms = Some(now);

        let consumed = elapsed.min(self.remaining_ms);
        self.remaining_ms -= consumed;
        if self.mode == TimerMode::Work {
            self.session_elapsed_ms = self.session_elapsed_ms.saturating_add(consumed);
            self.total_work_ms = self.total_work_ms.saturating_add(consumed);
        }

        if self.remaining_ms == 0 {
            Some(self.complete_phase())
        } else {
            None
        }
    }

    fn complete_phase(&mut self) -> Event {
        let finished = self.mode;
        let at = self.clock.now();
        self.halt();

        let next = match finished {
            TimerMode::Work => {
                self.completed_work_sessions = self.completed_work_sessions.saturating_add(1);
                self.completed_work = Some(CompletedWork {
                    task_id: self.task_id.clone(),
                    task_title: self.task_title.clone(),
                    elapsed_secs: self.current_session_elapsed_secs(),
                    ended_at: at,
                });
                self.durations.break_after(self.completed_work_sessions)
            }
            TimerMode::ShortBreak | TimerMode::LongBreak => TimerMode::Work,
        };
        self.enter_mode(next);

        info!(
            mode = %finished,
            next = %next,
            completed_work_sessions = self.completed_work_sessions,
            "phase completed"
        );
        Event::PhaseCompleted {
            mode: finished,
            next_mode: next,
            completed_work_sessions: self.completed_work_sessions,
            at,
        }
    }

    fn halt(&mut self) {
        self.running = false;
        self.last_tick_epoch_ms = None;
        self.epoch = self.epoch.wrapping_add(1);
    }

    fn enter_mode(&mut self, mode: TimerMode) {
        self.mode = mode;
        self.remaining_ms = self.durations.duration_ms(mode);
        self.session_elapsed_ms = 0;
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(PhaseDurations::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualClock;
    use proptest::prelude::*;

    fn engine_with(durations: PhaseDurations) -> (TimerEngine, ManualClock) {
        let clock = ManualClock::default();
        let engine = TimerEngine::with_clock(durations, Arc::new(clock.clone()));
        (engine, clock)
    }

    fn engine() -> (TimerEngine, ManualClock) {
        engine_with(PhaseDurations::default())
    }

    /// Run the current phase down to zero in one jump.
    fn finish_phase(engine: &mut TimerEngine, clock: &ManualClock) -> Event {
        engine.start();
        clock.advance_ms(engine.remaining_ms());
        engine.tick().expect("phase should complete")
    }

    #[test]
    fn initial_state() {
        let (engine, _) = engine();
        let snap = engine.snapshot();
        assert_eq!(snap.mode, TimerMode::Work);
        assert_eq!(snap.time_left_secs, 1500);
        assert!(!snap.running);
        assert_eq!(snap.completed_work_sessions, 0);
        assert_eq!(snap.current_session_elapsed_secs, 0);
    }

    #[test]
    fn start_pause_resume() {
        let (mut engine, clock) = engine();
        assert!(engine.start().is_some());
        assert!(engine.is_running());
        assert!(engine.start().is_none());

        clock.advance_secs(30);
        assert!(matches!(engine.pause(), Some(Event::TimerPaused { time_left_secs: 1470, .. })));
        assert!(!engine.is_running());
        assert_eq!(engine.current_session_elapsed_secs(), 30);

        // Time passing while paused is not counted.
        clock.advance_secs(100);
        assert!(engine.start().is_some());
        clock.advance_secs(10);
        engine.tick();
        assert_eq!(engine.time_left_secs(), 1460);
        assert_eq!(engine.current_session_elapsed_secs(), 40);
    }

    #[test]
    fn work_runs_down_to_short_break() {
        let (mut engine, clock) = engine();
        engine.start();
        for t in 1..=1500u64 {
            clock.advance_secs(1);
            let event = engine.tick();
            if t == 1499 {
                assert!(event.is_none());
                assert_eq!(engine.time_left_secs(), 1);
                assert!(engine.is_running());
            }
            if t == 1500 {
                assert!(matches!(
                    event,
                    Some(Event::PhaseCompleted {
                        mode: TimerMode::Work,
                        next_mode: TimerMode::ShortBreak,
                        completed_work_sessions: 1,
                        ..
                    })
                ));
            }
        }
        assert_eq!(engine.mode(), TimerMode::ShortBreak);
        assert_eq!(engine.time_left_secs(), 300);
        assert_eq!(engine.completed_work_sessions(), 1);
        assert!(!engine.is_running());
        assert_eq!(engine.current_session_elapsed_secs(), 0);
        assert_eq!(engine.total_work_secs(), 1500);
    }

    #[test]
    fn fourth_work_phase_leads_to_long_break() {
        let (mut engine, clock) = engine();
        for _ in 0..3 {
            finish_phase(&mut engine, &clock); // work
            finish_phase(&mut engine, &clock); // break
        }
        assert_eq!(engine.completed_work_sessions(), 3);
        assert_eq!(engine.mode(), TimerMode::Work);

        finish_phase(&mut engine, &clock);
        assert_eq!(engine.mode(), TimerMode::LongBreak);
        assert_eq!(engine.time_left_secs(), 900);
    }

    #[test]
    fn long_break_follows_every_nth_work_phase() {
        let (mut engine, clock) = engine();
        for n in 1..=12u32 {
            finish_phase(&mut engine, &clock);
            let expected = if n % 4 == 0 {
                TimerMode::LongBreak
            } else {
                TimerMode::ShortBreak
            };
            assert_eq!(engine.mode(), expected, "after work phase {n}");
            finish_phase(&mut engine, &clock);
            assert_eq!(engine.mode(), TimerMode::Work);
        }
    }

    #[test]
    fn large_gap_clamps_to_zero() {
        let (mut engine, clock) = engine_with(PhaseDurations {
            work_secs: 300,
            ..PhaseDurations::default()
        });
        engine.start();
        clock.advance_secs(600);
        let event = engine.tick();
        assert!(matches!(event, Some(Event::PhaseCompleted { .. })));
        assert_eq!(engine.total_work_secs(), 300);
        assert_eq!(engine.mode(), TimerMode::ShortBreak);
        assert_eq!(engine.time_left_secs(), 300);
    }

    #[test]
    fn pause_twice_is_idempotent() {
        let (mut engine, clock) = engine();
        engine.start();
        clock.advance_secs(5);
        engine.pause();
        let first = engine.snapshot();
        let epoch = engine.epoch();
        clock.advance_secs(5);
        assert!(engine.pause().is_none());
        assert_eq!(engine.snapshot(), first);
        assert_eq!(engine.epoch(), epoch);
    }

    #[test]
    fn stale_tick_after_reset_is_ignored() {
        let (mut engine, clock) = engine();
        engine.start();
        let armed = engine.epoch();
        clock.advance_secs(10);
        engine.tick_for(armed);
        engine.reset();
        let after_reset = engine.snapshot();

        clock.advance_secs(10);
        assert!(engine.tick_for(armed).is_none());
        assert!(engine.tick().is_none());
        assert_eq!(engine.snapshot(), after_reset);
        assert_eq!(after_reset.time_left_secs, 1500);
        assert_eq!(after_reset.current_session_elapsed_secs, 0);
    }

    #[test]
    fn stale_tick_after_restart_is_ignored() {
        let (mut engine, clock) = engine();
        engine.start();
        let armed = engine.epoch();
        engine.pause();
        engine.start();
        clock.advance_secs(10);
        assert!(engine.tick_for(armed).is_none());
        assert_eq!(engine.time_left_secs(), 1500);
        engine.tick();
        assert_eq!(engine.time_left_secs(), 1490);
    }

    #[test]
    fn reset_keeps_mode_and_count() {
        let (mut engine, clock) = engine();
        finish_phase(&mut engine, &clock);
        engine.start();
        clock.advance_secs(42);
        engine.tick();
        engine.reset();
        assert_eq!(engine.mode(), TimerMode::ShortBreak);
        assert_eq!(engine.completed_work_sessions(), 1);
        assert_eq!(engine.time_left_secs(), 300);
        assert!(!engine.is_running());
    }

    #[test]
    fn skip_toggles_without_counting() {
        let (mut engine, clock) = engine();
        engine.start();
        clock.advance_secs(100);
        engine.tick();

        let event = engine.skip(None);
        assert!(matches!(
            event,
            Event::TimerSkipped { from: TimerMode::Work, to: TimerMode::ShortBreak, .. }
        ));
        assert_eq!(engine.completed_work_sessions(), 0);
        assert_eq!(engine.current_session_elapsed_secs(), 0);
        assert_eq!(engine.time_left_secs(), 300);
        assert!(engine.take_completed_work().is_none());

        engine.skip(None);
        assert_eq!(engine.mode(), TimerMode::Work);
        assert_eq!(engine.time_left_secs(), 1500);
    }

    #[test]
    fn skip_picks_long_break_when_due() {
        let (mut engine, clock) = engine();
        for _ in 0..3 {
            finish_phase(&mut engine, &clock);
            engine.skip(None);
        }
        assert_eq!(engine.completed_work_sessions(), 3);
        engine.skip(None);
        assert_eq!(engine.mode(), TimerMode::LongBreak);
    }

    #[test]
    fn skip_to_explicit_target() {
        let (mut engine, _) = engine();
        engine.skip(Some(TimerMode::LongBreak));
        assert_eq!(engine.mode(), TimerMode::LongBreak);
        assert_eq!(engine.time_left_secs(), 900);
    }

    #[test]
    fn start_with_no_time_left_is_a_no_op() {
        let (mut engine, _) = engine_with(PhaseDurations {
            work_secs: 0,
            ..PhaseDurations::default()
        });
        assert!(engine.start().is_none());
        assert!(!engine.is_running());
    }

    #[test]
    fn break_time_is_not_work_time() {
        let (mut engine, clock) = engine();
        engine.skip(Some(TimerMode::ShortBreak));
        engine.start();
        clock.advance_secs(60);
        engine.tick();
        assert_eq!(engine.current_session_elapsed_secs(), 0);
        assert_eq!(engine.total_work_secs(), 0);
        assert_eq!(engine.time_left_secs(), 240);
    }

    #[test]
    fn pause_that_reaches_zero_completes_the_phase() {
        let (mut engine, clock) = engine();
        engine.start();
        clock.advance_secs(2000);
        assert!(matches!(engine.pause(), Some(Event::PhaseCompleted { .. })));
        assert_eq!(engine.mode(), TimerMode::ShortBreak);
        assert!(!engine.is_running());
    }

    #[test]
    fn pending_record_requires_task_and_elapsed_time() {
        let (mut engine, clock) = engine();
        engine.start();
        clock.advance_secs(10);
        engine.pause();
        assert!(engine.pending_record().is_none());

        engine.set_current_task(Some("t1".into()), Some("Weekly review".into()));
        let record = engine.pending_record().unwrap();
        assert_eq!(record.duration_secs, 10);
        assert_eq!(record.task_id.as_deref(), Some("t1"));
        assert_eq!(record.task_title, "Weekly review");
        assert!(!record.completed);
        assert_eq!(record.start_time, clock.now() - Duration::seconds(10));

        engine.mark_saved(record.duration_secs);
        assert!(engine.pending_record().is_none());
    }

    #[test]
    fn changing_task_keeps_countdown() {
        let (mut engine, clock) = engine();
        engine.start();
        clock.advance_secs(10);
        engine.tick();
        engine.set_current_task(Some("t2".into()), None);
        assert!(engine.is_running());
        assert_eq!(engine.current_session_elapsed_secs(), 10);
        assert_eq!(engine.time_left_secs(), 1490);
    }

    #[test]
    fn completed_work_is_kept_for_the_owner() {
        let (mut engine, clock) = engine();
        engine.set_current_task(Some("t1".into()), Some("Big rock".into()));
        finish_phase(&mut engine, &clock);

        let done = engine.take_completed_work().unwrap();
        assert_eq!(done.elapsed_secs, 1500);
        let record = done.into_record().unwrap();
        assert!(record.completed);
        assert_eq!(record.duration_secs, 1500);
        assert!(engine.take_completed_work().is_none());
    }

    #[test]
    fn snapshot_survives_serialization() {
        let (mut engine, clock) = engine();
        engine.set_current_task(Some("t1".into()), None);
        engine.start();
        clock.advance_secs(20);
        engine.pause();

        let json = serde_json::to_string(&engine).unwrap();
        let mut restored: TimerEngine = serde_json::from_str(&json).unwrap();
        restored.set_clock(Arc::new(clock.clone()));
        assert_eq!(restored.snapshot(), engine.snapshot());
    }

    #[test]
    fn set_durations_restarts_current_phase() {
        let (mut engine, clock) = engine();
        engine.start();
        clock.advance_secs(10);
        engine.tick();
        engine.set_durations(PhaseDurations {
            work_secs: 50 * 60,
            ..PhaseDurations::default()
        });
        assert!(!engine.is_running());
        assert_eq!(engine.time_left_secs(), 3000);
    }

    proptest! {
        #[test]
        fn work_time_is_conserved(deltas in prop::collection::vec(0u64..5_000, 1..200)) {
            let (mut engine, clock) = engine();
            engine.start();
            let total: u64 = deltas.iter().sum();
            for d in &deltas {
                clock.advance_ms(*d);
                engine.tick();
            }
            // 200 * 5s stays well under the 1500s Work phase.
            prop_assert_eq!(engine.current_session_elapsed_ms(), total);
            prop_assert_eq!(engine.remaining_ms(), 1_500_000 - total);
            prop_assert!(engine.is_running());
        }

        #[test]
        fn time_left_stays_in_bounds(deltas in prop::collection::vec(0u64..2_000_000, 1..50)) {
            let (mut engine, clock) = engine();
            for d in &deltas {
                engine.start();
                clock.advance_ms(*d);
                engine.tick();
                let max = engine.durations().duration_ms(engine.mode());
                prop_assert!(engine.remaining_ms() <= max);
                if engine.is_running() {
                    prop_assert!(engine.remaining_ms() > 0);
                }
            }
        }
    }
}
