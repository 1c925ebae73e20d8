//! In-memory session and task-time stores.
//!
//! Useful for tests and for hosts that persist elsewhere. Writes can be made
//! to fail on demand to exercise retry paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::DatabaseError;
use crate::ports::{SessionStore, TaskTimeStore};
use crate::session::PomodoroSessionRecord;

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<PomodoroSessionRecord>>,
    task_time: Mutex<HashMap<String, u64>>,
    fail_sessions: AtomicBool,
    fail_task_updates: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<PomodoroSessionRecord> {
        lock(&self.records).clone()
    }

    pub fn task_time(&self, task_id: &str) -> u64 {
        lock(&self.task_time).get(task_id).copied().unwrap_or(0)
    }

    /// Seed a task's counter, e.g. as another device would have left it.
    pub fn set_task_time(&self, task_id: &str, secs: u64) {
        lock(&self.task_time).insert(task_id.to_string(), secs);
    }

    pub fn fail_session_writes(&self, fail: bool) {
        self.fail_sessions.store(fail, Ordering::SeqCst);
    }

    pub fn fail_task_updates(&self, fail: bool) {
        self.fail_task_updates.store(fail, Ordering::SeqCst);
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session_record(
        &self,
        record: &PomodoroSessionRecord,
    ) -> Result<String, DatabaseError> {
        if self.fail_sessions.load(Ordering::SeqCst) {
            return Err(DatabaseError::QueryFailed("session store unavailable".into()));
        }
        lock(&self.records).push(record.clone());
        Ok(record.id.clone())
    }
}

#[async_trait]
impl TaskTimeStore for MemoryStore {
    async fn get_task_time_spent(&self, task_id: &str) -> Result<u64, DatabaseError> {
        Ok(self.task_time(task_id))
    }

    async fn set_task_time_spent(&self, task_id: &str, secs: u64) -> Result<(), DatabaseError> {
        if self.fail_task_updates.load(Ordering::SeqCst) {
            return Err(DatabaseError::Locked);
        }
        self.set_task_time(task_id, secs);
        Ok(())
    }
}
