//! Persistent session counters.
//!
//! Tallies of completed work sessions, breaks and tasks survive daemon
//! restarts through a [`CounterStore`]. The in-memory values are the source
//! of truth for the running process: a failed write is logged and the count
//! still advances.

mod error;
mod store;

pub use error::StoreError;
pub use store::{CounterStore, JsonFileStore, MemoryStore, COUNTER_FILE_NAME};

use tracing::{debug, warn};

use crate::types::{CounterSnapshot, Phase};

/// Storage key for completed work sessions.
pub const WORK_SESSIONS_KEY: &str = "workSessions";

/// Storage key for completed breaks.
pub const BREAK_SESSIONS_KEY: &str = "breakSessions";

/// Storage key for completed tasks.
pub const COMPLETED_TASKS_KEY: &str = "completedTasks";

/// Session tallies backed by a [`CounterStore`].
pub struct SessionCounters {
    store: Box<dyn CounterStore>,
    snapshot: CounterSnapshot,
}

impl SessionCounters {
    /// Loads the current values from `store`. Unreadable keys start at 0.
    pub fn load(store: Box<dyn CounterStore>) -> Self {
        let read = |key: &str| match store.load(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("{} ({}は0から開始します)", e, key);
                0
            }
        };

        let snapshot = CounterSnapshot {
            work_sessions: read(WORK_SESSIONS_KEY),
            break_sessions: read(BREAK_SESSIONS_KEY),
            completed_tasks: read(COMPLETED_TASKS_KEY),
        };
        debug!("counters loaded: {:?}", snapshot);

        Self { store, snapshot }
    }

    /// Counters that live only in memory.
    pub fn in_memory() -> Self {
        Self::load(Box::new(MemoryStore::new()))
    }

    /// Counts a completed phase.
    pub fn record(&mut self, phase: Phase) {
        match phase {
            Phase::Work => self.increment_work(),
            Phase::Break => self.increment_break(),
        }
    }

    /// Counts a completed work session.
    pub fn increment_work(&mut self) {
        self.snapshot.work_sessions += 1;
        self.persist(WORK_SESSIONS_KEY, self.snapshot.work_sessions);
    }

    /// Counts a completed break.
    pub fn increment_break(&mut self) {
        self.snapshot.break_sessions += 1;
        self.persist(BREAK_SESSIONS_KEY, self.snapshot.break_sessions);
    }

    /// Counts a completed task.
    pub fn increment_task_completed(&mut self) {
        self.snapshot.completed_tasks += 1;
        self.persist(COMPLETED_TASKS_KEY, self.snapshot.completed_tasks);
    }

    /// Sets every counter back to 0.
    pub fn reset_all(&mut self) {
        self.snapshot = CounterSnapshot::default();
        for key in [WORK_SESSIONS_KEY, BREAK_SESSIONS_KEY, COMPLETED_TASKS_KEY] {
            self.persist(key, 0);
        }
    }

    /// Returns the current values.
    pub fn snapshot(&self) -> CounterSnapshot {
        self.snapshot
    }

    fn persist(&mut self, key: &str, value: u64) {
        if let Err(e) = self.store.store(key, value) {
            warn!("カウンターの保存に失敗しました: {}", e);
        }
    }
}

impl std::fmt::Debug for SessionCounters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCounters")
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Store whose writes always fail.
    struct ReadOnlyStore;

    impl CounterStore for ReadOnlyStore {
        fn load(&self, _key: &str) -> Result<u64, StoreError> {
            Ok(10)
        }

        fn store(&mut self, _key: &str, _value: u64) -> Result<(), StoreError> {
            Err(StoreError::NoHomeDirectory)
        }
    }

    #[test]
    fn test_load_existing_values() {
        let store = MemoryStore::with_values([
            (WORK_SESSIONS_KEY, 3),
            (BREAK_SESSIONS_KEY, 2),
            (COMPLETED_TASKS_KEY, 9),
        ]);

        let counters = SessionCounters::load(Box::new(store));

        assert_eq!(
            counters.snapshot(),
            CounterSnapshot {
                work_sessions: 3,
                break_sessions: 2,
                completed_tasks: 9,
            }
        );
    }

    #[test]
    fn test_record_by_phase() {
        let mut counters = SessionCounters::in_memory();

        counters.record(Phase::Work);
        counters.record(Phase::Work);
        counters.record(Phase::Break);

        assert_eq!(counters.snapshot().work_sessions, 2);
        assert_eq!(counters.snapshot().break_sessions, 1);
    }

    #[test]
    fn test_task_completed() {
        let mut counters = SessionCounters::in_memory();

        counters.increment_task_completed();

        assert_eq!(counters.snapshot().completed_tasks, 1);
    }

    #[test]
    fn test_reset_all() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(COUNTER_FILE_NAME);
        let mut counters = SessionCounters::load(Box::new(JsonFileStore::new(&path)));
        counters.increment_work();
        counters.increment_task_completed();

        counters.reset_all();

        assert_eq!(counters.snapshot(), CounterSnapshot::default());
        let reloaded = SessionCounters::load(Box::new(JsonFileStore::new(&path)));
        assert_eq!(reloaded.snapshot(), CounterSnapshot::default());
    }

    #[test]
    fn test_values_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(COUNTER_FILE_NAME);

        let mut counters = SessionCounters::load(Box::new(JsonFileStore::new(&path)));
        counters.increment_work();
        counters.increment_break();
        drop(counters);

        let reloaded = SessionCounters::load(Box::new(JsonFileStore::new(&path)));
        assert_eq!(reloaded.snapshot().work_sessions, 1);
        assert_eq!(reloaded.snapshot().break_sessions, 1);
    }

    #[test]
    fn test_write_failure_keeps_in_memory_count() {
        let mut counters = SessionCounters::load(Box::new(ReadOnlyStore));

        counters.increment_work();

        assert_eq!(counters.snapshot().work_sessions, 11);
    }
}
