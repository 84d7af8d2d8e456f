//! Collaborator seams: entity snapshots in, timetables out.
//!
//! The engine reads a consistent [`EntitySnapshot`] per key and writes
//! whole [`Timetable`]s back. Persistence itself belongs to the caller;
//! the in-memory implementations here back tests and embedded use.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{Result, TimetableError};
use crate::models::{EntitySnapshot, Timetable, TimetableKey};

/// Supplies the entities of one department/term.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Snapshot for `key`, consistent for the duration of one request.
    async fn snapshot(&self, key: &TimetableKey) -> Result<EntitySnapshot>;
}

/// Stores timetables by key.
#[async_trait]
pub trait TimetableStore: Send + Sync {
    /// Current timetable for `key`, if any.
    async fn get(&self, key: &TimetableKey) -> Result<Option<Timetable>>;

    /// Replaces the timetable stored under its key.
    async fn put(&self, timetable: Timetable) -> Result<()>;
}

/// Snapshot provider backed by a map.
#[derive(Debug, Default)]
pub struct InMemorySnapshotProvider {
    snapshots: RwLock<HashMap<TimetableKey, EntitySnapshot>>,
}

impl InMemorySnapshotProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a snapshot (builder style).
    pub fn with_snapshot(self, key: TimetableKey, snapshot: EntitySnapshot) -> Self {
        self.insert(key, snapshot);
        self
    }

    /// Inserts or replaces the snapshot for `key`.
    pub fn insert(&self, key: TimetableKey, snapshot: EntitySnapshot) {
        self.snapshots.write().insert(key, snapshot);
    }
}

#[async_trait]
impl SnapshotProvider for InMemorySnapshotProvider {
    async fn snapshot(&self, key: &TimetableKey) -> Result<EntitySnapshot> {
        self.snapshots
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| TimetableError::NotFound(format!("snapshot for '{key}'")))
    }
}

/// Timetable store backed by a map. Counts writes so callers can tell
/// whether an operation persisted anything.
#[derive(Debug, Default)]
pub struct InMemoryTimetableStore {
    timetables: RwLock<HashMap<TimetableKey, Timetable>>,
    writes: RwLock<u64>,
}

impl InMemoryTimetableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `put` calls served.
    pub fn write_count(&self) -> u64 {
        *self.writes.read()
    }

    /// Number of stored timetables.
    pub fn len(&self) -> usize {
        self.timetables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.timetables.read().is_empty()
    }
}

#[async_trait]
impl TimetableStore for InMemoryTimetableStore {
    async fn get(&self, key: &TimetableKey) -> Result<Option<Timetable>> {
        Ok(self.timetables.read().get(key).cloned())
    }

    async fn put(&self, timetable: Timetable) -> Result<()> {
        self.timetables
            .write()
            .insert(timetable.key.clone(), timetable);
        *self.writes.write() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Subject;

    fn key() -> TimetableKey {
        TimetableKey::new("CSE", "2024-25", 5)
    }

    #[tokio::test]
    async fn test_snapshot_provider() {
        let provider = InMemorySnapshotProvider::new()
            .with_snapshot(key(), EntitySnapshot::new().with_subject(Subject::theory("S", "CSE")));
        let snap = provider.snapshot(&key()).await.unwrap();
        assert_eq!(snap.subjects.len(), 1);

        let other = TimetableKey::new("ECE", "2024-25", 5);
        assert!(matches!(
            provider.snapshot(&other).await,
            Err(TimetableError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_timetable_store() {
        let store = InMemoryTimetableStore::new();
        assert!(store.get(&key()).await.unwrap().is_none());

        store.put(Timetable::draft(key())).await.unwrap();
        let stored = store.get(&key()).await.unwrap().unwrap();
        assert_eq!(stored.key, key());
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.len(), 1);
    }
}
