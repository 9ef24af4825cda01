//! In-Memory Entity Store
//!
//! DashMap-backed implementation of [`EntityStore`]. Reads are lock-free per
//! shard; a commit writes the whole change set and advances the cursor under
//! one writer lock so readers never observe a half-applied event.
//!
//! ## Persistence
//!
//! The full store serializes to a single bincode snapshot. [`MemoryStore::persist_to`]
//! writes it to a temporary file and renames it into place, so a crash while
//! persisting keeps the previous snapshot intact.

use crate::bar::Bar;
use crate::error::StoreError;
use crate::history::History;
use crate::traits::{ChangeSet, EntityStore, Snapshot};
use crate::user::User;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use types::{Address, EventPosition};

const SNAPSHOT_FILE: &str = "bar_state.bin";

/// Store counters for logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub commits: u64,
    pub users: usize,
    pub history_buckets: usize,
}

#[derive(Serialize, Deserialize)]
struct StoreSnapshot {
    bars: Vec<Bar>,
    users: Vec<User>,
    histories: Vec<History>,
    cursor: Option<EventPosition>,
    commits: u64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    bars: DashMap<Address, Bar>,
    users: DashMap<Address, User>,
    histories: DashMap<u64, History>,
    cursor: RwLock<Option<EventPosition>>,
    commits: Mutex<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            commits: *self.commits.lock(),
            users: self.users.len(),
            history_buckets: self.histories.len(),
        }
    }

    /// All holder records, ordered by address
    pub fn users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().map(|e| e.value().clone()).collect();
        users.sort_by_key(|u| u.id);
        users
    }

    /// All History buckets, ordered by day
    pub fn histories(&self) -> Vec<History> {
        let mut histories: Vec<History> =
            self.histories.iter().map(|e| e.value().clone()).collect();
        histories.sort_by_key(|h| h.id);
        histories
    }

    pub fn snapshot_path(dir: &Path) -> PathBuf {
        dir.join(SNAPSHOT_FILE)
    }

    /// Write a snapshot into `dir`, replacing any previous one
    pub fn persist_to(&self, dir: &Path) -> Result<(), StoreError> {
        std::fs::create_dir_all(dir)?;

        let bytes = self.snapshot()?;
        let target = Self::snapshot_path(dir);
        let tmp = target.with_extension("bin.tmp");

        std::fs::write(&tmp, &bytes)?;
        std::fs::rename(&tmp, &target)?;

        debug!("Persisted {} bytes to {:?}", bytes.len(), target);
        Ok(())
    }

    /// Load the snapshot in `dir`; an empty store if none exists
    pub fn load_from(dir: &Path) -> Result<Self, StoreError> {
        let store = Self::new();
        let path = Self::snapshot_path(dir);

        if !path.exists() {
            info!("No snapshot at {:?}, starting empty", path);
            return Ok(store);
        }

        let bytes = std::fs::read(&path)?;
        store.restore(&bytes)?;

        let stats = store.stats();
        info!(
            "Restored snapshot from {:?}: {} users, {} history buckets, cursor {:?}",
            path,
            stats.users,
            stats.history_buckets,
            *store.cursor.read()
        );
        Ok(store)
    }
}

impl EntityStore for MemoryStore {
    fn load_bar(&self, id: &Address) -> Result<Option<Bar>, StoreError> {
        Ok(self.bars.get(id).map(|e| e.value().clone()))
    }

    fn load_user(&self, id: &Address) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(id).map(|e| e.value().clone()))
    }

    fn load_history(&self, day: u64) -> Result<Option<History>, StoreError> {
        Ok(self.histories.get(&day).map(|e| e.value().clone()))
    }

    fn cursor(&self) -> Result<Option<EventPosition>, StoreError> {
        Ok(*self.cursor.read())
    }

    fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        let mut cursor = self.cursor.write();

        let ChangeSet {
            bar,
            users,
            history,
            position,
        } = changes;

        debug!(
            "Committing event {}: {} users, history {}",
            position,
            users.len(),
            history.is_some()
        );

        self.bars.insert(bar.id, bar);
        for user in users {
            self.users.insert(user.id, user);
        }
        if let Some(history) = history {
            self.histories.insert(history.id, history);
        }

        *cursor = Some(position);
        *self.commits.lock() += 1;
        Ok(())
    }
}

impl Snapshot for MemoryStore {
    type Error = StoreError;

    fn snapshot(&self) -> Result<Vec<u8>, StoreError> {
        let cursor = self.cursor.read();

        let data = StoreSnapshot {
            bars: self.bars.iter().map(|e| e.value().clone()).collect(),
            users: self.users(),
            histories: self.histories(),
            cursor: *cursor,
            commits: *self.commits.lock(),
        };

        Ok(bincode::serialize(&data)?)
    }

    fn restore(&self, snapshot: &[u8]) -> Result<(), StoreError> {
        let data: StoreSnapshot = bincode::deserialize(snapshot)?;
        let mut cursor = self.cursor.write();

        self.bars.clear();
        self.users.clear();
        self.histories.clear();

        for bar in data.bars {
            self.bars.insert(bar.id, bar);
        }
        for user in data.users {
            self.users.insert(user.id, user);
        }
        for history in data.histories {
            self.histories.insert(history.id, history);
        }

        *cursor = data.cursor;
        *self.commits.lock() = data.commits;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::TokenMetadata;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn change_set(block: u64) -> ChangeSet {
        let bar_id = Address([0xBA; 20]);
        let metadata = TokenMetadata {
            decimals: 18,
            name: "UNN Bar".to_string(),
            symbol: "xUNN".to_string(),
        };
        let mut user = User::new(Address([1u8; 20]), 86_400);
        user.record_mint(bar_id, dec!(5), dec!(5), 86_400).unwrap();

        ChangeSet {
            bar: Bar::new(bar_id, metadata, 86_400),
            users: vec![user],
            history: Some(History::for_timestamp(86_400)),
            position: EventPosition::new(block, 0),
        }
    }

    #[test]
    fn test_commit_applies_everything() {
        let store = MemoryStore::new();
        assert_eq!(store.cursor().unwrap(), None);

        store.commit(change_set(7)).unwrap();

        assert!(store.load_bar(&Address([0xBA; 20])).unwrap().is_some());
        let user = store.load_user(&Address([1u8; 20])).unwrap().unwrap();
        assert_eq!(user.xunn, dec!(5));
        assert!(store.load_history(1).unwrap().is_some());
        assert!(store.load_history(2).unwrap().is_none());
        assert_eq!(store.cursor().unwrap(), Some(EventPosition::new(7, 0)));

        let stats = store.stats();
        assert_eq!(stats.commits, 1);
        assert_eq!(stats.users, 1);
        assert_eq!(stats.history_buckets, 1);
    }

    #[test]
    fn test_snapshot_restore() {
        let store = MemoryStore::new();
        store.commit(change_set(3)).unwrap();
        let bytes = store.snapshot().unwrap();

        let restored = MemoryStore::new();
        restored.restore(&bytes).unwrap();

        assert_eq!(restored.users(), store.users());
        assert_eq!(restored.histories(), store.histories());
        assert_eq!(restored.cursor().unwrap(), Some(EventPosition::new(3, 0)));
        assert_eq!(restored.stats(), store.stats());
    }

    #[test]
    fn test_persist_and_load() {
        let dir = tempdir().unwrap();

        let empty = MemoryStore::load_from(dir.path()).unwrap();
        assert_eq!(empty.stats(), StoreStats::default());

        let store = MemoryStore::new();
        store.commit(change_set(9)).unwrap();
        store.persist_to(dir.path()).unwrap();

        let loaded = MemoryStore::load_from(dir.path()).unwrap();
        assert_eq!(loaded.users(), store.users());
        assert_eq!(loaded.cursor().unwrap(), Some(EventPosition::new(9, 0)));
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let store = MemoryStore::new();
        let err = store.restore(&[0xFF, 0x01]).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
