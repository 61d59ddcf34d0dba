use tracing::{debug, warn};

use super::entry::ForestEntry;
use super::DEFAULT_HISTORY_KEY;
use crate::error::Result;
use crate::storage::KvStore;

/// Append-only, newest-first list of forest entries.
///
/// The whole list is written back under one key after every append.
pub struct HistoryStore<S: KvStore> {
    store: S,
    key: String,
    entries: Vec<ForestEntry>,
}

impl<S: KvStore> HistoryStore<S> {
    /// Load the history under the default key.
    pub fn load(store: S) -> Self {
        Self::load_with_key(store, DEFAULT_HISTORY_KEY)
    }

    /// Load the history under `key`. An absent, unreadable or malformed
    /// record yields an empty history.
    pub fn load_with_key(store: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let entries = match store.get(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<ForestEntry>>(&raw) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(%key, "discarding malformed forest history: {err}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(%key, "could not read forest history: {err}");
                Vec::new()
            }
        };
        debug!(%key, trees = entries.len(), "forest history loaded");
        Self {
            store,
            key,
            entries,
        }
    }

    pub fn entries(&self) -> &[ForestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Prepend `entry` and persist the full list.
    ///
    /// The entry stays in memory even when persisting fails.
    pub fn append(&mut self, entry: ForestEntry) -> Result<()> {
        self.entries.insert(0, entry);
        let json = serde_json::to_string(&self.entries)?;
        self.store.set(&self.key, &json)?;
        debug!(key = %self.key, trees = self.entries.len(), "forest history saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::to_datetime;
    use crate::error::{CoreError, DatabaseError};
    use crate::forest::TREE_MARKER;
    use crate::storage::MemoryStore;

    fn entry(id: i64) -> ForestEntry {
        ForestEntry {
            id,
            date: to_datetime(id as u64),
            tree: TREE_MARKER.into(),
            rotation: 0.0,
            scale: 1.0,
            top: None,
            left: None,
        }
    }

    struct BrokenStore;

    impl KvStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(CoreError::Database(DatabaseError::Locked))
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(CoreError::Database(DatabaseError::Locked))
        }
    }

    #[test]
    fn absent_history_is_empty() {
        let history = HistoryStore::load(MemoryStore::new());
        assert!(history.is_empty());
    }

    #[test]
    fn malformed_history_is_empty() {
        for raw in ["not json", "{\"id\": 1}", "null", "[{\"id\": \"x\"}]"] {
            let store = MemoryStore::with_value(DEFAULT_HISTORY_KEY, raw);
            assert!(HistoryStore::load(store).is_empty(), "payload {raw:?}");
        }
    }

    #[test]
    fn unreadable_store_is_empty() {
        assert!(HistoryStore::load(BrokenStore).is_empty());
    }

    #[test]
    fn append_prepends_and_persists() {
        let mut history = HistoryStore::load(MemoryStore::new());
        history.append(entry(1)).unwrap();
        history.append(entry(2)).unwrap();
        let ids: Vec<_> = history.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 1]);

        let raw = history.store().get(DEFAULT_HISTORY_KEY).unwrap().unwrap();
        let stored: Vec<ForestEntry> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, history.entries());
    }

    #[test]
    fn reload_returns_appended_entry() {
        let mut history = HistoryStore::load(MemoryStore::new());
        history.append(entry(1_700_000_000_000)).unwrap();
        let reloaded = HistoryStore::load(history.into_store());
        assert_eq!(reloaded.entries(), &[entry(1_700_000_000_000)]);
    }

    #[test]
    fn failed_persist_keeps_entry_in_memory() {
        let mut history = HistoryStore::load(BrokenStore);
        assert!(history.append(entry(1)).is_err());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn custom_key_is_isolated() {
        let mut history = HistoryStore::load_with_key(MemoryStore::new(), "other");
        history.append(entry(5)).unwrap();
        let store = history.into_store();
        assert!(store.get(DEFAULT_HISTORY_KEY).unwrap().is_none());
        assert_eq!(HistoryStore::load_with_key(store, "other").len(), 1);
    }
}
