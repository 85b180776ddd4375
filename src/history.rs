use std::sync::Arc;

use tracing::{debug, warn};

use crate::storage::{KeyValueStore, HISTORY_KEY};
use crate::types::HistoryItem;

/// Where an upsert landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// New id, prepended as most recent.
    Inserted,
    /// Existing id, overwritten at its current position.
    Replaced { index: usize },
}

/// Most-recent-first list of saved snapshots, keyed by content id.
///
/// The whole list is written back after every mutation. Persistence is best effort: read and
/// write failures are logged and the in-memory list stays authoritative.
pub struct HistoryStore {
    items: Vec<HistoryItem>,
    store: Arc<dyn KeyValueStore>,
}

impl HistoryStore {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let items = match store.get(HISTORY_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "failed to parse saved history; starting empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read saved history; starting empty");
                Vec::new()
            }
        };
        debug!(count = items.len(), "loaded history");
        Self { items, store }
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Upserts a copy of `item` by content id.
    pub fn save(&mut self, item: HistoryItem) -> SaveOutcome {
        let outcome = match self.items.iter().position(|h| h.id() == item.id()) {
            Some(index) => {
                self.items[index] = item;
                SaveOutcome::Replaced { index }
            }
            None => {
                self.items.insert(0, item);
                SaveOutcome::Inserted
            }
        };
        self.persist();
        outcome
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    fn persist(&self) {
        let raw = match serde_json::to_string(&self.items) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "failed to serialize history; skipping save");
                return;
            }
        };
        if let Err(e) = self.store.set(HISTORY_KEY, &raw) {
            warn!(error = %e, "failed to save history; skipping");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ForgeError, Result};
    use crate::storage::MemoryStore;
    use crate::types::{AdCopyVariation, AdCreative, CarouselCreative};

    fn creative(id: &str, title: &str) -> HistoryItem {
        HistoryItem::Single(AdCreative::from_variation(
            id.into(),
            AdCopyVariation {
                title: title.into(),
                subtitle: "s".into(),
                body: "b".into(),
                caption: "c".into(),
                background_prompt: "p".into(),
            },
            "data:image/png;base64,AAAA".into(),
        ))
    }

    fn carousel(id: &str) -> HistoryItem {
        HistoryItem::Carousel(CarouselCreative {
            id: id.into(),
            slides: vec![],
            caption: "cap".into(),
        })
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(ForgeError::Storage("disk on fire".into()))
        }
        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(ForgeError::Storage("disk on fire".into()))
        }
        fn remove(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn saving_same_id_twice_keeps_one_entry_with_latest_content() {
        let mut history = HistoryStore::load(MemoryStore::shared());
        assert_eq!(history.save(creative("x", "first")), SaveOutcome::Inserted);
        assert_eq!(
            history.save(creative("x", "second")),
            SaveOutcome::Replaced { index: 0 }
        );

        assert_eq!(history.len(), 1);
        match history.get("x") {
            Some(HistoryItem::Single(c)) => assert_eq!(c.title, "second"),
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[test]
    fn new_items_prepend_and_updates_keep_position() {
        let mut history = HistoryStore::load(MemoryStore::shared());
        history.save(creative("a", "a"));
        history.save(carousel("b"));
        history.save(creative("c", "c"));
        let ids: Vec<_> = history.items().iter().map(|h| h.id().to_string()).collect();
        assert_eq!(ids, ["c", "b", "a"]);

        assert_eq!(
            history.save(creative("a", "updated")),
            SaveOutcome::Replaced { index: 2 }
        );
        let ids: Vec<_> = history.items().iter().map(|h| h.id().to_string()).collect();
        assert_eq!(ids, ["c", "b", "a"]);
    }

    #[test]
    fn persists_every_mutation_and_reloads() {
        let store = MemoryStore::shared();
        let mut history = HistoryStore::load(store.clone());
        history.save(creative("a", "a"));
        history.save(carousel("b"));

        let reloaded = HistoryStore::load(store.clone());
        assert_eq!(reloaded.items(), history.items());

        history.clear();
        assert!(HistoryStore::load(store).is_empty());
    }

    #[test]
    fn corrupt_blob_loads_as_empty() {
        let store = MemoryStore::shared();
        store.set(HISTORY_KEY, "{not json").unwrap();
        assert!(HistoryStore::load(store).is_empty());
    }

    #[test]
    fn storage_failures_are_swallowed() {
        let mut history = HistoryStore::load(Arc::new(FailingStore));
        history.save(creative("a", "a"));
        assert_eq!(history.len(), 1);
    }
}
