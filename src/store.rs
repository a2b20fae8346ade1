//! Collaborator contracts consumed by the resolution session, plus the
//! in-memory implementation used by the CLI and tests. Durable persistence
//! lives behind these traits; the engine never touches a schema of its own.

use crate::model::{ContentFilter, HideRecord, ItemId, ProgressEvent};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Read-only source of filters that already matched upstream.
#[async_trait]
pub trait FilterLookup: Send + Sync {
    /// Returns the matched filter for every id that has one. Every returned
    /// filter must be enabled.
    async fn matched_filters(&self, ids: &HashSet<ItemId>) -> Result<HashMap<ItemId, ContentFilter>>;
}

/// Persisted hide/remove records, with a bulk upsert surface for records the
/// session synthesizes.
#[async_trait]
pub trait HideRecordStore: Send + Sync {
    async fn hide_records(&self, ids: &HashSet<ItemId>) -> Result<HashMap<ItemId, HideRecord>>;

    /// Bulk upsert. Must be effectively atomic with respect to subsequent
    /// lookups.
    async fn put_hide_records(&self, records: &[HideRecord]) -> Result<()>;
}

/// Fire-and-forget progress sink. Never affects correctness.
pub trait ProgressNotifier: Send + Sync {
    fn notify(&self, event: ProgressEvent);
}

/// Notifier for contexts that do not track progress (threaded resolution).
pub struct NoopProgress;

impl ProgressNotifier for NoopProgress {
    fn notify(&self, _event: ProgressEvent) {}
}

/// In-memory rule store backing the CLI, the debug binary, and tests.
#[derive(Default)]
pub struct MemoryRuleStore {
    filters: Mutex<HashMap<ItemId, ContentFilter>>,
    hides: Mutex<HashMap<ItemId, HideRecord>>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_filter(&self, id: ItemId, filter: ContentFilter) {
        self.filters.lock().unwrap().insert(id, filter);
    }

    pub fn insert_hide_record(&self, record: HideRecord) {
        self.hides.lock().unwrap().insert(record.item_id, record);
    }

    pub fn hide_record_count(&self) -> usize {
        self.hides.lock().unwrap().len()
    }

    pub fn hide_record(&self, id: ItemId) -> Option<HideRecord> {
        self.hides.lock().unwrap().get(&id).copied()
    }
}

#[async_trait]
impl FilterLookup for MemoryRuleStore {
    async fn matched_filters(&self, ids: &HashSet<ItemId>) -> Result<HashMap<ItemId, ContentFilter>> {
        let filters = self.filters.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| filters.get(id).map(|f| (*id, *f)))
            .filter(|(_, f)| f.enabled)
            .collect())
    }
}

#[async_trait]
impl HideRecordStore for MemoryRuleStore {
    async fn hide_records(&self, ids: &HashSet<ItemId>) -> Result<HashMap<ItemId, HideRecord>> {
        let hides = self.hides.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| hides.get(id).map(|h| (*id, *h)))
            .collect())
    }

    async fn put_hide_records(&self, records: &[HideRecord]) -> Result<()> {
        let mut hides = self.hides.lock().unwrap();
        for record in records {
            hides.insert(record.item_id, *record);
        }
        Ok(())
    }
}
