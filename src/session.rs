//! One full resolution pass over a batch: classification, reply-chain
//! propagation, write-back of synthesized records, and pruning of removed
//! items.

use crate::classifier::{can_hide_item, can_remove_item};
use crate::error::ResolveError;
use crate::model::{
    CollectionContext, Disposition, HideRecord, Item, ItemId, ProgressEvent,
};
use crate::propagation::{propagate_into, synthesize_hide, SynthesizedHide};
use crate::store::{FilterLookup, HideRecordStore, ProgressNotifier};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Result of one resolution session.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionOutcome {
    /// Surviving items in input order. Items with a Remove disposition are
    /// pruned.
    pub items: Vec<Item>,
    /// Final disposition for every input item, pruned ones included, in input
    /// order.
    pub dispositions: IndexMap<ItemId, Disposition>,
    /// Items whose record was synthesized because of a filter match. The
    /// caller must re-evaluate/re-render these: propagation can change how an
    /// already rendered item should display.
    pub needs_reparse: HashSet<ItemId>,
    /// Records synthesized this session. Already persisted through the store;
    /// returned so callers can refresh in-memory caches.
    pub new_records: Vec<HideRecord>,
}

/// Resolves final visibility dispositions for batches of items against the
/// externally maintained filter and hide-record stores.
///
/// One `resolve` call is a synchronous computation over an in-memory snapshot;
/// only the initial record read and the final write-back touch the stores.
/// The engine does not serialize concurrent sessions: callers must run at most
/// one session per logical collection at a time, or the read-modify-write of
/// the record store can race.
pub struct HideResolver {
    filters: Arc<dyn FilterLookup>,
    hides: Arc<dyn HideRecordStore>,
    progress: Arc<dyn ProgressNotifier>,
}

impl HideResolver {
    pub fn new(
        filters: Arc<dyn FilterLookup>,
        hides: Arc<dyn HideRecordStore>,
        progress: Arc<dyn ProgressNotifier>,
    ) -> Self {
        HideResolver {
            filters,
            hides,
            progress,
        }
    }

    /// Runs one full resolution pass. Returns the pruned items with their
    /// sidecar disposition map; synthesized records are written back through
    /// the store before the result is returned. On write-back failure the
    /// computed result is discarded.
    pub async fn resolve(
        &self,
        context: CollectionContext,
        items: Vec<Item>,
    ) -> Result<ResolutionOutcome, ResolveError> {
        let ids: HashSet<ItemId> = items.iter().map(|item| item.id).collect();

        let filters = self
            .filters
            .matched_filters(&ids)
            .await
            .map_err(ResolveError::Lookup)?;
        let mut hides = self
            .hides
            .hide_records(&ids)
            .await
            .map_err(ResolveError::Lookup)?;

        log::debug!(
            "resolve({context:?}) start: {} items, {} matched filters, {} hide records",
            items.len(),
            filters.len(),
            hides.len()
        );

        let matched_filters = filters.len();
        let hide_records = hides.len();
        let total = items.len();

        let mut new_hides: IndexMap<ItemId, SynthesizedHide> = IndexMap::new();
        let mut dispositions: IndexMap<ItemId, Disposition> = IndexMap::with_capacity(total);

        // First pass: classify every item on its own filter and record.
        for (index, item) in items.iter().enumerate() {
            let filter = filters.get(&item.id);
            let record = hides.get(&item.id).copied();

            if let Some(filter) = filter {
                assert!(filter.enabled, "matched filter must be enabled");
            }

            let can_hide = can_hide_item(context, item, filter, record.as_ref());
            let can_remove = can_remove_item(context, item, filter, record.as_ref());

            let disposition = if can_remove {
                Disposition::Remove
            } else if can_hide {
                Disposition::Hide
            } else {
                Disposition::Leave
            };

            if let Some(filter) = filter {
                if (can_hide || can_remove) && record.is_none() {
                    synthesize_hide(
                        item.id,
                        true,
                        !can_remove,
                        filter.apply_to_replies,
                        &mut hides,
                        &mut new_hides,
                    );
                }
            }

            dispositions.insert(item.id, disposition);

            if context.is_catalog() {
                self.progress.notify(ProgressEvent {
                    context,
                    processed: index + 1,
                    total,
                    matched_filters,
                    hide_records,
                });
            }
        }

        // Second pass: walk the reply chains. Catalogs have no reply edges,
        // so the pass only runs for threads.
        if !context.is_catalog() {
            let items_by_id: HashMap<ItemId, &Item> =
                items.iter().map(|item| (item.id, item)).collect();
            let mut visited: HashSet<ItemId> = HashSet::with_capacity(64);

            for item in &items {
                propagate_into(
                    item,
                    &mut dispositions,
                    &mut hides,
                    &mut new_hides,
                    &items_by_id,
                    &filters,
                    &mut visited,
                );
            }
        }

        let new_records: Vec<HideRecord> =
            new_hides.values().map(|synthesized| synthesized.record).collect();
        let mut needs_reparse: HashSet<ItemId> = HashSet::new();

        if !new_records.is_empty() {
            self.hides
                .put_hide_records(&new_records)
                .await
                .map_err(ResolveError::WriteBack)?;

            needs_reparse = new_hides
                .values()
                .filter(|synthesized| synthesized.created_by_filter)
                .map(|synthesized| synthesized.record.item_id)
                .collect();
        }

        let mut hidden_count = 0usize;
        let mut removed_count = 0usize;
        let mut normal_count = 0usize;
        for disposition in dispositions.values() {
            match disposition {
                Disposition::Hide => hidden_count += 1,
                Disposition::Remove => removed_count += 1,
                Disposition::Leave => normal_count += 1,
            }
        }

        log::debug!(
            "resolve({context:?}) end (hidden={hidden_count}, removed={removed_count}, \
             normal={normal_count}, total={total}, synthesized={})",
            new_records.len()
        );

        let mut items = items;
        items.retain(|item| dispositions.get(&item.id) != Some(&Disposition::Remove));

        if cfg!(debug_assertions) {
            for item in &items {
                if dispositions.get(&item.id) == Some(&Disposition::Remove) {
                    return Err(ResolveError::InvariantViolation(item.id));
                }
            }
        }

        Ok(ResolutionOutcome {
            items,
            dispositions,
            needs_reparse,
            new_records,
        })
    }
}
