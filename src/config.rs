//! Batch description files for the CLI: the items of one collection plus the
//! matched filters and pre-existing hide records to seed the store with.

use crate::model::{CollectionContext, ContentFilter, HideRecord, Item, ItemId};
use crate::store::MemoryRuleStore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedFilter {
    pub item: ItemId,
    pub filter: ContentFilter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFile {
    pub context: CollectionContext,
    pub items: Vec<Item>,
    #[serde(default)]
    pub filters: Vec<MatchedFilter>,
    #[serde(default)]
    pub hide_records: Vec<HideRecord>,
}

impl Default for BatchFile {
    fn default() -> Self {
        // A small threaded conversation: the root matched a stub filter that
        // propagates, so its replies end up hidden as well.
        BatchFile {
            context: CollectionContext::Thread,
            items: vec![
                Item::root(ItemId(100)),
                Item::reply(ItemId(101), vec![ItemId(100)]),
                Item::reply(ItemId(102), vec![ItemId(101)]),
                Item::new(ItemId(103)),
            ],
            filters: vec![MatchedFilter {
                item: ItemId(100),
                filter: ContentFilter {
                    enabled: true,
                    remove: false,
                    stub: true,
                    apply_to_replies: true,
                },
            }],
            hide_records: vec![],
        }
    }
}

impl BatchFile {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let batch: BatchFile = serde_yaml::from_str(&content)?;
        Ok(batch)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let mut content = String::from(
            "# post-sift batch description\n\
             # context: catalog (flat list of roots) or thread (replies resolve\n\
             # against their ancestors); filters listed here must be enabled.\n",
        );
        content.push_str(&serde_yaml::to_string(self)?);
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Structural validation. Fails on duplicate item ids and disabled
    /// filters; reply edges pointing outside the batch are legal (the engine
    /// ignores them) and are only reported as warnings.
    pub fn validate(&self) -> anyhow::Result<Vec<String>> {
        let mut seen: HashSet<ItemId> = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if !seen.insert(item.id) {
                anyhow::bail!("duplicate item id {}", item.id);
            }
        }

        for matched in &self.filters {
            if !matched.filter.enabled {
                anyhow::bail!(
                    "filter for {} is disabled; only enabled, matched filters belong in a batch",
                    matched.item
                );
            }
        }

        let mut warnings = Vec::new();
        for item in &self.items {
            for target in &item.replies_to {
                if !seen.contains(target) {
                    warnings.push(format!(
                        "item {} replies to {} which is not part of the batch",
                        item.id, target
                    ));
                }
            }
        }
        for matched in &self.filters {
            if !seen.contains(&matched.item) {
                warnings.push(format!(
                    "filter references {} which is not part of the batch",
                    matched.item
                ));
            }
        }
        for record in &self.hide_records {
            if !seen.contains(&record.item_id) {
                warnings.push(format!(
                    "hide record references {} which is not part of the batch",
                    record.item_id
                ));
            }
        }

        Ok(warnings)
    }

    /// Seeds an in-memory store with the batch's filters and records.
    pub fn seed(&self, store: &MemoryRuleStore) {
        for matched in &self.filters {
            store.insert_filter(matched.item, matched.filter);
        }
        for record in &self.hide_records {
            store.insert_hide_record(*record);
        }
    }
}
