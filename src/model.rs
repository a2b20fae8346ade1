use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, stable identity of one content item. Ordered so that batch
/// processing stays deterministic regardless of map iteration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One content item in a batch. Items are read-only for the duration of a
/// resolution pass; the engine never mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// True for a thread's originating post.
    #[serde(default)]
    pub is_root: bool,
    /// Outgoing reply edges, in the item's own declared order. May contain
    /// cycles or ids that are not part of the batch.
    #[serde(default)]
    pub replies_to: Vec<ItemId>,
}

impl Item {
    pub fn new(id: ItemId) -> Self {
        Item {
            id,
            is_root: false,
            replies_to: Vec::new(),
        }
    }

    pub fn root(id: ItemId) -> Self {
        Item {
            id,
            is_root: true,
            replies_to: Vec::new(),
        }
    }

    pub fn reply(id: ItemId, replies_to: Vec<ItemId>) -> Self {
        Item {
            id,
            is_root: false,
            replies_to,
        }
    }
}

/// A content filter already matched against an item upstream. Matching itself
/// (keyword/regex evaluation) happens outside this engine; only the matched
/// filter's intent reaches us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFilter {
    pub enabled: bool,
    /// Drop the item entirely.
    #[serde(default)]
    pub remove: bool,
    /// Hide the item behind a stub.
    #[serde(default)]
    pub stub: bool,
    /// Propagate the disposition down the reply chain.
    #[serde(default)]
    pub apply_to_replies: bool,
}

/// A persisted (or freshly synthesized) hide/remove fact for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HideRecord {
    pub item_id: ItemId,
    /// true = hide behind a stub, false = remove entirely.
    pub only_hide: bool,
    /// Lets the record affect a root item when processing a catalog.
    #[serde(default)]
    pub apply_to_whole_thread: bool,
    /// Propagate the disposition down the reply chain.
    #[serde(default)]
    pub apply_to_replies: bool,
    /// The user explicitly undid an automatic hide/remove. The engine never
    /// supersedes such a record.
    #[serde(default)]
    pub manually_restored: bool,
}

/// Final visibility outcome for one item. Variant order is severity order,
/// so `Remove > Hide > Leave` holds under the derived `Ord`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    Leave,
    Hide,
    Remove,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Leave => write!(f, "leave"),
            Disposition::Hide => write!(f, "hide"),
            Disposition::Remove => write!(f, "remove"),
        }
    }
}

/// Whether the batch is a flat list of root items (catalog) or a threaded
/// conversation (root plus replies).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionContext {
    Catalog,
    Thread,
}

impl CollectionContext {
    pub fn is_catalog(self) -> bool {
        matches!(self, CollectionContext::Catalog)
    }
}

/// Incremental progress of one resolution pass, emitted per processed item in
/// catalog context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub context: CollectionContext,
    pub processed: usize,
    pub total: usize,
    /// Items in the batch with a matched filter.
    pub matched_filters: usize,
    /// Items in the batch with a pre-existing hide record.
    pub hide_records: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_severity_order() {
        assert!(Disposition::Leave < Disposition::Hide);
        assert!(Disposition::Hide < Disposition::Remove);
        assert_eq!(
            Disposition::Remove,
            Disposition::Hide.max(Disposition::Remove)
        );
    }

    #[test]
    fn test_item_id_is_ordered_and_displays() {
        let mut ids = vec![ItemId(3), ItemId(1), ItemId(2)];
        ids.sort();
        assert_eq!(ids, vec![ItemId(1), ItemId(2), ItemId(3)]);
        assert_eq!(ItemId(42).to_string(), "#42");
    }
}
