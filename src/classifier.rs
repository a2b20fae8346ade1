//! Disposition classification for a single item: its matched filter (if any)
//! and persisted hide record (if any) against the root-protection rules.
//! Pure functions, no side effects.

use crate::model::{CollectionContext, ContentFilter, Disposition, HideRecord, Item};

/// Whether this item should be removed (dropped entirely).
///
/// Filters may remove anything, including root items in both contexts. Hide
/// records are subject to root protection: in a catalog a root item is only
/// removable when the record says `apply_to_whole_thread`; in a thread a
/// record can never remove the root.
pub fn can_remove_item(
    context: CollectionContext,
    item: &Item,
    filter: Option<&ContentFilter>,
    record: Option<&HideRecord>,
) -> bool {
    if filter.is_none() && record.is_none() {
        return false;
    }

    if record.is_some_and(|r| r.manually_restored) {
        return false;
    }

    if let Some(filter) = filter {
        if filter.enabled && filter.remove {
            return true;
        }
    }

    if let Some(record) = record {
        if item.is_root {
            if context.is_catalog() {
                if !record.apply_to_whole_thread {
                    return false;
                }
            } else {
                return false;
            }
        }

        if !record.only_hide {
            return true;
        }
    }

    false
}

/// Whether this item should be hidden behind a stub. Same root protection as
/// [`can_remove_item`], with the record's `only_hide` flag inverted.
pub fn can_hide_item(
    context: CollectionContext,
    item: &Item,
    filter: Option<&ContentFilter>,
    record: Option<&HideRecord>,
) -> bool {
    if filter.is_none() && record.is_none() {
        return false;
    }

    if record.is_some_and(|r| r.manually_restored) {
        return false;
    }

    if let Some(filter) = filter {
        if filter.enabled && filter.stub {
            return true;
        }
    }

    if let Some(record) = record {
        if item.is_root {
            if context.is_catalog() {
                if !record.apply_to_whole_thread {
                    return false;
                }
            } else {
                return false;
            }
        }

        if record.only_hide {
            return true;
        }
    }

    false
}

/// Final pass-1 disposition for one item. Remove outranks Hide outranks Leave.
pub fn classify(
    context: CollectionContext,
    item: &Item,
    filter: Option<&ContentFilter>,
    record: Option<&HideRecord>,
) -> Disposition {
    if can_remove_item(context, item, filter, record) {
        Disposition::Remove
    } else if can_hide_item(context, item, filter, record) {
        Disposition::Hide
    } else {
        Disposition::Leave
    }
}
