//! Reply-chain propagation: lets a hide/remove decision on an ancestor item
//! flow down to its replies when the rule that caused it asks for that.
//!
//! The reply graph may contain cycles and long chains reachable through many
//! paths, so the ancestor search carries an explicit visited set and never
//! relies on the call stack alone for termination.

use crate::model::{ContentFilter, Disposition, HideRecord, Item, ItemId};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// A hide record created during the current session, together with whether a
/// matched filter caused it. Filter-created records force the caller to
/// re-evaluate the affected item.
#[derive(Debug, Clone, Copy)]
pub struct SynthesizedHide {
    pub record: HideRecord,
    pub created_by_filter: bool,
}

/// Records a newly inferred hide/remove fact for `id`, unless the item already
/// received a record this session or is protected by a manual restore.
///
/// The record goes into both the session lookup map (so later items observe
/// it) and the synthesized map (for write-back after the passes complete).
pub(crate) fn synthesize_hide(
    id: ItemId,
    created_by_filter: bool,
    only_hide: bool,
    apply_to_replies: bool,
    hides: &mut HashMap<ItemId, HideRecord>,
    new_hides: &mut IndexMap<ItemId, SynthesizedHide>,
) {
    if new_hides.contains_key(&id) {
        return;
    }

    if hides.get(&id).is_some_and(|r| r.manually_restored) {
        return;
    }

    let record = HideRecord {
        item_id: id,
        only_hide,
        apply_to_whole_thread: false,
        apply_to_replies,
        manually_restored: false,
    };

    new_hides.insert(
        id,
        SynthesizedHide {
            record,
            created_by_filter,
        },
    );
    hides.insert(id, record);
}

/// Depth-first search for the first non-null hide record reachable from `id`
/// through reply edges, checking `id` itself first. `visited` guards against
/// cycles and against re-walking chains reachable through many paths.
pub(crate) fn find_ancestor_hide(
    id: ItemId,
    hides: &HashMap<ItemId, HideRecord>,
    new_hides: &IndexMap<ItemId, SynthesizedHide>,
    items_by_id: &HashMap<ItemId, &Item>,
    visited: &mut HashSet<ItemId>,
) -> Option<HideRecord> {
    if let Some(record) = hides.get(&id) {
        return Some(*record);
    }

    if let Some(synthesized) = new_hides.get(&id) {
        return Some(synthesized.record);
    }

    // Dangling edge: the id is outside the batch.
    let item = items_by_id.get(&id)?;

    visited.insert(id);

    for target in &item.replies_to {
        if visited.contains(target) {
            continue;
        }

        let found = find_ancestor_hide(*target, hides, new_hides, items_by_id, visited);
        if found.is_some() {
            return found;
        }
    }

    None
}

/// Pass-2 step for one item: if any of its reply targets leads to an ancestor
/// whose rule propagates to replies and whose own disposition is not Leave,
/// the item inherits that disposition and gets a synthesized record.
///
/// Reply targets are scanned in the item's declared order and the first
/// qualifying one wins; the scan does not look for the nearest or the most
/// severe ancestor.
#[allow(clippy::too_many_arguments)]
pub(crate) fn propagate_into(
    item: &Item,
    dispositions: &mut IndexMap<ItemId, Disposition>,
    hides: &mut HashMap<ItemId, HideRecord>,
    new_hides: &mut IndexMap<ItemId, SynthesizedHide>,
    items_by_id: &HashMap<ItemId, &Item>,
    filters: &HashMap<ItemId, ContentFilter>,
    visited: &mut HashSet<ItemId>,
) {
    match dispositions.get(&item.id) {
        // Already hidden or removed in pass 1 or by an earlier propagation.
        Some(disposition) if *disposition != Disposition::Leave => return,
        Some(_) => {}
        None => return,
    }

    if hides.get(&item.id).is_some_and(|r| r.manually_restored) {
        // Manually unhidden by the user, never auto-hide again.
        return;
    }

    for target in &item.replies_to {
        visited.clear();

        let found = find_ancestor_hide(*target, hides, new_hides, items_by_id, visited);

        let mut target_filter = filters.get(target);
        if target_filter.is_none() {
            if let Some(found) = &found {
                target_filter = filters.get(&found.item_id);
            }
        }

        let applies = target_filter.is_some_and(|f| f.apply_to_replies)
            || found.is_some_and(|r| r.apply_to_replies);
        if !applies {
            continue;
        }

        let target_disposition = match dispositions.get(target) {
            Some(disposition) => *disposition,
            None => continue,
        };

        if target_disposition == Disposition::Leave {
            continue;
        }

        let only_hide = target_disposition == Disposition::Hide;
        synthesize_hide(
            item.id,
            target_filter.is_some(),
            only_hide,
            true,
            hides,
            new_hides,
        );

        dispositions.insert(item.id, target_disposition);
        break;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hide_record(id: u64, apply_to_replies: bool) -> HideRecord {
        HideRecord {
            item_id: ItemId(id),
            only_hide: true,
            apply_to_whole_thread: false,
            apply_to_replies,
            manually_restored: false,
        }
    }

    fn by_id(items: &[Item]) -> HashMap<ItemId, &Item> {
        items.iter().map(|item| (item.id, item)).collect()
    }

    #[test]
    fn test_ancestor_search_terminates_on_cycle() {
        // 1 -> 2 -> 3 -> 1, no hide record anywhere.
        let items = vec![
            Item::reply(ItemId(1), vec![ItemId(2)]),
            Item::reply(ItemId(2), vec![ItemId(3)]),
            Item::reply(ItemId(3), vec![ItemId(1)]),
        ];
        let items_by_id = by_id(&items);
        let hides = HashMap::new();
        let new_hides = IndexMap::new();
        let mut visited = HashSet::new();

        let found = find_ancestor_hide(ItemId(1), &hides, &new_hides, &items_by_id, &mut visited);
        assert!(found.is_none());
    }

    #[test]
    fn test_ancestor_search_finds_record_behind_cycle() {
        // 1 -> 2 -> 1 and 2 -> 3, record on 3.
        let items = vec![
            Item::reply(ItemId(1), vec![ItemId(2)]),
            Item::reply(ItemId(2), vec![ItemId(1), ItemId(3)]),
            Item::new(ItemId(3)),
        ];
        let items_by_id = by_id(&items);
        let mut hides = HashMap::new();
        hides.insert(ItemId(3), hide_record(3, true));
        let new_hides = IndexMap::new();
        let mut visited = HashSet::new();

        let found = find_ancestor_hide(ItemId(1), &hides, &new_hides, &items_by_id, &mut visited)
            .expect("record behind the cycle must be reachable");
        assert_eq!(found.item_id, ItemId(3));
    }

    #[test]
    fn test_ancestor_search_checks_start_item_first() {
        let items = vec![
            Item::reply(ItemId(1), vec![ItemId(2)]),
            Item::new(ItemId(2)),
        ];
        let items_by_id = by_id(&items);
        let mut hides = HashMap::new();
        hides.insert(ItemId(1), hide_record(1, false));
        hides.insert(ItemId(2), hide_record(2, true));
        let new_hides = IndexMap::new();
        let mut visited = HashSet::new();

        let found = find_ancestor_hide(ItemId(1), &hides, &new_hides, &items_by_id, &mut visited)
            .expect("start item has a record");
        assert_eq!(found.item_id, ItemId(1));
    }

    #[test]
    fn test_ancestor_search_ignores_dangling_edges() {
        let items = vec![Item::reply(ItemId(1), vec![ItemId(99)])];
        let items_by_id = by_id(&items);
        let hides = HashMap::new();
        let new_hides = IndexMap::new();
        let mut visited = HashSet::new();

        let found = find_ancestor_hide(ItemId(1), &hides, &new_hides, &items_by_id, &mut visited);
        assert!(found.is_none());
    }

    #[test]
    fn test_synthesize_hide_never_duplicates() {
        let mut hides = HashMap::new();
        let mut new_hides = IndexMap::new();

        synthesize_hide(ItemId(5), true, true, true, &mut hides, &mut new_hides);
        synthesize_hide(ItemId(5), false, false, false, &mut hides, &mut new_hides);

        assert_eq!(new_hides.len(), 1);
        let synthesized = new_hides.get(&ItemId(5)).unwrap();
        // First synthesis wins.
        assert!(synthesized.record.only_hide);
        assert!(synthesized.created_by_filter);
    }

    #[test]
    fn test_propagation_skips_non_propagating_ancestor() {
        let items = vec![
            Item::new(ItemId(1)),
            Item::reply(ItemId(2), vec![ItemId(1)]),
        ];
        let items_by_id = by_id(&items);
        let mut hides = HashMap::new();
        hides.insert(ItemId(1), hide_record(1, false));
        let mut new_hides = IndexMap::new();
        let filters = HashMap::new();
        let mut visited = HashSet::new();
        let mut dispositions: IndexMap<ItemId, Disposition> = IndexMap::new();
        dispositions.insert(ItemId(1), Disposition::Hide);
        dispositions.insert(ItemId(2), Disposition::Leave);

        propagate_into(
            &items[1],
            &mut dispositions,
            &mut hides,
            &mut new_hides,
            &items_by_id,
            &filters,
            &mut visited,
        );

        assert_eq!(dispositions[&ItemId(2)], Disposition::Leave);
        assert!(new_hides.is_empty());
    }

    #[test]
    fn test_propagation_inherits_from_propagating_ancestor() {
        let items = vec![
            Item::new(ItemId(1)),
            Item::reply(ItemId(2), vec![ItemId(1)]),
        ];
        let items_by_id = by_id(&items);
        let mut hides = HashMap::new();
        hides.insert(ItemId(1), hide_record(1, true));
        let mut new_hides = IndexMap::new();
        let filters = HashMap::new();
        let mut visited = HashSet::new();
        let mut dispositions: IndexMap<ItemId, Disposition> = IndexMap::new();
        dispositions.insert(ItemId(1), Disposition::Hide);
        dispositions.insert(ItemId(2), Disposition::Leave);

        propagate_into(
            &items[1],
            &mut dispositions,
            &mut hides,
            &mut new_hides,
            &items_by_id,
            &filters,
            &mut visited,
        );

        assert_eq!(dispositions[&ItemId(2)], Disposition::Hide);
        let synthesized = new_hides.get(&ItemId(2)).expect("record synthesized for 2");
        assert!(synthesized.record.only_hide);
        assert!(synthesized.record.apply_to_replies);
        assert!(!synthesized.created_by_filter);
    }

    #[test]
    fn test_propagation_first_declared_target_wins() {
        // 3 replies to both a removed item and a hidden item; the first edge
        // in declared order decides.
        let items = vec![
            Item::new(ItemId(1)),
            Item::new(ItemId(2)),
            Item::reply(ItemId(3), vec![ItemId(1), ItemId(2)]),
        ];
        let items_by_id = by_id(&items);
        let mut hides = HashMap::new();
        hides.insert(
            ItemId(1),
            HideRecord {
                only_hide: false,
                ..hide_record(1, true)
            },
        );
        hides.insert(ItemId(2), hide_record(2, true));
        let mut new_hides = IndexMap::new();
        let filters = HashMap::new();
        let mut visited = HashSet::new();
        let mut dispositions: IndexMap<ItemId, Disposition> = IndexMap::new();
        dispositions.insert(ItemId(1), Disposition::Remove);
        dispositions.insert(ItemId(2), Disposition::Hide);
        dispositions.insert(ItemId(3), Disposition::Leave);

        propagate_into(
            &items[2],
            &mut dispositions,
            &mut hides,
            &mut new_hides,
            &items_by_id,
            &filters,
            &mut visited,
        );

        assert_eq!(dispositions[&ItemId(3)], Disposition::Remove);
        assert!(!new_hides.get(&ItemId(3)).unwrap().record.only_hide);
    }

    #[test]
    fn test_propagation_skips_manually_restored_source() {
        let items = vec![
            Item::new(ItemId(1)),
            Item::reply(ItemId(2), vec![ItemId(1)]),
        ];
        let items_by_id = by_id(&items);
        let mut hides = HashMap::new();
        hides.insert(ItemId(1), hide_record(1, true));
        hides.insert(
            ItemId(2),
            HideRecord {
                manually_restored: true,
                ..hide_record(2, false)
            },
        );
        let mut new_hides = IndexMap::new();
        let filters = HashMap::new();
        let mut visited = HashSet::new();
        let mut dispositions: IndexMap<ItemId, Disposition> = IndexMap::new();
        dispositions.insert(ItemId(1), Disposition::Hide);
        dispositions.insert(ItemId(2), Disposition::Leave);

        propagate_into(
            &items[1],
            &mut dispositions,
            &mut hides,
            &mut new_hides,
            &items_by_id,
            &filters,
            &mut visited,
        );

        assert_eq!(dispositions[&ItemId(2)], Disposition::Leave);
        assert!(new_hides.is_empty());
    }

    #[test]
    fn test_propagation_falls_back_to_record_owner_filter() {
        // 3 replies to 2, which is already hidden but owns neither a record
        // nor a filter; the ancestor search lands on 1's record, whose
        // apply_to_replies is off. The filter attached to 1 decides instead.
        let items = vec![
            Item::new(ItemId(1)),
            Item::reply(ItemId(2), vec![ItemId(1)]),
            Item::reply(ItemId(3), vec![ItemId(2)]),
        ];
        let items_by_id = by_id(&items);
        let mut hides = HashMap::new();
        hides.insert(ItemId(1), hide_record(1, false));
        let mut new_hides = IndexMap::new();
        let mut filters = HashMap::new();
        filters.insert(
            ItemId(1),
            ContentFilter {
                enabled: true,
                remove: false,
                stub: true,
                apply_to_replies: true,
            },
        );
        let mut visited = HashSet::new();
        let mut dispositions: IndexMap<ItemId, Disposition> = IndexMap::new();
        dispositions.insert(ItemId(1), Disposition::Hide);
        dispositions.insert(ItemId(2), Disposition::Hide);
        dispositions.insert(ItemId(3), Disposition::Leave);

        propagate_into(
            &items[2],
            &mut dispositions,
            &mut hides,
            &mut new_hides,
            &items_by_id,
            &filters,
            &mut visited,
        );

        assert_eq!(dispositions[&ItemId(3)], Disposition::Hide);
        let synthesized = new_hides.get(&ItemId(3)).expect("record synthesized for 3");
        assert!(synthesized.record.only_hide);
        // The fallback filter qualified the propagation, so the record counts
        // as filter-created.
        assert!(synthesized.created_by_filter);
    }

    #[test]
    fn test_propagation_continues_past_leave_target() {
        // First edge leads to an ancestor chain whose rule applies but whose
        // direct target is still Leave; the scan moves on to the next edge.
        let items = vec![
            Item::new(ItemId(1)),
            Item::reply(ItemId(2), vec![ItemId(1)]),
            Item::new(ItemId(3)),
            Item::reply(ItemId(4), vec![ItemId(2), ItemId(3)]),
        ];
        let items_by_id = by_id(&items);
        let mut hides = HashMap::new();
        hides.insert(ItemId(1), hide_record(1, true));
        hides.insert(ItemId(3), hide_record(3, true));
        let mut new_hides = IndexMap::new();
        let filters = HashMap::new();
        let mut visited = HashSet::new();
        let mut dispositions: IndexMap<ItemId, Disposition> = IndexMap::new();
        dispositions.insert(ItemId(1), Disposition::Hide);
        dispositions.insert(ItemId(2), Disposition::Leave);
        dispositions.insert(ItemId(3), Disposition::Hide);
        dispositions.insert(ItemId(4), Disposition::Leave);

        propagate_into(
            &items[3],
            &mut dispositions,
            &mut hides,
            &mut new_hides,
            &items_by_id,
            &filters,
            &mut visited,
        );

        // 2 stayed Leave (it was not processed), so 4 inherits from 3 instead.
        assert_eq!(dispositions[&ItemId(4)], Disposition::Hide);
    }
}
