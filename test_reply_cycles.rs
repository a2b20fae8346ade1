use post_sift::model::{CollectionContext, ContentFilter, Item, ItemId};
use post_sift::session::HideResolver;
use post_sift::store::{MemoryRuleStore, NoopProgress};
use std::sync::Arc;

// Manual repro for reply graphs with cycles: two items replying to each other
// plus a chain hanging off the cycle. The hidden root must pull the whole
// chain down without the walk looping forever.
#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .init();

    let store = Arc::new(MemoryRuleStore::new());
    store.insert_filter(
        ItemId(1),
        ContentFilter {
            enabled: true,
            remove: false,
            stub: true,
            apply_to_replies: true,
        },
    );

    let items = vec![
        Item::reply(ItemId(1), vec![ItemId(2)]),
        Item::reply(ItemId(2), vec![ItemId(1)]),
        Item::reply(ItemId(3), vec![ItemId(2)]),
        Item::reply(ItemId(4), vec![ItemId(3)]),
        // Dangling edge out of the batch, must be ignored.
        Item::reply(ItemId(5), vec![ItemId(999), ItemId(4)]),
    ];

    let resolver = HideResolver::new(store.clone(), store.clone(), Arc::new(NoopProgress));
    let outcome = resolver
        .resolve(CollectionContext::Thread, items)
        .await
        .expect("resolution failed");

    println!("Dispositions:");
    for (id, disposition) in &outcome.dispositions {
        println!("  {id}: {disposition}");
    }

    println!("Synthesized records:");
    for record in &outcome.new_records {
        println!(
            "  {}: only_hide={} apply_to_replies={}",
            record.item_id, record.only_hide, record.apply_to_replies
        );
    }

    println!("Store now holds {} hide records", store.hide_record_count());
}
