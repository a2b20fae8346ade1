pub mod classifier;
pub mod config;
pub mod error;
pub mod model;
pub mod propagation;
pub mod session;
pub mod store;

pub use config::{BatchFile, MatchedFilter};
pub use error::ResolveError;
pub use model::{
    CollectionContext, ContentFilter, Disposition, HideRecord, Item, ItemId, ProgressEvent,
};
pub use session::{HideResolver, ResolutionOutcome};
pub use store::{
    FilterLookup, HideRecordStore, MemoryRuleStore, NoopProgress, ProgressNotifier,
};
