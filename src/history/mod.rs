//! In-memory generation history and usage analytics.

mod store;

pub use store::{
    DEFAULT_CAPACITY, HistoryEntry, HistoryStats, HistoryStore, KindCount, SUMMARY_CHARS,
};
