//! Generic caching layer for record persistence and offline support.
//!
//! This module is agnostic of lessons and chats. It provides:
//! - Collections of records with an identity key and a freshness timestamp
//! - Merge-by-identity writes and move-to-front writes with a count bound
//! - Lazy expiry (filtered on read, evicted on write)
//! - A single writer lock around every read-modify-write cycle

mod layer;
mod merge;
mod retention;
mod storage;
mod traits;

pub use layer::{CacheLayer, SETTINGS_KEY};
pub use merge::merge_by_identity;
pub use retention::{is_expired, retain_fresh, trim, RetentionConfig, SettingsUpdate};
pub use storage::{CacheStorage, SqliteStorage};
pub use traits::{CacheResult, CacheSource, Cacheable, Clock, SystemClock};

#[cfg(test)]
pub(crate) use storage::test_storage;
#[cfg(test)]
pub(crate) use traits::test_clock;
