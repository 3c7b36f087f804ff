//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// Trait for records that live in a cached collection.
///
/// Implementors provide an identity used for merging, the timestamp the
/// retention policy judges, and the storage key of their collection.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned {
  /// Unique identifier for this record within its collection
  fn cache_key(&self) -> &str;

  /// Timestamp used for expiry decisions
  fn freshness(&self) -> DateTime<Utc>;

  /// Storage key holding the whole collection (e.g., "cached_lessons")
  fn collection() -> &'static str;

  /// Called on every write of this record, with the record it replaces (if any).
  fn on_write(&mut self, _previous: Option<&Self>, _now: DateTime<Utc>) {}
}

/// Source of the current time. Swappable so expiry can be tested at exact boundaries.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// Result from a gateway operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if served from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Fresh data from a provider.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Data served from cache because no provider could answer.
  pub fn offline(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Offline,
      cached_at: Some(cached_at),
    }
  }

  /// Synthesized placeholder content.
  pub fn fallback(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Fallback,
      cached_at: None,
    }
  }
}

/// Indicates where returned data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from a provider
  Network,
  /// Provider unavailable, serving cached data
  Offline,
  /// Nothing usable anywhere, serving generated placeholder content
  Fallback,
}

#[cfg(test)]
pub(crate) mod test_clock {
  use super::Clock;
  use chrono::{DateTime, Duration, TimeZone, Utc};
  use std::sync::Mutex;

  /// Clock that only moves when told to.
  pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
  }

  impl FixedClock {
    pub fn new() -> Self {
      Self {
        now: Mutex::new(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()),
      }
    }

    pub fn advance(&self, by: Duration) {
      let mut now = self.now.lock().unwrap();
      *now += by;
    }
  }

  impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
      *self.now.lock().unwrap()
    }
  }
}
