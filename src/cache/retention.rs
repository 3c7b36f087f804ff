//! Retention policy: expiry by age and count bounds.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::traits::Cacheable;
use crate::error::{LearnError, Result};

/// Retention settings, persisted under `offline_settings`.
///
/// Missing fields in a stored document fall back to the defaults, so older
/// or partial documents still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetentionConfig {
  /// Stored and reported; lessons are bounded by expiry only
  pub max_cached_lessons: u32,
  pub max_cached_chats: u32,
  pub cache_expiry_days: u32,
  pub auto_download_lessons: bool,
}

impl Default for RetentionConfig {
  fn default() -> Self {
    Self {
      max_cached_lessons: 50,
      max_cached_chats: 10,
      cache_expiry_days: 30,
      auto_download_lessons: true,
    }
  }
}

impl RetentionConfig {
  /// Reject zero counts.
  pub fn validate(&self) -> Result<()> {
    if self.max_cached_lessons == 0 {
      return Err(LearnError::validation("maxCachedLessons must be positive"));
    }
    if self.max_cached_chats == 0 {
      return Err(LearnError::validation("maxCachedChats must be positive"));
    }
    if self.cache_expiry_days == 0 {
      return Err(LearnError::validation("cacheExpiryDays must be positive"));
    }
    Ok(())
  }

  /// Overlay the fields set in `update`.
  pub fn apply(&self, update: &SettingsUpdate) -> Self {
    Self {
      max_cached_lessons: update.max_cached_lessons.unwrap_or(self.max_cached_lessons),
      max_cached_chats: update.max_cached_chats.unwrap_or(self.max_cached_chats),
      cache_expiry_days: update.cache_expiry_days.unwrap_or(self.cache_expiry_days),
      auto_download_lessons: update
        .auto_download_lessons
        .unwrap_or(self.auto_download_lessons),
    }
  }
}

/// Partial update of [`RetentionConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
  pub max_cached_lessons: Option<u32>,
  pub max_cached_chats: Option<u32>,
  pub cache_expiry_days: Option<u32>,
  pub auto_download_lessons: Option<bool>,
}

impl SettingsUpdate {
  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }
}

/// True iff `timestamp` is strictly more than `expiry_days` days before `now`.
pub fn is_expired(timestamp: DateTime<Utc>, expiry_days: u32, now: DateTime<Utc>) -> bool {
  now - timestamp > Duration::days(i64::from(expiry_days))
}

/// Keep the first `max` records, dropping the rest.
pub fn trim<T>(mut records: Vec<T>, max: usize) -> Vec<T> {
  records.truncate(max);
  records
}

/// Drop expired records, preserving order.
pub fn retain_fresh<T: Cacheable>(records: Vec<T>, expiry_days: u32, now: DateTime<Utc>) -> Vec<T> {
  records
    .into_iter()
    .filter(|r| !is_expired(r.freshness(), expiry_days, now))
    .collect()
}
