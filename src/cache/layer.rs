//! Cache layer that owns the storage medium and serializes writers.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use super::merge::merge_by_identity;
use super::retention::{retain_fresh, trim, RetentionConfig, SettingsUpdate};
use super::storage::CacheStorage;
use super::traits::{Cacheable, Clock, SystemClock};
use crate::error::{LearnError, Result};

/// Storage key of the persisted [`RetentionConfig`].
pub const SETTINGS_KEY: &str = "offline_settings";

/// Cache layer that manages collections of [`Cacheable`] records.
///
/// Every read-modify-write cycle runs under a single async writer lock, so
/// two concurrent writers of the same collection cannot lose each other's
/// updates. Reads skip the writer lock and see the last committed document.
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
  clock: Arc<dyn Clock>,
  /// Loaded once at construction, replaced only by `update_settings`
  settings: Arc<RwLock<RetentionConfig>>,
  writer: Arc<Mutex<()>>,
}

impl<S: CacheStorage> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S) -> Self {
    Self::with_clock(storage, Arc::new(SystemClock))
  }

  /// Create a cache layer reading time from `clock`.
  pub fn with_clock(storage: S, clock: Arc<dyn Clock>) -> Self {
    let settings = load_settings(&storage);
    debug!(
      expiry_days = settings.cache_expiry_days,
      max_chats = settings.max_cached_chats,
      "Loaded retention settings"
    );

    Self {
      storage: Arc::new(storage),
      clock,
      settings: Arc::new(RwLock::new(settings)),
      writer: Arc::new(Mutex::new(())),
    }
  }

  pub fn now(&self) -> DateTime<Utc> {
    self.clock.now()
  }

  /// Current retention settings.
  pub async fn settings(&self) -> RetentionConfig {
    self.settings.read().await.clone()
  }

  /// Apply a partial settings update and persist the result.
  pub async fn update_settings(&self, update: &SettingsUpdate) -> Result<RetentionConfig> {
    let _writer = self.writer.lock().await;
    let mut current = self.settings.write().await;

    let next = current.apply(update);
    next.validate()?;
    self.write_document(SETTINGS_KEY, &next)?;
    *current = next.clone();

    Ok(next)
  }

  /// Read a collection, best effort.
  ///
  /// Expired records are filtered out but stay persisted until the next
  /// write. Any failure yields an empty collection.
  pub async fn read<T: Cacheable>(&self) -> Vec<T> {
    let expiry_days = self.settings().await.cache_expiry_days;

    let records = match self.storage.get(T::collection()) {
      Ok(Some(raw)) => match serde_json::from_str::<Vec<T>>(&raw) {
        Ok(records) => records,
        Err(e) => {
          warn!(collection = T::collection(), error = %e, "Cached collection is corrupt");
          return Vec::new();
        }
      },
      Ok(None) => return Vec::new(),
      Err(e) => {
        warn!(collection = T::collection(), error = %e, "Failed to read cached collection");
        return Vec::new();
      }
    };

    retain_fresh(records, expiry_days, self.now())
  }

  /// Merge `batch` into its collection by identity and persist.
  pub async fn merge<T: Cacheable>(&self, batch: Vec<T>) -> Result<()> {
    let _writer = self.writer.lock().await;
    let now = self.now();
    let existing = self.load_fresh_for_write::<T>(now).await?;

    let stamped: Vec<T> = batch
      .into_iter()
      .map(|mut record| {
        let previous = existing
          .iter()
          .find(|e| e.cache_key() == record.cache_key());
        record.on_write(previous, now);
        record
      })
      .collect();

    let merged = merge_by_identity(existing, stamped);
    debug!(collection = T::collection(), count = merged.len(), "Merged collection");
    self.write_document(T::collection(), &merged)
  }

  /// Move `record` to the front of its collection, replacing any record with
  /// the same key, then keep at most `bound(settings)` records.
  pub async fn upsert_front<T, B>(&self, record: T, bound: B) -> Result<T>
  where
    T: Cacheable,
    B: FnOnce(&RetentionConfig) -> usize,
  {
    let key = record.cache_key().to_string();
    self.update_front(&key, bound, |_| Ok(record)).await
  }

  /// Replace the record under `key` with `update(previous)` inside one write
  /// cycle, move it to the front, then keep at most `bound(settings)` records.
  ///
  /// Returns the record as stored. Nothing is written when `update` fails.
  pub async fn update_front<T, B, F>(&self, key: &str, bound: B, update: F) -> Result<T>
  where
    T: Cacheable,
    B: FnOnce(&RetentionConfig) -> usize,
    F: FnOnce(Option<&T>) -> Result<T>,
  {
    let _writer = self.writer.lock().await;
    let now = self.now();
    let max = bound(&*self.settings.read().await);
    let mut existing = self.load_fresh_for_write::<T>(now).await?;

    let previous = existing
      .iter()
      .position(|e| e.cache_key() == key)
      .map(|i| existing.remove(i));
    let mut record = update(previous.as_ref())?;
    record.on_write(previous.as_ref(), now);
    existing.insert(0, record.clone());

    let kept = trim(existing, max);
    debug!(collection = T::collection(), count = kept.len(), "Upserted record at front");
    self.write_document(T::collection(), &kept)?;
    Ok(record)
  }

  /// Delete the record with `key`. Returns whether it was present.
  pub async fn remove<T: Cacheable>(&self, key: &str) -> Result<bool> {
    let _writer = self.writer.lock().await;
    let mut existing = self.load_fresh_for_write::<T>(self.now()).await?;

    let before = existing.len();
    existing.retain(|r| r.cache_key() != key);
    let removed = existing.len() != before;

    self.write_document(T::collection(), &existing)?;
    Ok(removed)
  }

  /// Rewrite a collection without its expired records. Returns how many were dropped.
  pub async fn prune<T: Cacheable>(&self) -> Result<usize> {
    let _writer = self.writer.lock().await;
    let expiry_days = self.settings().await.cache_expiry_days;

    let all = self.load_for_write::<T>()?;
    let before = all.len();
    let fresh = retain_fresh(all, expiry_days, self.now());
    let dropped = before - fresh.len();

    self.write_document(T::collection(), &fresh)?;
    Ok(dropped)
  }

  /// Delete the documents stored under `keys`.
  pub async fn clear(&self, keys: &[&str]) -> Result<()> {
    let _writer = self.writer.lock().await;
    self.storage.remove(keys)
  }

  /// Serialized size in bytes of the document under `key`, zero if unreadable.
  pub fn document_size(&self, key: &str) -> usize {
    match self.storage.get(key) {
      Ok(raw) => raw.map(|r| r.len()).unwrap_or(0),
      Err(e) => {
        warn!(key, error = %e, "Failed to read document size");
        0
      }
    }
  }

  /// Read a standalone document, falling back to its default on any failure.
  pub async fn read_document<V: DeserializeOwned + Default>(&self, key: &str) -> V {
    match self.storage.get(key) {
      Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(key, error = %e, "Cached document is corrupt");
        V::default()
      }),
      Ok(None) => V::default(),
      Err(e) => {
        warn!(key, error = %e, "Failed to read cached document");
        V::default()
      }
    }
  }

  /// Read-modify-write a standalone document.
  pub async fn update_document<V, F>(&self, key: &str, update: F) -> Result<V>
  where
    V: Serialize + DeserializeOwned + Default,
    F: FnOnce(&mut V, DateTime<Utc>),
  {
    let _writer = self.writer.lock().await;

    let mut document: V = match self.storage.get(key)? {
      Some(raw) => parse_for_write(key, &raw)?,
      None => V::default(),
    };

    update(&mut document, self.now());
    self.write_document(key, &document)?;
    Ok(document)
  }

  /// Whole collection as stored, for a writer already holding the lock.
  ///
  /// A corrupt document fails the write and stays untouched; only `clear`
  /// discards it.
  fn load_for_write<T: Cacheable>(&self) -> Result<Vec<T>> {
    match self.storage.get(T::collection())? {
      Some(raw) => parse_for_write(T::collection(), &raw),
      None => Ok(Vec::new()),
    }
  }

  async fn load_fresh_for_write<T: Cacheable>(&self, now: DateTime<Utc>) -> Result<Vec<T>> {
    let expiry_days = self.settings().await.cache_expiry_days;
    Ok(retain_fresh(self.load_for_write::<T>()?, expiry_days, now))
  }

  fn write_document<V: Serialize + ?Sized>(&self, key: &str, value: &V) -> Result<()> {
    let raw = serde_json::to_string(value)
      .map_err(|e| LearnError::storage(format!("Failed to serialize {}: {}", key, e)))?;
    self.storage.set(key, &raw)
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      clock: Arc::clone(&self.clock),
      settings: Arc::clone(&self.settings),
      writer: Arc::clone(&self.writer),
    }
  }
}

fn parse_for_write<V: DeserializeOwned>(key: &str, raw: &str) -> Result<V> {
  serde_json::from_str(raw).map_err(|e| {
    warn!(key, error = %e, "Refusing to overwrite corrupt document");
    LearnError::storage(format!("Cached {} is corrupt: {}", key, e))
  })
}

fn load_settings<S: CacheStorage>(storage: &S) -> RetentionConfig {
  match storage.get(SETTINGS_KEY) {
    Ok(Some(raw)) => match serde_json::from_str::<RetentionConfig>(&raw) {
      Ok(settings) => match settings.validate() {
        Ok(()) => settings,
        Err(e) => {
          warn!(error = %e, "Stored retention settings are invalid, using defaults");
          RetentionConfig::default()
        }
      },
      Err(e) => {
        warn!(error = %e, "Stored retention settings are corrupt, using defaults");
        RetentionConfig::default()
      }
    },
    Ok(None) => RetentionConfig::default(),
    Err(e) => {
      warn!(error = %e, "Failed to load retention settings, using defaults");
      RetentionConfig::default()
    }
  }
}
