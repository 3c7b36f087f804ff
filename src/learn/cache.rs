//! Cache store for lessons, chats and learner progress.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::cache::{CacheLayer, CacheStorage, Cacheable, Clock, RetentionConfig, SettingsUpdate};
use crate::error::Result;

use super::types::{ChatMessage, ChatRecord, LessonProgress, LessonRecord, LessonRequest};

pub const LESSONS_KEY: &str = "cached_lessons";
pub const CHATS_KEY: &str = "cached_chats";
pub const PROGRESS_KEY: &str = "user_progress";

// ============================================================================
// Cacheable implementations
// ============================================================================

impl Cacheable for LessonRecord {
  fn cache_key(&self) -> &str {
    &self.id
  }

  fn freshness(&self) -> DateTime<Utc> {
    self.cached_at
  }

  fn collection() -> &'static str {
    LESSONS_KEY
  }

  fn on_write(&mut self, previous: Option<&Self>, now: DateTime<Utc>) {
    // First known generation time wins
    self.created_at = previous
      .and_then(|p| p.created_at)
      .or(self.created_at)
      .or(Some(now));
    self.cached_at = now;
  }
}

impl Cacheable for ChatRecord {
  fn cache_key(&self) -> &str {
    &self.id
  }

  fn freshness(&self) -> DateTime<Utc> {
    self.last_updated
  }

  fn collection() -> &'static str {
    CHATS_KEY
  }

  fn on_write(&mut self, previous: Option<&Self>, _now: DateTime<Utc>) {
    if let Some(previous) = previous {
      if previous.last_updated > self.last_updated {
        self.last_updated = previous.last_updated;
      }
    }
  }
}

// ============================================================================
// Content cache
// ============================================================================

/// Which persisted collections to clear
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Collection {
  Lessons,
  Chats,
  All,
}

/// Serialized sizes of the cached collections
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheSize {
  pub lessons: usize,
  pub chats: usize,
  pub total_mb: f64,
}

/// Records dropped by [`ContentCache::clear_expired`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PruneReport {
  pub lessons: usize,
  pub chats: usize,
}

/// The offline content cache.
///
/// Construct once at startup and hand clones to every consumer; clones share
/// the same storage, settings and writer lock.
pub struct ContentCache<S: CacheStorage> {
  layer: CacheLayer<S>,
}

impl<S: CacheStorage> ContentCache<S> {
  pub fn new(storage: S) -> Self {
    Self {
      layer: CacheLayer::new(storage),
    }
  }

  pub fn with_clock(storage: S, clock: Arc<dyn Clock>) -> Self {
    Self {
      layer: CacheLayer::with_clock(storage, clock),
    }
  }

  pub fn now(&self) -> DateTime<Utc> {
    self.layer.now()
  }

  // -- lessons --------------------------------------------------------------

  /// Merge `batch` into the cached lessons by id and persist.
  pub async fn put_lessons(&self, batch: Vec<LessonRecord>) -> Result<()> {
    let count = batch.len();
    self.layer.merge(batch).await?;
    info!(count, "Cached lessons");
    Ok(())
  }

  /// Non-expired lessons in stored order.
  pub async fn get_lessons(&self) -> Vec<LessonRecord> {
    self.layer.read().await
  }

  pub async fn get_lesson_by_id(&self, id: &str) -> Option<LessonRecord> {
    self.get_lessons().await.into_iter().find(|l| l.id == id)
  }

  /// Delete a lesson. Returns whether it was cached.
  pub async fn remove_lesson(&self, id: &str) -> Result<bool> {
    self.layer.remove::<LessonRecord>(id).await
  }

  /// Most recently cached lesson matching a generation request.
  ///
  /// Matches when the title contains the topic (case-insensitive) and
  /// category, difficulty and duration (15 minutes when unset) are equal.
  pub async fn find_lesson(&self, request: &LessonRequest) -> Option<LessonRecord> {
    let needle = request.topic().to_lowercase();
    let duration = request.duration_or_default();

    self
      .get_lessons()
      .await
      .into_iter()
      .enumerate()
      .filter(|(_, l)| {
        l.category == request.category
          && l.difficulty == request.difficulty
          && l.estimated_duration == duration
          && l.title.to_lowercase().contains(&needle)
      })
      .max_by_key(|(position, l)| (l.cached_at, *position))
      .map(|(_, l)| l)
  }

  // -- chats ----------------------------------------------------------------

  /// Store `chat` as the most recent conversation, keeping at most
  /// `maxCachedChats`.
  pub async fn put_chat(&self, chat: ChatRecord) -> Result<()> {
    chat.validate()?;
    self.layer.upsert_front(chat, max_chats).await?;
    Ok(())
  }

  /// Append `messages` to the chat `chat_id`, creating it when it is not
  /// cached, and move it to the front.
  ///
  /// Read and write happen in one write cycle, so concurrent appends to the
  /// same chat all survive. Returns the chat as stored.
  pub async fn append_to_chat(&self, chat_id: &str, messages: Vec<ChatMessage>) -> Result<ChatRecord> {
    let now = self.now();
    self
      .layer
      .update_front(chat_id, max_chats, |previous: Option<&ChatRecord>| {
        let mut chat = previous
          .cloned()
          .unwrap_or_else(|| ChatRecord::new(chat_id, now));
        for message in messages {
          chat.push(message)?;
        }
        Ok(chat)
      })
      .await
  }

  /// Non-expired chats, most recent first.
  pub async fn get_chats(&self) -> Vec<ChatRecord> {
    self.layer.read().await
  }

  pub async fn get_chat_by_id(&self, id: &str) -> Option<ChatRecord> {
    self.get_chats().await.into_iter().find(|c| c.id == id)
  }

  // -- maintenance ----------------------------------------------------------

  pub async fn clear(&self, collection: Collection) -> Result<()> {
    let keys: &[&str] = match collection {
      Collection::Lessons => &[LESSONS_KEY],
      Collection::Chats => &[CHATS_KEY],
      Collection::All => &[LESSONS_KEY, CHATS_KEY],
    };
    self.layer.clear(keys).await?;
    info!(?collection, "Cleared cache");
    Ok(())
  }

  /// Evict expired lessons and chats from storage.
  pub async fn clear_expired(&self) -> Result<PruneReport> {
    let report = PruneReport {
      lessons: self.layer.prune::<LessonRecord>().await?,
      chats: self.layer.prune::<ChatRecord>().await?,
    };
    info!(lessons = report.lessons, chats = report.chats, "Evicted expired records");
    Ok(report)
  }

  pub fn cache_size(&self) -> CacheSize {
    let lessons = self.layer.document_size(LESSONS_KEY);
    let chats = self.layer.document_size(CHATS_KEY);
    CacheSize {
      lessons,
      chats,
      total_mb: (lessons + chats) as f64 / (1024.0 * 1024.0),
    }
  }

  pub async fn settings(&self) -> RetentionConfig {
    self.layer.settings().await
  }

  pub async fn update_settings(&self, update: &SettingsUpdate) -> Result<RetentionConfig> {
    self.layer.update_settings(update).await
  }

  // -- progress -------------------------------------------------------------

  /// Record progress for a lesson, stamping `last_updated`.
  pub async fn save_progress(&self, lesson_id: &str, progress: LessonProgress) -> Result<()> {
    self
      .layer
      .update_document::<HashMap<String, LessonProgress>, _>(PROGRESS_KEY, |all, now| {
        all.insert(
          lesson_id.to_string(),
          LessonProgress {
            last_updated: Some(now),
            ..progress
          },
        );
      })
      .await?;
    Ok(())
  }

  pub async fn progress(&self) -> HashMap<String, LessonProgress> {
    self.layer.read_document(PROGRESS_KEY).await
  }
}

fn max_chats(settings: &RetentionConfig) -> usize {
  settings.max_cached_chats as usize
}

impl<S: CacheStorage> Clone for ContentCache<S> {
  fn clone(&self) -> Self {
    Self {
      layer: self.layer.clone(),
    }
  }
}
