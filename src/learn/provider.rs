//! Provider abstraction shared by every content backend.

use async_trait::async_trait;
use tracing::debug;

use super::api_types::{TranslationRequest, TranslationResponse};
use super::types::{ChatMessage, HealthStatus, LessonRecord, LessonRequest};
use crate::error::{LearnError, Result};

/// A backend able to produce lessons, quizzes and chat replies.
///
/// Generation methods return the raw response body. Normalization is the
/// gateway's job so every provider goes through the same tolerant parser.
#[async_trait]
pub trait ContentProvider: Send + Sync {
  /// Short name used in logs
  fn name(&self) -> &str;

  async fn generate_lesson(&self, request: &LessonRequest) -> Result<String>;

  async fn chat(&self, message: &str, history: &[ChatMessage]) -> Result<String>;

  async fn health(&self) -> Result<HealthStatus>;

  /// Multiple-choice questions about a cached lesson
  async fn generate_quiz(&self, _lesson: &LessonRecord, _questions: usize) -> Result<String> {
    Err(LearnError::unreachable(format!(
      "{} does not support quizzes",
      self.name()
    )))
  }

  async fn translate(&self, _request: &TranslationRequest) -> Result<TranslationResponse> {
    Err(LearnError::unreachable(format!(
      "{} does not support translation",
      self.name()
    )))
  }
}

/// Whether the gateway may reach out to a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
  Online,
  Offline,
}

impl Connectivity {
  /// Online when the provider answers its health check.
  pub async fn from_health(provider: &dyn ContentProvider) -> Self {
    match provider.health().await {
      Ok(status) => {
        debug!(provider = provider.name(), status = %status.status, "Provider reachable");
        Self::Online
      }
      Err(e) => {
        debug!(provider = provider.name(), error = %e, "Provider unreachable");
        Self::Offline
      }
    }
  }
}
