//! Provider gateway: routes requests to a provider or the cache, normalizes
//! what comes back, and degrades to cached or placeholder content on failure.
//!
//! Provider errors never reach the caller. Only validation errors and
//! failures to persist do.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::api_types::{TranslationRequest, TranslationResponse};
use super::cache::ContentCache;
use super::fallback::{self, UNREACHABLE_CHAT_REPLY};
use super::knowledge;
use super::normalize;
use super::provider::{Connectivity, ContentProvider};
use super::types::{ChatMessage, ChatRecord, HealthStatus, LessonRecord, LessonRequest, Quiz};
use crate::cache::{CacheResult, CacheStorage};
use crate::error::{LearnError, Result};

/// Default bound on a single provider call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ProviderGateway<S: CacheStorage> {
  cache: ContentCache<S>,
  provider: Option<Arc<dyn ContentProvider>>,
  timeout: Duration,
}

impl<S: CacheStorage> ProviderGateway<S> {
  /// `provider` is `None` when no backend is selected; every request is
  /// then answered from the cache.
  pub fn new(cache: ContentCache<S>, provider: Option<Arc<dyn ContentProvider>>) -> Self {
    Self {
      cache,
      provider,
      timeout: DEFAULT_TIMEOUT,
    }
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn cache(&self) -> &ContentCache<S> {
    &self.cache
  }

  /// Provider to use for this request, if any
  fn route(&self, connectivity: Connectivity) -> Option<&Arc<dyn ContentProvider>> {
    match (&self.provider, connectivity) {
      (Some(provider), Connectivity::Online) => {
        debug!(provider = provider.name(), "Routing to provider");
        Some(provider)
      }
      (None, _) => {
        debug!("No provider selected, routing to cache");
        None
      }
      (Some(_), Connectivity::Offline) => {
        debug!("Offline, routing to cache");
        None
      }
    }
  }

  async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(self.timeout, call)
      .await
      .unwrap_or_else(|_| {
        Err(LearnError::unreachable(format!(
          "provider timed out after {}s",
          self.timeout.as_secs_f64()
        )))
      })
  }

  // -- lessons --------------------------------------------------------------

  /// Generate a lesson, caching whatever is returned.
  ///
  /// Falls back to the most recent matching cached lesson, then to a
  /// synthesized placeholder lesson.
  pub async fn generate_lesson(
    &self,
    request: &LessonRequest,
    connectivity: Connectivity,
  ) -> Result<CacheResult<LessonRecord>> {
    request.validate()?;

    if let Some(provider) = self.route(connectivity) {
      let generated = self
        .bounded(provider.generate_lesson(request))
        .await
        .and_then(|body| normalize::lesson_from_response(&body, request));

      match generated {
        Ok(lesson) => {
          let now = self.cache.now();
          let record = LessonRecord {
            id: format!("generated-{}", Uuid::new_v4()),
            title: lesson.title,
            category: request.category,
            difficulty: request.difficulty,
            content: lesson.content,
            activities: lesson.activities,
            key_points: lesson.key_points,
            estimated_duration: lesson.estimated_duration,
            created_at: Some(now),
            cached_at: now,
          };
          let stored = self.write_through(record).await?;
          info!(id = %stored.id, provider = provider.name(), "Generated lesson");
          return Ok(CacheResult::from_network(stored));
        }
        Err(e) => {
          warn!(provider = provider.name(), topic = request.topic(), error = %e, "Lesson generation failed, degrading");
        }
      }
    }

    self.cached_or_fallback(request).await
  }

  async fn cached_or_fallback(&self, request: &LessonRequest) -> Result<CacheResult<LessonRecord>> {
    if let Some(lesson) = self.cache.find_lesson(request).await {
      debug!(id = %lesson.id, "Serving cached lesson");
      let cached_at = lesson.cached_at;
      return Ok(CacheResult::offline(lesson, cached_at));
    }

    let lesson = fallback::fallback_lesson(
      request,
      format!("fallback-{}", Uuid::new_v4()),
      self.cache.now(),
    );
    let stored = self.write_through(lesson).await?;
    info!(id = %stored.id, "Serving fallback lesson");
    Ok(CacheResult::fallback(stored))
  }

  /// Persist `lesson` and return it as stored
  async fn write_through(&self, lesson: LessonRecord) -> Result<LessonRecord> {
    let id = lesson.id.clone();
    self.cache.put_lessons(vec![lesson.clone()]).await?;
    Ok(self.cache.get_lesson_by_id(&id).await.unwrap_or(lesson))
  }

  // -- quizzes --------------------------------------------------------------

  /// Multiple-choice questions about the cached lesson `lesson_id`.
  ///
  /// Falls back to questions built from the lesson's key points. Quizzes are
  /// not cached.
  pub async fn generate_quiz(
    &self,
    lesson_id: &str,
    questions: usize,
    connectivity: Connectivity,
  ) -> Result<CacheResult<Quiz>> {
    if questions == 0 {
      return Err(LearnError::validation("a quiz needs at least one question"));
    }
    let lesson = self
      .cache
      .get_lesson_by_id(lesson_id.trim())
      .await
      .ok_or_else(|| LearnError::validation(format!("lesson {} is not cached", lesson_id)))?;

    if let Some(provider) = self.route(connectivity) {
      let generated = self
        .bounded(provider.generate_quiz(&lesson, questions))
        .await
        .and_then(|body| normalize::quiz_from_response(&body, questions));

      match generated {
        Ok(questions) => {
          info!(lesson = %lesson.id, count = questions.len(), provider = provider.name(), "Generated quiz");
          return Ok(CacheResult::from_network(Quiz {
            lesson_id: lesson.id,
            questions,
          }));
        }
        Err(e) => {
          warn!(provider = provider.name(), lesson = %lesson.id, error = %e, "Quiz generation failed, degrading");
        }
      }
    }

    Ok(CacheResult::fallback(Quiz {
      questions: fallback::fallback_quiz(&lesson, questions),
      lesson_id: lesson.id,
    }))
  }

  // -- chat -----------------------------------------------------------------

  /// Send `text` in the chat `chat_id` (a new chat when unknown or `None`)
  /// and persist the exchange.
  ///
  /// The exchange is appended to whatever the chat holds at write time, so
  /// concurrent sends to one chat keep every message. The returned chat ends
  /// with this exchange.
  pub async fn send_chat_message(
    &self,
    chat_id: Option<&str>,
    text: &str,
    connectivity: Connectivity,
  ) -> Result<CacheResult<ChatRecord>> {
    let text = text.trim();
    if text.is_empty() {
      return Err(LearnError::validation("message must not be empty"));
    }

    let chat_id = match chat_id {
      Some(id) => id.to_string(),
      None => format!("chat-{}", Uuid::new_v4()),
    };
    let history = self
      .cache
      .get_chat_by_id(&chat_id)
      .await
      .map(|chat| chat.messages)
      .unwrap_or_default();

    let question = ChatMessage {
      id: Uuid::new_v4().to_string(),
      text: text.to_string(),
      is_user: true,
      timestamp: self.cache.now(),
    };

    let (reply, from_provider) = match self.route(connectivity) {
      Some(provider) => match self
        .bounded(provider.chat(text, &history))
        .await
        .and_then(|body| normalize::chat_reply_from_response(&body))
      {
        Ok(reply) => (reply, true),
        Err(e) => {
          warn!(provider = provider.name(), chat = %chat_id, error = %e, "Chat failed, replying with fallback");
          (UNREACHABLE_CHAT_REPLY.to_string(), false)
        }
      },
      None => (knowledge::offline_reply(text), false),
    };

    let answer = ChatMessage {
      id: Uuid::new_v4().to_string(),
      text: reply,
      is_user: false,
      timestamp: self.cache.now(),
    };

    let chat = self.cache.append_to_chat(&chat_id, vec![question, answer]).await?;

    Ok(if from_provider {
      CacheResult::from_network(chat)
    } else {
      CacheResult::fallback(chat)
    })
  }

  // -- translation and health -----------------------------------------------

  /// Translate text. On any failure the source text comes back unchanged.
  pub async fn translate(
    &self,
    request: &TranslationRequest,
    connectivity: Connectivity,
  ) -> Result<CacheResult<TranslationResponse>> {
    if request.text.trim().is_empty() {
      return Err(LearnError::validation("text must not be empty"));
    }
    if request.target_language.trim().is_empty() {
      return Err(LearnError::validation("target language must not be empty"));
    }

    if let Some(provider) = self.route(connectivity) {
      match self.bounded(provider.translate(request)).await {
        Ok(response) => return Ok(CacheResult::from_network(response)),
        Err(e) => {
          warn!(provider = provider.name(), error = %e, "Translation failed, returning source text");
        }
      }
    }

    Ok(CacheResult::fallback(TranslationResponse {
      translated_text: request.text.clone(),
      source_language: request
        .source_language
        .clone()
        .unwrap_or_else(|| "en".to_string()),
      target_language: request.target_language.clone(),
    }))
  }

  /// Health of the selected provider. Diagnostic only, so failures surface.
  pub async fn check_health(&self) -> Result<HealthStatus> {
    let provider = self
      .provider
      .as_ref()
      .ok_or_else(|| LearnError::unreachable("no provider selected"))?;
    self.bounded(provider.health()).await
  }

  /// Health-check the selected provider; offline when none is selected.
  pub async fn connectivity(&self) -> Connectivity {
    match &self.provider {
      Some(provider) => Connectivity::from_health(provider.as_ref()).await,
      None => Connectivity::Offline,
    }
  }
}

impl<S: CacheStorage> Clone for ProviderGateway<S> {
  fn clone(&self) -> Self {
    Self {
      cache: self.cache.clone(),
      provider: self.provider.clone(),
      timeout: self.timeout,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::test_storage::FailingStorage;
  use crate::cache::{CacheSource, SqliteStorage};
  use crate::learn::fallback::OFFLINE_CHAT_REPLY;
  use crate::learn::client::HttpProvider;
  use crate::learn::provider::test_provider::ScriptedProvider;
  use crate::learn::types::{Category, Difficulty};
  use serde_json::json;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn cache() -> ContentCache<SqliteStorage> {
    ContentCache::new(SqliteStorage::open_in_memory().unwrap())
  }

  fn gateway(provider: Option<Arc<dyn ContentProvider>>) -> ProviderGateway<SqliteStorage> {
    ProviderGateway::new(cache(), provider)
  }

  fn water_cycle() -> LessonRequest {
    LessonRequest::new("Water Cycle", Difficulty::Beginner, Category::Stem).with_duration(15)
  }

  fn lesson_envelope() -> String {
    let lesson = json!({
      "title": "The Water Cycle",
      "content": "Water evaporates, condenses and falls as rain.",
      "activities": ["Build a terrarium"],
      "keyPoints": ["Evaporation"],
      "estimatedDuration": 20
    });
    json!({ "response": lesson.to_string(), "model": "gpt-oss", "timestamp": "t" }).to_string()
  }

  async fn assert_fallback_cached(gateway: &ProviderGateway<SqliteStorage>) {
    let result = gateway
      .generate_lesson(&water_cycle(), Connectivity::Online)
      .await
      .unwrap();

    assert_eq!(result.source, CacheSource::Fallback);
    assert!(result.data.title.contains("Water Cycle"));
    assert!(!result.data.content.is_empty());
    assert_eq!(result.data.estimated_duration, 15);
    assert!(!result.data.activities.is_empty());

    let lessons = gateway.cache().get_lessons().await;
    assert!(lessons
      .iter()
      .any(|l| l.title == result.data.title && l.category == Category::Stem));
  }

  #[tokio::test]
  async fn test_water_cycle_network_error_falls_back() {
    let provider: Arc<dyn ContentProvider> =
      Arc::new(ScriptedProvider::lesson(Err(LearnError::unreachable("connection refused"))));
    assert_fallback_cached(&gateway(Some(provider))).await;
  }

  #[tokio::test]
  async fn test_unbound_port_falls_back() {
    // Nothing listens on port 9 locally
    let provider: Arc<dyn ContentProvider> =
      Arc::new(HttpProvider::new("remote", "http://127.0.0.1:9", "gpt-oss").unwrap());
    assert_fallback_cached(&gateway(Some(provider))).await;
  }

  #[tokio::test]
  async fn test_server_error_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/generate-lesson"))
      .respond_with(ResponseTemplate::new(500))
      .mount(&server)
      .await;

    let provider: Arc<dyn ContentProvider> =
      Arc::new(HttpProvider::new("remote", &server.uri(), "gpt-oss").unwrap());
    assert_fallback_cached(&gateway(Some(provider))).await;
  }

  #[tokio::test]
  async fn test_malformed_body_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/generate-lesson"))
      .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"error": "bad model"}"#))
      .mount(&server)
      .await;

    let provider: Arc<dyn ContentProvider> =
      Arc::new(HttpProvider::new("remote", &server.uri(), "gpt-oss").unwrap());
    assert_fallback_cached(&gateway(Some(provider))).await;
  }

  #[tokio::test]
  async fn test_timeout_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/generate-lesson"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_string(lesson_envelope())
          .set_delay(Duration::from_secs(5)),
      )
      .mount(&server)
      .await;

    let provider: Arc<dyn ContentProvider> =
      Arc::new(HttpProvider::new("remote", &server.uri(), "gpt-oss").unwrap());
    let gateway = gateway(Some(provider)).with_timeout(Duration::from_millis(100));
    assert_fallback_cached(&gateway).await;
  }

  #[tokio::test]
  async fn test_generated_lesson_is_written_through() {
    let provider = Arc::new(ScriptedProvider::lesson(Ok(lesson_envelope())));
    let gateway = gateway(Some(provider.clone() as Arc<dyn ContentProvider>));

    let result = gateway
      .generate_lesson(&water_cycle(), Connectivity::Online)
      .await
      .unwrap();

    assert_eq!(result.source, CacheSource::Network);
    assert!(result.data.id.starts_with("generated-"));
    assert_eq!(result.data.title, "The Water Cycle");
    assert_eq!(result.data.estimated_duration, 20);
    assert_eq!(
      gateway.cache().get_lesson_by_id(&result.data.id).await,
      Some(result.data)
    );
    assert_eq!(provider.calls(), 1);
  }

  #[tokio::test]
  async fn test_offline_serves_cached_lesson_without_calling_provider() {
    let provider = Arc::new(ScriptedProvider::lesson(Ok(lesson_envelope())));
    let gateway = gateway(Some(provider.clone() as Arc<dyn ContentProvider>));
    let request = water_cycle().with_duration(20);

    let generated = gateway
      .generate_lesson(&request, Connectivity::Online)
      .await
      .unwrap();

    let offline = gateway
      .generate_lesson(&request, Connectivity::Offline)
      .await
      .unwrap();

    assert_eq!(offline.source, CacheSource::Offline);
    assert_eq!(offline.data.id, generated.data.id);
    assert_eq!(offline.cached_at, Some(generated.data.cached_at));
    assert_eq!(provider.calls(), 1);
  }

  #[tokio::test]
  async fn test_cached_lesson_of_other_duration_is_not_served() {
    let provider = Arc::new(ScriptedProvider::lesson(Ok(lesson_envelope())));
    let gateway = gateway(Some(provider.clone() as Arc<dyn ContentProvider>));
    let generated = gateway
      .generate_lesson(&water_cycle().with_duration(20), Connectivity::Online)
      .await
      .unwrap();
    assert_eq!(generated.data.estimated_duration, 20);

    let result = gateway
      .generate_lesson(&water_cycle(), Connectivity::Offline)
      .await
      .unwrap();
    assert_eq!(result.source, CacheSource::Fallback);
    assert_eq!(result.data.title, "Water Cycle - Beginner Level");
    assert_eq!(result.data.estimated_duration, 15);
    assert_eq!(gateway.cache().get_lessons().await.len(), 2);
  }

  #[tokio::test]
  async fn test_fallback_write_failure_surfaces() {
    let gateway = ProviderGateway::new(ContentCache::new(FailingStorage::writes()), None);

    let err = gateway
      .generate_lesson(&water_cycle(), Connectivity::Online)
      .await
      .unwrap_err();
    assert!(matches!(err, LearnError::Storage(_)));

    let err = gateway
      .send_chat_message(None, "hello", Connectivity::Offline)
      .await
      .unwrap_err();
    assert!(matches!(err, LearnError::Storage(_)));
  }

  #[tokio::test]
  async fn test_no_provider_synthesizes_fallback() {
    let gateway = gateway(None);
    let result = gateway
      .generate_lesson(&water_cycle(), Connectivity::Online)
      .await
      .unwrap();

    assert_eq!(result.source, CacheSource::Fallback);
    assert!(result.data.id.starts_with("fallback-"));
    assert_eq!(result.data.title, "Water Cycle - Beginner Level");
  }

  #[tokio::test]
  async fn test_validation_happens_before_io() {
    let provider = Arc::new(ScriptedProvider::lesson(Ok(lesson_envelope())));
    let gateway = gateway(Some(provider.clone() as Arc<dyn ContentProvider>));

    let empty = LessonRequest::new("   ", Difficulty::Beginner, Category::Stem);
    assert!(matches!(
      gateway.generate_lesson(&empty, Connectivity::Online).await,
      Err(LearnError::Validation(_))
    ));

    let zero = water_cycle().with_duration(0);
    assert!(matches!(
      gateway.generate_lesson(&zero, Connectivity::Online).await,
      Err(LearnError::Validation(_))
    ));

    assert!(matches!(
      gateway.send_chat_message(None, "  ", Connectivity::Online).await,
      Err(LearnError::Validation(_))
    ));

    assert_eq!(provider.calls(), 0);
    assert!(gateway.cache().get_lessons().await.is_empty());
    assert!(gateway.cache().get_chats().await.is_empty());
  }

  #[tokio::test]
  async fn test_chat_exchange_is_persisted() {
    let provider: Arc<dyn ContentProvider> = Arc::new(ScriptedProvider::chat(Ok(
      json!({"response": "Rain falls from clouds."}).to_string(),
    )));
    let gateway = gateway(Some(provider));

    let first = gateway
      .send_chat_message(Some("chat-1"), "What is rain?", Connectivity::Online)
      .await
      .unwrap();
    assert_eq!(first.source, CacheSource::Network);
    assert_eq!(first.data.messages.len(), 2);
    assert!(first.data.messages[0].is_user);
    assert_eq!(first.data.messages[1].text, "Rain falls from clouds.");

    let second = gateway
      .send_chat_message(Some("chat-1"), "And snow?", Connectivity::Online)
      .await
      .unwrap();
    assert_eq!(second.data.messages.len(), 4);

    let stored = gateway.cache().get_chat_by_id("chat-1").await.unwrap();
    assert_eq!(stored.messages, second.data.messages);
    assert_eq!(gateway.cache().get_chats().await.len(), 1);
  }

  #[tokio::test]
  async fn test_chat_fallback_replies() {
    let failing: Arc<dyn ContentProvider> =
      Arc::new(ScriptedProvider::chat(Err(LearnError::unreachable("refused"))));
    let gateway = gateway(Some(failing));

    let failed = gateway
      .send_chat_message(None, "hello", Connectivity::Online)
      .await
      .unwrap();
    assert_eq!(failed.source, CacheSource::Fallback);
    assert_eq!(failed.data.messages[1].text, UNREACHABLE_CHAT_REPLY);

    let offline = gateway
      .send_chat_message(None, "volcanoes", Connectivity::Offline)
      .await
      .unwrap();
    assert_eq!(offline.data.messages[1].text, OFFLINE_CHAT_REPLY);
    assert_eq!(gateway.cache().get_chats().await.len(), 2);
  }

  #[tokio::test]
  async fn test_offline_chat_answers_from_knowledge_base() {
    let provider = Arc::new(ScriptedProvider::chat(Ok("unused".to_string())));
    let gateway = gateway(Some(provider.clone() as Arc<dyn ContentProvider>));

    let result = gateway
      .send_chat_message(None, "What is photosynthesis?", Connectivity::Offline)
      .await
      .unwrap();

    assert_eq!(result.source, CacheSource::Fallback);
    assert!(result.data.messages[1].text.starts_with("Photosynthesis is"));
    assert_eq!(provider.calls(), 0);
  }

  #[tokio::test]
  async fn test_concurrent_sends_to_one_chat_keep_every_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/chat"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(json!({"response": "Noted."}))
          .set_delay(Duration::from_millis(50)),
      )
      .mount(&server)
      .await;

    let provider: Arc<dyn ContentProvider> =
      Arc::new(HttpProvider::new("remote", &server.uri(), "gpt-oss").unwrap());
    let gateway = gateway(Some(provider));

    let handles: Vec<_> = (0..6)
      .map(|i| {
        let gateway = gateway.clone();
        tokio::spawn(async move {
          gateway
            .send_chat_message(Some("shared"), &format!("fact {}", i), Connectivity::Online)
            .await
        })
      })
      .collect();
    for handle in handles {
      handle.await.unwrap().unwrap();
    }

    let stored = gateway.cache().get_chat_by_id("shared").await.unwrap();
    assert_eq!(stored.messages.len(), 12);
    assert_eq!(stored.messages.iter().filter(|m| m.is_user).count(), 6);
  }

  fn quiz_body() -> String {
    json!({
      "questions": [
        {
          "question": "What is evaporation?",
          "options": ["Water turning to vapor", "Rain", "Snow", "Ice"],
          "correctAnswer": 0,
          "explanation": "Heat turns liquid water into vapor."
        }
      ]
    })
    .to_string()
  }

  async fn cached_lesson(gateway: &ProviderGateway<SqliteStorage>) -> LessonRecord {
    gateway
      .generate_lesson(&water_cycle(), Connectivity::Offline)
      .await
      .unwrap()
      .data
  }

  #[tokio::test]
  async fn test_quiz_from_provider() {
    let provider = Arc::new(ScriptedProvider::quiz(Ok(quiz_body())));
    let gateway = gateway(Some(provider.clone() as Arc<dyn ContentProvider>));
    let lesson = cached_lesson(&gateway).await;

    let result = gateway
      .generate_quiz(&lesson.id, 3, Connectivity::Online)
      .await
      .unwrap();

    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(result.data.lesson_id, lesson.id);
    assert_eq!(result.data.questions.len(), 1);
    assert_eq!(result.data.questions[0].correct_answer, 0);
    assert_eq!(provider.calls(), 1);
  }

  #[tokio::test]
  async fn test_quiz_falls_back_to_key_points() {
    let provider = Arc::new(ScriptedProvider::quiz(Ok(r#"{"response": "no quiz"}"#.to_string())));
    let gateway = gateway(Some(provider.clone() as Arc<dyn ContentProvider>));
    let lesson = cached_lesson(&gateway).await;

    let failed = gateway
      .generate_quiz(&lesson.id, 2, Connectivity::Online)
      .await
      .unwrap();
    assert_eq!(failed.source, CacheSource::Fallback);
    assert_eq!(failed.data.questions.len(), 2);
    assert!(failed.data.questions[0].question.contains(&lesson.title));

    let offline = gateway
      .generate_quiz(&lesson.id, 2, Connectivity::Offline)
      .await
      .unwrap();
    assert_eq!(offline.data, failed.data);
    assert_eq!(provider.calls(), 1);
  }

  #[tokio::test]
  async fn test_quiz_validation() {
    let provider = Arc::new(ScriptedProvider::quiz(Ok(quiz_body())));
    let gateway = gateway(Some(provider.clone() as Arc<dyn ContentProvider>));
    let lesson = cached_lesson(&gateway).await;

    assert!(matches!(
      gateway.generate_quiz("missing", 3, Connectivity::Online).await,
      Err(LearnError::Validation(_))
    ));
    assert!(matches!(
      gateway.generate_quiz(&lesson.id, 0, Connectivity::Online).await,
      Err(LearnError::Validation(_))
    ));
    assert_eq!(provider.calls(), 0);
  }

  #[tokio::test]
  async fn test_translation_failure_returns_source_text() {
    let provider: Arc<dyn ContentProvider> = Arc::new(ScriptedProvider::lesson(Ok(String::new())));
    let gateway = gateway(Some(provider));
    let result = gateway
      .translate(&TranslationRequest::new("hola", "fr"), Connectivity::Online)
      .await
      .unwrap();

    assert_eq!(result.source, CacheSource::Fallback);
    assert_eq!(result.data.translated_text, "hola");
    assert_eq!(result.data.source_language, "en");
    assert_eq!(result.data.target_language, "fr");

    assert!(matches!(
      gateway
        .translate(&TranslationRequest::new("hola", " "), Connectivity::Online)
        .await,
      Err(LearnError::Validation(_))
    ));
  }

  #[tokio::test]
  async fn test_check_health_surfaces_failure() {
    assert!(matches!(
      gateway(None).check_health().await,
      Err(LearnError::ProviderUnreachable(_))
    ));
    assert_eq!(gateway(None).connectivity().await, Connectivity::Offline);

    let up: Arc<dyn ContentProvider> = Arc::new(ScriptedProvider::lesson(Ok("{}".to_string())));
    let gateway = gateway(Some(up));
    assert_eq!(gateway.check_health().await.unwrap().status, "ok");
    assert_eq!(gateway.connectivity().await, Connectivity::Online);
  }
}
