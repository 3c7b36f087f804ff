use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use super::api_types::{
  ApiHealthResponse, ChatRequestBody, GenerateLessonBody, GenerateQuizBody, QuizConversation,
  TranslationRequest, TranslationResponse,
};
use super::prompt;
use super::provider::ContentProvider;
use super::types::{ChatMessage, HealthStatus, LessonRecord, LessonRequest};
use crate::error::{LearnError, Result};

/// Client for a LearnLocal server, remote or embedded on the device
#[derive(Clone)]
pub struct HttpProvider {
  client: Client,
  base: Url,
  model: String,
  max_tokens: Option<u32>,
  name: String,
}

impl HttpProvider {
  pub fn new(name: impl Into<String>, base: &str, model: impl Into<String>) -> Result<Self> {
    let base = Url::parse(base)
      .map_err(|e| LearnError::validation(format!("Invalid provider URL {}: {}", base, e)))?;

    let client = Client::builder()
      .user_agent(concat!("learnlocal/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| LearnError::unreachable(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Self {
      client,
      base,
      model: model.into(),
      max_tokens: None,
      name: name.into(),
    })
  }

  pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
    self.max_tokens = Some(max_tokens);
    self
  }

  fn endpoint(&self, path: &str) -> String {
    format!("{}/{}", self.base.as_str().trim_end_matches('/'), path)
  }

  /// POST a JSON body and return the raw response text
  async fn post_text<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String> {
    let url = self.endpoint(path);
    debug!(provider = %self.name, %url, "POST");

    let response = self
      .client
      .post(&url)
      .json(body)
      .send()
      .await
      .map_err(|e| LearnError::unreachable(format!("Request to {} failed: {}", url, e)))?;

    let status = response.status();
    let text = response
      .text()
      .await
      .map_err(|e| LearnError::unreachable(format!("Failed to read response from {}: {}", url, e)))?;

    if !status.is_success() {
      return Err(LearnError::unreachable(format!("HTTP {} from {}: {}", status, url, text)));
    }

    Ok(text)
  }

  async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    let url = self.endpoint(path);

    let response = self
      .client
      .get(&url)
      .send()
      .await
      .map_err(|e| LearnError::unreachable(format!("Request to {} failed: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
      return Err(LearnError::unreachable(format!("HTTP {} from {}", status, url)));
    }

    response
      .json()
      .await
      .map_err(|e| LearnError::malformed(format!("Failed to parse response from {}: {}", url, e)))
  }
}

#[async_trait]
impl ContentProvider for HttpProvider {
  fn name(&self) -> &str {
    &self.name
  }

  async fn generate_lesson(&self, request: &LessonRequest) -> Result<String> {
    let messages = prompt::lesson_conversation(request);
    let body = GenerateLessonBody {
      messages: &messages,
      model: &self.model,
      max_tokens: self.max_tokens,
    };
    self.post_text("api/generate-lesson", &body).await
  }

  async fn chat(&self, message: &str, _history: &[ChatMessage]) -> Result<String> {
    let body = ChatRequestBody {
      message,
      model: &self.model,
    };
    self.post_text("api/chat", &body).await
  }

  async fn generate_quiz(&self, lesson: &LessonRecord, questions: usize) -> Result<String> {
    let messages = prompt::quiz_conversation(lesson, questions);
    let body = GenerateQuizBody {
      conversation: QuizConversation {
        messages: &messages,
      },
      lesson_id: &lesson.id,
      model: &self.model,
    };
    self.post_text("api/generate-quiz", &body).await
  }

  async fn health(&self) -> Result<HealthStatus> {
    let response: ApiHealthResponse = self.get_json("api/health").await?;
    Ok(HealthStatus {
      status: response.status,
      model: response.model,
    })
  }

  async fn translate(&self, request: &TranslationRequest) -> Result<TranslationResponse> {
    let text = self.post_text("api/translate", request).await?;
    serde_json::from_str(&text)
      .map_err(|e| LearnError::malformed(format!("Invalid translation response: {}", e)))
  }
}
