use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use tracing::debug;
use url::Url;

use super::api_types::{HfGenerateBody, HfParameters, TranslationRequest, TranslationResponse};
use super::normalize;
use super::prompt;
use super::provider::ContentProvider;
use super::types::{ChatMessage, HealthStatus, LessonRecord, LessonRequest};
use crate::error::{LearnError, Result};

/// Languages with a dedicated English pair model
const OPUS_LANGUAGES: &[&str] = &["es", "fr", "de"];

const MANY_TO_MANY_MODEL: &str = "facebook/mbart-large-50-many-to-many-mmt";

/// Client for a Hugging Face style inference hub
#[derive(Clone)]
pub struct HuggingFaceProvider {
  client: Client,
  base: String,
  model_url: String,
  model: String,
  token: Option<String>,
}

impl HuggingFaceProvider {
  pub fn new(base: &str, model: impl Into<String>, token: Option<String>) -> Result<Self> {
    let parsed = Url::parse(base)
      .map_err(|e| LearnError::validation(format!("Invalid Hugging Face URL {}: {}", base, e)))?;
    let model = model.into();
    let base = parsed.as_str().trim_end_matches('/').to_string();
    let model_url = format!("{}/models/{}", base, model);

    let client = Client::builder()
      .user_agent(concat!("learnlocal/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| LearnError::unreachable(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Self {
      client,
      base,
      model_url,
      model,
      token,
    })
  }

  fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
    match &self.token {
      Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
      None => builder,
    }
  }

  async fn infer(&self, inputs: &str, parameters: HfParameters) -> Result<String> {
    self.infer_at(&self.model_url, inputs, parameters).await
  }

  async fn infer_at(&self, url: &str, inputs: &str, parameters: HfParameters) -> Result<String> {
    debug!(%url, "Hugging Face inference");
    let body = HfGenerateBody { inputs, parameters };

    let response = self
      .authorize(self.client.post(url))
      .json(&body)
      .send()
      .await
      .map_err(|e| LearnError::unreachable(format!("Request to {} failed: {}", url, e)))?;

    let status = response.status();
    let text = response
      .text()
      .await
      .map_err(|e| LearnError::unreachable(format!("Failed to read inference response: {}", e)))?;

    if !status.is_success() {
      return Err(LearnError::unreachable(format!("HTTP {} from inference hub: {}", status, text)));
    }

    Ok(text)
  }
}

#[async_trait]
impl ContentProvider for HuggingFaceProvider {
  fn name(&self) -> &str {
    "huggingface"
  }

  async fn generate_lesson(&self, request: &LessonRequest) -> Result<String> {
    let prompt = prompt::lesson_completion_prompt(request);
    self.infer(&prompt, HfParameters::lesson()).await
  }

  async fn chat(&self, message: &str, history: &[ChatMessage]) -> Result<String> {
    let prompt = prompt::chat_completion_prompt(message, history);
    self.infer(&prompt, HfParameters::chat()).await
  }

  async fn generate_quiz(&self, lesson: &LessonRecord, questions: usize) -> Result<String> {
    let prompt = prompt::quiz_completion_prompt(lesson, questions);
    self.infer(&prompt, HfParameters::lesson()).await
  }

  /// Runs a translation model picked from the language pair instead of the
  /// configured model.
  async fn translate(&self, request: &TranslationRequest) -> Result<TranslationResponse> {
    let source = request
      .source_language
      .as_deref()
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .unwrap_or("en")
      .to_lowercase();
    let target = request.target_language.trim().to_lowercase();

    let url = format!("{}/models/{}", self.base, translation_model(&source, &target));
    let body = self
      .infer_at(&url, &request.text, HfParameters::translation(&request.text))
      .await?;

    Ok(TranslationResponse {
      translated_text: normalize::translation_from_response(&body)?,
      source_language: source,
      target_language: target,
    })
  }

  async fn health(&self) -> Result<HealthStatus> {
    let response = self
      .authorize(self.client.get(&self.model_url))
      .send()
      .await
      .map_err(|e| LearnError::unreachable(format!("Request to {} failed: {}", self.model_url, e)))?;

    if !response.status().is_success() {
      return Err(LearnError::unreachable(format!(
        "HTTP {} from inference hub",
        response.status()
      )));
    }

    Ok(HealthStatus {
      status: "ok".to_string(),
      model: self.model.clone(),
    })
  }
}

fn translation_model(source: &str, target: &str) -> String {
  match (source, target) {
    ("en", t) if OPUS_LANGUAGES.contains(&t) => format!("Helsinki-NLP/opus-mt-en-{}", t),
    (s, "en") if OPUS_LANGUAGES.contains(&s) => format!("Helsinki-NLP/opus-mt-{}-en", s),
    _ => MANY_TO_MANY_MODEL.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::learn::types::{Category, Difficulty};
  use serde_json::json;
  use wiremock::matchers::{body_partial_json, header, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  const MODEL: &str = "microsoft/DialoGPT-medium";

  #[tokio::test]
  async fn test_chat_sends_bearer_token_and_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path(format!("/models/{}", MODEL)))
      .and(header("authorization", "Bearer hf_secret"))
      .and(body_partial_json(json!({
        "inputs": "Human: What is rain?\nAssistant:",
        "parameters": {"max_length": 200}
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
        "generated_text": "Human: What is rain?\nAssistant: Water falling from clouds."
      }])))
      .expect(1)
      .mount(&server)
      .await;

    let provider =
      HuggingFaceProvider::new(&server.uri(), MODEL, Some("hf_secret".to_string())).unwrap();
    let body = provider.chat("What is rain?", &[]).await.unwrap();

    assert_eq!(
      normalize::chat_reply_from_response(&body).unwrap(),
      "Water falling from clouds."
    );
  }

  #[tokio::test]
  async fn test_lesson_prose_is_normalized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path(format!("/models/{}", MODEL)))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "generated_text": "Title: Clouds\nClouds form when vapor condenses."
      })))
      .mount(&server)
      .await;

    let provider = HuggingFaceProvider::new(&server.uri(), MODEL, None).unwrap();
    let request = LessonRequest::new("Clouds", Difficulty::Beginner, Category::Stem);
    let body = provider.generate_lesson(&request).await.unwrap();
    let lesson = normalize::lesson_from_response(&body, &request).unwrap();

    assert_eq!(lesson.title, "Clouds");
  }

  #[tokio::test]
  async fn test_health_failure_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path(format!("/models/{}", MODEL)))
      .respond_with(ResponseTemplate::new(401))
      .mount(&server)
      .await;

    let provider = HuggingFaceProvider::new(&server.uri(), MODEL, None).unwrap();
    assert!(matches!(
      provider.health().await,
      Err(LearnError::ProviderUnreachable(_))
    ));
  }

  #[test]
  fn test_translation_model_by_language_pair() {
    assert_eq!(translation_model("en", "es"), "Helsinki-NLP/opus-mt-en-es");
    assert_eq!(translation_model("fr", "en"), "Helsinki-NLP/opus-mt-fr-en");
    assert_eq!(translation_model("en", "ja"), MANY_TO_MANY_MODEL);
    assert_eq!(translation_model("es", "fr"), MANY_TO_MANY_MODEL);
  }

  #[tokio::test]
  async fn test_translate_uses_pair_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/models/Helsinki-NLP/opus-mt-en-fr"))
      .and(body_partial_json(json!({
        "inputs": "Good morning",
        "parameters": {"max_length": 100}
      })))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!([{"translation_text": "Bonjour"}])),
      )
      .expect(1)
      .mount(&server)
      .await;

    let provider = HuggingFaceProvider::new(&server.uri(), MODEL, None).unwrap();
    let response = provider
      .translate(&TranslationRequest::new("Good morning", "FR"))
      .await
      .unwrap();

    assert_eq!(response.translated_text, "Bonjour");
    assert_eq!(response.source_language, "en");
    assert_eq!(response.target_language, "fr");
  }

  #[tokio::test]
  async fn test_translate_failure_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path(format!("/models/{}", MANY_TO_MANY_MODEL)))
      .respond_with(ResponseTemplate::new(503))
      .mount(&server)
      .await;

    let provider = HuggingFaceProvider::new(&server.uri(), MODEL, None).unwrap();
    let request = TranslationRequest {
      source_language: Some("ja".to_string()),
      ..TranslationRequest::new("konnichiwa", "en")
    };
    assert!(matches!(
      provider.translate(&request).await,
      Err(LearnError::ProviderUnreachable(_))
    ));
  }

  #[tokio::test]
  async fn test_quiz_prompt_goes_to_configured_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path(format!("/models/{}", MODEL)))
      .and(body_partial_json(json!({"parameters": {"max_length": 1000}})))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
        "generated_text": "{\"questions\": [{\"question\": \"What pulls tides?\", \"options\": [\"Moon\", \"Wind\"], \"correctAnswer\": 0}]}"
      }])))
      .expect(1)
      .mount(&server)
      .await;

    let provider = HuggingFaceProvider::new(&server.uri(), MODEL, None).unwrap();
    let lesson = LessonRecord {
      id: "l1".to_string(),
      title: "Tides".to_string(),
      category: Category::OurWorld,
      difficulty: Difficulty::Beginner,
      content: "The Moon pulls the sea.".to_string(),
      activities: vec![],
      key_points: vec![],
      estimated_duration: 15,
      created_at: None,
      cached_at: chrono::Utc::now(),
    };
    let body = provider.generate_quiz(&lesson, 1).await.unwrap();
    let questions = normalize::quiz_from_response(&body, 1).unwrap();
    assert_eq!(questions[0].options[0], "Moon");
  }
}
