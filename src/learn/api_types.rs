//! Wire types for the provider HTTP contracts.
//!
//! These mirror what backends send and expect. Normalized domain types live
//! in `types.rs`.

use serde::{Deserialize, Serialize};

// ============================================================================
// LearnLocal server contract
// ============================================================================

/// Body of `POST /api/chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequestBody<'a> {
  pub message: &'a str,
  pub model: &'a str,
}

/// Role of a message in a lesson-generation conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  System,
  Developer,
  User,
  Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
  pub role: Role,
  pub content: String,
}

/// Body of `POST /api/generate-lesson`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLessonBody<'a> {
  pub messages: &'a [PromptMessage],
  pub model: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_tokens: Option<u32>,
}

/// Body of `POST /api/generate-quiz`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizBody<'a> {
  pub conversation: QuizConversation<'a>,
  pub lesson_id: &'a str,
  pub model: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizConversation<'a> {
  pub messages: &'a [PromptMessage],
}

/// Response of `GET /api/health`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiHealthResponse {
  pub status: String,
  #[serde(default)]
  pub model: String,
}

/// Body of `POST /api/translate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRequest {
  pub text: String,
  pub target_language: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source_language: Option<String>,
}

impl TranslationRequest {
  pub fn new(text: impl Into<String>, target_language: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      target_language: target_language.into(),
      source_language: None,
    }
  }
}

/// Response of `POST /api/translate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResponse {
  pub translated_text: String,
  pub source_language: String,
  pub target_language: String,
}

// ============================================================================
// Hugging Face style inference hub
// ============================================================================

/// Body of `POST {base}/models/{model}`
#[derive(Debug, Clone, Serialize)]
pub struct HfGenerateBody<'a> {
  pub inputs: &'a str,
  pub parameters: HfParameters,
}

#[derive(Debug, Clone, Serialize)]
pub struct HfParameters {
  pub max_length: u32,
  pub temperature: f32,
  pub top_p: f32,
  pub do_sample: bool,
  pub num_return_sequences: u32,
}

impl HfParameters {
  pub fn lesson() -> Self {
    Self {
      max_length: 1000,
      temperature: 0.8,
      top_p: 0.9,
      do_sample: true,
      num_return_sequences: 1,
    }
  }

  pub fn chat() -> Self {
    Self {
      max_length: 200,
      temperature: 0.7,
      top_p: 0.9,
      do_sample: true,
      num_return_sequences: 1,
    }
  }

  /// Low temperature, room for twice the source length
  pub fn translation(text: &str) -> Self {
    let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
    Self {
      max_length: chars.saturating_mul(2).max(100),
      temperature: 0.3,
      ..Self::chat()
    }
  }
}

// ============================================================================
// Lesson payload as providers encode it
// ============================================================================

/// A lesson object decoded from a provider, every field optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiLesson {
  pub title: Option<String>,
  pub content: Option<String>,
  pub activities: Option<Vec<String>>,
  pub key_points: Option<Vec<String>>,
  /// Some models emit minutes as a string
  pub estimated_duration: Option<serde_json::Value>,
}

impl ApiLesson {
  pub fn duration_minutes(&self) -> Option<u32> {
    let minutes = match self.estimated_duration.as_ref()? {
      serde_json::Value::Number(n) => n.as_u64().and_then(|m| u32::try_from(m).ok()),
      serde_json::Value::String(s) => s
        .split_whitespace()
        .next()
        .and_then(|m| m.parse().ok()),
      _ => None,
    };
    minutes.filter(|m| *m > 0)
  }
}

// ============================================================================
// Quiz payload as providers encode it
// ============================================================================

/// A quiz as providers encode it; a bare array of questions is accepted too.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiQuiz {
  pub questions: Vec<ApiQuizQuestion>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiQuizQuestion {
  pub question: Option<String>,
  pub options: Vec<String>,
  #[serde(alias = "correct_answer", alias = "answer")]
  pub correct_answer: Option<usize>,
  pub explanation: Option<String>,
}
