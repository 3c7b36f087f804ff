use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LearnError, Result};

/// Lesson subject area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
  Stem,
  CreativeArts,
  OurWorld,
}

impl Category {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Stem => "stem",
      Self::CreativeArts => "creative-arts",
      Self::OurWorld => "our-world",
    }
  }

  /// Long form used in generation prompts
  pub fn description(&self) -> &'static str {
    match self {
      Self::Stem => "Science, Technology, Engineering, and Mathematics",
      Self::CreativeArts => {
        "Creative Arts including visual arts, music, writing, and performing arts"
      }
      Self::OurWorld => "Social Studies, Geography, History, and Current Events",
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
  Beginner,
  Intermediate,
  Advanced,
}

impl Difficulty {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Beginner => "beginner",
      Self::Intermediate => "intermediate",
      Self::Advanced => "advanced",
    }
  }

  /// Audience guidance used in generation prompts
  pub fn instructions(&self) -> &'static str {
    match self {
      Self::Beginner => {
        "Use simple language, basic concepts, and include lots of examples. Suitable for ages 8-12."
      }
      Self::Intermediate => {
        "Use moderate complexity, introduce some technical terms with explanations. Suitable for ages 13-16."
      }
      Self::Advanced => "Use sophisticated language and complex concepts. Suitable for ages 17+.",
    }
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A generated lesson as stored in the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonRecord {
  pub id: String,
  pub title: String,
  pub category: Category,
  pub difficulty: Difficulty,
  pub content: String,
  pub activities: Vec<String>,
  pub key_points: Vec<String>,
  pub estimated_duration: u32,
  /// Generation time; kept across overwrites once known
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
  /// Time of the latest write into the cache
  pub cached_at: DateTime<Utc>,
}

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
  pub id: String,
  pub text: String,
  pub is_user: bool,
  pub timestamp: DateTime<Utc>,
}

/// A conversation as stored in the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRecord {
  pub id: String,
  pub messages: Vec<ChatMessage>,
  pub last_updated: DateTime<Utc>,
}

impl ChatRecord {
  pub fn new(id: impl Into<String>, now: DateTime<Utc>) -> Self {
    Self {
      id: id.into(),
      messages: Vec::new(),
      last_updated: now,
    }
  }

  /// Append a message in conversation order.
  ///
  /// Rejects a message whose id is already in this chat. `last_updated`
  /// only ever moves forward.
  pub fn push(&mut self, message: ChatMessage) -> Result<()> {
    if self.messages.iter().any(|m| m.id == message.id) {
      return Err(LearnError::validation(format!(
        "message {} already exists in chat {}",
        message.id, self.id
      )));
    }
    if message.timestamp > self.last_updated {
      self.last_updated = message.timestamp;
    }
    self.messages.push(message);
    Ok(())
  }

  /// Check that message ids are unique.
  pub fn validate(&self) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for message in &self.messages {
      if !seen.insert(message.id.as_str()) {
        return Err(LearnError::validation(format!(
          "duplicate message id {} in chat {}",
          message.id, self.id
        )));
      }
    }
    Ok(())
  }
}

/// Parameters of a lesson generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonRequest {
  pub topic: String,
  pub difficulty: Difficulty,
  pub category: Category,
  /// Minutes; 15 when unset
  pub duration: Option<u32>,
  /// English when unset
  pub language: Option<String>,
}

impl LessonRequest {
  pub const DEFAULT_DURATION: u32 = 15;

  pub fn new(topic: impl Into<String>, difficulty: Difficulty, category: Category) -> Self {
    Self {
      topic: topic.into(),
      difficulty,
      category,
      duration: None,
      language: None,
    }
  }

  pub fn with_duration(mut self, minutes: u32) -> Self {
    self.duration = Some(minutes);
    self
  }

  pub fn duration_or_default(&self) -> u32 {
    self.duration.unwrap_or(Self::DEFAULT_DURATION)
  }

  pub fn language_or_default(&self) -> &str {
    self.language.as_deref().unwrap_or("English")
  }

  /// Topic with surrounding whitespace removed
  pub fn topic(&self) -> &str {
    self.topic.trim()
  }

  pub fn validate(&self) -> Result<()> {
    if self.topic().is_empty() {
      return Err(LearnError::validation("topic must not be empty"));
    }
    if self.duration == Some(0) {
      return Err(LearnError::validation("duration must be positive"));
    }
    Ok(())
  }
}

/// Per-lesson learner progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
  pub completed: bool,
  /// Seconds spent in the lesson
  pub time_spent: u64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub score: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub completed_at: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_updated: Option<DateTime<Utc>>,
}

/// One multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
  pub question: String,
  pub options: Vec<String>,
  /// Index into `options`
  pub correct_answer: usize,
  pub explanation: String,
}

/// Questions about a cached lesson
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
  pub lesson_id: String,
  pub questions: Vec<QuizQuestion>,
}

impl Quiz {
  pub const DEFAULT_QUESTIONS: usize = 5;
}

/// Health of a provider backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
  pub status: String,
  pub model: String,
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{Duration, TimeZone};

  fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 10, minute, 0).unwrap()
  }

  fn message(id: &str, minute: u32) -> ChatMessage {
    ChatMessage {
      id: id.to_string(),
      text: "hi".to_string(),
      is_user: true,
      timestamp: at(minute),
    }
  }

  #[test]
  fn test_category_wire_names() {
    assert_eq!(
      serde_json::to_string(&Category::CreativeArts).unwrap(),
      "\"creative-arts\""
    );
    let parsed: Category = serde_json::from_str("\"our-world\"").unwrap();
    assert_eq!(parsed, Category::OurWorld);
  }

  #[test]
  fn test_lesson_serializes_camel_case() {
    let lesson = LessonRecord {
      id: "l1".to_string(),
      title: "Fractions".to_string(),
      category: Category::Stem,
      difficulty: Difficulty::Beginner,
      content: "# Fractions".to_string(),
      activities: vec!["Cut a pizza".to_string()],
      key_points: vec!["Parts of a whole".to_string()],
      estimated_duration: 15,
      created_at: Some(at(0)),
      cached_at: at(1),
    };
    let json = serde_json::to_value(&lesson).unwrap();
    assert!(json.get("keyPoints").is_some());
    assert!(json.get("estimatedDuration").is_some());
    assert!(json.get("cachedAt").is_some());
  }

  #[test]
  fn test_push_rejects_duplicate_message_id() {
    let mut chat = ChatRecord::new("c1", at(0));
    chat.push(message("m1", 1)).unwrap();
    let err = chat.push(message("m1", 2)).unwrap_err();
    assert!(matches!(err, LearnError::Validation(_)));
    assert_eq!(chat.messages.len(), 1);
  }

  #[test]
  fn test_last_updated_never_moves_back() {
    let mut chat = ChatRecord::new("c1", at(5));
    chat.push(message("m1", 3)).unwrap();
    assert_eq!(chat.last_updated, at(5));
    chat.push(message("m2", 7)).unwrap();
    assert_eq!(chat.last_updated, at(7));
    assert_eq!(chat.last_updated - at(5), Duration::minutes(2));
  }

  #[test]
  fn test_request_validation() {
    assert!(LessonRequest::new("  ", Difficulty::Beginner, Category::Stem)
      .validate()
      .is_err());
    assert!(
      LessonRequest::new("Volcanoes", Difficulty::Beginner, Category::Stem)
        .with_duration(0)
        .validate()
        .is_err()
    );
    assert!(
      LessonRequest::new("Volcanoes", Difficulty::Beginner, Category::Stem)
        .validate()
        .is_ok()
    );
  }
}
