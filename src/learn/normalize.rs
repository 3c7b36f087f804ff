//! Normalization of provider responses into lessons and chat replies.
//!
//! Parsing runs in two stages. The envelope stage pulls the payload out of
//! whatever the provider wrapped it in (the LearnLocal server double-encodes
//! the lesson as a JSON string inside `response`). The payload stage accepts
//! a JSON lesson, a JSON lesson embedded in prose, or plain prose. Quizzes
//! and translations reuse the envelope stage.

use serde_json::{Map, Value};

use super::api_types::{ApiLesson, ApiQuiz};
use super::types::{LessonRequest, QuizQuestion};
use crate::error::{LearnError, Result};

/// Envelope fields that may carry the payload, in lookup order.
const PAYLOAD_FIELDS: &[&str] = &[
  "response",
  "content",
  "message",
  "generated_text",
  "translation_text",
  "text",
];

const TITLE_HEADERS: &[&str] = &["title", "lesson"];
const KEY_POINT_HEADERS: &[&str] = &["key points", "key point", "learning points", "learning point"];
const ACTIVITY_HEADERS: &[&str] = &["activities", "activity"];

const MAX_SECTION_ITEMS: usize = 5;

/// Lesson fields recovered from a provider response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedLesson {
  pub title: String,
  pub content: String,
  pub activities: Vec<String>,
  pub key_points: Vec<String>,
  pub estimated_duration: u32,
}

#[derive(Debug)]
enum Payload {
  Text(String),
  Object(Map<String, Value>),
}

/// Parse a lesson-generation response body.
pub fn lesson_from_response(body: &str, request: &LessonRequest) -> Result<NormalizedLesson> {
  match unwrap_envelope(body)? {
    Payload::Object(map) => {
      let lesson: ApiLesson = serde_json::from_value(Value::Object(map))
        .map_err(|e| LearnError::malformed(format!("Invalid lesson object: {}", e)))?;
      from_api_lesson(lesson, request)
    }
    Payload::Text(text) => lesson_from_text(&text, request),
  }
}

/// Parse a chat response body into the assistant's reply text.
pub fn chat_reply_from_response(body: &str) -> Result<String> {
  match unwrap_envelope(body)? {
    Payload::Text(text) => Ok(assistant_turn(&text)),
    Payload::Object(_) => Err(LearnError::malformed("Expected a text reply, got an object")),
  }
}

/// Parse a translation response body into the translated text.
pub fn translation_from_response(body: &str) -> Result<String> {
  match unwrap_envelope(body)? {
    Payload::Text(text) => Ok(text.trim().to_string()),
    Payload::Object(_) => Err(LearnError::malformed("Expected translated text, got an object")),
  }
}

/// Parse a quiz response body, keeping at most `max_questions` usable questions.
///
/// A question is usable when it has text, at least two options and an answer
/// index inside them. Unusable questions are dropped; none usable is an error.
pub fn quiz_from_response(body: &str, max_questions: usize) -> Result<Vec<QuizQuestion>> {
  let value = match serde_json::from_str::<Value>(body.trim()) {
    Ok(Value::Object(map)) if map.contains_key("questions") => Value::Object(map),
    _ => match unwrap_envelope(body)? {
      Payload::Object(map) => Value::Object(map),
      Payload::Text(text) => quiz_value_from_text(&text)?,
    },
  };

  let quiz: ApiQuiz = match value {
    Value::Array(items) => ApiQuiz {
      questions: serde_json::from_value(Value::Array(items))
        .map_err(|e| LearnError::malformed(format!("Invalid quiz questions: {}", e)))?,
    },
    other => serde_json::from_value(other)
      .map_err(|e| LearnError::malformed(format!("Invalid quiz object: {}", e)))?,
  };

  let questions: Vec<QuizQuestion> = quiz
    .questions
    .into_iter()
    .filter_map(|q| {
      let question = q.question.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
      let options = clean_items(q.options);
      let correct_answer = q.correct_answer.filter(|i| *i < options.len())?;
      (options.len() >= 2).then(|| QuizQuestion {
        question,
        options,
        correct_answer,
        explanation: q.explanation.unwrap_or_default().trim().to_string(),
      })
    })
    .take(max_questions)
    .collect();

  if questions.is_empty() {
    return Err(LearnError::malformed("Quiz has no usable questions"));
  }
  Ok(questions)
}

fn quiz_value_from_text(text: &str) -> Result<Value> {
  let trimmed = text.trim();
  if let Ok(value @ (Value::Object(_) | Value::Array(_))) = serde_json::from_str::<Value>(trimmed) {
    return Ok(value);
  }
  outermost_object(trimmed)
    .and_then(|span| serde_json::from_str::<Value>(span).ok())
    .ok_or_else(|| LearnError::malformed("No quiz found in response text"))
}

fn unwrap_envelope(body: &str) -> Result<Payload> {
  let trimmed = body.trim();
  if trimmed.is_empty() {
    return Err(LearnError::malformed("Empty response body"));
  }

  let value: Value = match serde_json::from_str(trimmed) {
    Ok(value) => value,
    // Not JSON at all: the body is the payload
    Err(_) => return Ok(Payload::Text(trimmed.to_string())),
  };

  match value {
    Value::Object(map) => payload_from_object(map),
    Value::Array(items) => match items.into_iter().next() {
      Some(Value::Object(map)) => payload_from_object(map),
      Some(Value::String(text)) => non_empty_text(text),
      _ => Err(LearnError::malformed("Empty or unrecognized array body")),
    },
    Value::String(text) => non_empty_text(text),
    other => Err(LearnError::malformed(format!("Unexpected JSON body: {}", other))),
  }
}

fn payload_from_object(map: Map<String, Value>) -> Result<Payload> {
  if looks_like_lesson(&map) {
    return Ok(Payload::Object(map));
  }

  for field in PAYLOAD_FIELDS {
    match map.get(*field) {
      Some(Value::String(text)) if !text.trim().is_empty() => {
        return Ok(Payload::Text(text.clone()));
      }
      Some(Value::Object(inner)) => return Ok(Payload::Object(inner.clone())),
      _ => {}
    }
  }

  Err(LearnError::malformed("Envelope carries no response payload"))
}

fn looks_like_lesson(map: &Map<String, Value>) -> bool {
  map.contains_key("title")
    && (map.contains_key("content")
      || map.contains_key("activities")
      || map.contains_key("keyPoints"))
}

fn non_empty_text(text: String) -> Result<Payload> {
  if text.trim().is_empty() {
    Err(LearnError::malformed("Empty response text"))
  } else {
    Ok(Payload::Text(text))
  }
}

fn lesson_from_text(text: &str, request: &LessonRequest) -> Result<NormalizedLesson> {
  let trimmed = text.trim();

  // The whole payload is a lesson object
  if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
    let lesson: ApiLesson = serde_json::from_value(Value::Object(map))
      .map_err(|e| LearnError::malformed(format!("Invalid lesson object: {}", e)))?;
    return from_api_lesson(lesson, request);
  }

  // A lesson object wrapped in prose
  if let Some(span) = outermost_object(trimmed) {
    if let Ok(lesson) = serde_json::from_str::<ApiLesson>(span) {
      if let Ok(normalized) = from_api_lesson(lesson, request) {
        return Ok(normalized);
      }
    }
  }

  Ok(lesson_from_prose(trimmed, request))
}

fn from_api_lesson(lesson: ApiLesson, request: &LessonRequest) -> Result<NormalizedLesson> {
  let estimated_duration = lesson
    .duration_minutes()
    .unwrap_or_else(|| request.duration_or_default());

  let content = lesson
    .content
    .filter(|c| !c.trim().is_empty())
    .ok_or_else(|| LearnError::malformed("Lesson object has no content"))?;

  let title = lesson
    .title
    .map(|t| t.trim().to_string())
    .filter(|t| !t.is_empty())
    .unwrap_or_else(|| default_title(request));

  Ok(NormalizedLesson {
    title,
    content,
    activities: clean_items(lesson.activities.unwrap_or_default()),
    key_points: clean_items(lesson.key_points.unwrap_or_default()),
    estimated_duration,
  })
}

fn lesson_from_prose(text: &str, request: &LessonRequest) -> NormalizedLesson {
  let lines: Vec<&str> = text.lines().collect();

  let title = lines
    .iter()
    .find_map(|line| header_value(line, TITLE_HEADERS).filter(|t| !t.is_empty()))
    .map(str::to_string)
    .unwrap_or_else(|| default_title(request));

  let mut key_points = section_items(&lines, KEY_POINT_HEADERS);
  if key_points.is_empty() {
    key_points = placeholder(&[
      "Understanding the fundamentals",
      "Practical applications",
      "Real-world relevance",
    ]);
  }

  let mut activities = section_items(&lines, ACTIVITY_HEADERS);
  if activities.is_empty() {
    activities = placeholder(&[
      "Discuss the main concepts with a partner",
      "Create a mind map of key ideas",
      "Apply the concepts to a real-world scenario",
    ]);
  }

  NormalizedLesson {
    title,
    content: text.to_string(),
    activities,
    key_points,
    estimated_duration: request.duration_or_default(),
  }
}

fn default_title(request: &LessonRequest) -> String {
  format!("{} Lesson", request.topic())
}

fn placeholder(items: &[&str]) -> Vec<String> {
  items.iter().map(|s| s.to_string()).collect()
}

fn clean_items(items: Vec<String>) -> Vec<String> {
  items
    .into_iter()
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty())
    .collect()
}

/// Span from the first `{` to the last `}`.
fn outermost_object(text: &str) -> Option<&str> {
  let start = text.find('{')?;
  let end = text.rfind('}')?;
  (end > start).then(|| &text[start..=end])
}

/// Value after a `Name:` header, tolerating markdown emphasis and headings.
fn header_value<'a>(line: &'a str, names: &[&str]) -> Option<&'a str> {
  let cleaned = line
    .trim()
    .trim_start_matches(|c: char| c == '#' || c == '*')
    .trim_start();

  names.iter().find_map(|name| {
    let head = cleaned.get(..name.len())?;
    if !head.eq_ignore_ascii_case(name) {
      return None;
    }
    let rest = cleaned[name.len()..].trim_start_matches('*');
    let value = rest.strip_prefix(':')?;
    Some(value.trim().trim_matches('*').trim())
  })
}

fn is_header(line: &str) -> bool {
  [TITLE_HEADERS, KEY_POINT_HEADERS, ACTIVITY_HEADERS]
    .iter()
    .any(|names| header_value(line, names).is_some())
}

fn section_items(lines: &[&str], names: &[&str]) -> Vec<String> {
  let Some(start) = lines.iter().position(|l| header_value(l, names).is_some()) else {
    return Vec::new();
  };

  let mut items = Vec::new();
  if let Some(inline) = header_value(lines[start], names).filter(|v| !v.is_empty()) {
    items.push(inline.to_string());
  }

  for line in &lines[start + 1..] {
    let trimmed = line.trim();
    if trimmed.is_empty() {
      if items.is_empty() {
        continue;
      }
      break;
    }
    if is_header(trimmed) {
      break;
    }
    let item = strip_bullet(trimmed);
    if !item.is_empty() {
      items.push(item.to_string());
    }
  }

  items.truncate(MAX_SECTION_ITEMS);
  items
}

fn strip_bullet(line: &str) -> &str {
  let line = line
    .trim_start_matches(|c: char| c == '-' || c == '*' || c == '•')
    .trim_start();

  let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
  if digits > 0 {
    let rest = &line[digits..];
    if let Some(item) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
      return item.trim_start();
    }
  }
  line
}

/// Reply text, cut down to the last assistant turn when a transcript is echoed.
fn assistant_turn(text: &str) -> String {
  let trimmed = text.trim();
  let Some(idx) = trimmed.rfind("Assistant:") else {
    return trimmed.to_string();
  };

  let after = &trimmed[idx + "Assistant:".len()..];
  let reply = after.split("Human:").next().unwrap_or(after).trim();
  if reply.is_empty() {
    trimmed.to_string()
  } else {
    reply.to_string()
  }
}
