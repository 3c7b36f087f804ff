//! Placeholder content served when no provider can answer.

use chrono::{DateTime, Utc};

use super::types::{LessonRecord, LessonRequest, QuizQuestion};

/// Reply used offline when the knowledge base has nothing better.
pub const OFFLINE_CHAT_REPLY: &str = "I'm currently offline, but I can still help with basic questions using cached knowledge. For new lesson generation, please connect to the internet and make sure your learning server is running.";

/// Reply used when the selected provider failed.
pub const UNREACHABLE_CHAT_REPLY: &str = "I'm having trouble connecting to the learning model. Please make sure your learning server is running and accessible.";

const FALLBACK_KEY_POINTS: &[&str] = &[
  "Basic understanding",
  "Practical application",
  "Real-world relevance",
];

/// Wrong options offered next to a key point
const DISTRACTORS: &[&str] = &[
  "Memorizing facts without understanding them",
  "Skipping the practice activities",
  "Avoiding real-world examples",
];

/// Fixed-shape lesson for `request`.
///
/// Everything but `id` and the timestamps is a pure function of the request.
pub fn fallback_lesson(request: &LessonRequest, id: String, now: DateTime<Utc>) -> LessonRecord {
  let topic = request.topic();

  LessonRecord {
    id,
    title: format!("{} - {} Level", topic, capitalize(request.difficulty.as_str())),
    category: request.category,
    difficulty: request.difficulty,
    content: format!(
      "# {topic}\n\n\
       This lesson covers the fundamentals of {topic}. Full content will be generated by your learning model when the server is available.\n\n\
       ## Key Concepts\n\n\
       - Understanding the basics\n\
       - Practical applications\n\
       - Real-world examples\n\n\
       ## Activities\n\n\
       1. Research and discuss\n\
       2. Create examples\n\
       3. Apply knowledge"
    ),
    activities: vec![
      "Research the topic online".to_string(),
      "Discuss with classmates".to_string(),
      "Create practical examples".to_string(),
    ],
    key_points: FALLBACK_KEY_POINTS.iter().map(|p| p.to_string()).collect(),
    estimated_duration: request.duration_or_default(),
    created_at: Some(now),
    cached_at: now,
  }
}

/// Questions built from the lesson's key points, at most `questions` of them.
///
/// Each question asks which option is a key point of the lesson. The answer's
/// position rotates so it is not always the first option.
pub fn fallback_quiz(lesson: &LessonRecord, questions: usize) -> Vec<QuizQuestion> {
  let own: Vec<&str> = lesson
    .key_points
    .iter()
    .map(|p| p.trim())
    .filter(|p| !p.is_empty())
    .collect();
  let points = if own.is_empty() {
    FALLBACK_KEY_POINTS.to_vec()
  } else {
    own
  };

  points
    .into_iter()
    .take(questions)
    .enumerate()
    .map(|(i, point)| {
      let mut options: Vec<String> = DISTRACTORS.iter().map(|d| d.to_string()).collect();
      let correct_answer = i % (options.len() + 1);
      options.insert(correct_answer, point.to_string());

      QuizQuestion {
        question: format!("Which of these is a key point of \"{}\"?", lesson.title),
        options,
        correct_answer,
        explanation: format!("\"{}\" is one of the key points of this lesson.", point),
      }
    })
    .collect()
}

fn capitalize(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::learn::types::{Category, Difficulty};

  #[test]
  fn test_fallback_shape() {
    let request = LessonRequest::new(" Water Cycle ", Difficulty::Beginner, Category::Stem)
      .with_duration(15);
    let lesson = fallback_lesson(&request, "fallback-1".to_string(), Utc::now());

    assert_eq!(lesson.title, "Water Cycle - Beginner Level");
    assert!(lesson.content.starts_with("# Water Cycle\n"));
    assert_eq!(lesson.estimated_duration, 15);
    assert_eq!(lesson.activities.len(), 3);
    assert_eq!(lesson.category, Category::Stem);
  }

  #[test]
  fn test_fallback_is_deterministic_apart_from_identity() {
    let request = LessonRequest::new("Volcanoes", Difficulty::Advanced, Category::OurWorld);
    let now = Utc::now();
    let a = fallback_lesson(&request, "a".to_string(), now);
    let b = fallback_lesson(&request, "b".to_string(), now);

    assert_eq!(LessonRecord { id: "b".to_string(), ..a }, b);
    assert_eq!(b.estimated_duration, LessonRequest::DEFAULT_DURATION);
  }

  #[test]
  fn test_fallback_quiz_from_key_points() {
    let request = LessonRequest::new("Tides", Difficulty::Beginner, Category::OurWorld);
    let mut lesson = fallback_lesson(&request, "l1".to_string(), Utc::now());
    lesson.key_points = vec![
      "The Moon pulls the sea".to_string(),
      " ".to_string(),
      "Two tides a day".to_string(),
    ];

    let quiz = fallback_quiz(&lesson, 5);
    assert_eq!(quiz.len(), 2);
    assert_eq!(quiz[0].correct_answer, 0);
    assert_eq!(quiz[1].correct_answer, 1);
    assert_eq!(quiz[1].options[1], "Two tides a day");
    assert!(quiz.iter().all(|q| q.options.len() == 4));

    assert_eq!(fallback_quiz(&lesson, 1).len(), 1);
  }

  #[test]
  fn test_fallback_quiz_without_key_points() {
    let request = LessonRequest::new("Tides", Difficulty::Beginner, Category::OurWorld);
    let mut lesson = fallback_lesson(&request, "l1".to_string(), Utc::now());
    lesson.key_points.clear();

    let quiz = fallback_quiz(&lesson, 5);
    assert_eq!(quiz.len(), FALLBACK_KEY_POINTS.len());
    assert_eq!(quiz[2].options[2], "Real-world relevance");
  }
}
