//! Prompt construction for lesson generation, quizzes and chat.

use super::api_types::{PromptMessage, Role};
use super::types::{ChatMessage, LessonRecord, LessonRequest};

const SYSTEM_PROMPT: &str = "You are an expert educational content creator specializing in creating engaging, interactive lessons for learners of all ages.";

const QUIZ_SYSTEM_PROMPT: &str =
  "You are an expert quiz creator. Generate engaging, educational quiz questions.";

/// Conversation sent to `POST /api/generate-lesson`.
pub fn lesson_conversation(request: &LessonRequest) -> Vec<PromptMessage> {
  let developer = format!(
    "Create an educational lesson with the following requirements:
- Topic: {topic}
- Category: {category}
- Difficulty: {difficulty} ({instructions})
- Duration: Approximately {duration} minutes
- Language: {language}

Format the response as a JSON object with these fields:
- title: Engaging lesson title
- content: Main lesson content (markdown formatted)
- activities: Array of 3-5 interactive activities
- keyPoints: Array of 3-5 key learning points
- estimatedDuration: Duration in minutes

Make the lesson engaging, interactive, and age-appropriate. Include real-world examples and practical applications.",
    topic = request.topic(),
    category = request.category.description(),
    difficulty = request.difficulty,
    instructions = request.difficulty.instructions(),
    duration = request.duration_or_default(),
    language = request.language_or_default(),
  );

  let user = format!(
    "Please generate a {} level lesson about \"{}\" in the {} category.",
    request.difficulty,
    request.topic(),
    request.category
  );

  vec![
    PromptMessage {
      role: Role::System,
      content: SYSTEM_PROMPT.to_string(),
    },
    PromptMessage {
      role: Role::Developer,
      content: developer,
    },
    PromptMessage {
      role: Role::User,
      content: user,
    },
  ]
}

/// Conversation sent to `POST /api/generate-quiz`.
pub fn quiz_conversation(lesson: &LessonRecord, questions: usize) -> Vec<PromptMessage> {
  let developer = format!(
    "Create a quiz with {questions} multiple choice questions based on the lesson content. \
     Format as JSON with questions array containing: question, options (array of 4), correctAnswer (index), explanation.

{summary}",
    summary = lesson_summary(lesson),
  );

  vec![
    PromptMessage {
      role: Role::System,
      content: QUIZ_SYSTEM_PROMPT.to_string(),
    },
    PromptMessage {
      role: Role::Developer,
      content: developer,
    },
    PromptMessage {
      role: Role::User,
      content: format!("Generate a {}-question quiz for lesson {}.", questions, lesson.id),
    },
  ]
}

/// Plain-text quiz prompt for completion-style models.
pub fn quiz_completion_prompt(lesson: &LessonRecord, questions: usize) -> String {
  format!(
    "{summary}

Write {questions} multiple choice questions about this lesson as JSON:
{{\"questions\": [{{\"question\": \"...\", \"options\": [\"...\", \"...\", \"...\", \"...\"], \"correctAnswer\": 0, \"explanation\": \"...\"}}]}}

Quiz:",
    summary = lesson_summary(lesson),
  )
}

fn lesson_summary(lesson: &LessonRecord) -> String {
  let mut summary = format!(
    "Lesson: {}\nCategory: {}\nDifficulty: {}",
    lesson.title, lesson.category, lesson.difficulty
  );
  if !lesson.key_points.is_empty() {
    summary.push_str("\nKey points:");
    for point in &lesson.key_points {
      summary.push_str(&format!("\n- {}", point));
    }
  }
  summary
}

/// Plain-text lesson prompt for completion-style models.
pub fn lesson_completion_prompt(request: &LessonRequest) -> String {
  format!(
    "Create an educational lesson about {topic} for {difficulty} level students in the {category} category.

Include:
Title: a short lesson title
Key Points: 3-5 bullet points
Activities: 3-5 bullet points

Topic: {topic}
Difficulty: {difficulty}
Category: {category}

Lesson:",
    topic = request.topic(),
    difficulty = request.difficulty,
    category = request.category,
  )
}

/// Transcript-style chat prompt for completion-style models.
pub fn chat_completion_prompt(message: &str, history: &[ChatMessage]) -> String {
  let mut prompt = String::new();
  for turn in history {
    let speaker = if turn.is_user { "Human" } else { "Assistant" };
    prompt.push_str(&format!("{}: {}\n", speaker, turn.text));
  }
  prompt.push_str(&format!("Human: {}\nAssistant:", message));
  prompt
}
