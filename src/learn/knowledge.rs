//! Keyword-matched tutoring replies used while no provider can be reached.

use super::fallback::OFFLINE_CHAT_REPLY;

struct Subject {
  name: &'static str,
  /// Word prefixes that select this subject
  keywords: &'static [&'static str],
  topics: &'static [&'static str],
}

const SUBJECTS: &[Subject] = &[
  Subject {
    name: "mathematics",
    keywords: &["math", "algebra", "geometry", "calculus", "arithmetic"],
    topics: &["arithmetic", "algebra", "geometry", "calculus"],
  },
  Subject {
    name: "science",
    keywords: &["science", "biology", "chemistry", "physics"],
    topics: &["biology", "chemistry", "physics", "earth science"],
  },
  Subject {
    name: "history",
    keywords: &["history"],
    topics: &["ancient", "medieval", "modern", "contemporary"],
  },
  Subject {
    name: "language arts",
    keywords: &["english", "grammar", "literature", "reading", "writing"],
    topics: &["reading", "writing", "grammar", "literature"],
  },
];

const EXPLANATIONS: &[(&str, &str)] = &[
  (
    "photosynthesis",
    "Photosynthesis is the process plants use to make food from sunlight, water, and carbon dioxide. The green chlorophyll in leaves captures sunlight energy, which combines water from the roots and CO2 from the air to create glucose (sugar) and oxygen. This is why plants are so important - they make the oxygen we breathe!",
  ),
  (
    "gravity",
    "Gravity is the force that pulls objects toward each other. On Earth, gravity pulls everything toward the center of our planet, which is why things fall down instead of floating away. The bigger an object is, the stronger its gravitational pull. That's why the Moon orbits Earth, and Earth orbits the Sun!",
  ),
  (
    "democracy",
    "Democracy is a system of government where people have the power to choose their leaders through voting. In a democracy, citizens elect representatives who make decisions on their behalf. Key principles include equal rights, free elections, and the rule of law. This gives people a voice in how their country is run.",
  ),
];

const QUESTION_WORDS: &[&str] = &["what", "how", "why"];
const LESSON_WORDS: &[&str] = &["lesson", "teach", "learn"];
const GREETINGS: &[&str] = &["hello", "hi", "hey"];

const OPEN_QUESTION_REPLY: &str = "That's a great question! While I don't have a specific explanation ready, I'd be happy to help you explore this topic. Would you like me to create a lesson about it, or do you have more specific questions I can help with?";

const LESSON_SUGGESTION_REPLY: &str = "I'd love to create a lesson for you! To make the best lesson possible, could you tell me:\n\n1. What topic you'd like to learn about\n2. Your current level (beginner, intermediate, or advanced)\n3. How much time you have (15, 30, or 45 minutes)\n\nI can create engaging lessons with activities and key points to help you learn effectively!";

const GREETING_REPLY: &str = "Hello! I'm your offline learning assistant. I can help you with math, science, history, language arts, and more. What would you like to learn about today?";

/// Reply to `message` from the built-in knowledge base.
///
/// Checked in order: a known concept, a school subject, an open question, a
/// lesson request, a greeting. Anything else gets [`OFFLINE_CHAT_REPLY`].
pub fn offline_reply(message: &str) -> String {
  let lower = message.to_lowercase();
  let words: Vec<&str> = lower
    .split(|c: char| !c.is_alphanumeric())
    .filter(|w| !w.is_empty())
    .collect();

  if let Some((_, explanation)) = EXPLANATIONS
    .iter()
    .find(|(concept, _)| has_prefix(&words, &[*concept]))
  {
    return explanation.to_string();
  }

  if let Some(subject) = SUBJECTS.iter().find(|s| has_prefix(&words, s.keywords)) {
    return format!(
      "Great! I can help you with {}. Some key areas include: {}. What specific topic would you like to explore? I can create a lesson or answer questions about any of these areas.",
      subject.name,
      subject.topics[..3].join(", ")
    );
  }

  if has_word(&words, QUESTION_WORDS) {
    return OPEN_QUESTION_REPLY.to_string();
  }
  if has_prefix(&words, LESSON_WORDS) {
    return LESSON_SUGGESTION_REPLY.to_string();
  }
  if has_word(&words, GREETINGS) {
    return GREETING_REPLY.to_string();
  }

  OFFLINE_CHAT_REPLY.to_string()
}

fn has_word(words: &[&str], candidates: &[&str]) -> bool {
  words.iter().any(|w| candidates.contains(w))
}

fn has_prefix(words: &[&str], prefixes: &[&str]) -> bool {
  words
    .iter()
    .any(|w| prefixes.iter().any(|p| w.starts_with(p)))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_known_concept_is_explained() {
    let reply = offline_reply("Why does GRAVITY exist?");
    assert!(reply.starts_with("Gravity is the force"));
  }

  #[test]
  fn test_subject_lists_topics() {
    let reply = offline_reply("I need help with mathematics homework");
    assert!(reply.contains("help you with mathematics"));
    assert!(reply.contains("arithmetic, algebra, geometry"));

    let reply = offline_reply("chemistry is hard");
    assert!(reply.contains("help you with science"));
  }

  #[test]
  fn test_questions_lessons_and_greetings() {
    assert_eq!(offline_reply("How do volcanoes erupt?"), OPEN_QUESTION_REPLY);
    assert_eq!(offline_reply("Can you teach me about volcanoes"), LESSON_SUGGESTION_REPLY);
    assert_eq!(offline_reply("hey there"), GREETING_REPLY);
  }

  #[test]
  fn test_greeting_needs_a_whole_word() {
    // "this" and "which" contain "hi"
    assert_eq!(offline_reply("this one, which one"), OFFLINE_CHAT_REPLY);
  }

  #[test]
  fn test_unmatched_message_gets_offline_notice() {
    assert_eq!(offline_reply("volcanoes"), OFFLINE_CHAT_REPLY);
    assert_eq!(offline_reply(""), OFFLINE_CHAT_REPLY);
  }
}
