//! Subcommand handlers

use color_eyre::Result;

use learnlocal::cache::{CacheResult, CacheSource, SettingsUpdate, SqliteStorage};
use learnlocal::learn::api_types::TranslationRequest;
use learnlocal::learn::{
  Connectivity, LessonProgress, LessonRecord, LessonRequest, ProviderGateway, Quiz,
};

use crate::Command;

pub struct Context {
  pub gateway: ProviderGateway<SqliteStorage>,
  pub offline: bool,
}

impl Context {
  fn connectivity(&self) -> Connectivity {
    if self.offline {
      Connectivity::Offline
    } else {
      Connectivity::Online
    }
  }
}

pub async fn run(command: Command, ctx: &Context) -> Result<()> {
  let cache = ctx.gateway.cache();

  match command {
    Command::Generate {
      topic,
      difficulty,
      category,
      duration,
      language,
    } => {
      let request = LessonRequest {
        duration,
        language,
        ..LessonRequest::new(topic, difficulty, category)
      };
      let result = ctx.gateway.generate_lesson(&request, ctx.connectivity()).await?;
      print_source(&result);
      print_lesson(&result.data);
    }

    Command::Quiz {
      lesson_id,
      questions,
    } => {
      let result = ctx
        .gateway
        .generate_quiz(&lesson_id, questions, ctx.connectivity())
        .await?;
      print_source(&result);
      print_quiz(&result.data);
    }

    Command::Chat { message, chat_id } => {
      let result = ctx
        .gateway
        .send_chat_message(chat_id.as_deref(), &message, ctx.connectivity())
        .await?;
      print_source(&result);
      if let Some(reply) = result.data.messages.last() {
        println!("{}", reply.text);
      }
      println!("\n(chat {})", result.data.id);
    }

    Command::Lessons => {
      let lessons = cache.get_lessons().await;
      if lessons.is_empty() {
        println!("No cached lessons");
      }
      for lesson in lessons {
        println!(
          "{}  {} [{} / {}] {} min, cached {}",
          lesson.id,
          lesson.title,
          lesson.category,
          lesson.difficulty,
          lesson.estimated_duration,
          lesson.cached_at.format("%Y-%m-%d %H:%M")
        );
      }
    }

    Command::Lesson { id } => match cache.get_lesson_by_id(&id).await {
      Some(lesson) => print_lesson(&lesson),
      None => println!("Lesson {} is not cached", id),
    },

    Command::Remove { id } => {
      if cache.remove_lesson(&id).await? {
        println!("Removed lesson {}", id);
      } else {
        println!("Lesson {} is not cached", id);
      }
    }

    Command::Chats => {
      let chats = cache.get_chats().await;
      if chats.is_empty() {
        println!("No cached chats");
      }
      for chat in chats {
        let preview = chat
          .messages
          .iter()
          .find(|m| m.is_user)
          .map(|m| m.text.as_str())
          .unwrap_or("");
        println!(
          "{}  {} messages, updated {}  {}",
          chat.id,
          chat.messages.len(),
          chat.last_updated.format("%Y-%m-%d %H:%M"),
          preview
        );
      }
    }

    Command::Clear { collection } => {
      cache.clear(collection).await?;
      println!("Cleared {:?}", collection);
    }

    Command::Prune => {
      let report = cache.clear_expired().await?;
      println!(
        "Evicted {} lessons and {} chats",
        report.lessons, report.chats
      );
    }

    Command::Size => {
      let size = cache.cache_size();
      println!("lessons: {} bytes", size.lessons);
      println!("chats:   {} bytes", size.chats);
      println!("total:   {:.3} MB", size.total_mb);
    }

    Command::Settings {
      max_lessons,
      max_chats,
      expiry_days,
      auto_download,
    } => {
      let update = SettingsUpdate {
        max_cached_lessons: max_lessons,
        max_cached_chats: max_chats,
        cache_expiry_days: expiry_days,
        auto_download_lessons: auto_download,
      };
      let settings = if update.is_empty() {
        cache.settings().await
      } else {
        cache.update_settings(&update).await?
      };
      println!("{}", serde_json::to_string_pretty(&settings)?);
    }

    Command::Progress => {
      let progress = cache.progress().await;
      if progress.is_empty() {
        println!("No progress recorded");
      }
      let mut entries: Vec<_> = progress.into_iter().collect();
      entries.sort_by(|a, b| a.0.cmp(&b.0));
      for (lesson_id, p) in entries {
        let state = if p.completed { "completed" } else { "in progress" };
        let score = p.score.map(|s| format!(", score {}", s)).unwrap_or_default();
        println!("{}  {}, {}s{}", lesson_id, state, p.time_spent, score);
      }
    }

    Command::Complete {
      lesson_id,
      score,
      time_spent,
      in_progress,
    } => {
      let completed = !in_progress;
      let progress = LessonProgress {
        completed,
        time_spent,
        score,
        completed_at: completed.then(|| cache.now()),
        last_updated: None,
      };
      cache.save_progress(&lesson_id, progress).await?;
      println!("Saved progress for {}", lesson_id);
    }

    Command::Translate { text, to, from } => {
      let request = TranslationRequest {
        source_language: from,
        ..TranslationRequest::new(text, to)
      };
      let result = ctx.gateway.translate(&request, ctx.connectivity()).await?;
      print_source(&result);
      println!("{}", result.data.translated_text);
    }

    Command::Health => {
      match ctx.gateway.check_health().await {
        Ok(health) => println!("{} ({})", health.status, health.model),
        Err(e) => println!("unreachable: {}", e),
      }
      println!("connectivity: {:?}", ctx.gateway.connectivity().await);
    }
  }

  Ok(())
}

fn print_source<T>(result: &CacheResult<T>) {
  match result.source {
    CacheSource::Network => {}
    CacheSource::Offline => match result.cached_at {
      Some(at) => eprintln!("(offline: served from cache, {})", at.format("%Y-%m-%d %H:%M")),
      None => eprintln!("(offline: served from cache)"),
    },
    CacheSource::Fallback => eprintln!("(provider unavailable: showing fallback content)"),
  }
}

fn print_lesson(lesson: &LessonRecord) {
  println!("# {}", lesson.title);
  println!(
    "{} / {} / {} min  ({})\n",
    lesson.category, lesson.difficulty, lesson.estimated_duration, lesson.id
  );
  println!("{}\n", lesson.content);

  if !lesson.key_points.is_empty() {
    println!("Key points:");
    for point in &lesson.key_points {
      println!("  - {}", point);
    }
  }
  if !lesson.activities.is_empty() {
    println!("Activities:");
    for (i, activity) in lesson.activities.iter().enumerate() {
      println!("  {}. {}", i + 1, activity);
    }
  }
}

fn print_quiz(quiz: &Quiz) {
  for (i, question) in quiz.questions.iter().enumerate() {
    println!("{}. {}", i + 1, question.question);
    for (j, option) in question.options.iter().enumerate() {
      println!("   {}) {}", option_label(j), option);
    }
    print!("   Answer: {}", option_label(question.correct_answer));
    if question.explanation.is_empty() {
      println!("\n");
    } else {
      println!(" - {}\n", question.explanation);
    }
  }
}

fn option_label(index: usize) -> char {
  u8::try_from(index)
    .ok()
    .and_then(|i| b'a'.checked_add(i))
    .map(char::from)
    .unwrap_or('?')
}
