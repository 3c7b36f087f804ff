mod commands;
mod config;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;

use learnlocal::cache::SqliteStorage;
use learnlocal::learn::{
  Category, Collection, ContentCache, ContentProvider, Difficulty, HttpProvider,
  HuggingFaceProvider, ProviderGateway, Quiz,
};

use config::{Config, ProviderKind};

#[derive(Parser, Debug)]
#[command(name = "learnlocal")]
#[command(about = "Offline-first lessons and tutoring chat backed by local or remote models")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/learnlocal/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Answer from the cache without contacting any provider
  #[arg(long, global = true)]
  offline: bool,

  /// Provider to use, overriding the config file
  #[arg(short, long, global = true, value_enum)]
  provider: Option<ProviderKind>,

  /// Log at debug level on stderr
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Generate a lesson, falling back to cached or placeholder content
  Generate {
    topic: String,
    #[arg(short, long, value_enum, default_value = "beginner")]
    difficulty: Difficulty,
    #[arg(short = 'k', long, value_enum, default_value = "stem")]
    category: Category,
    /// Minutes
    #[arg(long)]
    duration: Option<u32>,
    #[arg(short, long)]
    language: Option<String>,
  },
  /// Quiz yourself on a cached lesson
  Quiz {
    lesson_id: String,
    /// Number of questions
    #[arg(short = 'n', long, default_value_t = Quiz::DEFAULT_QUESTIONS)]
    questions: usize,
  },
  /// Send a chat message; starts a new chat unless --chat is given
  Chat {
    message: String,
    #[arg(long = "chat")]
    chat_id: Option<String>,
  },
  /// List cached lessons
  Lessons,
  /// Show one cached lesson
  Lesson { id: String },
  /// Remove a cached lesson
  Remove { id: String },
  /// List cached chats, most recent first
  Chats,
  /// Clear cached collections
  Clear {
    #[arg(value_enum, default_value = "all")]
    collection: Collection,
  },
  /// Evict expired lessons and chats
  Prune,
  /// Show the size of the cached collections
  Size,
  /// Show or change retention settings
  Settings {
    #[arg(long)]
    max_lessons: Option<u32>,
    #[arg(long)]
    max_chats: Option<u32>,
    #[arg(long)]
    expiry_days: Option<u32>,
    #[arg(long)]
    auto_download: Option<bool>,
  },
  /// Show learner progress
  Progress,
  /// Record progress for a lesson
  Complete {
    lesson_id: String,
    #[arg(long)]
    score: Option<u32>,
    /// Seconds spent in the lesson
    #[arg(long, default_value_t = 0)]
    time_spent: u64,
    /// Record progress without marking the lesson completed
    #[arg(long)]
    in_progress: bool,
  },
  /// Translate text; returns the text unchanged when translation fails
  Translate {
    text: String,
    #[arg(short, long)]
    to: String,
    #[arg(short, long)]
    from: Option<String>,
  },
  /// Check the selected provider
  Health,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let config = Config::load(args.config.as_deref())?;
  let _guard = init_tracing(&config, args.verbose)?;

  let storage = match &config.cache_path {
    Some(path) => SqliteStorage::open_at(path)?,
    None => SqliteStorage::open()?,
  };
  let cache = ContentCache::new(storage);

  let kind = args.provider.unwrap_or(config.provider.kind);
  let provider = build_provider(&config, kind)?;
  let gateway = ProviderGateway::new(cache, provider).with_timeout(config.timeout());

  let ctx = commands::Context {
    gateway,
    offline: args.offline,
  };
  commands::run(args.command, &ctx).await
}

fn build_provider(config: &Config, kind: ProviderKind) -> Result<Option<Arc<dyn ContentProvider>>> {
  let provider: Arc<dyn ContentProvider> = match kind {
    ProviderKind::None => return Ok(None),
    ProviderKind::HuggingFace => Arc::new(HuggingFaceProvider::new(
      &config.huggingface.url,
      config.huggingface.model.clone(),
      Config::hf_token(),
    )?),
    ProviderKind::Remote => Arc::new(server_provider(config, "remote", &config.provider.url)?),
    ProviderKind::Embedded => Arc::new(server_provider(
      config,
      "embedded",
      &config.provider.embedded_url,
    )?),
  };
  Ok(Some(provider))
}

fn server_provider(config: &Config, name: &str, url: &str) -> Result<HttpProvider> {
  let provider = HttpProvider::new(name, url, config.provider.model.clone())?;
  Ok(match config.provider.max_tokens {
    Some(max_tokens) => provider.with_max_tokens(max_tokens),
    None => provider,
  })
}

/// Human-readable logs on stderr plus a rotating JSON file.
fn init_tracing(
  config: &Config,
  verbose: bool,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
  use tracing_subscriber::prelude::*;
  use tracing_subscriber::EnvFilter;

  let console_filter = if verbose {
    EnvFilter::new("learnlocal=debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("learnlocal=info"))
  };

  let log_dir = config.log_dir();
  std::fs::create_dir_all(&log_dir)?;
  let file_appender = tracing_appender::rolling::daily(&log_dir, "learnlocal.log");
  let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

  tracing_subscriber::registry()
    .with(
      tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter),
    )
    .with(
      tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("learnlocal=debug")),
    )
    .init();

  Ok(guard)
}
