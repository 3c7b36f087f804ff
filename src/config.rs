use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  pub provider: ProviderConfig,
  pub huggingface: HuggingFaceConfig,
  /// Bound on a single provider call
  pub timeout_secs: u64,
  /// SQLite cache file (defaults to the platform data directory)
  pub cache_path: Option<PathBuf>,
  /// Directory for the rolling JSON log
  pub log_dir: Option<PathBuf>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      provider: ProviderConfig::default(),
      huggingface: HuggingFaceConfig::default(),
      timeout_secs: 30,
      cache_path: None,
      log_dir: None,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
  /// LearnLocal server on the network
  #[default]
  Remote,
  /// LearnLocal server running on this device
  Embedded,
  /// Hugging Face style inference hub
  #[value(name = "huggingface")]
  HuggingFace,
  /// Serve everything from the cache
  None,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
  pub kind: ProviderKind,
  pub url: String,
  pub embedded_url: String,
  pub model: String,
  pub max_tokens: Option<u32>,
}

impl Default for ProviderConfig {
  fn default() -> Self {
    Self {
      kind: ProviderKind::Remote,
      url: "http://localhost:8000".to_string(),
      embedded_url: "http://localhost:8080".to_string(),
      model: "gpt-oss".to_string(),
      max_tokens: Some(2000),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HuggingFaceConfig {
  pub url: String,
  pub model: String,
}

impl Default for HuggingFaceConfig {
  fn default() -> Self {
    Self {
      url: "https://api-inference.huggingface.co".to_string(),
      model: "microsoft/DialoGPT-medium".to_string(),
    }
  }
}

impl Config {
  /// Load configuration from file, falling back to defaults.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./learnlocal.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/learnlocal/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };
    config.validate()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("learnlocal.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("learnlocal").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  fn validate(&self) -> Result<()> {
    for (key, value) in [
      ("provider.url", &self.provider.url),
      ("provider.embedded_url", &self.provider.embedded_url),
      ("huggingface.url", &self.huggingface.url),
    ] {
      Url::parse(value).map_err(|e| eyre!("Invalid {} {:?}: {}", key, value, e))?;
    }
    if self.timeout_secs == 0 {
      return Err(eyre!("timeout_secs must be positive"));
    }
    Ok(())
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }

  /// Base URL of the selected LearnLocal server, if one is selected.
  pub fn server_url(&self, kind: ProviderKind) -> Option<&str> {
    match kind {
      ProviderKind::Remote => Some(&self.provider.url),
      ProviderKind::Embedded => Some(&self.provider.embedded_url),
      ProviderKind::HuggingFace | ProviderKind::None => None,
    }
  }

  pub fn log_dir(&self) -> PathBuf {
    self.log_dir.clone().unwrap_or_else(|| {
      dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("learnlocal")
        .join("logs")
    })
  }

  /// Get the Hugging Face token from environment variables.
  ///
  /// Checks LEARNLOCAL_HF_TOKEN first, then HUGGINGFACE_API_TOKEN as fallback.
  pub fn hf_token() -> Option<String> {
    std::env::var("LEARNLOCAL_HF_TOKEN")
      .or_else(|_| std::env::var("HUGGINGFACE_API_TOKEN"))
      .ok()
      .filter(|t| !t.is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
  }

  #[test]
  fn test_partial_file_keeps_defaults() {
    let file = write_config("provider:\n  kind: embedded\ntimeout_secs: 10\n");
    let config = Config::load(Some(file.path())).unwrap();

    assert_eq!(config.provider.kind, ProviderKind::Embedded);
    assert_eq!(config.provider.model, "gpt-oss");
    assert_eq!(config.timeout(), Duration::from_secs(10));
    assert_eq!(
      config.server_url(config.provider.kind),
      Some("http://localhost:8080")
    );
    assert_eq!(config.huggingface.model, "microsoft/DialoGPT-medium");
  }

  #[test]
  fn test_huggingface_kind() {
    let file = write_config("provider:\n  kind: huggingface\nhuggingface:\n  model: gpt2\n");
    let config = Config::load(Some(file.path())).unwrap();

    assert_eq!(config.provider.kind, ProviderKind::HuggingFace);
    assert_eq!(config.huggingface.model, "gpt2");
    assert_eq!(config.server_url(config.provider.kind), None);
  }

  #[test]
  fn test_missing_explicit_path_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::load(Some(&dir.path().join("nope.yaml"))).is_err());
  }

  #[test]
  fn test_invalid_values_rejected() {
    let file = write_config("provider:\n  url: not a url\n");
    assert!(Config::load(Some(file.path())).is_err());

    let file = write_config("timeout_secs: 0\n");
    assert!(Config::load(Some(file.path())).is_err());

    let file = write_config("provider:\n  kind: carrier-pigeon\n");
    assert!(Config::load(Some(file.path())).is_err());
  }

  #[test]
  fn test_log_dir_override() {
    let file = write_config("log_dir: /tmp/learnlocal-logs\n");
    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.log_dir(), PathBuf::from("/tmp/learnlocal-logs"));
  }
}
