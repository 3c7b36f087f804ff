//! Error types shared by the cache and the provider gateway.

use thiserror::Error;

/// Result type alias using [`LearnError`].
pub type Result<T> = std::result::Result<T, LearnError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LearnError {
  /// Persistence medium unreadable, unwritable or holding corrupt data.
  #[error("storage error: {0}")]
  Storage(String),

  /// Network failure, timeout or non-2xx status from a provider.
  #[error("provider unreachable: {0}")]
  ProviderUnreachable(String),

  /// Provider body matched none of the tolerated encodings.
  #[error("malformed provider response: {0}")]
  MalformedProviderResponse(String),

  /// Caller input rejected before any I/O.
  #[error("invalid request: {0}")]
  Validation(String),
}

impl LearnError {
  pub fn storage(msg: impl Into<String>) -> Self {
    Self::Storage(msg.into())
  }

  pub fn unreachable(msg: impl Into<String>) -> Self {
    Self::ProviderUnreachable(msg.into())
  }

  pub fn malformed(msg: impl Into<String>) -> Self {
    Self::MalformedProviderResponse(msg.into())
  }

  pub fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }

  /// Whether this error is handed back to the caller.
  ///
  /// Provider failures degrade to fallback content inside the gateway and
  /// never escape; only storage and validation errors do.
  pub fn is_surfaced(&self) -> bool {
    matches!(self, Self::Storage(_) | Self::Validation(_))
  }
}
