//! Offline-first lesson and chat cache with multi-provider fetching.

pub mod cache;
pub mod error;
pub mod learn;

pub use error::{LearnError, Result};
