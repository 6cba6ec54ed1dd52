//! Structured error types for the authorship engine.
//!
//! None of these abort a run: malformed commits are skipped and reported,
//! signals without enough data contribute nothing, and degenerate numeric
//! input falls back to documented constants.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  /// A single commit's data is unusable.
  #[error("malformed record {sha}: {reason}")]
  MalformedRecord { sha: String, reason: String },

  /// A signal lacks qualifying commits or authors.
  #[error("insufficient data for {signal}: {reason}")]
  InsufficientData { signal: String, reason: String },

  /// Zero variance, empty input or a divide-by-zero risk.
  #[error("degenerate input: {what}")]
  DegenerateInput { what: String },

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),
}

impl EngineError {
  pub fn malformed(sha: &str, reason: &str) -> Self {
    Self::MalformedRecord {
      sha: sha.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn insufficient(signal: &str, reason: impl Into<String>) -> Self {
    Self::InsufficientData {
      signal: signal.to_string(),
      reason: reason.into(),
    }
  }

  pub fn degenerate(what: impl Into<String>) -> Self {
    Self::DegenerateInput { what: what.into() }
  }
}
