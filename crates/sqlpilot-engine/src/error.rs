//! Error type for `sqlpilot-engine`.

use sqlpilot_core::query::QueryFailure;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  /// The service could not be reached or the connection dropped.
  #[error("engine unreachable: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("engine responded with status {0}")]
  Status(u16),

  #[error("malformed engine response: {0}")]
  Decode(String),

  /// The service answered with an `error` object.
  #[error("engine rejected request: {}", .0.message)]
  Rejected(QueryFailure),
}

impl EngineError {
  /// Whether a manual retry by the user might succeed.
  pub fn is_transient(&self) -> bool {
    matches!(self, Self::Transport(_) | Self::Status(500..))
  }
}
