//! Error type for `sqlpilot-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Validation or uniqueness failure.
  #[error("core error: {0}")]
  Core(#[from] sqlpilot_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("corrupt row: {0}")]
  Corrupt(String),

  #[error("user not found: {0}")]
  UserNotFound(uuid::Uuid),
}

impl Error {
  /// Whether the failure was caused by the caller's input rather than the
  /// database itself.
  pub fn is_validation(&self) -> bool {
    matches!(self, Self::Core(e) if e.is_validation())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
