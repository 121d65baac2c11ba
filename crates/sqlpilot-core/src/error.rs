//! Error types for `sqlpilot-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid {field}: {reason}")]
  Validation {
    field:  &'static str,
    reason: String,
  },

  #[error("duplicate {0}")]
  Duplicate(&'static str),

  #[error("unknown dialect: {0:?}")]
  UnknownDialect(String),
}

impl Error {
  pub fn is_validation(&self) -> bool {
    matches!(self, Self::Validation { .. } | Self::Duplicate(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
