//! Query history records.
//!
//! Every execution attempt is appended once and never modified. The outcome
//! is a tagged union: a record carries either a result set or an error, never
//! both and never neither.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Dialect, Result, validate};

/// Name given to failures that arrive without one.
pub const DEFAULT_ERROR_NAME: &str = "Error";

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// A tabular result set as returned by the engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryOutput {
  pub columns: Vec<String>,
  pub rows:    Vec<Vec<serde_json::Value>>,
}

/// An engine-reported failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFailure {
  pub message: String,
  /// Error kind, e.g. `ParseError`.
  #[serde(default = "default_error_name")]
  pub name:    String,
}

fn default_error_name() -> String { DEFAULT_ERROR_NAME.to_owned() }

impl QueryFailure {
  pub fn new(message: impl Into<String>, name: Option<String>) -> Self {
    Self {
      message: message.into(),
      name:    name.unwrap_or_else(default_error_name),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryResult {
  Success(QueryOutput),
  Failure(QueryFailure),
}

impl QueryResult {
  /// Build the outcome from the loose shape the UI submits: the presence of
  /// `error_message` alone decides which side is populated.
  pub fn from_parts(
    columns: Option<Vec<String>>,
    rows: Option<Vec<Vec<serde_json::Value>>>,
    error_message: Option<String>,
    error_name: Option<String>,
  ) -> Self {
    match error_message {
      Some(message) => Self::Failure(QueryFailure::new(message, error_name)),
      None => Self::Success(QueryOutput {
        columns: columns.unwrap_or_default(),
        rows:    rows.unwrap_or_default(),
      }),
    }
  }

  pub fn is_success(&self) -> bool { matches!(self, Self::Success(_)) }

  pub fn output(&self) -> Option<&QueryOutput> {
    match self {
      Self::Success(o) => Some(o),
      Self::Failure(_) => None,
    }
  }

  pub fn failure(&self) -> Option<&QueryFailure> {
    match self {
      Self::Success(_) => None,
      Self::Failure(f) => Some(f),
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRecord {
  pub id:         Uuid,
  pub project_id: Uuid,
  pub schema_id:  Uuid,
  pub query_text: String,
  pub dialect:    Dialect,
  pub result:     QueryResult,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewQuery {
  pub project_id: Uuid,
  pub schema_id:  Uuid,
  pub query_text: String,
  pub dialect:    Dialect,
  pub result:     QueryResult,
}

impl NewQuery {
  pub fn validate(&self) -> Result<()> {
    validate::required("query text", &self.query_text)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn error_message_selects_failure() {
    let r = QueryResult::from_parts(
      Some(vec!["a".into()]),
      Some(vec![vec![json!(1)]]),
      Some("syntax error".into()),
      Some("ParseError".into()),
    );
    assert_eq!(
      r,
      QueryResult::Failure(QueryFailure {
        message: "syntax error".into(),
        name:    "ParseError".into(),
      })
    );
    assert!(r.output().is_none());
  }

  #[test]
  fn missing_error_message_selects_success() {
    let r = QueryResult::from_parts(
      Some(vec!["a".into(), "b".into()]),
      Some(vec![vec![json!(1), json!(2)]]),
      None,
      Some("ignored".into()),
    );
    let out = r.output().expect("success");
    assert_eq!(out.columns, vec!["a", "b"]);
    assert!(r.failure().is_none());
  }

  #[test]
  fn success_without_rows_is_empty_result_set() {
    let r = QueryResult::from_parts(None, None, None, None);
    assert_eq!(r, QueryResult::Success(QueryOutput::default()));
  }

  #[test]
  fn failure_name_defaults() {
    let f: QueryFailure = serde_json::from_value(json!({ "message": "boom" })).unwrap();
    assert_eq!(f.name, DEFAULT_ERROR_NAME);
  }
}
