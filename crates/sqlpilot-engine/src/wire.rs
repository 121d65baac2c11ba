//! Request and response bodies of the service, and the rules that turn a
//! raw `(status, body)` pair into a typed outcome.

use serde::{Deserialize, Serialize};
use sqlpilot_core::{
  Dialect,
  query::{QueryFailure, QueryOutput, QueryResult},
};

use crate::{EngineError, GeneratedSchema, Translation};

// ─── Requests ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct GenerateSchemaRequest<'a> {
  pub business_description: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct TranslateRequest<'a> {
  pub natural_query: &'a str,
  pub schema_info:   &'a [String],
  pub dialect:       Dialect,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExecuteRequest<'a> {
  pub sql_query: &'a str,
  pub schema:    &'a str,
  pub dialect:   Dialect,
}

#[derive(Debug, Serialize)]
pub(crate) struct SuggestionsRequest<'a> {
  pub query: &'a str,
}

// ─── Responses ───────────────────────────────────────────────────────────────

/// The service reports errors either as an object or as a bare string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireError {
  Object {
    message: String,
    #[serde(default)]
    name:    Option<String>,
  },
  Text(String),
}

impl From<WireError> for QueryFailure {
  fn from(e: WireError) -> Self {
    match e {
      WireError::Object { message, name } => QueryFailure::new(message, name),
      WireError::Text(message) => QueryFailure::new(message, None),
    }
  }
}

#[derive(Debug, Deserialize)]
struct DiagramBody {
  mermaid_code: String,
}

#[derive(Debug, Deserialize)]
struct GenerateSchemaResponse {
  #[serde(default)]
  ddl_statements: Option<Vec<String>>,
  #[serde(default)]
  schema:         Option<DiagramBody>,
  #[serde(default)]
  error:          Option<WireError>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
  #[serde(default)]
  sql:          Option<String>,
  // The service spells it this way.
  #[serde(default, alias = "explanation")]
  explaination: Option<String>,
  #[serde(default)]
  error:        Option<WireError>,
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
  #[serde(default)]
  output: Option<QueryOutput>,
  #[serde(default)]
  error:  Option<WireError>,
}

#[derive(Debug, Deserialize)]
struct SuggestionsResponse {
  #[serde(default)]
  suggestions: Vec<String>,
}

// ─── Classification ──────────────────────────────────────────────────────────

fn is_success(status: u16) -> bool { (200..300).contains(&status) }

/// Parse `body`; an unparseable body on an error status reports the status.
fn parse<T: for<'de> Deserialize<'de>>(status: u16, body: &str) -> Result<T, EngineError> {
  serde_json::from_str(body).map_err(|e| {
    if is_success(status) {
      EngineError::Decode(e.to_string())
    } else {
      EngineError::Status(status)
    }
  })
}

pub(crate) fn decode_generate(status: u16, body: &str) -> Result<GeneratedSchema, EngineError> {
  let resp: GenerateSchemaResponse = parse(status, body)?;
  if let Some(e) = resp.error {
    return Err(EngineError::Rejected(e.into()));
  }
  if !is_success(status) {
    return Err(EngineError::Status(status));
  }
  match (resp.ddl_statements, resp.schema) {
    (Some(ddl_statements), Some(schema)) => Ok(GeneratedSchema {
      ddl_statements,
      mermaid_code: schema.mermaid_code,
    }),
    _ => Err(EngineError::Decode("missing ddl_statements or schema".into())),
  }
}

pub(crate) fn decode_translate(status: u16, body: &str) -> Result<Translation, EngineError> {
  let resp: TranslateResponse = parse(status, body)?;
  if let Some(e) = resp.error {
    return Err(EngineError::Rejected(e.into()));
  }
  if !is_success(status) {
    return Err(EngineError::Status(status));
  }
  match resp.sql {
    Some(sql) if !sql.trim().is_empty() => Ok(Translation {
      sql,
      explanation: resp.explaination,
    }),
    _ => Err(EngineError::Rejected(QueryFailure::new(
      "Failed to generate SQL. Please try again.",
      None,
    ))),
  }
}

pub(crate) fn decode_execute(status: u16, body: &str) -> Result<QueryResult, EngineError> {
  let resp: ExecuteResponse = parse(status, body)?;
  if let Some(e) = resp.error {
    return Ok(QueryResult::Failure(e.into()));
  }
  if !is_success(status) {
    return Err(EngineError::Status(status));
  }
  resp
    .output
    .map(QueryResult::Success)
    .ok_or_else(|| EngineError::Decode("missing output".into()))
}

pub(crate) fn decode_suggestions(status: u16, body: &str) -> Result<Vec<String>, EngineError> {
  if !is_success(status) {
    return Err(EngineError::Status(status));
  }
  let resp: SuggestionsResponse = parse(status, body)?;
  Ok(resp.suggestions)
}
