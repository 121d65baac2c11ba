//! Client for the external query/generation service.
//!
//! The service owns schema generation, natural-language translation and SQL
//! execution; this crate only shapes requests and classifies responses.
//! Nothing here retries, times out on its own, or caches.

mod error;
mod http;
mod wire;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlpilot_core::{Dialect, query::QueryResult};

pub use error::EngineError;
pub use http::HttpEngine;

/// DDL and diagram produced from a business description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSchema {
  pub ddl_statements: Vec<String>,
  /// Mermaid source of the entity-relationship diagram.
  pub mermaid_code:   String,
}

/// SQL produced from a natural-language question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
  pub sql:         String,
  pub explanation: Option<String>,
}

/// The operations of the external service.
#[async_trait]
pub trait QueryEngine: Send + Sync {
  async fn generate_schema(&self, business_description: &str)
  -> Result<GeneratedSchema, EngineError>;

  /// `schema_info` is the DDL, one statement per element.
  async fn translate_sql(
    &self,
    natural_query: &str,
    schema_info: &[String],
    dialect: Dialect,
  ) -> Result<Translation, EngineError>;

  /// Run `sql` against `schema`. An engine-reported failure is a
  /// [`QueryResult::Failure`], not an `Err`; `Err` means the call itself
  /// did not complete.
  async fn execute_query(
    &self,
    sql: &str,
    schema: &str,
    dialect: Dialect,
  ) -> Result<QueryResult, EngineError>;

  /// Completion hints for a partial query.
  async fn query_suggestions(&self, query: &str) -> Result<Vec<String>, EngineError>;
}
