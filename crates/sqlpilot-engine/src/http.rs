//! [`HttpEngine`]: the reqwest implementation of [`QueryEngine`].

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use sqlpilot_core::{Dialect, query::QueryResult};

use crate::{
  EngineError, GeneratedSchema, QueryEngine, Translation,
  wire::{
    ExecuteRequest, GenerateSchemaRequest, SuggestionsRequest, TranslateRequest,
    decode_execute, decode_generate, decode_suggestions, decode_translate,
  },
};

/// JSON-over-HTTP client of the query/generation service.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpEngine {
  client:   Client,
  base_url: String,
}

impl HttpEngine {
  pub fn new(base_url: impl Into<String>) -> Result<Self, EngineError> {
    let client = Client::builder().build()?;
    Ok(Self { client, base_url: base_url.into() })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url.trim_end_matches('/'), path)
  }

  /// POST a JSON body and return the raw status and body text.
  async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(u16, String), EngineError> {
    let resp = self.client.post(self.url(path)).json(body).send().await?;
    let status = resp.status().as_u16();
    let text = resp.text().await?;
    tracing::debug!(path, status, "engine response");
    Ok((status, text))
  }
}

#[async_trait]
impl QueryEngine for HttpEngine {
  async fn generate_schema(&self, business_description: &str) -> Result<GeneratedSchema, EngineError> {
    let (status, body) = self
      .post("/generate_schema", &GenerateSchemaRequest { business_description })
      .await?;
    decode_generate(status, &body)
  }

  async fn translate_sql(
    &self,
    natural_query: &str,
    schema_info: &[String],
    dialect: Dialect,
  ) -> Result<Translation, EngineError> {
    let (status, body) = self
      .post("/translate_sql", &TranslateRequest { natural_query, schema_info, dialect })
      .await?;
    decode_translate(status, &body)
  }

  async fn execute_query(
    &self,
    sql: &str,
    schema: &str,
    dialect: Dialect,
  ) -> Result<QueryResult, EngineError> {
    let (status, body) = self
      .post("/execute_query", &ExecuteRequest { sql_query: sql, schema, dialect })
      .await?;
    decode_execute(status, &body)
  }

  async fn query_suggestions(&self, query: &str) -> Result<Vec<String>, EngineError> {
    let (status, body) = self
      .post("/query_suggestions", &SuggestionsRequest { query })
      .await?;
    decode_suggestions(status, &body)
  }
}
