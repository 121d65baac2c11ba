//! Fixtures shared by the server's tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sqlpilot_core::{
  Dialect,
  query::{QueryOutput, QueryResult},
  store::WorkspaceStore,
  user::{NewUser, User},
};
use sqlpilot_engine::{EngineError, GeneratedSchema, QueryEngine, Translation};
use sqlpilot_store_sqlite::SqliteStore;

use crate::{AppState, ServerConfig, auth::hash_password, session::SessionKeys};

pub const SECRET: &str = "0123456789abcdef0123456789abcdef";
pub const BROKER_SECRET: &str = "broker-shared-secret";

/// Engine double. `execute_query` answers with `execute`; every call is
/// recorded in `calls` as `"<op>:<first argument>"`.
pub struct StubEngine {
  pub execute: QueryResult,
  pub calls:   Mutex<Vec<String>>,
}

impl Default for StubEngine {
  fn default() -> Self {
    Self {
      execute: QueryResult::Success(QueryOutput::default()),
      calls:   Mutex::new(Vec::new()),
    }
  }
}

impl StubEngine {
  fn record(&self, call: String) {
    if let Ok(mut calls) = self.calls.lock() {
      calls.push(call);
    }
  }
}

#[async_trait]
impl QueryEngine for StubEngine {
  async fn generate_schema(&self, business_description: &str) -> Result<GeneratedSchema, EngineError> {
    self.record(format!("generate:{business_description}"));
    Ok(GeneratedSchema {
      ddl_statements: vec!["CREATE TABLE t (id INT)".into()],
      mermaid_code:   "erDiagram".into(),
    })
  }

  async fn translate_sql(
    &self,
    natural_query: &str,
    schema_info: &[String],
    _dialect: Dialect,
  ) -> Result<Translation, EngineError> {
    self.record(format!("translate:{natural_query}:{}", schema_info.len()));
    Ok(Translation { sql: "SELECT 1".into(), explanation: None })
  }

  async fn execute_query(&self, sql: &str, schema: &str, _dialect: Dialect) -> Result<QueryResult, EngineError> {
    self.record(format!("execute:{sql}:{schema}"));
    Ok(self.execute.clone())
  }

  async fn query_suggestions(&self, _query: &str) -> Result<Vec<String>, EngineError> {
    Err(EngineError::Status(503))
  }
}

pub fn config() -> ServerConfig {
  ServerConfig {
    host:                "127.0.0.1".into(),
    port:                0,
    store_path:          ":memory:".into(),
    engine_url:          "http://127.0.0.1:9".into(),
    session_secret:      SECRET.into(),
    session_ttl_hours:   1,
    oauth_shared_secret: Some(BROKER_SECRET.into()),
    secure_cookies:      false,
  }
}

pub async fn make_state_with(engine: Arc<StubEngine>) -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  AppState {
    store:   Arc::new(store),
    engine,
    session: Arc::new(SessionKeys::new(SECRET.as_bytes(), 1).unwrap()),
    config:  Arc::new(config()),
  }
}

pub async fn make_state() -> AppState<SqliteStore> {
  make_state_with(Arc::new(StubEngine::default())).await
}

pub async fn seed_user(state: &AppState<SqliteStore>, email: &str, password: &str) -> User {
  state
    .store
    .create_user(NewUser {
      name:          "Ada Lovelace".into(),
      email:         email.into(),
      image:         "https://example.com/a.png".into(),
      password_hash: Some(hash_password(password).unwrap()),
    })
    .await
    .unwrap()
}
