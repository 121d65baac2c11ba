//! HTTP surface of SQLPilot.
//!
//! Exposes an axum [`Router`] serving the data-access actions as JSON routes
//! under `/api`, backed by any [`WorkspaceStore`] and any [`QueryEngine`].
//! Every route except sign-in, sign-up and sign-out sits behind the session
//! gate in [`auth`].

pub mod actions;
pub mod auth;
pub mod error;
pub mod session;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use sqlpilot_core::store::WorkspaceStore;
use sqlpilot_engine::QueryEngine;
use tower_http::trace::TraceLayer;

use actions::{files, profile, projects, queries, schemas, session as sign};
use session::SessionKeys;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SQLPILOT_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  /// Base URL of the query/generation service.
  #[serde(default = "default_engine_url")]
  pub engine_url:          String,
  /// HMAC key for session tokens; at least 32 bytes.
  pub session_secret:      String,
  #[serde(default = "default_session_ttl_hours")]
  pub session_ttl_hours:   i64,
  /// Bearer secret shared with the identity broker. OAuth sign-in is
  /// disabled when unset.
  #[serde(default)]
  pub oauth_shared_secret: Option<String>,
  #[serde(default)]
  pub secure_cookies:      bool,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 3000 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/sqlpilot/sqlpilot.db") }
fn default_engine_url() -> String { "http://localhost:8000".into() }
fn default_session_ttl_hours() -> i64 { 24 * 7 }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: WorkspaceStore> {
  pub store:   Arc<S>,
  pub engine:  Arc<dyn QueryEngine>,
  pub session: Arc<SessionKeys>,
  pub config:  Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the application router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Session
    .route("/api/register", post(sign::register::<S>))
    .route("/api/login", post(sign::login::<S>))
    .route("/api/auth/oauth", post(sign::oauth::<S>))
    .route("/api/logout", post(sign::logout::<S>))
    // Account
    .route("/api/profile", get(profile::get::<S>).patch(profile::update::<S>))
    .route("/api/connections", post(profile::create_connection::<S>))
    // Projects
    .route("/api/projects", get(projects::list::<S>).post(projects::create::<S>))
    .route("/api/projects/{id}", get(projects::get_one::<S>))
    // Schemas
    .route("/api/projects/{id}/schemas", get(schemas::list::<S>).post(schemas::save::<S>))
    .route("/api/projects/{id}/schemas/apply", post(schemas::apply::<S>))
    .route("/api/projects/{id}/schemas/generate", post(schemas::generate::<S>))
    // Queries
    .route("/api/projects/{id}/queries", get(queries::list::<S>).post(queries::save::<S>))
    .route("/api/projects/{id}/queries/translate", post(queries::translate::<S>))
    .route("/api/projects/{id}/queries/execute", post(queries::execute::<S>))
    .route("/api/projects/{id}/queries/suggestions", post(queries::suggestions::<S>))
    // Files
    .route("/api/projects/{id}/files", get(files::list::<S>).post(files::create::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod tests;
