//! Error types and axum `IntoResponse` implementation.
//!
//! Every failure leaves an action as one of these. Store failures are logged
//! here and reach the client only as a generic message.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use sqlpilot_engine::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// No usable session on the request.
  #[error("User not found")]
  Unauthenticated,

  /// The session is valid but names a user the store does not have.
  #[error("User not found in database")]
  IdentityNotFound,

  #[error("Invalid email or password")]
  InvalidCredentials,

  #[error("{0} not found")]
  NotFound(&'static str),

  #[error("{0}")]
  BadRequest(String),

  #[error("{action} failed: {source}")]
  Action {
    action: &'static str,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("engine error: {0}")]
  Engine(#[from] EngineError),
}

impl Error {
  /// Wrap a store failure raised inside `action`.
  ///
  /// ```rust,ignore
  /// store.create_project(p).await.map_err(Error::action("createProject"))?;
  /// ```
  pub fn action<E>(action: &'static str) -> impl FnOnce(E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    move |e| Error::Action { action, source: Box::new(e) }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      Error::Unauthenticated | Error::IdentityNotFound | Error::InvalidCredentials => {
        (StatusCode::UNAUTHORIZED, self.to_string())
      }
      Error::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
      Error::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      Error::Action { action, source } => {
        tracing::error!(action, error = %source, "action failed");
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{action} failed"))
      }
      Error::Engine(EngineError::Rejected(f)) => {
        (StatusCode::UNPROCESSABLE_ENTITY, f.message.clone())
      }
      Error::Engine(e) => {
        tracing::warn!(error = %e, "engine call failed");
        let message = if e.is_transient() {
          "The query engine is unavailable. Please try again."
        } else {
          "The query engine returned an unexpected response."
        };
        (StatusCode::BAD_GATEWAY, message.to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
