//! Sign-in, sign-up and sign-out.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/register`   | `{name, email, password}`; 400 if the email is taken |
//! | `POST` | `/api/login`      | `{email, password}`; 401 on mismatch |
//! | `POST` | `/api/auth/oauth` | broker only; `{email, name, image}` |
//! | `POST` | `/api/logout`     | clears the cookie |

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use sqlpilot_core::{
  store::WorkspaceStore,
  user::{NewUser, User},
};

use crate::{
  AppState,
  auth::{avatar_url, hash_password, verify_broker, verify_password},
  error::Error,
  session::clear_cookie,
};

/// Attach a fresh session cookie for `user` to `body`.
fn with_session<S>(state: &AppState<S>, user: &User, status: StatusCode, body: serde_json::Value) -> Response
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  let token = state.session.issue(user);
  let cookie = state.session.cookie(&token, state.config.secure_cookies);
  (status, [(header::SET_COOKIE, cookie)], Json(body)).into_response()
}

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub name:     String,
  pub email:    String,
  pub password: String,
}

/// `POST /api/register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<Response, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  if body.password.is_empty() {
    return Err(Error::BadRequest("Password is required".into()));
  }

  let existing = state
    .store
    .find_user_by_email(&body.email)
    .await
    .map_err(Error::action("register"))?;
  if existing.is_some() {
    return Err(Error::BadRequest("User already exists".into()));
  }

  let input = NewUser {
    image:         avatar_url(&body.name),
    name:          body.name,
    email:         body.email,
    password_hash: Some(hash_password(&body.password)?),
  };
  let user = state.store.create_user(input).await.map_err(Error::action("register"))?;

  tracing::info!(user = %user.id, "user registered");
  Ok(with_session(
    &state,
    &user,
    StatusCode::CREATED,
    json!({ "message": "User registered successfully" }),
  ))
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /api/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Response, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  let creds = state
    .store
    .find_user_by_email(&body.email)
    .await
    .map_err(Error::action("login"))?
    .ok_or(Error::InvalidCredentials)?;

  // OAuth-provisioned accounts have no password to check against.
  let hash = creds.password_hash.as_deref().ok_or(Error::InvalidCredentials)?;
  if !verify_password(&body.password, hash) {
    tracing::debug!(user = %creds.user.id, "password mismatch");
    return Err(Error::InvalidCredentials);
  }

  Ok(with_session(&state, &creds.user, StatusCode::OK, json!({ "user": creds.user })))
}

// ─── OAuth ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct OAuthBody {
  pub email: String,
  pub name:  String,
  pub image: String,
}

/// `POST /api/auth/oauth`
///
/// Called by the identity broker after it has completed the provider
/// handshake. First sign-in provisions the user.
pub async fn oauth<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  Json(body): Json<OAuthBody>,
) -> Result<Response, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  verify_broker(&headers, state.config.oauth_shared_secret.as_deref())?;

  let existing = state
    .store
    .find_user_by_email(&body.email)
    .await
    .map_err(Error::action("oauthSignIn"))?;

  let (user, status) = match existing {
    Some(creds) => (creds.user, StatusCode::OK),
    None => {
      let user = state
        .store
        .create_user(NewUser {
          name:          body.name,
          email:         body.email,
          image:         body.image,
          password_hash: None,
        })
        .await
        .map_err(Error::action("oauthSignIn"))?;
      tracing::info!(user = %user.id, "user provisioned from identity provider");
      (user, StatusCode::CREATED)
    }
  };

  Ok(with_session(&state, &user, status, json!({ "user": user })))
}

// ─── Logout ───────────────────────────────────────────────────────────────────

/// `POST /api/logout`
pub async fn logout<S>(State(state): State<AppState<S>>) -> impl IntoResponse
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  (
    StatusCode::NO_CONTENT,
    [(header::SET_COOKIE, clear_cookie(state.config.secure_cookies))],
  )
}
