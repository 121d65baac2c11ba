//! Session/auth gate: resolves the caller to a [`User`] before any action
//! touches their data.
//!
//! Two ways in: a password credential checked against an argon2 hash, and an
//! identity asserted by the OAuth broker (trusted through a shared secret).

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use rand_core::OsRng;
use sha2::{Digest, Sha256};
use sqlpilot_core::{store::WorkspaceStore, user::User};

use crate::{AppState, error::Error, session::{bearer_token, token_from_headers}};

/// The authenticated caller. Present in a handler means the request carried
/// a valid session naming an existing user.
pub struct CurrentUser(pub User);

/// Resolve the session on `headers` to a stored user.
pub async fn resolve<S>(headers: &HeaderMap, state: &AppState<S>) -> Result<User, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  let token = token_from_headers(headers).ok_or(Error::Unauthenticated)?;
  let claims = state.session.verify(token).map_err(|e| {
    tracing::debug!(reason = %e, "session rejected");
    Error::Unauthenticated
  })?;

  state
    .store
    .get_user(claims.sub)
    .await
    .map_err(Error::action("resolveSession"))?
    .ok_or(Error::IdentityNotFound)
}

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    resolve(&parts.headers, state).await.map(CurrentUser)
  }
}

// ─── Password credentials ─────────────────────────────────────────────────────

/// Produce the argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| Error::Action {
      action: "hashPassword",
      source: e.to_string().into(),
    })
}

/// Check `password` against a stored PHC string. Unparseable hashes never
/// verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
  PasswordHash::new(hash)
    .map(|parsed| {
      Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
    })
    .unwrap_or(false)
}

// ─── OAuth broker ─────────────────────────────────────────────────────────────

/// Check that the request comes from the identity broker. Fails with
/// `NotFound` when no broker is configured so the route looks absent.
pub fn verify_broker(headers: &HeaderMap, shared_secret: Option<&str>) -> Result<(), Error> {
  let expected = shared_secret.ok_or(Error::NotFound("route"))?;
  let presented = bearer_token(headers).ok_or(Error::Unauthenticated)?;

  // Compare digests so the comparison time does not depend on the secret.
  if Sha256::digest(presented.as_bytes()) != Sha256::digest(expected.as_bytes()) {
    return Err(Error::Unauthenticated);
  }
  Ok(())
}

/// Default avatar for accounts registered with a password.
pub fn avatar_url(name: &str) -> String {
  format!(
    "https://ui-avatars.com/api/?name={}&background=random",
    urlencoding::encode(name.trim())
  )
}
