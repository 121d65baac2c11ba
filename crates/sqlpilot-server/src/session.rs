//! Signed session tokens.
//!
//! A token is `base64url(claims JSON) "." hex(HMAC-SHA256(payload))`. It is
//! carried in the `authToken` cookie or, for API clients, a bearer header.
//! Tokens expire; there is no rotation or server-side revocation.

use axum::http::{HeaderMap, header};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sqlpilot_core::user::User;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "authToken";

/// Shortest accepted signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted session lifetime: one year.
pub const MAX_TTL_HOURS: i64 = 24 * 366;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
  #[error("session secret must be at least {MIN_SECRET_LEN} bytes")]
  WeakSecret,
  #[error("session lifetime must be between 1 and {MAX_TTL_HOURS} hours, got {0}")]
  InvalidTtl(i64),
  #[error("malformed session token")]
  Malformed,
  #[error("session signature mismatch")]
  BadSignature,
  #[error("session expired")]
  Expired,
}

/// What a token asserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  /// User id.
  pub sub:   Uuid,
  pub email: String,
  /// Expiry, seconds since the epoch.
  pub exp:   i64,
}

/// Issues and verifies session tokens with one server secret.
#[derive(Clone)]
pub struct SessionKeys {
  mac: HmacSha256,
  ttl: Duration,
}

impl SessionKeys {
  /// Build the keys for `secret`, issuing tokens valid for `ttl_hours`.
  pub fn new(secret: &[u8], ttl_hours: i64) -> Result<Self, SessionError> {
    if secret.len() < MIN_SECRET_LEN {
      return Err(SessionError::WeakSecret);
    }
    let ttl = Duration::try_hours(ttl_hours)
      .filter(|_| (1..=MAX_TTL_HOURS).contains(&ttl_hours))
      .ok_or(SessionError::InvalidTtl(ttl_hours))?;
    let mac = HmacSha256::new_from_slice(secret).map_err(|_| SessionError::WeakSecret)?;
    Ok(Self { mac, ttl })
  }

  pub fn issue(&self, user: &User) -> String { self.issue_at(user, Utc::now()) }

  pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> String {
    let claims = Claims {
      sub:   user.id,
      email: user.email.clone(),
      exp:   (now + self.ttl).timestamp(),
    };
    // Serialising a struct of plain fields cannot fail.
    let json = serde_json::to_vec(&claims).unwrap_or_default();
    let payload = B64.encode(json);
    let signature = hex::encode(self.sign(payload.as_bytes()));
    format!("{payload}.{signature}")
  }

  pub fn verify(&self, token: &str) -> Result<Claims, SessionError> {
    self.verify_at(token, Utc::now())
  }

  pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, SessionError> {
    let (payload, signature) = token.split_once('.').ok_or(SessionError::Malformed)?;
    let signature = hex::decode(signature).map_err(|_| SessionError::Malformed)?;

    let mut mac = self.mac.clone();
    mac.update(payload.as_bytes());
    mac
      .verify_slice(&signature)
      .map_err(|_| SessionError::BadSignature)?;

    let json = B64.decode(payload).map_err(|_| SessionError::Malformed)?;
    let claims: Claims = serde_json::from_slice(&json).map_err(|_| SessionError::Malformed)?;
    if claims.exp <= now.timestamp() {
      return Err(SessionError::Expired);
    }
    Ok(claims)
  }

  /// `Set-Cookie` value carrying `token`.
  pub fn cookie(&self, token: &str, secure: bool) -> String {
    let mut cookie = format!(
      "{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
      self.ttl.num_seconds()
    );
    if secure {
      cookie.push_str("; Secure");
    }
    cookie
  }

  fn sign(&self, payload: &[u8]) -> Vec<u8> {
    let mut mac = self.mac.clone();
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
  }
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_cookie(secure: bool) -> String {
  let mut cookie = format!("{SESSION_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0");
  if secure {
    cookie.push_str("; Secure");
  }
  cookie
}

/// Find the session token in the request: the cookie first, then a bearer
/// `Authorization` header.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
  let from_cookie = headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
    .map(|(_, value)| value);

  from_cookie.or_else(|| bearer_token(headers))
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}
