//! Users and the database endpoints they keep on file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Dialect, Error, Result, validate};

// ─── User ────────────────────────────────────────────────────────────────────

/// An account. The password hash never travels with this type; see
/// [`UserCredentials`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id:          Uuid,
  pub name:        String,
  pub email:       String,
  /// Avatar URL.
  pub image:       String,
  pub connections: Vec<Uuid>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// A user together with the stored password hash, for the credential path.
#[derive(Debug, Clone)]
pub struct UserCredentials {
  pub user:          User,
  /// argon2 PHC string. `None` for accounts provisioned through OAuth.
  pub password_hash: Option<String>,
}

/// Input for [`WorkspaceStore::create_user`](crate::store::WorkspaceStore::create_user).
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:          String,
  pub email:         String,
  pub image:         String,
  pub password_hash: Option<String>,
}

impl NewUser {
  pub fn validate(&self) -> Result<()> {
    validate::char_len("name", &self.name, 2, Some(100))?;
    validate_email(&self.email)?;
    validate::required("image", &self.image)
  }
}

/// Partial profile edit. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
  pub name:  Option<String>,
  pub image: Option<String>,
}

impl ProfileUpdate {
  pub fn validate(&self) -> Result<()> {
    if let Some(name) = &self.name {
      validate::char_len("name", name, 2, Some(100))?;
    }
    if let Some(image) = &self.image {
      validate::required("image", image)?;
    }
    Ok(())
  }
}

fn validate_email(email: &str) -> Result<()> {
  validate::required("email", email)?;
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
    _ => Err(Error::Validation {
      field:  "email",
      reason: "must be an address".into(),
    }),
  }
}

// ─── Connection ──────────────────────────────────────────────────────────────

/// A stored engine endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
  pub id:         Uuid,
  pub dialect:    Dialect,
  pub host:       String,
  pub port:       u16,
  /// Database or catalog name; unique across connections.
  pub database:   String,
  pub username:   String,
  #[serde(skip_serializing, default)]
  pub password:   String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewConnection {
  pub dialect:  Dialect,
  pub host:     String,
  pub port:     u16,
  pub database: String,
  pub username: String,
  pub password: String,
}

impl NewConnection {
  pub fn validate(&self) -> Result<()> {
    validate::required("host", &self.host)?;
    validate::required("database", &self.database)?;
    validate::required("username", &self.username)?;
    validate::required("password", &self.password)?;
    if self.port == 0 {
      return Err(Error::Validation {
        field:  "port",
        reason: "must be non-zero".into(),
      });
    }
    Ok(())
  }
}
