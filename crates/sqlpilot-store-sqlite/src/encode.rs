//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so that lexical order equals chronological order. UUIDs are stored as
//! hyphenated lowercase strings. Query outcomes are compact JSON.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use rusqlite::Row;
use sqlpilot_core::{
  Dialect,
  project::{File, Project, Schema},
  query::{QueryFailure, QueryOutput, QueryRecord, QueryResult},
  user::{Connection, User},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// The current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Dialect ──────────────────────────────────────────────────────────────────

pub fn encode_dialect(d: Dialect) -> &'static str { d.as_str() }

pub fn decode_dialect(s: &str) -> Result<Dialect> { Ok(s.parse()?) }

// ─── Query outcome ────────────────────────────────────────────────────────────

/// Split an outcome into the `(output_json, error_json)` column pair.
pub fn encode_result(r: &QueryResult) -> Result<(Option<String>, Option<String>)> {
  Ok(match r {
    QueryResult::Success(o) => (Some(serde_json::to_string(o)?), None),
    QueryResult::Failure(f) => (None, Some(serde_json::to_string(f)?)),
  })
}

pub fn decode_result(output: Option<&str>, error: Option<&str>) -> Result<QueryResult> {
  match (output, error) {
    (Some(o), None) => Ok(QueryResult::Success(serde_json::from_str::<QueryOutput>(o)?)),
    (None, Some(e)) => Ok(QueryResult::Failure(serde_json::from_str::<QueryFailure>(e)?)),
    _ => Err(Error::Corrupt("query row must carry exactly one outcome".into())),
  }
}

// ─── Unique-constraint detection ──────────────────────────────────────────────

pub fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str =
  "user_id, name, email, image, password_hash, created_at, updated_at";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub name:          String,
  pub email:         String,
  pub image:         String,
  pub password_hash: Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      name:          row.get(1)?,
      email:         row.get(2)?,
      image:         row.get(3)?,
      password_hash: row.get(4)?,
      created_at:    row.get(5)?,
      updated_at:    row.get(6)?,
    })
  }

  /// Decode into a [`User`], returning the password hash alongside.
  pub fn into_user(self, connections: &[String]) -> Result<(User, Option<String>)> {
    let user = User {
      id:          decode_uuid(&self.user_id)?,
      name:        self.name,
      email:       self.email,
      image:       self.image,
      connections: connections
        .iter()
        .map(|c| decode_uuid(c))
        .collect::<Result<_>>()?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    };
    Ok((user, self.password_hash))
  }
}

pub struct RawConnection {
  pub connection_id: String,
  pub dialect:       String,
  pub host:          String,
  pub port:          i64,
  pub database:      String,
  pub username:      String,
  pub password:      String,
  pub created_at:    String,
}

impl RawConnection {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      connection_id: row.get(0)?,
      dialect:       row.get(1)?,
      host:          row.get(2)?,
      port:          row.get(3)?,
      database:      row.get(4)?,
      username:      row.get(5)?,
      password:      row.get(6)?,
      created_at:    row.get(7)?,
    })
  }

  pub fn into_connection(self) -> Result<Connection> {
    Ok(Connection {
      id:         decode_uuid(&self.connection_id)?,
      dialect:    decode_dialect(&self.dialect)?,
      host:       self.host,
      port:       u16::try_from(self.port)
        .map_err(|_| Error::Corrupt(format!("port out of range: {}", self.port)))?,
      database:   self.database,
      username:   self.username,
      password:   self.password,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const PROJECT_COLUMNS: &str =
  "project_id, title, description, created_by, created_at, updated_at";

pub struct RawProject {
  pub project_id:  String,
  pub title:       String,
  pub description: Option<String>,
  pub created_by:  String,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawProject {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      project_id:  row.get(0)?,
      title:       row.get(1)?,
      description: row.get(2)?,
      created_by:  row.get(3)?,
      created_at:  row.get(4)?,
      updated_at:  row.get(5)?,
    })
  }

  pub fn into_project(self) -> Result<Project> {
    Ok(Project {
      id:          decode_uuid(&self.project_id)?,
      title:       self.title,
      description: self.description,
      created_by:  decode_uuid(&self.created_by)?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

pub const SCHEMA_COLUMNS: &str =
  "schema_id, project_id, name, ddl, diagram, created_at, updated_at";

pub struct RawSchema {
  pub schema_id:  String,
  pub project_id: String,
  pub name:       String,
  pub ddl:        String,
  pub diagram:    String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawSchema {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      schema_id:  row.get(0)?,
      project_id: row.get(1)?,
      name:       row.get(2)?,
      ddl:        row.get(3)?,
      diagram:    row.get(4)?,
      created_at: row.get(5)?,
      updated_at: row.get(6)?,
    })
  }

  pub fn into_schema(self) -> Result<Schema> {
    Ok(Schema {
      id:         decode_uuid(&self.schema_id)?,
      project_id: decode_uuid(&self.project_id)?,
      name:       self.name,
      ddl:        self.ddl,
      diagram:    self.diagram,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub const QUERY_COLUMNS: &str =
  "query_id, project_id, schema_id, query_text, dialect, output_json, error_json, created_at";

pub struct RawQuery {
  pub query_id:    String,
  pub project_id:  String,
  pub schema_id:   String,
  pub query_text:  String,
  pub dialect:     String,
  pub output_json: Option<String>,
  pub error_json:  Option<String>,
  pub created_at:  String,
}

impl RawQuery {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      query_id:    row.get(0)?,
      project_id:  row.get(1)?,
      schema_id:   row.get(2)?,
      query_text:  row.get(3)?,
      dialect:     row.get(4)?,
      output_json: row.get(5)?,
      error_json:  row.get(6)?,
      created_at:  row.get(7)?,
    })
  }

  pub fn into_record(self) -> Result<QueryRecord> {
    Ok(QueryRecord {
      id:         decode_uuid(&self.query_id)?,
      project_id: decode_uuid(&self.project_id)?,
      schema_id:  decode_uuid(&self.schema_id)?,
      query_text: self.query_text,
      dialect:    decode_dialect(&self.dialect)?,
      result:     decode_result(self.output_json.as_deref(), self.error_json.as_deref())?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const FILE_COLUMNS: &str = "file_id, project_id, name, created_at";

pub struct RawFile {
  pub file_id:    String,
  pub project_id: String,
  pub name:       String,
  pub created_at: String,
}

impl RawFile {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      file_id:    row.get(0)?,
      project_id: row.get(1)?,
      name:       row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_file(self) -> Result<File> {
    Ok(File {
      id:         decode_uuid(&self.file_id)?,
      project_id: decode_uuid(&self.project_id)?,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.timestamp_opt(1_700_000_000, 5_000).unwrap();
    let b = Utc.timestamp_opt(1_700_000_000, 120_000_000).unwrap();
    let c = Utc.timestamp_opt(1_700_000_001, 0).unwrap();
    let (ea, eb, ec) = (encode_dt(a), encode_dt(b), encode_dt(c));
    assert!(ea < eb && eb < ec, "{ea} {eb} {ec}");
    assert_eq!(ea.len(), ec.len());
  }

  #[test]
  fn timestamp_roundtrip_at_store_precision() {
    let t = now();
    assert_eq!(decode_dt(&encode_dt(t)).unwrap(), t);
  }

  #[test]
  fn outcome_with_both_columns_is_corrupt() {
    assert!(matches!(
      decode_result(Some("{}"), Some("{}")),
      Err(Error::Corrupt(_))
    ));
    assert!(matches!(decode_result(None, None), Err(Error::Corrupt(_))));
  }
}
