//! Projects and the documents scoped under them.
//!
//! A project is owned by exactly one user. Schemas, queries and files each
//! reference exactly one project. References are not cascading: nothing is
//! cleaned up when a project goes away.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, validate};

// ─── Project ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
  pub id:          Uuid,
  pub title:       String,
  pub description: Option<String>,
  /// The owning user.
  pub created_by:  Uuid,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProject {
  pub title:       String,
  pub description: Option<String>,
  pub created_by:  Uuid,
}

impl NewProject {
  pub fn validate(&self) -> Result<()> {
    validate::char_len("title", &self.title, 3, None)
  }
}

// ─── Schema ──────────────────────────────────────────────────────────────────

/// A DDL document plus its entity-relationship diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
  pub id:         Uuid,
  pub project_id: Uuid,
  pub name:       String,
  pub ddl:        String,
  /// Diagram markup (mermaid `erDiagram` source).
  pub diagram:    String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Schema {
  /// DDL split into individual statements the way the translator expects
  /// them: one chunk per blank-line separated block.
  pub fn ddl_statements(&self) -> Vec<String> {
    self
      .ddl
      .split("\n\n")
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_owned)
      .collect()
  }
}

/// Input for a schema save. Matching is by `name` or `ddl` within
/// `project_id`; see [`WorkspaceStore::save_schema`](crate::store::WorkspaceStore::save_schema).
#[derive(Debug, Clone)]
pub struct SchemaInput {
  pub project_id: Uuid,
  pub name:       String,
  pub ddl:        String,
  pub diagram:    String,
}

impl SchemaInput {
  pub fn validate(&self) -> Result<()> {
    validate::char_len("name", &self.name, 3, None)?;
    validate::required("ddl", &self.ddl)
  }
}

/// Result of a schema save.
#[derive(Debug, Clone, Serialize)]
pub struct SavedSchema {
  pub schema:  Schema,
  /// `false` when an existing record was overwritten.
  pub created: bool,
}

// ─── File ────────────────────────────────────────────────────────────────────

/// An uploaded dataset reference used by the "talk to data" view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
  pub id:         Uuid,
  pub project_id: Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFile {
  pub project_id: Uuid,
  pub name:       String,
}

impl NewFile {
  pub fn validate(&self) -> Result<()> {
    validate::char_len("name", &self.name, 2, Some(100))
  }
}
