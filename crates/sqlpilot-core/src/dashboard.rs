//! Per-session view state for the dashboard.
//!
//! A cache of what the user is currently looking at, handed explicitly to
//! whatever renders the workspace. It is not a source of truth and is never
//! persisted; a fresh [`DashboardState::default`] is the state after reload.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Dialect, project::{Project, Schema}, user::Connection};

/// Endpoint the dashboard queries against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveConnection {
  pub dialect: Dialect,
  pub host:    String,
  pub port:    u16,
}

impl Default for ActiveConnection {
  fn default() -> Self {
    Self {
      dialect: Dialect::Trino,
      host:    "localhost".into(),
      port:    4032,
    }
  }
}

impl From<&Connection> for ActiveConnection {
  fn from(c: &Connection) -> Self {
    Self {
      dialect: c.dialect,
      host:    c.host.clone(),
      port:    c.port,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveProject {
  pub id:    Uuid,
  pub title: String,
}

impl From<&Project> for ActiveProject {
  fn from(p: &Project) -> Self {
    Self { id: p.id, title: p.title.clone() }
  }
}

/// Mutable, last-writer-wins container. No derived fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardState {
  connection: ActiveConnection,
  schema:     Option<Schema>,
  project:    Option<ActiveProject>,
  catalog:    Option<String>,
}

impl DashboardState {
  pub fn connection(&self) -> &ActiveConnection { &self.connection }

  pub fn schema(&self) -> Option<&Schema> { self.schema.as_ref() }

  pub fn project(&self) -> Option<&ActiveProject> { self.project.as_ref() }

  pub fn catalog(&self) -> Option<&str> { self.catalog.as_deref() }

  pub fn set_connection(&mut self, connection: ActiveConnection) {
    self.connection = connection;
  }

  pub fn set_schema(&mut self, schema: Schema) { self.schema = Some(schema); }

  pub fn set_project(&mut self, project: ActiveProject) {
    self.project = Some(project);
  }

  pub fn set_catalog(&mut self, catalog: impl Into<String>) {
    self.catalog = Some(catalog.into());
  }
}
