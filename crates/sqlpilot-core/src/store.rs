//! The `WorkspaceStore` trait.
//!
//! Implemented by storage backends (e.g. `sqlpilot-store-sqlite`). The server
//! depends on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  project::{File, NewFile, NewProject, Project, SavedSchema, Schema, SchemaInput},
  query::{NewQuery, QueryRecord},
  user::{Connection, NewConnection, NewUser, ProfileUpdate, User, UserCredentials},
};

/// Number of records returned by a history listing.
pub const QUERY_HISTORY_LIMIT: usize = 100;

/// Abstraction over the document store.
///
/// Every write validates its input first; validation and uniqueness failures
/// surface through `Self::Error`. Query records are append-only.
///
/// All methods return `Send` futures so the trait can be used behind `axum`.
pub trait WorkspaceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Insert a user. Fails if the email is already registered.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look a user up by email, including the password hash.
  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<UserCredentials>, Self::Error>> + Send + 'a;

  /// Apply a profile edit. Returns `None` if the user does not exist.
  fn update_user_profile(
    &self,
    id: Uuid,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  // ── Connections ───────────────────────────────────────────────────────

  /// Insert a connection. Fails if the database name is already taken.
  fn create_connection(
    &self,
    input: NewConnection,
  ) -> impl Future<Output = Result<Connection, Self::Error>> + Send + '_;

  /// Append a connection reference to a user's list.
  fn link_connection(
    &self,
    user_id: Uuid,
    connection_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Connections referenced by the user, in link order.
  fn list_connections(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Connection>, Self::Error>> + Send + '_;

  // ── Projects ──────────────────────────────────────────────────────────

  fn create_project(
    &self,
    input: NewProject,
  ) -> impl Future<Output = Result<Project, Self::Error>> + Send + '_;

  fn get_project(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Project>, Self::Error>> + Send + '_;

  /// Projects owned by `owner` in insertion order, optionally capped.
  fn list_projects_by_owner(
    &self,
    owner: Uuid,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<Project>, Self::Error>> + Send + '_;

  // ── Schemas ───────────────────────────────────────────────────────────

  /// Upsert a schema: if a schema in the same project matches by name *or*
  /// by DDL it is overwritten in place, otherwise a new one is inserted.
  /// Lookup and write happen in one transaction.
  fn save_schema(
    &self,
    input: SchemaInput,
  ) -> impl Future<Output = Result<SavedSchema, Self::Error>> + Send + '_;

  fn get_schema(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Schema>, Self::Error>> + Send + '_;

  fn list_schemas(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Schema>, Self::Error>> + Send + '_;

  // ── Queries ───────────────────────────────────────────────────────────

  /// Append one query record. The store assigns `id` and `created_at`.
  fn save_query(
    &self,
    input: NewQuery,
  ) -> impl Future<Output = Result<QueryRecord, Self::Error>> + Send + '_;

  /// The `limit` most recent records of a project, newest first.
  fn list_recent_queries(
    &self,
    project_id: Uuid,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<QueryRecord>, Self::Error>> + Send + '_;

  // ── Files ─────────────────────────────────────────────────────────────

  fn create_file(
    &self,
    input: NewFile,
  ) -> impl Future<Output = Result<File, Self::Error>> + Send + '_;

  fn list_files(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<Vec<File>, Self::Error>> + Send + '_;
}
