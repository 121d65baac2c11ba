//! [`SqliteStore`]: the SQLite implementation of [`WorkspaceStore`].

use std::path::Path;

use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use sqlpilot_core::{
  project::{File, NewFile, NewProject, Project, SavedSchema, Schema, SchemaInput},
  query::{NewQuery, QueryRecord},
  store::WorkspaceStore,
  user::{Connection, NewConnection, NewUser, ProfileUpdate, User, UserCredentials},
};

use crate::{
  encode::{
    FILE_COLUMNS, PROJECT_COLUMNS, QUERY_COLUMNS, RawConnection,
    RawFile, RawProject, RawQuery, RawSchema, RawUser, SCHEMA_COLUMNS, USER_COLUMNS,
    decode_dt, decode_uuid, encode_dialect, encode_dt, encode_result, encode_uuid,
    is_unique_violation, now,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A SQLPilot document store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Read a user row plus its ordered connection references.
fn load_user(
  conn: &rusqlite::Connection,
  column: &str,
  value: &str,
) -> rusqlite::Result<Option<(RawUser, Vec<String>)>> {
  let raw = conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
      rusqlite::params![value],
      RawUser::from_row,
    )
    .optional()?;

  let Some(raw) = raw else { return Ok(None) };

  let mut stmt = conn.prepare(
    "SELECT connection_id FROM user_connections WHERE user_id = ?1 ORDER BY rowid",
  )?;
  let connections = stmt
    .query_map(rusqlite::params![raw.user_id], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;

  Ok(Some((raw, connections)))
}

// ─── WorkspaceStore impl ─────────────────────────────────────────────────────

impl WorkspaceStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    input.validate()?;

    let at   = now();
    let user = User {
      id:          Uuid::new_v4(),
      name:        input.name,
      email:       input.email,
      image:       input.image,
      connections: vec![],
      created_at:  at,
      updated_at:  at,
    };

    let id_str = encode_uuid(user.id);
    let name   = user.name.clone();
    let email  = user.email.clone();
    let image  = user.image.clone();
    let hash   = input.password_hash;
    let at_str = encode_dt(at);

    let inserted = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO users (user_id, name, email, image, password_hash, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          rusqlite::params![id_str, name, email, image, hash, at_str],
        ) {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(sqlpilot_core::Error::Duplicate("email").into());
    }
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(load_user(conn, "user_id", &id_str)?))
      .await?;

    raw
      .map(|(raw, conns)| raw.into_user(&conns).map(|(user, _)| user))
      .transpose()
  }

  async fn find_user_by_email<'a>(&'a self, email: &'a str) -> Result<Option<UserCredentials>> {
    let email = email.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(load_user(conn, "email", &email)?))
      .await?;

    raw
      .map(|(raw, conns)| {
        raw
          .into_user(&conns)
          .map(|(user, password_hash)| UserCredentials { user, password_hash })
      })
      .transpose()
  }

  async fn update_user_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Option<User>> {
    update.validate()?;

    let id_str = encode_uuid(id);
    let at_str = encode_dt(now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users
              SET name       = COALESCE(?2, name),
                  image      = COALESCE(?3, image),
                  updated_at = ?4
            WHERE user_id = ?1",
          rusqlite::params![id_str, update.name, update.image, at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_user(id).await
  }

  // ── Connections ───────────────────────────────────────────────────────────

  async fn create_connection(&self, input: NewConnection) -> Result<Connection> {
    input.validate()?;

    let connection = Connection {
      id:         Uuid::new_v4(),
      dialect:    input.dialect,
      host:       input.host,
      port:       input.port,
      database:   input.database,
      username:   input.username,
      password:   input.password,
      created_at: now(),
    };

    let id_str   = encode_uuid(connection.id);
    let dialect  = encode_dialect(connection.dialect);
    let host     = connection.host.clone();
    let port     = i64::from(connection.port);
    let database = connection.database.clone();
    let username = connection.username.clone();
    let password = connection.password.clone();
    let at_str   = encode_dt(connection.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO connections (
             connection_id, dialect, host, port, database_name, username, password, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![id_str, dialect, host, port, database, username, password, at_str],
        ) {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(sqlpilot_core::Error::Duplicate("database").into());
    }
    Ok(connection)
  }

  async fn link_connection(&self, user_id: Uuid, connection_id: Uuid) -> Result<()> {
    let user_str = encode_uuid(user_id);
    let conn_str = encode_uuid(connection_id);

    let linked = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row(
            "SELECT 1 FROM users WHERE user_id = ?1",
            rusqlite::params![user_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(false);
        }
        conn.execute(
          "INSERT OR IGNORE INTO user_connections (user_id, connection_id) VALUES (?1, ?2)",
          rusqlite::params![user_str, conn_str],
        )?;
        Ok(true)
      })
      .await?;

    if !linked {
      return Err(Error::UserNotFound(user_id));
    }
    Ok(())
  }

  async fn list_connections(&self, user_id: Uuid) -> Result<Vec<Connection>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawConnection> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT c.connection_id, c.dialect, c.host, c.port, c.database_name,
                  c.username, c.password, c.created_at
             FROM user_connections uc
             JOIN connections c ON c.connection_id = uc.connection_id
            WHERE uc.user_id = ?1
            ORDER BY uc.rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], RawConnection::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawConnection::into_connection).collect()
  }

  // ── Projects ──────────────────────────────────────────────────────────────

  async fn create_project(&self, input: NewProject) -> Result<Project> {
    input.validate()?;

    let at = now();
    let project = Project {
      id:          Uuid::new_v4(),
      title:       input.title,
      description: input.description,
      created_by:  input.created_by,
      created_at:  at,
      updated_at:  at,
    };

    let id_str      = encode_uuid(project.id);
    let title       = project.title.clone();
    let description = project.description.clone();
    let owner_str   = encode_uuid(project.created_by);
    let at_str      = encode_dt(at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO projects (project_id, title, description, created_by, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          rusqlite::params![id_str, title, description, owner_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(project)
  }

  async fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawProject> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE project_id = ?1"),
            rusqlite::params![id_str],
            RawProject::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawProject::into_project).transpose()
  }

  async fn list_projects_by_owner(&self, owner: Uuid, limit: Option<usize>) -> Result<Vec<Project>> {
    let owner_str = encode_uuid(owner);
    // SQLite treats a negative LIMIT as "no limit".
    let limit_val = limit.map_or(-1, |l| l as i64);

    let raws: Vec<RawProject> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROJECT_COLUMNS} FROM projects
            WHERE created_by = ?1
            ORDER BY rowid
            LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str, limit_val], RawProject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProject::into_project).collect()
  }

  // ── Schemas ───────────────────────────────────────────────────────────────

  async fn save_schema(&self, input: SchemaInput) -> Result<SavedSchema> {
    input.validate()?;

    let new_id      = Uuid::new_v4();
    let new_id_str  = encode_uuid(new_id);
    let project_str = encode_uuid(input.project_id);
    let name        = input.name.clone();
    let ddl         = input.ddl.clone();
    let diagram     = input.diagram.clone();
    let at          = now();
    let at_str      = encode_dt(at);

    // (schema_id, created_at, created)
    let (id_str, created_str, created): (String, String, bool) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<(String, String)> = tx
          .query_row(
            "SELECT schema_id, created_at FROM schemas
              WHERE project_id = ?1 AND (name = ?2 OR ddl = ?3)
              ORDER BY rowid
              LIMIT 1",
            rusqlite::params![project_str, name, ddl],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;

        let outcome = match existing {
          Some((id, created_at)) => {
            tx.execute(
              "UPDATE schemas SET name = ?2, ddl = ?3, diagram = ?4, updated_at = ?5
                WHERE schema_id = ?1",
              rusqlite::params![id, name, ddl, diagram, at_str],
            )?;
            (id, created_at, false)
          }
          None => {
            tx.execute(
              "INSERT INTO schemas (schema_id, project_id, name, ddl, diagram, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
              rusqlite::params![new_id_str, project_str, name, ddl, diagram, at_str],
            )?;
            (new_id_str, at_str, true)
          }
        };

        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    let schema = Schema {
      id:         decode_uuid(&id_str)?,
      project_id: input.project_id,
      name:       input.name,
      ddl:        input.ddl,
      diagram:    input.diagram,
      created_at: decode_dt(&created_str)?,
      updated_at: at,
    };
    tracing::debug!(schema_id = %schema.id, created, "schema saved");

    Ok(SavedSchema { schema, created })
  }

  async fn get_schema(&self, id: Uuid) -> Result<Option<Schema>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSchema> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SCHEMA_COLUMNS} FROM schemas WHERE schema_id = ?1"),
            rusqlite::params![id_str],
            RawSchema::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSchema::into_schema).transpose()
  }

  async fn list_schemas(&self, project_id: Uuid) -> Result<Vec<Schema>> {
    let project_str = encode_uuid(project_id);

    let raws: Vec<RawSchema> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SCHEMA_COLUMNS} FROM schemas WHERE project_id = ?1 ORDER BY rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![project_str], RawSchema::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSchema::into_schema).collect()
  }

  // ── Queries ───────────────────────────────────────────────────────────────

  async fn save_query(&self, input: NewQuery) -> Result<QueryRecord> {
    input.validate()?;

    let record = QueryRecord {
      id:         Uuid::new_v4(),
      project_id: input.project_id,
      schema_id:  input.schema_id,
      query_text: input.query_text,
      dialect:    input.dialect,
      result:     input.result,
      created_at: now(),
    };

    let (output_json, error_json) = encode_result(&record.result)?;
    let id_str      = encode_uuid(record.id);
    let project_str = encode_uuid(record.project_id);
    let schema_str  = encode_uuid(record.schema_id);
    let text        = record.query_text.clone();
    let dialect     = encode_dialect(record.dialect);
    let at_str      = encode_dt(record.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO queries (
             query_id, project_id, schema_id, query_text, dialect,
             output_json, error_json, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            project_str,
            schema_str,
            text,
            dialect,
            output_json,
            error_json,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(record)
  }

  async fn list_recent_queries(&self, project_id: Uuid, limit: usize) -> Result<Vec<QueryRecord>> {
    let project_str = encode_uuid(project_id);
    let limit_val   = limit as i64;

    let raws: Vec<RawQuery> = self
      .conn
      .call(move |conn| {
        // rowid breaks ties between records stamped in the same microsecond.
        let mut stmt = conn.prepare(&format!(
          "SELECT {QUERY_COLUMNS} FROM queries
            WHERE project_id = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![project_str, limit_val], RawQuery::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawQuery::into_record).collect()
  }

  // ── Files ─────────────────────────────────────────────────────────────────

  async fn create_file(&self, input: NewFile) -> Result<File> {
    input.validate()?;

    let file = File {
      id:         Uuid::new_v4(),
      project_id: input.project_id,
      name:       input.name,
      created_at: now(),
    };

    let id_str      = encode_uuid(file.id);
    let project_str = encode_uuid(file.project_id);
    let name        = file.name.clone();
    let at_str      = encode_dt(file.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO files (file_id, project_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, project_str, name, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(file)
  }

  async fn list_files(&self, project_id: Uuid) -> Result<Vec<File>> {
    let project_str = encode_uuid(project_id);

    let raws: Vec<RawFile> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {FILE_COLUMNS} FROM files WHERE project_id = ?1 ORDER BY rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![project_str], RawFile::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFile::into_file).collect()
  }
}
