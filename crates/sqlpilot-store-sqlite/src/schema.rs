//! SQL schema for the SQLPilot SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    image         TEXT NOT NULL,
    password_hash TEXT,            -- argon2 PHC string; NULL for OAuth accounts
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS connections (
    connection_id TEXT PRIMARY KEY,
    dialect       TEXT NOT NULL,   -- 'trino' | 'spark'
    host          TEXT NOT NULL,
    port          INTEGER NOT NULL,
    database_name TEXT NOT NULL UNIQUE,
    username      TEXT NOT NULL,
    password      TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

-- Ordered list of connection references held by a user.
CREATE TABLE IF NOT EXISTS user_connections (
    user_id       TEXT NOT NULL REFERENCES users(user_id),
    connection_id TEXT NOT NULL REFERENCES connections(connection_id),
    PRIMARY KEY (user_id, connection_id)
);

CREATE TABLE IF NOT EXISTS projects (
    project_id  TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    description TEXT,
    created_by  TEXT NOT NULL REFERENCES users(user_id),
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS schemas (
    schema_id   TEXT PRIMARY KEY,
    project_id  TEXT NOT NULL REFERENCES projects(project_id),
    name        TEXT NOT NULL,
    ddl         TEXT NOT NULL,
    diagram     TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- Query history is strictly append-only.
CREATE TABLE IF NOT EXISTS queries (
    query_id    TEXT PRIMARY KEY,
    project_id  TEXT NOT NULL REFERENCES projects(project_id),
    schema_id   TEXT NOT NULL REFERENCES schemas(schema_id),
    query_text  TEXT NOT NULL,
    dialect     TEXT NOT NULL,
    output_json TEXT,              -- {columns, rows} on success
    error_json  TEXT,              -- {message, name} on failure
    created_at  TEXT NOT NULL,
    CHECK ((output_json IS NULL) != (error_json IS NULL))
);

CREATE TABLE IF NOT EXISTS files (
    file_id     TEXT PRIMARY KEY,
    project_id  TEXT NOT NULL REFERENCES projects(project_id),
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS projects_owner_idx   ON projects(created_by);
CREATE INDEX IF NOT EXISTS schemas_project_idx  ON schemas(project_id);
CREATE INDEX IF NOT EXISTS queries_history_idx  ON queries(project_id, created_at);
CREATE INDEX IF NOT EXISTS files_project_idx    ON files(project_id);

PRAGMA user_version = 1;
";
