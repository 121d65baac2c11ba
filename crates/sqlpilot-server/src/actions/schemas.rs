//! Handlers for `/api/projects/{id}/schemas`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `.../schemas` | all schemas of the project |
//! | `POST` | `.../schemas` | `{name, ddl, diagram}`; upsert by name or DDL |
//! | `POST` | `.../schemas/apply` | save, then run each DDL statement in the engine |
//! | `POST` | `.../schemas/generate` | `{businessDescription}`; nothing is saved |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use sqlpilot_core::{
  Dialect,
  project::{SavedSchema, Schema, SchemaInput},
  query::QueryResult,
  store::WorkspaceStore,
  user::User,
};
use sqlpilot_engine::GeneratedSchema;
use uuid::Uuid;

use super::owned_project;
use crate::{AppState, auth::CurrentUser, error::Error};

/// `GET .../schemas`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Schema>>, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  owned_project(state.store.as_ref(), &user, project_id, "getSchemas").await?;
  let schemas = state
    .store
    .list_schemas(project_id)
    .await
    .map_err(Error::action("getSchemas"))?;
  Ok(Json(schemas))
}

#[derive(Debug, Deserialize)]
pub struct SaveBody {
  pub name:    String,
  pub ddl:     String,
  #[serde(default)]
  pub diagram: String,
}

async fn store_schema<S>(
  state: &AppState<S>,
  user: &User,
  project_id: Uuid,
  body: SaveBody,
  action: &'static str,
) -> Result<SavedSchema, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  owned_project(state.store.as_ref(), user, project_id, action).await?;
  let saved = state
    .store
    .save_schema(SchemaInput {
      project_id,
      name: body.name,
      ddl: body.ddl,
      diagram: body.diagram,
    })
    .await
    .map_err(Error::action(action))?;

  tracing::info!(schema = %saved.schema.id, created = saved.created, "schema saved");
  Ok(saved)
}

fn save_status(saved: &SavedSchema) -> StatusCode {
  if saved.created { StatusCode::CREATED } else { StatusCode::OK }
}

/// `POST .../schemas`
///
/// Responds 201 when a record was inserted and 200 when an existing one was
/// overwritten.
pub async fn save<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(project_id): Path<Uuid>,
  Json(body): Json<SaveBody>,
) -> Result<impl IntoResponse, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  let saved = store_schema(&state, &user, project_id, body, "saveSchema").await?;
  Ok((save_status(&saved), Json(saved)))
}

// ─── Apply ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ApplyBody {
  #[serde(flatten)]
  pub schema:  SaveBody,
  #[serde(default)]
  pub dialect: Dialect,
}

/// Engine outcome of one DDL statement.
#[derive(Debug, Serialize)]
pub struct StatementOutcome {
  pub statement: String,
  pub result:    QueryResult,
}

#[derive(Debug, Serialize)]
pub struct Applied {
  #[serde(flatten)]
  pub saved:      SavedSchema,
  pub statements: Vec<StatementOutcome>,
}

/// `POST .../schemas/apply`
///
/// Saves the schema, then sends its statements to the engine one at a time,
/// in order. A statement the engine rejects is reported and the rest still
/// run. Nothing is rolled back: if the engine becomes unreachable partway,
/// the schema stays saved and earlier statements stay applied.
pub async fn apply<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(project_id): Path<Uuid>,
  Json(body): Json<ApplyBody>,
) -> Result<impl IntoResponse, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  let saved = store_schema(&state, &user, project_id, body.schema, "applySchema").await?;
  let schema = &saved.schema;

  let mut statements = Vec::new();
  for statement in schema.ddl_statements() {
    let result = state
      .engine
      .execute_query(&statement, &schema.name, body.dialect)
      .await?;
    statements.push(StatementOutcome { statement, result });
  }

  let failed = statements.iter().filter(|s| !s.result.is_success()).count();
  tracing::info!(schema = %schema.id, total = statements.len(), failed, "schema applied");

  let status = save_status(&saved);
  Ok((status, Json(Applied { saved, statements })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody {
  pub business_description: String,
}

/// `POST .../schemas/generate`
pub async fn generate<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(project_id): Path<Uuid>,
  Json(body): Json<GenerateBody>,
) -> Result<Json<GeneratedSchema>, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  owned_project(state.store.as_ref(), &user, project_id, "generateSchema").await?;
  if body.business_description.trim().is_empty() {
    return Err(Error::BadRequest("Business description is required".into()));
  }
  let generated = state.engine.generate_schema(&body.business_description).await?;
  Ok(Json(generated))
}
