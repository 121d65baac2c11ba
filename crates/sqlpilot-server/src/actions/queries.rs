//! Handlers for `/api/projects/{id}/queries`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `.../queries` | last 100, newest first, as [`QueryView`] |
//! | `POST` | `.../queries` | append one record from the UI's outcome shape |
//! | `POST` | `.../queries/translate`   | natural language to SQL |
//! | `POST` | `.../queries/execute`     | run and record the attempt |
//! | `POST` | `.../queries/suggestions` | completion hints, never fails |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlpilot_core::{
  Dialect,
  project::{Project, Schema},
  query::{NewQuery, QueryFailure, QueryOutput, QueryRecord, QueryResult},
  store::{QUERY_HISTORY_LIMIT, WorkspaceStore},
  user::User,
};
use sqlpilot_engine::Translation;
use uuid::Uuid;

use super::owned_project;
use crate::{AppState, auth::CurrentUser, error::Error};

// ─── View ─────────────────────────────────────────────────────────────────────

/// A history record flattened for the UI.
///
/// `success` holds the JSON text of the result set, or `""` for a failed
/// attempt. Exactly one of `output` and `error` is non-null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryView {
  pub id:         Uuid,
  pub project:    Uuid,
  pub schema_id:  Uuid,
  pub query_text: String,
  pub dialect:    Dialect,
  pub success:    String,
  pub output:     Option<QueryOutput>,
  pub error:      Option<QueryFailure>,
  pub created_at: DateTime<Utc>,
}

impl TryFrom<&QueryRecord> for QueryView {
  type Error = serde_json::Error;

  fn try_from(record: &QueryRecord) -> Result<Self, Self::Error> {
    let (success, output, error) = match &record.result {
      QueryResult::Success(out) => (serde_json::to_string(out)?, Some(out.clone()), None),
      QueryResult::Failure(f) => (String::new(), None, Some(f.clone())),
    };
    Ok(Self {
      id: record.id,
      project: record.project_id,
      schema_id: record.schema_id,
      query_text: record.query_text.clone(),
      dialect: record.dialect,
      success,
      output,
      error,
      created_at: record.created_at,
    })
  }
}

fn view(record: &QueryRecord, action: &'static str) -> Result<QueryView, Error> {
  QueryView::try_from(record).map_err(Error::action(action))
}

/// Load `schema_id` and check it belongs to `project`.
async fn project_schema<S>(
  store: &S,
  project: &Project,
  schema_id: Uuid,
  action: &'static str,
) -> Result<Schema, Error>
where
  S: WorkspaceStore,
{
  match store.get_schema(schema_id).await.map_err(Error::action(action))? {
    Some(s) if s.project_id == project.id => Ok(s),
    _ => Err(Error::NotFound("schema")),
  }
}

async fn scoped<S>(
  state: &AppState<S>,
  user: &User,
  project_id: Uuid,
  schema_id: Uuid,
  action: &'static str,
) -> Result<Schema, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  let project = owned_project(state.store.as_ref(), user, project_id, action).await?;
  project_schema(state.store.as_ref(), &project, schema_id, action).await
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET .../queries`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<QueryView>>, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  owned_project(state.store.as_ref(), &user, project_id, "getQueries").await?;
  let records = state
    .store
    .list_recent_queries(project_id, QUERY_HISTORY_LIMIT)
    .await
    .map_err(Error::action("getQueries"))?;

  records
    .iter()
    .map(|r| view(r, "getQueries"))
    .collect::<Result<Vec<_>, _>>()
    .map(Json)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveBody {
  pub schema_id:      Uuid,
  pub query_text:     String,
  #[serde(default)]
  pub dialect:        Dialect,
  pub output_columns: Option<Vec<String>>,
  pub output_rows:    Option<Vec<Vec<serde_json::Value>>>,
  pub error_message:  Option<String>,
  pub error_name:     Option<String>,
}

/// `POST .../queries`
pub async fn save<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(project_id): Path<Uuid>,
  Json(body): Json<SaveBody>,
) -> Result<impl IntoResponse, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  scoped(&state, &user, project_id, body.schema_id, "saveQuery").await?;
  let record = state
    .store
    .save_query(NewQuery {
      project_id,
      schema_id: body.schema_id,
      query_text: body.query_text,
      dialect: body.dialect,
      result: QueryResult::from_parts(
        body.output_columns,
        body.output_rows,
        body.error_message,
        body.error_name,
      ),
    })
    .await
    .map_err(Error::action("saveQuery"))?;
  Ok((StatusCode::CREATED, Json(view(&record, "saveQuery")?)))
}

// ─── Engine round trips ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateBody {
  pub schema_id:     Uuid,
  pub natural_query: String,
  #[serde(default)]
  pub dialect:       Dialect,
}

/// `POST .../queries/translate`
pub async fn translate<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(project_id): Path<Uuid>,
  Json(body): Json<TranslateBody>,
) -> Result<Json<Translation>, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  let schema = scoped(&state, &user, project_id, body.schema_id, "translateQuery").await?;
  if body.natural_query.trim().is_empty() {
    return Err(Error::BadRequest("Question is required".into()));
  }
  let translation = state
    .engine
    .translate_sql(&body.natural_query, &schema.ddl_statements(), body.dialect)
    .await?;
  Ok(Json(translation))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteBody {
  pub schema_id: Uuid,
  pub sql:       String,
  #[serde(default)]
  pub dialect:   Dialect,
}

/// `POST .../queries/execute`
///
/// An engine-reported failure is recorded like a success; only a call that
/// never completed leaves no record.
pub async fn execute<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(project_id): Path<Uuid>,
  Json(body): Json<ExecuteBody>,
) -> Result<impl IntoResponse, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  let schema = scoped(&state, &user, project_id, body.schema_id, "executeQuery").await?;
  if body.sql.trim().is_empty() {
    return Err(Error::BadRequest("SQL is required".into()));
  }

  let result = state.engine.execute_query(&body.sql, &schema.name, body.dialect).await?;
  if let QueryResult::Failure(f) = &result {
    tracing::info!(schema = %schema.id, kind = %f.name, "query failed in engine");
  }

  let record = state
    .store
    .save_query(NewQuery {
      project_id,
      schema_id: schema.id,
      query_text: body.sql,
      dialect: body.dialect,
      result,
    })
    .await
    .map_err(Error::action("executeQuery"))?;
  Ok((StatusCode::CREATED, Json(view(&record, "executeQuery")?)))
}

#[derive(Debug, Deserialize)]
pub struct SuggestionsBody {
  pub query: String,
}

/// `POST .../queries/suggestions`
pub async fn suggestions<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(project_id): Path<Uuid>,
  Json(body): Json<SuggestionsBody>,
) -> Result<impl IntoResponse, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  owned_project(state.store.as_ref(), &user, project_id, "querySuggestions").await?;
  let suggestions = match state.engine.query_suggestions(&body.query).await {
    Ok(s) => s,
    Err(e) => {
      tracing::warn!(error = %e, "suggestions unavailable");
      Vec::new()
    }
  };
  Ok(Json(json!({ "suggestions": suggestions })))
}
