//! Handlers for `/api/projects`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/projects` | `{title, description?}`; owner is the caller |
//! | `GET`  | `/api/projects` | optional `?limit=n` (0 means no cap), insertion order |
//! | `GET`  | `/api/projects/{id}` | 404 unless owned by the caller |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use sqlpilot_core::{
  project::{NewProject, Project},
  store::WorkspaceStore,
};
use uuid::Uuid;

use super::owned_project;
use crate::{AppState, auth::CurrentUser, error::Error};

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub title:       String,
  #[serde(default)]
  pub description: Option<String>,
}

/// `POST /api/projects`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  let project = state
    .store
    .create_project(NewProject {
      title:       body.title,
      description: body.description,
      created_by:  user.id,
    })
    .await
    .map_err(Error::action("createProject"))?;

  tracing::info!(project = %project.id, owner = %user.id, "project created");
  Ok((StatusCode::CREATED, Json(json!({ "id": project.id, "project": project }))))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Cap on the number of projects; `0` is the same as absent.
  pub limit: Option<usize>,
}

/// `GET /api/projects[?limit=n]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Project>>, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  let projects = state
    .store
    .list_projects_by_owner(user.id, params.limit.filter(|&l| l > 0))
    .await
    .map_err(Error::action("getProjectsByUser"))?;
  Ok(Json(projects))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /api/projects/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Project>, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  owned_project(state.store.as_ref(), &user, id, "getProject").await.map(Json)
}
