//! Handlers for `/api/projects/{id}/files`.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use sqlpilot_core::{
  project::{File, NewFile},
  store::WorkspaceStore,
};
use uuid::Uuid;

use super::owned_project;
use crate::{AppState, auth::CurrentUser, error::Error};

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name: String,
}

/// `POST .../files`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(project_id): Path<Uuid>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  owned_project(state.store.as_ref(), &user, project_id, "createFile").await?;
  let file = state
    .store
    .create_file(NewFile { project_id, name: body.name })
    .await
    .map_err(Error::action("createFile"))?;
  Ok((StatusCode::CREATED, Json(file)))
}

/// `GET .../files`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<File>>, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  owned_project(state.store.as_ref(), &user, project_id, "getFilesByProjectId").await?;
  let files = state
    .store
    .list_files(project_id)
    .await
    .map_err(Error::action("getFilesByProjectId"))?;
  Ok(Json(files))
}
