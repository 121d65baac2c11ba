//! The caller's own account: profile and saved connections.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::Serialize;
use sqlpilot_core::{
  store::WorkspaceStore,
  user::{Connection, NewConnection, ProfileUpdate, User},
};

use crate::{AppState, auth::CurrentUser, error::Error};

/// A user with its connection references resolved.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  #[serde(flatten)]
  pub user:                  User,
  pub populated_connections: Vec<Connection>,
}

async fn load_profile<S>(state: &AppState<S>, user: User, action: &'static str) -> Result<Profile, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  let populated_connections = state
    .store
    .list_connections(user.id)
    .await
    .map_err(Error::action(action))?;
  Ok(Profile { user, populated_connections })
}

/// `GET /api/profile`
pub async fn get<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Profile>, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  load_profile(&state, user, "getProfile").await.map(Json)
}

/// `PATCH /api/profile`, body: `{"name"?, "image"?}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<ProfileUpdate>,
) -> Result<Json<Profile>, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  let updated = state
    .store
    .update_user_profile(user.id, body)
    .await
    .map_err(Error::action("updateProfile"))?
    .ok_or(Error::IdentityNotFound)?;
  load_profile(&state, updated, "updateProfile").await.map(Json)
}

/// `POST /api/connections`
pub async fn create_connection<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<NewConnection>,
) -> Result<impl IntoResponse, Error>
where
  S: WorkspaceStore + Clone + Send + Sync + 'static,
{
  let connection = state
    .store
    .create_connection(body)
    .await
    .map_err(Error::action("createConnection"))?;
  state
    .store
    .link_connection(user.id, connection.id)
    .await
    .map_err(Error::action("createConnection"))?;

  tracing::info!(user = %user.id, connection = %connection.id, "connection added");
  Ok((StatusCode::CREATED, Json(connection)))
}
