//! Data-access actions, one module per resource.
//!
//! Every handler takes [`CurrentUser`](crate::auth::CurrentUser) first, so the
//! session is resolved before the store is touched. Project-scoped handlers
//! additionally go through [`owned_project`].

pub mod files;
pub mod profile;
pub mod projects;
pub mod queries;
pub mod schemas;
pub mod session;

use sqlpilot_core::{project::Project, store::WorkspaceStore, user::User};
use uuid::Uuid;

use crate::error::Error;

/// Load project `id` on behalf of `user`. A project owned by someone else is
/// indistinguishable from a missing one.
pub(crate) async fn owned_project<S>(
  store: &S,
  user: &User,
  id: Uuid,
  action: &'static str,
) -> Result<Project, Error>
where
  S: WorkspaceStore,
{
  match store.get_project(id).await.map_err(Error::action(action))? {
    Some(p) if p.created_by == user.id => Ok(p),
    _ => Err(Error::NotFound("project")),
  }
}
