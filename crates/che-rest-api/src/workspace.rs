//! Workspace handlers

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use tracing::{debug, instrument};

use che_rest_workspace::Workspace;

use crate::error::Result;
use crate::server::AppState;

/// `GET /api/workspace/{*key}`
#[instrument(skip(state))]
pub async fn get_workspace_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Workspace>> {
    let workspace = state.accessor.get_workspace(&key).await?;
    Ok(Json(workspace))
}

/// `PUT /api/workspace/{*key}`
///
/// Workspaces are owned by their custom resource, so the body is discarded
/// and the current view is returned.
#[instrument(skip(state, body))]
pub async fn update_workspace_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<Json<Workspace>> {
    debug!(ignored_bytes = body.len(), "workspace update treated as read");
    let workspace = state.accessor.get_workspace(&key).await?;
    Ok(Json(workspace))
}
