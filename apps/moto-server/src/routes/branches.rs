//! Dealership branches.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use moto_core::ordering::ReorderRequest;
use moto_core::{Branch, BranchInput};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/branches", get(list).post(create))
        .route("/api/branches/order", put(reorder))
        .route("/api/branches/{id}", get(show).put(update).delete(remove))
}

async fn list(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Vec<Branch>>> {
    Ok(Json(state.db.branches().list(&auth.organization_id).await?))
}

async fn show(State(state): State<AppState>, auth: AuthUser, Path(id): Path<String>) -> ApiResult<Json<Branch>> {
    Ok(Json(state.db.branches().get(&auth.organization_id, &id).await?))
}

async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<BranchInput>,
) -> ApiResult<(StatusCode, Json<Branch>)> {
    auth.require_configure()?;
    let branch = state.db.branches().insert(&auth.organization_id, input).await?;
    Ok((StatusCode::CREATED, Json(branch)))
}

async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<BranchInput>,
) -> ApiResult<Json<Branch>> {
    auth.require_configure()?;
    let branch = state.db.branches().update(&auth.organization_id, &id, input).await?;
    Ok(Json(branch))
}

async fn remove(State(state): State<AppState>, auth: AuthUser, Path(id): Path<String>) -> ApiResult<StatusCode> {
    auth.require_configure()?;
    state.db.branches().delete(&auth.organization_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reorder(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<ReorderRequest>,
) -> ApiResult<Json<Vec<Branch>>> {
    auth.require_configure()?;
    let branches = state.db.branches().reorder(&auth.organization_id, &request).await?;
    Ok(Json(branches))
}
