//! Organization color palette.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use moto_core::ordering::ReorderRequest;
use moto_core::{Color, ColorInput};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/colors", get(list).post(create))
        .route("/api/colors/order", put(reorder))
        .route("/api/colors/{id}", get(show).put(update).delete(remove))
}

async fn list(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Vec<Color>>> {
    Ok(Json(state.db.colors().list(&auth.organization_id).await?))
}

async fn show(State(state): State<AppState>, auth: AuthUser, Path(id): Path<String>) -> ApiResult<Json<Color>> {
    Ok(Json(state.db.colors().get(&auth.organization_id, &id).await?))
}

async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<ColorInput>,
) -> ApiResult<(StatusCode, Json<Color>)> {
    auth.require_configure()?;
    let color = state.db.colors().insert(&auth.organization_id, input).await?;
    Ok((StatusCode::CREATED, Json(color)))
}

async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<ColorInput>,
) -> ApiResult<Json<Color>> {
    auth.require_configure()?;
    let color = state.db.colors().update(&auth.organization_id, &id, input).await?;
    Ok(Json(color))
}

async fn remove(State(state): State<AppState>, auth: AuthUser, Path(id): Path<String>) -> ApiResult<StatusCode> {
    auth.require_configure()?;
    state.db.colors().delete(&auth.organization_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reorder(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<ReorderRequest>,
) -> ApiResult<Json<Vec<Color>>> {
    auth.require_configure()?;
    let colors = state.db.colors().reorder(&auth.organization_id, &request).await?;
    Ok(Json(colors))
}
