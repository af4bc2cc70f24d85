//! Login and current user.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use moto_core::User;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: User,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
}

async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> ApiResult<Json<LoginResponse>> {
    let user = state
        .db
        .users()
        .verify_credentials(&body.email, &body.password)
        .await?
        .ok_or_else(|| {
            warn!(email = %body.email, "Failed login");
            ApiError::unauthorized("Invalid email or password")
        })?;

    let token = state.jwt.issue(&user)?;
    info!(user_id = %user.id, organization_id = %user.organization_id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        expires_in: state.jwt.lifetime_secs(),
        user,
    }))
}

async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<User>> {
    let user = state
        .db
        .users()
        .get_by_id(&auth.user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;
    Ok(Json(user))
}
