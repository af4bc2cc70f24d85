//! Banking promotions.
//!
//! ```text
//! GET /api/promotions/applicable?paymentMethodId=..&bankId=..&cardTypeId=..&date=2024-05-14
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use moto_core::promotion::PaymentSelection;
use moto_core::{BankingPromotion, PromotionInput};
use serde::Deserialize;

use super::EnabledBody;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicableQuery {
    pub payment_method_id: String,
    #[serde(default)]
    pub bank_id: Option<String>,
    #[serde(default)]
    pub card_type_id: Option<String>,
    /// Defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/promotions", get(list).post(create))
        .route("/api/promotions/applicable", get(applicable))
        .route("/api/promotions/{id}", get(show).put(update).delete(remove))
        .route("/api/promotions/{id}/enabled", put(toggle))
}

async fn list(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Vec<BankingPromotion>>> {
    Ok(Json(state.db.promotions().list(&auth.organization_id).await?))
}

async fn applicable(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ApplicableQuery>,
) -> ApiResult<Json<Vec<BankingPromotion>>> {
    let payment = PaymentSelection {
        payment_method_id: query.payment_method_id,
        bank_id: query.bank_id,
        card_type_id: query.card_type_id,
    };
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let promotions = state
        .db
        .promotions()
        .list_applicable(&auth.organization_id, &payment, date)
        .await?;
    Ok(Json(promotions))
}

async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<BankingPromotion>> {
    Ok(Json(state.db.promotions().get(&auth.organization_id, &id).await?))
}

async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<PromotionInput>,
) -> ApiResult<(StatusCode, Json<BankingPromotion>)> {
    auth.require_configure()?;
    let promotion = state.db.promotions().insert(&auth.organization_id, input).await?;
    Ok((StatusCode::CREATED, Json(promotion)))
}

async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<PromotionInput>,
) -> ApiResult<Json<BankingPromotion>> {
    auth.require_configure()?;
    let promotion = state
        .db
        .promotions()
        .update(&auth.organization_id, &id, input)
        .await?;
    Ok(Json(promotion))
}

async fn toggle(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<EnabledBody>,
) -> ApiResult<Json<BankingPromotion>> {
    auth.require_configure()?;
    let promotion = state
        .db
        .promotions()
        .set_enabled(&auth.organization_id, &id, body.enabled)
        .await?;
    Ok(Json(promotion))
}

async fn remove(State(state): State<AppState>, auth: AuthUser, Path(id): Path<String>) -> ApiResult<StatusCode> {
    auth.require_configure()?;
    state.db.promotions().delete(&auth.organization_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
