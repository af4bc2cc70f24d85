//! # Inventory Routes
//!
//! ```text
//! GET    /api/motorcycles?state=in_stock&brandId=..&priceMax=..&sort=-price
//! GET    /api/motorcycles/summary          counts per state (dashboard cards)
//! POST   /api/motorcycles/{id}/state       pause, processing, delivered, back to stock
//! POST   /api/motorcycles/{id}/reserve     InStock ──► Reserved
//! POST   /api/motorcycles/{id}/sell        InStock | Reserved | Processing ──► Sold
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use moto_core::listing::{MotorcycleFilter, MotorcycleSortKey, Page, SortSpec};
use moto_core::{Motorcycle, MotorcycleInput, MotorcycleState, Reservation, ReservationInput, Sale, SaleInput};
use serde::{Deserialize, Serialize};

use super::sales::release_expired;
use super::PageQuery;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotorcycleQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub state: Option<MotorcycleState>,
    #[serde(default)]
    pub brand_id: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub branch_id: Option<String>,
    #[serde(default)]
    pub year_min: Option<i32>,
    #[serde(default)]
    pub year_max: Option<i32>,
    #[serde(default)]
    pub price_min: Option<i64>,
    #[serde(default)]
    pub price_max: Option<i64>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl MotorcycleQuery {
    fn filter(&self) -> MotorcycleFilter {
        MotorcycleFilter {
            search: self.search.clone(),
            state: self.state,
            brand_id: self.brand_id.clone(),
            model_id: self.model_id.clone(),
            branch_id: self.branch_id.clone(),
            year_min: self.year_min,
            year_max: self.year_max,
            price_min: self.price_min,
            price_max: self.price_max,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMotorcycle {
    #[serde(flatten)]
    pub input: MotorcycleInput,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StateChange {
    pub state: MotorcycleState,
}

#[derive(Debug, Serialize)]
pub struct StateCount {
    pub state: MotorcycleState,
    pub count: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/motorcycles", get(list).post(create))
        .route("/api/motorcycles/summary", get(summary))
        .route("/api/motorcycles/{id}", get(show).put(update).delete(remove))
        .route("/api/motorcycles/{id}/state", post(change_state))
        .route("/api/motorcycles/{id}/reserve", post(reserve))
        .route("/api/motorcycles/{id}/sell", post(sell))
}

async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<MotorcycleQuery>,
) -> ApiResult<Json<Page<Motorcycle>>> {
    let sort = SortSpec::<MotorcycleSortKey>::parse(query.sort.as_deref().unwrap_or(""))?;
    release_expired(&state, &auth.organization_id).await?;
    let page = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .request();

    let motorcycles = state
        .db
        .motorcycles()
        .list(&auth.organization_id, &query.filter(), sort, page)
        .await?;
    Ok(Json(motorcycles))
}

async fn summary(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Vec<StateCount>>> {
    release_expired(&state, &auth.organization_id).await?;
    let counts = state
        .db
        .motorcycles()
        .state_summary(&auth.organization_id)
        .await?
        .into_iter()
        .map(|(state, count)| StateCount { state, count })
        .collect();
    Ok(Json(counts))
}

async fn show(State(state): State<AppState>, auth: AuthUser, Path(id): Path<String>) -> ApiResult<Json<Motorcycle>> {
    let motorcycle = state.db.motorcycles().get(&auth.organization_id, &id).await?;
    Ok(Json(motorcycle))
}

async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<MotorcycleInput>,
) -> ApiResult<(StatusCode, Json<Motorcycle>)> {
    let motorcycle = state.db.motorcycles().insert(&auth.organization_id, input).await?;
    Ok((StatusCode::CREATED, Json(motorcycle)))
}

async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateMotorcycle>,
) -> ApiResult<Json<Motorcycle>> {
    let motorcycle = state
        .db
        .motorcycles()
        .update(&auth.organization_id, &id, body.input, body.expected_version)
        .await?;
    Ok(Json(motorcycle))
}

async fn remove(State(state): State<AppState>, auth: AuthUser, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.motorcycles().delete(&auth.organization_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_state(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<StateChange>,
) -> ApiResult<Json<Motorcycle>> {
    let motorcycle = state
        .db
        .motorcycles()
        .set_state(&auth.organization_id, &id, body.state)
        .await?;
    Ok(Json(motorcycle))
}

async fn reserve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<ReservationInput>,
) -> ApiResult<(StatusCode, Json<Reservation>)> {
    release_expired(&state, &auth.organization_id).await?;
    let reservation = state
        .db
        .reservations()
        .create(&auth.organization_id, &id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

async fn sell(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<SaleInput>,
) -> ApiResult<(StatusCode, Json<Sale>)> {
    release_expired(&state, &auth.organization_id).await?;
    let sale = state
        .db
        .sales()
        .record_sale(&auth.organization_id, &id, Some(&auth.user_id), input)
        .await?;
    Ok((StatusCode::CREATED, Json(sale)))
}
