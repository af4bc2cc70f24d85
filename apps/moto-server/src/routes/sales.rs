//! Reservations and closed sales.
//!
//! Overdue reservations are expired when they are next looked at: listing
//! reservations or inventory, reserving, selling or quoting runs
//! [`release_expired`] first.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use moto_core::listing::Page;
use moto_core::{Reservation, ReservationStatus, Sale};
use serde::{Deserialize, Serialize};

use super::PageQuery;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ReservationQuery {
    #[serde(default)]
    pub status: Option<ReservationStatus>,
}

#[derive(Debug, Serialize)]
pub struct ExpireResponse {
    pub expired: Vec<Reservation>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/reservations", get(list_reservations))
        .route("/api/reservations/expire", post(expire_reservations))
        .route("/api/reservations/{id}", get(show_reservation))
        .route("/api/reservations/{id}/cancel", post(cancel_reservation))
        .route("/api/sales", get(list_sales))
        .route("/api/sales/{id}", get(show_sale))
}

/// Expires the organization's overdue reservations, releasing their units.
pub(crate) async fn release_expired(state: &AppState, organization_id: &str) -> ApiResult<()> {
    state
        .db
        .reservations()
        .expire_due(organization_id, Utc::now())
        .await?;
    Ok(())
}

async fn list_reservations(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ReservationQuery>,
) -> ApiResult<Json<Vec<Reservation>>> {
    release_expired(&state, &auth.organization_id).await?;
    let reservations = state
        .db
        .reservations()
        .list(&auth.organization_id, query.status)
        .await?;
    Ok(Json(reservations))
}

async fn show_reservation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Reservation>> {
    let reservation = state.db.reservations().get(&auth.organization_id, &id).await?;
    Ok(Json(reservation))
}

async fn cancel_reservation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Reservation>> {
    let reservation = state.db.reservations().cancel(&auth.organization_id, &id).await?;
    Ok(Json(reservation))
}

async fn expire_reservations(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<ExpireResponse>> {
    let expired = state
        .db
        .reservations()
        .expire_due(&auth.organization_id, Utc::now())
        .await?;
    Ok(Json(ExpireResponse { expired }))
}

async fn list_sales(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<Sale>>> {
    let sales = state
        .db
        .sales()
        .list(&auth.organization_id, query.request())
        .await?;
    Ok(Json(sales))
}

async fn show_sale(State(state): State<AppState>, auth: AuthUser, Path(id): Path<String>) -> ApiResult<Json<Sale>> {
    let sale = state.db.sales().get(&auth.organization_id, &id).await?;
    Ok(Json(sale))
}
