//! # Payment Configuration Routes
//!
//! ```text
//! /api/payment-methods/catalog     every method the platform knows
//! /api/payment-methods             the ones this organization accepts
//! /api/banks, /api/card-types      shared catalogs
//! /api/bank-cards                  accepted bank + card type pairs
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use moto_core::ordering::ReorderRequest;
use moto_core::{Bank, BankCard, CardNetwork, CardType, OrganizationPaymentMethod, PaymentMethod};
use serde::Deserialize;

use super::EnabledBody;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociateMethod {
    pub payment_method_id: String,
}

#[derive(Debug, Deserialize)]
pub struct NewBank {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct NewCardType {
    pub name: String,
    #[serde(default)]
    pub network: CardNetwork,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBankCard {
    pub bank_id: String,
    pub card_type_id: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/payment-methods", get(list_methods).post(associate_method))
        .route("/api/payment-methods/catalog", get(method_catalog))
        .route("/api/payment-methods/order", put(reorder_methods))
        .route("/api/payment-methods/{id}", delete(dissociate_method))
        .route("/api/payment-methods/{id}/enabled", put(toggle_method))
        .route("/api/banks", get(list_banks).post(create_bank))
        .route("/api/card-types", get(list_card_types).post(create_card_type))
        .route("/api/bank-cards", get(list_bank_cards).post(add_bank_card))
        .route("/api/bank-cards/order", put(reorder_bank_cards))
        .route("/api/bank-cards/{id}", delete(remove_bank_card))
        .route("/api/bank-cards/{id}/enabled", put(toggle_bank_card))
}

// =============================================================================
// Payment Methods
// =============================================================================

async fn method_catalog(State(state): State<AppState>, _auth: AuthUser) -> ApiResult<Json<Vec<PaymentMethod>>> {
    Ok(Json(state.db.payments().list_catalog().await?))
}

async fn list_methods(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<OrganizationPaymentMethod>>> {
    Ok(Json(state.db.payments().list_for_org(&auth.organization_id).await?))
}

async fn associate_method(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<AssociateMethod>,
) -> ApiResult<(StatusCode, Json<OrganizationPaymentMethod>)> {
    auth.require_configure()?;
    let method = state
        .db
        .payments()
        .associate(&auth.organization_id, &body.payment_method_id)
        .await?;
    Ok((StatusCode::CREATED, Json(method)))
}

async fn dissociate_method(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    auth.require_configure()?;
    state.db.payments().dissociate(&auth.organization_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_method(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<EnabledBody>,
) -> ApiResult<Json<OrganizationPaymentMethod>> {
    auth.require_configure()?;
    let method = state
        .db
        .payments()
        .set_enabled(&auth.organization_id, &id, body.enabled)
        .await?;
    Ok(Json(method))
}

async fn reorder_methods(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<ReorderRequest>,
) -> ApiResult<Json<Vec<OrganizationPaymentMethod>>> {
    auth.require_configure()?;
    let methods = state.db.payments().reorder(&auth.organization_id, &request).await?;
    Ok(Json(methods))
}

// =============================================================================
// Banks & Card Types
// =============================================================================

async fn list_banks(State(state): State<AppState>, _auth: AuthUser) -> ApiResult<Json<Vec<Bank>>> {
    Ok(Json(state.db.payments().list_banks().await?))
}

async fn create_bank(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NewBank>,
) -> ApiResult<(StatusCode, Json<Bank>)> {
    auth.require_configure()?;
    let bank = state.db.payments().create_bank(&body.name).await?;
    Ok((StatusCode::CREATED, Json(bank)))
}

async fn list_card_types(State(state): State<AppState>, _auth: AuthUser) -> ApiResult<Json<Vec<CardType>>> {
    Ok(Json(state.db.payments().list_card_types().await?))
}

async fn create_card_type(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NewCardType>,
) -> ApiResult<(StatusCode, Json<CardType>)> {
    auth.require_configure()?;
    let card_type = state
        .db
        .payments()
        .create_card_type(&body.name, body.network)
        .await?;
    Ok((StatusCode::CREATED, Json(card_type)))
}

// =============================================================================
// Bank Cards
// =============================================================================

async fn list_bank_cards(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Vec<BankCard>>> {
    Ok(Json(state.db.payments().list_bank_cards(&auth.organization_id).await?))
}

async fn add_bank_card(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NewBankCard>,
) -> ApiResult<(StatusCode, Json<BankCard>)> {
    auth.require_configure()?;
    let card = state
        .db
        .payments()
        .add_bank_card(&auth.organization_id, &body.bank_id, &body.card_type_id)
        .await?;
    Ok((StatusCode::CREATED, Json(card)))
}

async fn remove_bank_card(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    auth.require_configure()?;
    state.db.payments().remove_bank_card(&auth.organization_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_bank_card(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<EnabledBody>,
) -> ApiResult<Json<BankCard>> {
    auth.require_configure()?;
    let card = state
        .db
        .payments()
        .set_bank_card_enabled(&auth.organization_id, &id, body.enabled)
        .await?;
    Ok(Json(card))
}

async fn reorder_bank_cards(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<ReorderRequest>,
) -> ApiResult<Json<Vec<BankCard>>> {
    auth.require_configure()?;
    let cards = state
        .db
        .payments()
        .reorder_bank_cards(&auth.organization_id, &request)
        .await?;
    Ok(Json(cards))
}
