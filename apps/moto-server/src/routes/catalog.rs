//! # Brand & Model Routes
//!
//! ```text
//! POST /api/brands   {"brandId": "..", "color": "#CC0000"}   associate catalog brand
//! POST /api/brands   {"name": "Honda", "color": ".."}         create (or reuse) and associate
//! PUT  /api/brands/order                                       drag-and-drop
//! ```
//!
//! Mutations require a configuring role.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use moto_core::ordering::ReorderRequest;
use moto_core::{Brand, BrandInput, Model, ModelInput, OrganizationBrand, OrganizationModel};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociateBrand {
    pub brand_id: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AddBrand {
    Existing(AssociateBrand),
    New(BrandInput),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociateModel {
    pub model_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AddModel {
    Existing(AssociateModel),
    New(ModelInput),
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/brands", get(list_brands).post(add_brand))
        .route("/api/brands/catalog", get(brand_catalog))
        .route("/api/brands/order", put(reorder_brands))
        .route("/api/brands/{id}", delete(remove_brand))
        .route("/api/brands/{id}/models", get(list_models).post(add_model))
        .route("/api/brands/{id}/models/catalog", get(model_catalog))
        .route("/api/brands/{id}/models/order", put(reorder_models))
        .route("/api/models/{id}", delete(remove_model))
}

// =============================================================================
// Brands
// =============================================================================

async fn brand_catalog(State(state): State<AppState>, _auth: AuthUser) -> ApiResult<Json<Vec<Brand>>> {
    Ok(Json(state.db.catalog().list_all_brands().await?))
}

async fn list_brands(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Vec<OrganizationBrand>>> {
    let brands = state.db.catalog().list_brands(&auth.organization_id).await?;
    Ok(Json(brands))
}

async fn add_brand(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<AddBrand>,
) -> ApiResult<(StatusCode, Json<OrganizationBrand>)> {
    auth.require_configure()?;

    let catalog = state.db.catalog();
    let brand = match body {
        AddBrand::Existing(existing) => {
            catalog
                .associate_brand(&auth.organization_id, &existing.brand_id, existing.color)
                .await?
        }
        AddBrand::New(input) => catalog.create_brand(&auth.organization_id, input).await?,
    };
    Ok((StatusCode::CREATED, Json(brand)))
}

async fn remove_brand(State(state): State<AppState>, auth: AuthUser, Path(id): Path<String>) -> ApiResult<StatusCode> {
    auth.require_configure()?;
    state.db.catalog().dissociate_brand(&auth.organization_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reorder_brands(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<ReorderRequest>,
) -> ApiResult<Json<Vec<OrganizationBrand>>> {
    auth.require_configure()?;
    let brands = state
        .db
        .catalog()
        .reorder_brands(&auth.organization_id, &request)
        .await?;
    Ok(Json(brands))
}

// =============================================================================
// Models
// =============================================================================

async fn model_catalog(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(brand_id): Path<String>,
) -> ApiResult<Json<Vec<Model>>> {
    Ok(Json(state.db.catalog().list_all_models(&brand_id).await?))
}

async fn list_models(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(brand_id): Path<String>,
) -> ApiResult<Json<Vec<OrganizationModel>>> {
    let models = state
        .db
        .catalog()
        .list_models(&auth.organization_id, &brand_id)
        .await?;
    Ok(Json(models))
}

async fn add_model(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(brand_id): Path<String>,
    Json(body): Json<AddModel>,
) -> ApiResult<(StatusCode, Json<OrganizationModel>)> {
    auth.require_configure()?;

    let catalog = state.db.catalog();
    let model = match body {
        AddModel::Existing(existing) => {
            let belongs = catalog
                .list_all_models(&brand_id)
                .await?
                .iter()
                .any(|model| model.id == existing.model_id);
            if !belongs {
                return Err(ApiError::validation(format!(
                    "Model {} does not belong to brand {brand_id}",
                    existing.model_id
                )));
            }
            catalog
                .associate_model(&auth.organization_id, &existing.model_id)
                .await?
        }
        AddModel::New(input) => catalog.create_model(&auth.organization_id, &brand_id, input).await?,
    };
    Ok((StatusCode::CREATED, Json(model)))
}

async fn remove_model(State(state): State<AppState>, auth: AuthUser, Path(id): Path<String>) -> ApiResult<StatusCode> {
    auth.require_configure()?;
    state.db.catalog().dissociate_model(&auth.organization_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reorder_models(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(brand_id): Path<String>,
    Json(request): Json<ReorderRequest>,
) -> ApiResult<Json<Vec<OrganizationModel>>> {
    auth.require_configure()?;
    let models = state
        .db
        .catalog()
        .reorder_models(&auth.organization_id, &brand_id, &request)
        .await?;
    Ok(Json(models))
}
