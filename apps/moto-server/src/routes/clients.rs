//! Client CRUD with search, sort and pagination.
//!
//! ```text
//! GET /api/clients?search=perez&status=active&sort=-created_at&page=2&perPage=20
//! GET /api/clients/{id}/sales      purchase history, newest first
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use moto_core::listing::{ClientFilter, ClientSortKey, Page, SortSpec};
use moto_core::{Client, ClientInput, ClientStatus, Sale};
use serde::Deserialize;

use super::PageQuery;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<ClientStatus>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

/// Client fields plus the version the editor loaded.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClient {
    #[serde(flatten)]
    pub input: ClientInput,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/clients", get(list).post(create))
        .route("/api/clients/{id}", get(show).put(update).delete(remove))
        .route("/api/clients/{id}/sales", get(sales))
}

async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ClientQuery>,
) -> ApiResult<Json<Page<Client>>> {
    let sort = SortSpec::<ClientSortKey>::parse(query.sort.as_deref().unwrap_or(""))?;
    let page = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .request();
    let filter = ClientFilter {
        search: query.search,
        status: query.status,
    };

    let clients = state
        .db
        .clients()
        .list(&auth.organization_id, &filter, sort, page)
        .await?;
    Ok(Json(clients))
}

async fn show(State(state): State<AppState>, auth: AuthUser, Path(id): Path<String>) -> ApiResult<Json<Client>> {
    let client = state.db.clients().get(&auth.organization_id, &id).await?;
    Ok(Json(client))
}

async fn sales(State(state): State<AppState>, auth: AuthUser, Path(id): Path<String>) -> ApiResult<Json<Vec<Sale>>> {
    // 404 for a client outside the organization rather than an empty list
    state.db.clients().get(&auth.organization_id, &id).await?;
    let sales = state
        .db
        .sales()
        .list_for_client(&auth.organization_id, &id)
        .await?;
    Ok(Json(sales))
}

async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<ClientInput>,
) -> ApiResult<(StatusCode, Json<Client>)> {
    let client = state.db.clients().insert(&auth.organization_id, input).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateClient>,
) -> ApiResult<Json<Client>> {
    let client = state
        .db
        .clients()
        .update(&auth.organization_id, &id, body.input, body.expected_version)
        .await?;
    Ok(Json(client))
}

async fn remove(State(state): State<AppState>, auth: AuthUser, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.clients().delete(&auth.organization_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
