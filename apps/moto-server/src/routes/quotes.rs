//! # Quote Routes
//!
//! Loads everything a quote needs, then hands it to the pure builder.
//!
//! ```text
//! POST /api/quotes        ──► Quote (JSON)
//! POST /api/quotes/html   ──► printable page, the browser prints it to PDF
//! ```

use axum::extract::State;
use axum::response::Html;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use moto_core::quote::{build_quote, render_html, Quote, QuoteContext, QuoteRequest};
use moto_db::DbError;
use tracing::info;

use super::sales::release_expired;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/quotes", post(quote))
        .route("/api/quotes/html", post(quote_html))
}

async fn quote(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<QuoteRequest>,
) -> ApiResult<Json<Quote>> {
    Ok(Json(issue(&state, &auth, &request).await?))
}

async fn quote_html(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<QuoteRequest>,
) -> ApiResult<Html<String>> {
    let quote = issue(&state, &auth, &request).await?;
    Ok(Html(render_html(&quote)))
}

async fn issue(state: &AppState, auth: &AuthUser, request: &QuoteRequest) -> ApiResult<Quote> {
    request.validate()?;
    release_expired(state, &auth.organization_id).await?;

    let ctx = load_context(state, &auth.organization_id, request).await?;
    let quote = build_quote(&ctx, request, Utc::now().date_naive())?;

    info!(
        organization_id = %auth.organization_id,
        motorcycle_id = %quote.motorcycle_id,
        total = quote.total.cents(),
        promotion = ?quote.promotion.as_ref().map(|p| p.name.as_str()),
        "Quote issued"
    );
    Ok(quote)
}

async fn load_context(state: &AppState, organization_id: &str, request: &QuoteRequest) -> ApiResult<QuoteContext> {
    let organization = state
        .db
        .organizations()
        .get_by_id(organization_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Organization", organization_id))?;

    let motorcycle = state
        .db
        .motorcycles()
        .get(organization_id, &request.motorcycle_id)
        .await?;

    let (brand_name, model_name) = state
        .db
        .catalog()
        .names(&motorcycle.brand_id, &motorcycle.model_id)
        .await?;

    let color_name = match &motorcycle.color_id {
        Some(color_id) => match state.db.colors().get(organization_id, color_id).await {
            Ok(color) => Some(color.name),
            Err(DbError::NotFound { .. }) => None,
            Err(e) => return Err(e.into()),
        },
        None => None,
    };

    let client = match &request.client_id {
        Some(client_id) => Some(state.db.clients().get(organization_id, client_id).await?),
        None => None,
    };

    let promotions = if request.payment.is_some() {
        state.db.promotions().list_enabled(organization_id).await?
    } else {
        Vec::new()
    };

    Ok(QuoteContext {
        organization_name: organization.name,
        motorcycle,
        brand_name,
        model_name,
        color_name,
        client,
        promotions,
    })
}
