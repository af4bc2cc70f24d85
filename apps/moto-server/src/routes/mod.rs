//! # Routes
//!
//! One module per area; each exposes `routes()` and this module merges them.
//!
//! | Area | Module |
//! |---|---|
//! | liveness | [`health`] |
//! | login, current user | [`auth`] |
//! | clients | [`clients`] |
//! | inventory, reserve, sell | [`motorcycles`] |
//! | reservations, sales | [`sales`] |
//! | brands and models | [`catalog`] |
//! | colors, branches | [`colors`], [`branches`] |
//! | payment methods, banks, cards | [`payments`] |
//! | banking promotions | [`promotions`] |
//! | calculator, quotes | [`financing`], [`quotes`] |

use axum::Router;
use moto_core::listing::{PageRequest, DEFAULT_PER_PAGE};
use serde::Deserialize;

use crate::AppState;

pub mod auth;
pub mod branches;
pub mod catalog;
pub mod clients;
pub mod colors;
pub mod financing;
pub mod health;
pub mod motorcycles;
pub mod payments;
pub mod promotions;
pub mod quotes;
pub mod sales;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(clients::routes())
        .merge(motorcycles::routes())
        .merge(sales::routes())
        .merge(catalog::routes())
        .merge(colors::routes())
        .merge(branches::routes())
        .merge(payments::routes())
        .merge(promotions::routes())
        .merge(financing::routes())
        .merge(quotes::routes())
}

// =============================================================================
// Shared Request Shapes
// =============================================================================

/// `?page=2&perPage=50`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(1), self.per_page.unwrap_or(DEFAULT_PER_PAGE))
    }
}

/// Body of the `.../enabled` toggles.
#[derive(Debug, Deserialize)]
pub struct EnabledBody {
    pub enabled: bool,
}
