//! # Repository Module
//!
//! Database repository implementations for Moto Dealer.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.clients().list(org, &filter, sort, page)                   │
//! │       ▼                                                                 │
//! │  ClientRepository                                                      │
//! │  ├── list(&self, org, filter, sort, page)                              │
//! │  ├── get(&self, org, id)                                               │
//! │  ├── insert(&self, org, input)                                         │
//! │  └── update(&self, org, id, input, expected_version)                   │
//! │       │                                                                 │
//! │       │  SQL (always scoped by organization_id)                        │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`OrganizationRepository`] - Tenants
//! - [`UserRepository`] - Accounts and credential checks
//! - [`ClientRepository`] - Customers, filtered and paged
//! - [`MotorcycleRepository`] - Inventory and state transitions
//! - [`CatalogRepository`] - Brand and model associations
//! - [`ColorRepository`], [`BranchRepository`] - Ordered organization lists
//! - [`PaymentRepository`] - Payment methods, banks, card types, bank cards
//! - [`PromotionRepository`] - Banking promotions
//! - [`ReservationRepository`] - Deposits holding a unit
//! - [`SaleRepository`] - Closed sales

pub mod branch;
pub mod catalog;
pub mod client;
pub mod color;
pub mod motorcycle;
pub mod organization;
pub mod payment;
pub mod promotion;
pub(crate) mod reorder;
pub mod reservation;
pub mod sale;
pub mod user;

pub use branch::BranchRepository;
pub use catalog::CatalogRepository;
pub use client::ClientRepository;
pub use color::ColorRepository;
pub use motorcycle::MotorcycleRepository;
pub use organization::OrganizationRepository;
pub use payment::PaymentRepository;
pub use promotion::PromotionRepository;
pub use reservation::ReservationRepository;
pub use sale::SaleRepository;
pub use user::UserRepository;

use moto_core::CoreError;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::DbError;

/// Fresh UUID v4 string for a new row.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Explains why a versioned `UPDATE` touched no row: the row is gone, or it
/// moved past `expected`.
pub(crate) async fn stale_write_error(
    pool: &SqlitePool,
    table: &'static str,
    entity: &'static str,
    organization_id: &str,
    id: &str,
    expected: Option<i64>,
) -> DbError {
    let sql = format!("SELECT version FROM {table} WHERE id = ? AND organization_id = ?");
    let current = sqlx::query_scalar::<_, i64>(&sql)
        .bind(id)
        .bind(organization_id)
        .fetch_optional(pool)
        .await;

    match (current, expected) {
        (Ok(Some(actual)), Some(expected)) => CoreError::VersionConflict {
            entity,
            id: id.to_string(),
            expected,
            actual,
        }
        .into(),
        (Ok(_), _) => DbError::not_found(entity, id),
        (Err(e), _) => e.into(),
    }
}

/// `%text%` with LIKE wildcards escaped (use with `ESCAPE '\'`).
pub(crate) fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use crate::pool::{Database, DbConfig};
    use moto_core::Organization;

    /// Fresh in-memory database with one organization.
    pub async fn setup() -> (Database, Organization) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let org = db
            .organizations()
            .create("Motos del Sur", "motos-del-sur")
            .await
            .unwrap();
        (db, org)
    }
}
