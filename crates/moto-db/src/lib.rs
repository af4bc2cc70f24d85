//! # moto-db: Database Layer for Moto Dealer
//!
//! Persistence for every organization's clients, inventory and configuration.
//! SQLite through sqlx, with migrations embedded in the binary.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Moto Dealer Data Flow                            │
//! │                                                                         │
//! │  HTTP handler (PUT /api/colors/order)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     moto-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (repository/) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │    │ ClientRepo    │    │ 001_schema   │  │   │
//! │  │   │ Connection    │◄───│ MotorcycleRepo│    │ 002_catalog  │  │   │
//! │  │   │ Management    │    │ SaleRepo ...  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per aggregate
//!
//! ## Usage
//!
//! ```rust,ignore
//! use moto_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("moto.db")).await?;
//!
//! let page = db
//!     .clients()
//!     .list(&org_id, &filter, sort, PageRequest::default())
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::{
    BranchRepository, CatalogRepository, ClientRepository, ColorRepository, MotorcycleRepository,
    OrganizationRepository, PaymentRepository, PromotionRepository, ReservationRepository,
    SaleRepository, UserRepository,
};
