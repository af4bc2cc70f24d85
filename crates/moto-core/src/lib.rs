//! # moto-core: Pure Business Logic for Moto Dealer
//!
//! This crate is the **heart** of Moto Dealer. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Moto Dealer Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web Frontend                                 │   │
//! │  │   Clients ──► Stock ──► Sales ──► Configuration ──► Quotes     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    moto-server (axum)                           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ moto-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ financing │  │ validation│  │   │
//! │  │   │ Client    │  │   Money   │  │ amortize  │  │   rules   │  │   │
//! │  │   │ Catalog   │  │   Rate    │  │ schedule  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │motorcycle │  │ ordering  │  │ promotion │  │   quote   │  │   │
//! │  │   │ states    │  │ reorder   │  │ matching  │  │ build+html│  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    moto-db (Database Layer)                     │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Organization, users, clients and configuration catalogs
//! - [`motorcycle`] - Inventory units, the state machine, reservations, sales
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`financing`] - French amortization schedules
//! - [`ordering`] - Drag-and-drop order persistence
//! - [`listing`] - Sorting, filtering and pagination primitives
//! - [`promotion`] - Banking promotion matching
//! - [`quote`] - Quote building and printable rendering
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use moto_core::financing::{amortize, Frequency, LoanTerms};
//! use moto_core::{Money, Rate};
//!
//! let terms = LoanTerms {
//!     principal: Money::from_cents(1_200_000),
//!     annual_rate: Rate::zero(),
//!     installments: 12,
//!     frequency: Frequency::Monthly,
//! };
//!
//! let schedule = amortize(&terms);
//! assert_eq!(schedule.installment_amount.cents(), 100_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod financing;
pub mod listing;
pub mod money;
pub mod motorcycle;
pub mod ordering;
pub mod promotion;
pub mod quote;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use motorcycle::*;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of installments a financing plan may have (ten years monthly).
pub const MAX_INSTALLMENTS: u32 = 120;

/// Largest accepted rate in basis points (1000% nominal annual).
///
/// Local consumer credit can carry three-digit nominal rates, so the ceiling is
/// deliberately generous.
pub const MAX_RATE_BPS: u32 = 100_000;

/// Largest accepted amount in cents (one hundred billion in major units).
///
/// At [`MAX_RATE_BPS`] over [`MAX_INSTALLMENTS`] periods, a schedule on this
/// principal stays well inside `i64` and exact in `f64`.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000_000;

/// Default validity of a quote, in days.
pub const DEFAULT_QUOTE_VALID_DAYS: u32 = 7;

/// Oldest model year accepted for inventory.
pub const MIN_MODEL_YEAR: i32 = 1950;
