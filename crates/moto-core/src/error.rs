//! # Error Types
//!
//! Domain-specific error types for moto-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  moto-core errors (this file)                                          │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  moto-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  moto-server errors                                                    │
//! │  └── ApiError         - What the frontend sees (JSON + status code)    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Frontend     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::motorcycle::MotorcycleState;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced entity does not exist (or belongs to another organization).
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The motorcycle cannot move between the two states.
    ///
    /// ## When This Occurs
    /// - Selling a unit that is paused
    /// - Reserving a unit that is already reserved
    /// - Any transition out of `Delivered`
    #[error("Cannot move motorcycle from {from} to {to}")]
    InvalidStateTransition {
        from: MotorcycleState,
        to: MotorcycleState,
    },

    /// The motorcycle is not available for the requested operation.
    #[error("Motorcycle {id} is {state} and not available")]
    MotorcycleUnavailable { id: String, state: MotorcycleState },

    /// A reorder request does not match the persisted list.
    ///
    /// ## When This Occurs
    /// - Dragging an item that another user deleted meanwhile
    /// - Submitting an order with duplicates or missing ids
    #[error("Invalid reorder: {reason}")]
    InvalidReorder { reason: String },

    /// The record changed since the client read it.
    #[error("{entity} {id} was modified concurrently (expected version {expected}, found {actual})")]
    VersionConflict {
        entity: &'static str,
        id: String,
        expected: i64,
        actual: i64,
    },

    /// The promotion exists but does not apply to the selected payment.
    #[error("Promotion {id} does not apply to the selected payment")]
    PromotionNotApplicable { id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for the given entity name and id.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates an InvalidReorder error.
    pub fn invalid_reorder(reason: impl Into<String>) -> Self {
        CoreError::InvalidReorder {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid CUIT check digit).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
