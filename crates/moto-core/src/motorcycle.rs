//! # Motorcycle Inventory
//!
//! Inventory units, the sales state machine, reservations and sales.
//!
//! ## State Machine
//! ```text
//!                 ┌──────────┐
//!        ┌───────►│  Paused  │
//!        │        └────┬─────┘
//!        │             │
//!   ┌────┴────┐◄───────┘          ┌──────────┐
//!   │ InStock │◄─────────────────►│ Reserved │
//!   └─┬──┬──▲─┘                   └────┬─────┘
//!     │  │  │                          │
//!     │  │  └──────────┐               │
//!     │  ▼             │               │
//!     │ ┌────────────┐ │               │
//!     │ │ Processing │─┼──────┐        │
//!     │ └────────────┘ │      ▼        ▼
//!     │                │   ┌──────────────┐     ┌───────────┐
//!     └────────────────┼──►│     Sold     │────►│ Delivered │
//!                      └───┤              │     └───────────┘
//!                          └──────────────┘        (terminal)
//! ```
//! `Sold -> InStock` is a cancelled sale. Every other edge is rejected,
//! including a transition to the same state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{non_empty, Currency};
use crate::validation::{self, ValidationResult};

// =============================================================================
// Motorcycle State
// =============================================================================

/// Where a unit is in the sales lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MotorcycleState {
    #[default]
    InStock,
    Reserved,
    Sold,
    Paused,
    /// Paperwork (registration, plates) in progress before the sale closes.
    Processing,
    Delivered,
}

impl MotorcycleState {
    /// Every state, in display order.
    pub const ALL: [MotorcycleState; 6] = [
        MotorcycleState::InStock,
        MotorcycleState::Reserved,
        MotorcycleState::Processing,
        MotorcycleState::Sold,
        MotorcycleState::Delivered,
        MotorcycleState::Paused,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MotorcycleState::InStock => "in_stock",
            MotorcycleState::Reserved => "reserved",
            MotorcycleState::Sold => "sold",
            MotorcycleState::Paused => "paused",
            MotorcycleState::Processing => "processing",
            MotorcycleState::Delivered => "delivered",
        }
    }

    /// Whether `self -> to` is a legal edge.
    pub fn can_transition_to(&self, to: MotorcycleState) -> bool {
        use MotorcycleState::*;
        matches!(
            (self, to),
            (InStock, Reserved | Sold | Paused | Processing)
                | (Reserved, InStock | Sold)
                | (Paused, InStock)
                | (Processing, InStock | Sold)
                | (Sold, Delivered | InStock)
        )
    }

    /// Validates a transition and returns the target state.
    pub fn transition(from: MotorcycleState, to: MotorcycleState) -> CoreResult<MotorcycleState> {
        if from.can_transition_to(to) {
            Ok(to)
        } else {
            Err(CoreError::InvalidStateTransition { from, to })
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MotorcycleState::Delivered)
    }
}

impl fmt::Display for MotorcycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MotorcycleState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MotorcycleState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "state".to_string(),
                allowed: MotorcycleState::ALL
                    .iter()
                    .map(|state| state.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Motorcycle
// =============================================================================

/// A physical unit in the dealership's inventory.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Motorcycle {
    pub id: String,
    pub organization_id: String,
    pub brand_id: String,
    pub model_id: String,
    pub color_id: Option<String>,
    pub branch_id: Option<String>,
    pub year: i32,
    /// VIN or frame number, uppercase. Unique per organization.
    pub chassis_number: String,
    pub engine_number: Option<String>,
    pub license_plate: Option<String>,
    pub mileage_km: i64,
    pub currency: Currency,
    pub retail_price_cents: i64,
    pub cost_price_cents: Option<i64>,
    pub state: MotorcycleState,
    /// Client holding or owning the unit (set by reservations and sales).
    pub client_id: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl Motorcycle {
    #[inline]
    pub fn retail_price(&self) -> Money {
        Money::from_cents(self.retail_price_cents)
    }

    /// Only units in stock can be reserved or sold directly.
    #[inline]
    pub fn is_available(&self) -> bool {
        self.state == MotorcycleState::InStock
    }

    /// Gross margin when the cost is known.
    pub fn margin(&self) -> Option<Money> {
        self.cost_price_cents
            .map(|cost| Money::from_cents(self.retail_price_cents - cost))
    }
}

/// Editable motorcycle fields. State is changed only through transitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MotorcycleInput {
    pub brand_id: String,
    pub model_id: String,
    #[serde(default)]
    pub color_id: Option<String>,
    #[serde(default)]
    pub branch_id: Option<String>,
    pub year: i32,
    pub chassis_number: String,
    #[serde(default)]
    pub engine_number: Option<String>,
    #[serde(default)]
    pub license_plate: Option<String>,
    #[serde(default)]
    pub mileage_km: i64,
    #[serde(default)]
    pub currency: Currency,
    pub retail_price_cents: i64,
    #[serde(default)]
    pub cost_price_cents: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl MotorcycleInput {
    pub fn normalized(mut self) -> Self {
        self.chassis_number = self.chassis_number.trim().to_uppercase();
        self.engine_number = non_empty(self.engine_number).map(|e| e.to_uppercase());
        self.license_plate = non_empty(self.license_plate)
            .map(|p| p.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_uppercase());
        self.color_id = non_empty(self.color_id);
        self.branch_id = non_empty(self.branch_id);
        self.notes = non_empty(self.notes);
        self
    }

    pub fn validate(&self, current_year: i32) -> ValidationResult<()> {
        validation::validate_uuid_field("brand_id", &self.brand_id)?;
        validation::validate_uuid_field("model_id", &self.model_id)?;
        if let Some(color_id) = &self.color_id {
            validation::validate_uuid_field("color_id", color_id)?;
        }
        if let Some(branch_id) = &self.branch_id {
            validation::validate_uuid_field("branch_id", branch_id)?;
        }
        validation::validate_model_year(self.year, current_year)?;
        validation::validate_chassis_number(&self.chassis_number)?;
        if self.mileage_km < 0 {
            return Err(ValidationError::OutOfRange {
                field: "mileage_km".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
        validation::validate_price_cents("retail_price_cents", self.retail_price_cents)?;
        if let Some(cost) = self.cost_price_cents {
            validation::validate_price_cents("cost_price_cents", cost)?;
        }
        if let Some(notes) = &self.notes {
            validation::validate_max_len("notes", notes, 2000)?;
        }
        Ok(())
    }
}

// =============================================================================
// Reservations
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    #[default]
    Active,
    /// Turned into a sale.
    Completed,
    Cancelled,
    Expired,
}

/// A deposit holding a unit for a client.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: String,
    pub organization_id: String,
    pub motorcycle_id: String,
    pub client_id: String,
    pub amount_cents: i64,
    pub payment_method_id: Option<String>,
    pub status: ReservationStatus,
    pub notes: Option<String>,
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// An active reservation whose deadline has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Active
            && self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReservationInput {
    pub client_id: String,
    #[serde(default)]
    pub amount_cents: i64,
    #[serde(default)]
    pub payment_method_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl ReservationInput {
    pub fn validate(&self, now: DateTime<Utc>) -> ValidationResult<()> {
        validation::validate_uuid_field("client_id", &self.client_id)?;
        if self.amount_cents < 0 {
            return Err(ValidationError::MustBePositive {
                field: "amount_cents".to_string(),
            });
        }
        validation::validate_price_cents("amount_cents", self.amount_cents)?;
        if let Some(id) = &self.payment_method_id {
            validation::validate_uuid_field("payment_method_id", id)?;
        }
        if self.expires_at.is_some_and(|deadline| deadline <= now) {
            return Err(ValidationError::invalid_format(
                "expires_at",
                "must be in the future",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Sales
// =============================================================================

/// A closed sale of one unit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub organization_id: String,
    pub motorcycle_id: String,
    pub client_id: String,
    pub seller_id: Option<String>,
    pub branch_id: Option<String>,
    pub payment_method_id: Option<String>,
    pub promotion_id: Option<String>,
    pub list_price_cents: i64,
    pub discount_cents: i64,
    pub surcharge_cents: i64,
    pub total_cents: i64,
    pub installments: u32,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleInput {
    pub client_id: String,
    #[serde(default)]
    pub branch_id: Option<String>,
    #[serde(default)]
    pub payment_method_id: Option<String>,
    #[serde(default)]
    pub bank_id: Option<String>,
    #[serde(default)]
    pub card_type_id: Option<String>,
    #[serde(default)]
    pub promotion_id: Option<String>,
    /// Extra discount negotiated by the seller, in cents.
    #[serde(default)]
    pub discount_cents: i64,
    #[serde(default)]
    pub installments: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SaleInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_uuid_field("client_id", &self.client_id)?;
        for (field, value) in [
            ("branch_id", &self.branch_id),
            ("payment_method_id", &self.payment_method_id),
            ("bank_id", &self.bank_id),
            ("card_type_id", &self.card_type_id),
            ("promotion_id", &self.promotion_id),
        ] {
            if let Some(id) = value {
                validation::validate_uuid_field(field, id)?;
            }
        }
        if self.promotion_id.is_some() && self.payment_method_id.is_none() {
            return Err(ValidationError::required("payment_method_id"));
        }
        if self.discount_cents < 0 {
            return Err(ValidationError::MustBePositive {
                field: "discount_cents".to_string(),
            });
        }
        validation::validate_price_cents("discount_cents", self.discount_cents)?;
        validation::validate_installments(self.installments)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_transition_table() {
        use MotorcycleState::*;

        let legal = [
            (InStock, Reserved),
            (InStock, Sold),
            (InStock, Paused),
            (InStock, Processing),
            (Reserved, InStock),
            (Reserved, Sold),
            (Paused, InStock),
            (Processing, InStock),
            (Processing, Sold),
            (Sold, Delivered),
            (Sold, InStock),
        ];

        for from in MotorcycleState::ALL {
            for to in MotorcycleState::ALL {
                let expected = legal.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{from} -> {to} should be {expected}"
                );
            }
        }
    }

    #[test]
    fn test_self_transition_rejected() {
        let err = MotorcycleState::transition(MotorcycleState::InStock, MotorcycleState::InStock)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidStateTransition { .. }));
    }

    #[test]
    fn test_delivered_is_terminal() {
        assert!(MotorcycleState::Delivered.is_terminal());
        for to in MotorcycleState::ALL {
            assert!(!MotorcycleState::Delivered.can_transition_to(to));
        }
    }

    #[test]
    fn test_state_parse_and_display() {
        assert_eq!("in_stock".parse::<MotorcycleState>().unwrap(), MotorcycleState::InStock);
        assert_eq!(MotorcycleState::Processing.to_string(), "processing");
        assert!("scrapped".parse::<MotorcycleState>().is_err());
    }

    #[test]
    fn test_state_serde_matches_display() {
        let json = serde_json::to_string(&MotorcycleState::InStock).unwrap();
        assert_eq!(json, "\"in_stock\"");
    }

    fn input() -> MotorcycleInput {
        MotorcycleInput {
            brand_id: "550e8400-e29b-41d4-a716-446655440000".into(),
            model_id: "550e8400-e29b-41d4-a716-446655440001".into(),
            year: 2025,
            chassis_number: " 9c2kc1670hr000123 ".into(),
            license_plate: Some("a 123 bcd".into()),
            retail_price_cents: 450_000_000,
            ..Default::default()
        }
    }

    #[test]
    fn test_motorcycle_input_normalization() {
        let input = input().normalized();
        assert_eq!(input.chassis_number, "9C2KC1670HR000123");
        assert_eq!(input.license_plate.as_deref(), Some("A123BCD"));
        assert!(input.validate(2026).is_ok());
    }

    #[test]
    fn test_motorcycle_input_rejects_future_year() {
        let mut input = input().normalized();
        input.year = 2030;
        assert!(input.validate(2026).is_err());
    }

    #[test]
    fn test_reservation_expiry() {
        let now = Utc::now();
        let mut reservation = Reservation {
            id: "r".into(),
            organization_id: "o".into(),
            motorcycle_id: "m".into(),
            client_id: "c".into(),
            amount_cents: 0,
            payment_method_id: None,
            status: ReservationStatus::Active,
            notes: None,
            expires_at: Some(now - Duration::hours(1)),
            created_at: now,
            updated_at: now,
        };
        assert!(reservation.is_expired(now));

        reservation.expires_at = None;
        assert!(!reservation.is_expired(now));

        reservation.expires_at = Some(now - Duration::hours(1));
        reservation.status = ReservationStatus::Cancelled;
        assert!(!reservation.is_expired(now));
    }

    #[test]
    fn test_amounts_are_capped() {
        let mut input = input().normalized();
        input.retail_price_cents = crate::MAX_PRICE_CENTS + 1;
        assert!(matches!(
            input.validate(2026),
            Err(ValidationError::OutOfRange { .. })
        ));

        let sale = SaleInput {
            client_id: "550e8400-e29b-41d4-a716-446655440000".into(),
            discount_cents: i64::MAX,
            ..Default::default()
        };
        assert!(matches!(
            sale.validate(),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_sale_input_requires_method_with_promotion() {
        let input = SaleInput {
            client_id: "550e8400-e29b-41d4-a716-446655440000".into(),
            promotion_id: Some("550e8400-e29b-41d4-a716-446655440001".into()),
            ..Default::default()
        };
        assert_eq!(
            input.validate().unwrap_err(),
            ValidationError::required("payment_method_id")
        );
    }
}
