//! # Domain Types
//!
//! Organization, people and configuration catalogs used throughout Moto Dealer.
//! Inventory types (motorcycles, reservations, sales) live in [`crate::motorcycle`].
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Tenant & People        Catalog                 Payments                │
//! │  ───────────────        ───────                 ────────                │
//! │  Organization           Brand ◄──┐              PaymentMethod           │
//! │  User (Role)            Model ───┘              Bank, CardType          │
//! │  Client                 Color                   BankCard                │
//! │                         Branch                  BankingPromotion        │
//! │                                                                         │
//! │  Organization-scoped association rows carry an `order` integer:        │
//! │  OrganizationBrand, OrganizationModel, OrganizationPaymentMethod,      │
//! │  Color, Branch, BankCard                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Input Types
//! Every editable entity has an `*Input` struct. Inputs are normalised
//! (trimmed, empty strings become `None`) and validated here, before any
//! database work happens.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::{self, ValidationResult};

// =============================================================================
// Rate
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 4500 bps = 45% nominal annual rate, 1000 bps = 10% discount
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        Rate((pct * 100.0).round().max(0.0) as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a fraction (4500 bps -> 0.45).
    #[inline]
    pub fn as_fraction(&self) -> f64 {
        self.0 as f64 / 10_000.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Currency
// =============================================================================

/// Currency a unit is priced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Ars,
    Usd,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Ars => "ARS",
            Currency::Usd => "USD",
        }
    }
}

// =============================================================================
// Organization & Users
// =============================================================================

/// A dealership. Tenant boundary for almost every other record.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    /// URL-safe unique handle.
    pub slug: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// What a user may do inside their organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    #[default]
    Seller,
}

impl Role {
    /// Whether the role may change organization configuration
    /// (catalogs, payment methods, promotions, branches).
    pub fn can_configure(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Seller => "seller",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "seller" => Ok(Role::Seller),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["admin".into(), "manager".into(), "seller".into()],
            }),
        }
    }
}

/// A dealership employee who can log in.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub organization_id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip)]
    pub password_hash: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Client
// =============================================================================

/// Identity document kinds accepted for clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    #[default]
    Dni,
    Cuit,
    Passport,
}

/// Lifecycle of a client record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    #[default]
    Active,
    Inactive,
    /// Contacted the dealership but has not bought yet.
    Prospect,
}

impl ClientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Active => "active",
            ClientStatus::Inactive => "inactive",
            ClientStatus::Prospect => "prospect",
        }
    }
}

/// A customer of the dealership.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub organization_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub document_type: DocumentType,
    pub document_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub status: ClientStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    /// Incremented on every update; used to detect stale writes.
    pub version: i64,
}

impl Client {
    /// "First Last", as printed on quotes.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Editable client fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ClientInput {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub document_type: DocumentType,
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub status: ClientStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ClientInput {
    /// Trims every field, folds empty strings to `None` and normalises the
    /// document number (digits only for DNI/CUIT) and email (lowercase).
    pub fn normalized(mut self) -> Self {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.email = non_empty(self.email).map(|e| e.to_lowercase());
        self.phone = non_empty(self.phone);
        self.document_number = non_empty(self.document_number).map(|d| match self.document_type {
            DocumentType::Dni | DocumentType::Cuit => d.chars().filter(|c| c.is_ascii_digit()).collect(),
            DocumentType::Passport => d.to_uppercase(),
        });
        self.address = non_empty(self.address);
        self.city = non_empty(self.city);
        self.notes = non_empty(self.notes);
        self
    }

    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_name("first_name", &self.first_name, 100)?;
        validation::validate_name("last_name", &self.last_name, 100)?;
        if let Some(email) = &self.email {
            validation::validate_email(email)?;
        }
        if let Some(phone) = &self.phone {
            validation::validate_phone(phone)?;
        }
        if let Some(number) = &self.document_number {
            validation::validate_document(self.document_type, number)?;
        }
        if let Some(notes) = &self.notes {
            validation::validate_max_len("notes", notes, 2000)?;
        }
        Ok(())
    }
}

// =============================================================================
// Brands & Models
// =============================================================================

/// A manufacturer, shared across organizations.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: String,
    pub name: String,
    pub logo_url: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A brand as an organization sees it: associated, colored and ordered.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationBrand {
    pub organization_id: String,
    pub brand_id: String,
    pub name: String,
    pub logo_url: Option<String>,
    /// Badge color used by the stock tables.
    pub color: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "sort_order"))]
    pub order: i64,
}

/// A model of a brand, shared across organizations.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: String,
    pub brand_id: String,
    pub name: String,
    pub year: Option<i32>,
    pub displacement_cc: Option<i32>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A model associated to an organization, ordered within its brand.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationModel {
    pub organization_id: String,
    pub model_id: String,
    pub brand_id: String,
    pub name: String,
    pub year: Option<i32>,
    pub displacement_cc: Option<i32>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "sort_order"))]
    pub order: i64,
}

/// Fields for creating a brand (and associating it in one step).
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BrandInput {
    pub name: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl BrandInput {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.logo_url = non_empty(self.logo_url);
        self.color = non_empty(self.color).map(|c| c.to_uppercase());
        self
    }

    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_name("name", &self.name, 80)?;
        if let Some(color) = &self.color {
            validation::validate_hex_color(color)?;
        }
        Ok(())
    }
}

/// Fields for creating a model under a brand.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ModelInput {
    pub name: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub displacement_cc: Option<i32>,
}

impl ModelInput {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self
    }

    pub fn validate(&self, current_year: i32) -> ValidationResult<()> {
        validation::validate_name("name", &self.name, 120)?;
        if let Some(year) = self.year {
            validation::validate_model_year(year, current_year)?;
        }
        if let Some(cc) = self.displacement_cc {
            if !(1..=3000).contains(&cc) {
                return Err(ValidationError::OutOfRange {
                    field: "displacement_cc".to_string(),
                    min: 1,
                    max: 3000,
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// Colors
// =============================================================================

/// Paint finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ColorKind {
    #[default]
    Solid,
    Metallic,
    Matte,
    TwoTone,
}

/// A paint color offered by the organization.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Color {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    /// `#RRGGBB`, uppercase.
    pub hex: String,
    pub kind: ColorKind,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "sort_order"))]
    pub order: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ColorInput {
    pub name: String,
    pub hex: String,
    #[serde(default)]
    pub kind: ColorKind,
}

impl ColorInput {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.hex = self.hex.trim().to_uppercase();
        if !self.hex.is_empty() && !self.hex.starts_with('#') {
            self.hex.insert(0, '#');
        }
        self
    }

    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_name("name", &self.name, 60)?;
        validation::validate_hex_color(&self.hex)
    }
}

// =============================================================================
// Branches
// =============================================================================

/// A physical location of the dealership.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "sort_order"))]
    pub order: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BranchInput {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl BranchInput {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.address = non_empty(self.address);
        self.phone = non_empty(self.phone);
        self
    }

    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_name("name", &self.name, 80)?;
        if let Some(phone) = &self.phone {
            validation::validate_phone(phone)?;
        }
        Ok(())
    }
}

// =============================================================================
// Payment Methods
// =============================================================================

/// How a payment method settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
    Cash,
    Transfer,
    CreditCard,
    DebitCard,
    Financing,
    Check,
}

impl PaymentMethodKind {
    /// Card methods are the ones banking promotions narrow by bank and card.
    pub fn is_card(&self) -> bool {
        matches!(self, PaymentMethodKind::CreditCard | PaymentMethodKind::DebitCard)
    }
}

/// A payment method in the global catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: String,
    pub name: String,
    pub kind: PaymentMethodKind,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A payment method the organization accepts.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationPaymentMethod {
    pub organization_id: String,
    pub payment_method_id: String,
    pub name: String,
    pub kind: PaymentMethodKind,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "sort_order"))]
    pub order: i64,
    pub is_enabled: bool,
}

/// An issuing bank.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Bank {
    pub id: String,
    pub name: String,
}

/// Card networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CardNetwork {
    Visa,
    Mastercard,
    Amex,
    Cabal,
    Naranja,
    #[default]
    Other,
}

/// A card product, e.g. "Visa Signature".
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CardType {
    pub id: String,
    pub name: String,
    pub network: CardNetwork,
}

/// A bank + card type pair the organization accepts.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BankCard {
    pub id: String,
    pub organization_id: String,
    pub bank_id: String,
    pub card_type_id: String,
    pub bank_name: String,
    pub card_name: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "sort_order"))]
    pub order: i64,
    pub is_enabled: bool,
}

// =============================================================================
// Banking Promotions
// =============================================================================

/// Days of the week a promotion runs, as a 7-bit mask (Monday = bit 0).
///
/// An empty set means "every day".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const ALL: WeekdaySet = WeekdaySet(0b111_1111);

    pub const fn empty() -> Self {
        WeekdaySet(0)
    }

    pub const fn from_bits(bits: u8) -> Self {
        WeekdaySet(bits & 0b111_1111)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub fn from_days(days: &[Weekday]) -> Self {
        days.iter().fold(WeekdaySet::empty(), |set, day| set.with(*day))
    }

    pub fn with(self, day: Weekday) -> Self {
        WeekdaySet(self.0 | 1 << day.num_days_from_monday())
    }

    /// Whether the set allows `day`. The empty set allows every day.
    pub fn contains(&self, day: Weekday) -> bool {
        self.0 == 0 || self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn allows_date(&self, date: NaiveDate) -> bool {
        self.contains(date.weekday())
    }
}

/// A discount or surcharge tied to paying with a method, bank or card.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BankingPromotion {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub description: Option<String>,
    pub payment_method_id: String,
    /// When set, only payments with this bank qualify.
    pub bank_id: Option<String>,
    /// When set, only payments with this card type qualify.
    pub card_type_id: Option<String>,
    pub discount_bps: u32,
    pub surcharge_bps: u32,
    /// Installments the bank finances without interest.
    pub interest_free_installments: u32,
    pub weekdays: WeekdaySet,
    #[ts(as = "Option<String>")]
    pub starts_on: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub ends_on: Option<NaiveDate>,
    pub is_enabled: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PromotionInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub payment_method_id: String,
    #[serde(default)]
    pub bank_id: Option<String>,
    #[serde(default)]
    pub card_type_id: Option<String>,
    #[serde(default)]
    pub discount_bps: u32,
    #[serde(default)]
    pub surcharge_bps: u32,
    #[serde(default)]
    pub interest_free_installments: u32,
    #[serde(default)]
    pub weekdays: WeekdaySet,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub starts_on: Option<NaiveDate>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub ends_on: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
}

impl PromotionInput {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.description = non_empty(self.description);
        self.bank_id = non_empty(self.bank_id);
        self.card_type_id = non_empty(self.card_type_id);
        self
    }

    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_name("name", &self.name, 120)?;
        validation::validate_uuid_field("payment_method_id", &self.payment_method_id)?;
        if let Some(bank_id) = &self.bank_id {
            validation::validate_uuid_field("bank_id", bank_id)?;
        }
        if let Some(card_type_id) = &self.card_type_id {
            validation::validate_uuid_field("card_type_id", card_type_id)?;
        }
        if self.discount_bps > 10_000 {
            return Err(ValidationError::OutOfRange {
                field: "discount_bps".to_string(),
                min: 0,
                max: 10_000,
            });
        }
        validation::validate_rate_bps("surcharge_bps", self.surcharge_bps)?;
        validation::validate_installments(self.interest_free_installments)?;
        if let (Some(start), Some(end)) = (self.starts_on, self.ends_on) {
            if end < start {
                return Err(ValidationError::invalid_format(
                    "ends_on",
                    "must not be before starts_on",
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Trims an optional string, folding blank values to `None`.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_conversions() {
        let rate = Rate::from_bps(4500);
        assert_eq!(rate.bps(), 4500);
        assert!((rate.as_fraction() - 0.45).abs() < 1e-9);
        assert!((rate.percentage() - 45.0).abs() < 1e-9);
        assert_eq!(Rate::from_percentage(8.25).bps(), 825);
        assert_eq!(Rate::from_percentage(-3.0).bps(), 0);
    }

    #[test]
    fn test_role_permissions() {
        assert!(Role::Admin.can_configure());
        assert!(Role::Manager.can_configure());
        assert!(!Role::Seller.can_configure());
        assert_eq!("manager".parse::<Role>().unwrap(), Role::Manager);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_client_input_normalization() {
        let input = ClientInput {
            first_name: "  Ana ".into(),
            last_name: "Pérez".into(),
            email: Some(" Ana@Mail.COM ".into()),
            phone: Some("   ".into()),
            document_type: DocumentType::Dni,
            document_number: Some("30.123.456".into()),
            ..Default::default()
        }
        .normalized();

        assert_eq!(input.first_name, "Ana");
        assert_eq!(input.email.as_deref(), Some("ana@mail.com"));
        assert_eq!(input.phone, None);
        assert_eq!(input.document_number.as_deref(), Some("30123456"));
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_client_input_rejects_bad_document() {
        let input = ClientInput {
            first_name: "Ana".into(),
            last_name: "Pérez".into(),
            document_type: DocumentType::Cuit,
            document_number: Some("20-12345678-0".into()),
            ..Default::default()
        }
        .normalized();

        assert!(input.validate().is_err());
    }

    #[test]
    fn test_color_input_normalization() {
        let input = ColorInput {
            name: "Rojo".into(),
            hex: "ff0000".into(),
            kind: ColorKind::Metallic,
        }
        .normalized();
        assert_eq!(input.hex, "#FF0000");
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_weekday_set() {
        let set = WeekdaySet::from_days(&[Weekday::Mon, Weekday::Fri]);
        assert_eq!(set.bits(), 0b001_0001);
        assert!(set.contains(Weekday::Mon));
        assert!(set.contains(Weekday::Fri));
        assert!(!set.contains(Weekday::Sun));

        // Empty means every day
        assert!(WeekdaySet::empty().contains(Weekday::Sun));
        assert_eq!(WeekdaySet::from_bits(0xFF), WeekdaySet::ALL);
    }

    #[test]
    fn test_promotion_input_rejects_inverted_range() {
        let input = PromotionInput {
            name: "Cuotas".into(),
            description: None,
            payment_method_id: "550e8400-e29b-41d4-a716-446655440000".into(),
            bank_id: None,
            card_type_id: None,
            discount_bps: 0,
            surcharge_bps: 0,
            interest_free_installments: 6,
            weekdays: WeekdaySet::empty(),
            starts_on: NaiveDate::from_ymd_opt(2026, 3, 10),
            ends_on: NaiveDate::from_ymd_opt(2026, 3, 1),
            is_enabled: true,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_serializes_camel_case() {
        let input = BranchInput {
            name: "Centro".into(),
            address: None,
            phone: None,
            is_active: true,
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["isActive"], true);
    }
}
