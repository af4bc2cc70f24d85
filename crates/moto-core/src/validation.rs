//! # Validation Module
//!
//! Input validation utilities for Moto Dealer.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend forms                                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                          │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE (chassis number, document number, slugs)                   │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use moto_core::validation::{validate_document, validate_installments};
//! use moto_core::DocumentType;
//!
//! assert!(validate_document(DocumentType::Cuit, "20123456786").is_ok());
//! assert!(validate_installments(12).is_ok());
//! ```

use crate::error::ValidationError;
use crate::types::DocumentType;
use crate::{MAX_INSTALLMENTS, MAX_PRICE_CENTS, MAX_RATE_BPS, MIN_MODEL_YEAR};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// CUIT/CUIL check digit weights, applied to the first ten digits.
const CUIT_WEIGHTS: [u32; 10] = [5, 4, 3, 2, 7, 6, 5, 4, 3, 2];

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required display name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most `max` characters (not bytes: names carry accents)
pub fn validate_name(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    validate_max_len(field, value, max)
}

/// Rejects values longer than `max` characters.
pub fn validate_max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Validates an email address.
///
/// Shape check only: `local@domain.tld`, no whitespace, at most 254 chars.
///
/// ## Example
/// ```rust
/// use moto_core::validation::validate_email;
///
/// assert!(validate_email("ana@example.com").is_ok());
/// assert!(validate_email("ana@localhost").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }
    validate_max_len("email", email, 254)?;

    let invalid = || ValidationError::invalid_format("email", "must look like name@domain.com");

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && tld.len() >= 2 => Ok(()),
        _ => Err(invalid()),
    }
}

/// Validates a phone number.
///
/// ## Rules
/// - Only digits, spaces and `+ - ( )`
/// - Between 6 and 15 digits (E.164 upper bound)
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'))
    {
        return Err(ValidationError::invalid_format(
            "phone",
            "may contain only digits, spaces and + - ( )",
        ));
    }

    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if !(6..=15).contains(&digits) {
        return Err(ValidationError::invalid_format(
            "phone",
            "must have between 6 and 15 digits",
        ));
    }

    Ok(())
}

/// Validates an identity document number for its type.
///
/// ## Rules
/// ```text
/// DNI       7-8 digits
/// CUIT      11 digits, last one is a mod-11 check digit
/// Passport  6-20 ASCII letters or digits
/// ```
/// Callers normalise first (DNI/CUIT stripped to digits).
pub fn validate_document(doc_type: DocumentType, number: &str) -> ValidationResult<()> {
    let number = number.trim();

    if number.is_empty() {
        return Err(ValidationError::required("document_number"));
    }

    match doc_type {
        DocumentType::Dni => {
            if !(7..=8).contains(&number.len()) || !number.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ValidationError::invalid_format(
                    "document_number",
                    "DNI must have 7 or 8 digits",
                ));
            }
        }
        DocumentType::Cuit => validate_cuit(number)?,
        DocumentType::Passport => {
            if !(6..=20).contains(&number.len())
                || !number.bytes().all(|b| b.is_ascii_alphanumeric())
            {
                return Err(ValidationError::invalid_format(
                    "document_number",
                    "passport must have 6 to 20 letters or digits",
                ));
            }
        }
    }

    Ok(())
}

/// CUIT/CUIL: 11 digits, mod-11 check digit.
fn validate_cuit(number: &str) -> ValidationResult<()> {
    let digits: Vec<u32> = number.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != 11 || number.len() != 11 {
        return Err(ValidationError::invalid_format(
            "document_number",
            "CUIT must have 11 digits",
        ));
    }

    let sum: u32 = digits
        .iter()
        .zip(CUIT_WEIGHTS.iter())
        .map(|(d, w)| d * w)
        .sum();

    let expected = match 11 - (sum % 11) {
        11 => 0,
        10 => {
            return Err(ValidationError::invalid_format(
                "document_number",
                "CUIT check digit is invalid",
            ))
        }
        d => d,
    };

    if digits[10] != expected {
        return Err(ValidationError::invalid_format(
            "document_number",
            "CUIT check digit is invalid",
        ));
    }

    Ok(())
}

/// Validates a `#RRGGBB` color.
pub fn validate_hex_color(hex: &str) -> ValidationResult<()> {
    let valid = hex.len() == 7
        && hex.starts_with('#')
        && hex[1..].bytes().all(|b| b.is_ascii_hexdigit());

    if !valid {
        return Err(ValidationError::invalid_format("hex", "must be #RRGGBB"));
    }
    Ok(())
}

/// Validates a chassis (frame/VIN) number.
///
/// ## Rules
/// - 6 to 17 ASCII letters or digits (17 is a full VIN)
/// - Compared case-insensitively; callers fold to uppercase
pub fn validate_chassis_number(chassis: &str) -> ValidationResult<()> {
    let chassis = chassis.trim();

    if chassis.is_empty() {
        return Err(ValidationError::required("chassis_number"));
    }

    if !(6..=17).contains(&chassis.len()) || !chassis.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(ValidationError::invalid_format(
            "chassis_number",
            "must have 6 to 17 letters or digits",
        ));
    }

    Ok(())
}

/// Validates a model year against the current year.
///
/// Next year's models go on sale before the calendar turns, so
/// `current_year + 1` is accepted.
pub fn validate_model_year(year: i32, current_year: i32) -> ValidationResult<()> {
    let max = current_year + 1;
    if !(MIN_MODEL_YEAR..=max).contains(&year) {
        return Err(ValidationError::OutOfRange {
            field: "year".to_string(),
            min: MIN_MODEL_YEAR as i64,
            max: max as i64,
        });
    }
    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns all results)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    validate_max_len("query", query, 100)?;

    Ok(query.to_string())
}

/// Validates a login password.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }
    if password.chars().count() < 8 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        });
    }
    validate_max_len("password", password, 128)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an amount in cents (0 to [`MAX_PRICE_CENTS`]).
///
/// ## Example
/// ```rust
/// use moto_core::validation::validate_price_cents;
/// use moto_core::MAX_PRICE_CENTS;
///
/// assert!(validate_price_cents("price", 450_000_000).is_ok());
/// assert!(validate_price_cents("price", 0).is_ok());
/// assert!(validate_price_cents("price", -100).is_err());
/// assert!(validate_price_cents("price", MAX_PRICE_CENTS + 1).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a rate in basis points (0 to [`MAX_RATE_BPS`]).
pub fn validate_rate_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > MAX_RATE_BPS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_RATE_BPS as i64,
        });
    }

    Ok(())
}

/// Validates an installment count (0 to [`MAX_INSTALLMENTS`]).
pub fn validate_installments(installments: u32) -> ValidationResult<()> {
    if installments > MAX_INSTALLMENTS {
        return Err(ValidationError::OutOfRange {
            field: "installments".to_string(),
            min: 0,
            max: MAX_INSTALLMENTS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use moto_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    validate_uuid_field("id", id)
}

/// Same as [`validate_uuid`], reporting the error against `field`.
pub fn validate_uuid_field(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required(field));
    }

    uuid::Uuid::parse_str(id)
        .map_err(|_| ValidationError::invalid_format(field, "must be a valid UUID"))?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Honda", 80).is_ok());
        assert!(validate_name("name", "   ", 80).is_err());
        // 5 chars, 6 bytes
        assert!(validate_name("name", "Peñas", 5).is_ok());
        assert!(validate_name("name", &"A".repeat(81), 80).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("a.b+c@mail.co").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("ana").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ana@@example.com").is_err());
        assert!(validate_email("ana @example.com").is_err());
        assert!(validate_email("ana@example.c").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+54 9 11 1234-5678").is_ok());
        assert!(validate_phone("(011) 4555-1234").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("11 1234 abcd").is_err());
    }

    #[test]
    fn test_validate_dni() {
        assert!(validate_document(DocumentType::Dni, "1234567").is_ok());
        assert!(validate_document(DocumentType::Dni, "30123456").is_ok());
        assert!(validate_document(DocumentType::Dni, "123456").is_err());
        assert!(validate_document(DocumentType::Dni, "301234567").is_err());
        assert!(validate_document(DocumentType::Dni, "3012345A").is_err());
    }

    #[test]
    fn test_validate_cuit_check_digit() {
        assert!(validate_document(DocumentType::Cuit, "20123456786").is_ok());
        assert!(validate_document(DocumentType::Cuit, "27111111117").is_ok());

        assert!(validate_document(DocumentType::Cuit, "20123456780").is_err());
        assert!(validate_document(DocumentType::Cuit, "2012345678").is_err());
        assert!(validate_document(DocumentType::Cuit, "20-12345678-6").is_err());
    }

    #[test]
    fn test_validate_passport() {
        assert!(validate_document(DocumentType::Passport, "AAA123456").is_ok());
        assert!(validate_document(DocumentType::Passport, "A1234").is_err());
        assert!(validate_document(DocumentType::Passport, "AB-12345").is_err());
    }

    #[test]
    fn test_validate_hex_color() {
        assert!(validate_hex_color("#FF00aa").is_ok());
        assert!(validate_hex_color("FF00AA").is_err());
        assert!(validate_hex_color("#FFF").is_err());
        assert!(validate_hex_color("#GG0000").is_err());
    }

    #[test]
    fn test_validate_chassis_number() {
        assert!(validate_chassis_number("9C2KC1670HR000123").is_ok());
        assert!(validate_chassis_number("ABC123").is_ok());
        assert!(validate_chassis_number("ABC12").is_err());
        assert!(validate_chassis_number("9C2KC1670HR0001234").is_err());
        assert!(validate_chassis_number("9C2-KC16").is_err());
    }

    #[test]
    fn test_validate_model_year() {
        assert!(validate_model_year(1950, 2026).is_ok());
        assert!(validate_model_year(2027, 2026).is_ok());
        assert!(validate_model_year(1949, 2026).is_err());
        assert!(validate_model_year(2028, 2026).is_err());
    }

    #[test]
    fn test_validate_numeric_ranges() {
        assert!(validate_rate_bps("rate", 0).is_ok());
        assert!(validate_rate_bps("rate", 100_000).is_ok());
        assert!(validate_rate_bps("rate", 100_001).is_err());

        assert!(validate_installments(0).is_ok());
        assert!(validate_installments(120).is_ok());
        assert!(validate_installments(121).is_err());

        assert!(validate_price_cents("price", MAX_PRICE_CENTS).is_ok());
        assert!(matches!(
            validate_price_cents("price", MAX_PRICE_CENTS + 1),
            Err(ValidationError::OutOfRange { max: MAX_PRICE_CENTS, .. })
        ));
        assert!(validate_price_cents("price", i64::MAX / 2).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  honda  ").unwrap(), "honda");
        assert!(validate_search_query(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("correct horse").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password("").is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
