//! # Listing Module
//!
//! Sorting, filtering and pagination primitives shared by every table view.
//!
//! ## Query String → SQL
//! ```text
//! ?sort=-price&page=2&perPage=25&search=Honda CB
//!     │          │                  │
//!     ▼          ▼                  ▼
//! SortSpec   PageRequest        MotorcycleFilter
//! (whitelist) (clamped)         (search folded: "honda cb")
//!     │          │                  │
//!     └──────────┴──────────┬───────┘
//!                           ▼
//!          ORDER BY retail_price_cents DESC, id ASC
//!          LIMIT 25 OFFSET 25
//! ```
//! Sort fields never reach SQL as user text: they are parsed into a
//! [`SortKey`] enum that names the column.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::motorcycle::MotorcycleState;
use crate::types::ClientStatus;
use crate::validation::{self, ValidationResult};

/// Rows per page when the request does not say.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Largest page a client may ask for.
pub const MAX_PER_PAGE: u32 = 100;

// =============================================================================
// Pagination
// =============================================================================

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        PageRequest { page, per_page }.normalized()
    }

    /// Page 0 becomes 1, `per_page` 0 becomes the default and anything above
    /// [`MAX_PER_PAGE`] is clamped.
    pub fn normalized(self) -> Self {
        PageRequest {
            page: self.page.max(1),
            per_page: match self.per_page {
                0 => DEFAULT_PER_PAGE,
                n => n.min(MAX_PER_PAGE),
            },
        }
    }

    pub fn limit(&self) -> i64 {
        self.normalized().per_page as i64
    }

    pub fn offset(&self) -> i64 {
        let page = self.normalized();
        (page.page as i64 - 1) * page.per_page as i64
    }
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

/// One page of results plus what the table footer needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: &PageRequest) -> Self {
        let request = request.normalized();
        let total = total.max(0);
        let per_page = request.per_page as i64;
        Page {
            items,
            total,
            page: request.page,
            per_page: request.per_page,
            total_pages: ((total + per_page - 1) / per_page) as u32,
        }
    }

    /// Converts the items, keeping the paging numbers.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

/// Pages an in-memory list (used for short catalogs).
pub fn paginate<T>(items: Vec<T>, request: &PageRequest) -> Page<T> {
    let total = items.len() as i64;
    let offset = request.offset() as usize;
    let limit = request.limit() as usize;
    let slice = items.into_iter().skip(offset).take(limit).collect();
    Page::new(slice, total, request)
}

// =============================================================================
// Sorting
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A whitelisted sortable field.
pub trait SortKey: Sized + Copy + Default {
    /// Every accepted field name, for error messages.
    const FIELDS: &'static [&'static str];

    fn parse(field: &str) -> Option<Self>;

    /// Columns to order by, most significant first.
    fn columns(&self) -> &'static [&'static str];
}

/// A parsed `sort` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec<K> {
    pub key: K,
    pub direction: SortDirection,
}

impl<K: SortKey> Default for SortSpec<K> {
    fn default() -> Self {
        SortSpec {
            key: K::default(),
            direction: SortDirection::Asc,
        }
    }
}

impl<K: SortKey> SortSpec<K> {
    pub fn new(key: K, direction: SortDirection) -> Self {
        SortSpec { key, direction }
    }

    /// Parses `"field"`, `"-field"` or `"field:desc"` / `"field:asc"`.
    ///
    /// An empty string yields the default sort.
    pub fn parse(input: &str) -> ValidationResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Self::default());
        }

        let (field, direction) = if let Some(field) = input.strip_prefix('-') {
            (field, SortDirection::Desc)
        } else if let Some((field, dir)) = input.split_once(':') {
            let direction = match dir.to_ascii_lowercase().as_str() {
                "asc" => SortDirection::Asc,
                "desc" => SortDirection::Desc,
                _ => {
                    return Err(ValidationError::NotAllowed {
                        field: "sort direction".to_string(),
                        allowed: vec!["asc".into(), "desc".into()],
                    })
                }
            };
            (field, direction)
        } else {
            (input, SortDirection::Asc)
        };

        let key = K::parse(field).ok_or_else(|| ValidationError::NotAllowed {
            field: "sort".to_string(),
            allowed: K::FIELDS.iter().map(|f| f.to_string()).collect(),
        })?;

        Ok(SortSpec { key, direction })
    }

    /// `ORDER BY` body, with `id` as a final tiebreaker for stable paging.
    pub fn order_by(&self) -> String {
        let dir = self.direction.as_sql();
        let mut parts: Vec<String> = self
            .key
            .columns()
            .iter()
            .map(|column| format!("{column} {dir}"))
            .collect();
        parts.push("id ASC".to_string());
        parts.join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientSortKey {
    #[default]
    Name,
    CreatedAt,
    Status,
}

impl SortKey for ClientSortKey {
    const FIELDS: &'static [&'static str] = &["name", "created_at", "status"];

    fn parse(field: &str) -> Option<Self> {
        match field {
            "name" => Some(ClientSortKey::Name),
            "created_at" | "createdAt" => Some(ClientSortKey::CreatedAt),
            "status" => Some(ClientSortKey::Status),
            _ => None,
        }
    }

    fn columns(&self) -> &'static [&'static str] {
        match self {
            ClientSortKey::Name => &["last_name", "first_name"],
            ClientSortKey::CreatedAt => &["created_at"],
            ClientSortKey::Status => &["status"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotorcycleSortKey {
    Price,
    Year,
    #[default]
    CreatedAt,
    State,
    Chassis,
}

impl SortKey for MotorcycleSortKey {
    const FIELDS: &'static [&'static str] = &["price", "year", "created_at", "state", "chassis"];

    fn parse(field: &str) -> Option<Self> {
        match field {
            "price" => Some(MotorcycleSortKey::Price),
            "year" => Some(MotorcycleSortKey::Year),
            "created_at" | "createdAt" => Some(MotorcycleSortKey::CreatedAt),
            "state" => Some(MotorcycleSortKey::State),
            "chassis" => Some(MotorcycleSortKey::Chassis),
            _ => None,
        }
    }

    fn columns(&self) -> &'static [&'static str] {
        match self {
            MotorcycleSortKey::Price => &["retail_price_cents"],
            MotorcycleSortKey::Year => &["year"],
            MotorcycleSortKey::CreatedAt => &["created_at"],
            MotorcycleSortKey::State => &["state"],
            MotorcycleSortKey::Chassis => &["chassis_number"],
        }
    }
}

// =============================================================================
// Filters
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ClientFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<ClientStatus>,
}

impl ClientFilter {
    /// Validates and folds the search text; blank searches are dropped.
    pub fn normalized(self) -> ValidationResult<Self> {
        Ok(ClientFilter {
            search: normalize_search(self.search)?,
            ..self
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MotorcycleFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub state: Option<MotorcycleState>,
    #[serde(default)]
    pub brand_id: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub branch_id: Option<String>,
    #[serde(default)]
    pub year_min: Option<i32>,
    #[serde(default)]
    pub year_max: Option<i32>,
    #[serde(default)]
    pub price_min: Option<i64>,
    #[serde(default)]
    pub price_max: Option<i64>,
}

impl MotorcycleFilter {
    pub fn normalized(self) -> ValidationResult<Self> {
        if let (Some(min), Some(max)) = (self.year_min, self.year_max) {
            if min > max {
                return Err(ValidationError::invalid_format(
                    "year_min",
                    "must not exceed year_max",
                ));
            }
        }
        if let (Some(min), Some(max)) = (self.price_min, self.price_max) {
            if min > max {
                return Err(ValidationError::invalid_format(
                    "price_min",
                    "must not exceed price_max",
                ));
            }
        }
        Ok(MotorcycleFilter {
            search: normalize_search(self.search)?,
            ..self
        })
    }
}

fn normalize_search(search: Option<String>) -> ValidationResult<Option<String>> {
    match search {
        Some(raw) => {
            let trimmed = validation::validate_search_query(&raw)?;
            let folded = fold_search_text(&trimmed);
            Ok((!folded.is_empty()).then_some(folded))
        }
        None => Ok(None),
    }
}

// =============================================================================
// Search Folding
// =============================================================================

/// Lowercases, strips Spanish diacritics and collapses whitespace.
///
/// Stored alongside searchable rows so `LIKE` matches "Pérez" from "perez".
///
/// ## Example
/// ```rust
/// use moto_core::listing::fold_search_text;
///
/// assert_eq!(fold_search_text("  José   PÉREZ Muñoz "), "jose perez munoz");
/// ```
pub fn fold_search_text(text: &str) -> String {
    let folded: String = text
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_normalization() {
        assert_eq!(PageRequest::new(0, 0), PageRequest { page: 1, per_page: 20 });
        assert_eq!(PageRequest::new(3, 500).per_page, 100);

        let request = PageRequest::new(3, 25);
        assert_eq!(request.offset(), 50);
        assert_eq!(request.limit(), 25);
    }

    #[test]
    fn test_page_totals() {
        let page: Page<i32> = Page::new(vec![], 0, &PageRequest::default());
        assert_eq!(page.total_pages, 0);

        let page = Page::new(vec![1, 2], 41, &PageRequest::new(1, 20));
        assert_eq!(page.total_pages, 3);

        let mapped = page.map(|n| n.to_string());
        assert_eq!(mapped.items, vec!["1", "2"]);
        assert_eq!(mapped.total, 41);
    }

    #[test]
    fn test_paginate_in_memory() {
        let items: Vec<i32> = (1..=45).collect();
        let page = paginate(items, &PageRequest::new(3, 20));
        assert_eq!(page.items, vec![41, 42, 43, 44, 45]);
        assert_eq!(page.total, 45);
        assert_eq!(page.total_pages, 3);

        let past_end = paginate(vec![1, 2, 3], &PageRequest::new(9, 20));
        assert!(past_end.items.is_empty());
    }

    #[test]
    fn test_sort_spec_parsing() {
        let spec = SortSpec::<MotorcycleSortKey>::parse("-price").unwrap();
        assert_eq!(spec.key, MotorcycleSortKey::Price);
        assert_eq!(spec.direction, SortDirection::Desc);

        let spec = SortSpec::<MotorcycleSortKey>::parse("year:desc").unwrap();
        assert_eq!(spec, SortSpec::new(MotorcycleSortKey::Year, SortDirection::Desc));

        let spec = SortSpec::<ClientSortKey>::parse("").unwrap();
        assert_eq!(spec, SortSpec::default());

        assert!(SortSpec::<ClientSortKey>::parse("password_hash").is_err());
        assert!(SortSpec::<ClientSortKey>::parse("name:sideways").is_err());
    }

    #[test]
    fn test_order_by_uses_whitelisted_columns() {
        let spec = SortSpec::new(ClientSortKey::Name, SortDirection::Desc);
        assert_eq!(spec.order_by(), "last_name DESC, first_name DESC, id ASC");
    }

    #[test]
    fn test_filter_normalization() {
        let filter = ClientFilter {
            search: Some("  PÉREZ ".into()),
            status: None,
        }
        .normalized()
        .unwrap();
        assert_eq!(filter.search.as_deref(), Some("perez"));

        let blank = ClientFilter {
            search: Some("   ".into()),
            status: None,
        }
        .normalized()
        .unwrap();
        assert_eq!(blank.search, None);

        let inverted = MotorcycleFilter {
            year_min: Some(2025),
            year_max: Some(2020),
            ..Default::default()
        };
        assert!(inverted.normalized().is_err());
    }

    #[test]
    fn test_fold_search_text() {
        assert_eq!(fold_search_text("Ñandú"), "nandu");
        assert_eq!(fold_search_text("Honda\tCB  190R"), "honda cb 190r");
    }
}
