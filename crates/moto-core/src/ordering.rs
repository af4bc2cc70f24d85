//! # Ordering Module
//!
//! Persists drag-and-drop list order through an integer `order` per row.
//!
//! ## Reorder Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Frontend                     Server                      Database     │
//! │                                                                         │
//! │  drag "Rojo" to slot 0  ──►  load current (id, order)                   │
//! │  (optimistic UI)              │                                         │
//! │                               ▼                                         │
//! │                          move_item / apply_order  ← THIS MODULE         │
//! │                               │  only rows whose order changed          │
//! │                               ▼                                         │
//! │                          one transaction ──────────────►  UPDATE x k    │
//! │                               │                                         │
//! │  confirm or roll back   ◄──  full list, orders 0..n                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Persisted orders may contain gaps (rows deleted elsewhere); every plan
//! produced here lands the list on exactly `0..n`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

/// A row id with its (current or desired) position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderAssignment {
    pub id: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "sort_order"))]
    pub order: i64,
}

impl OrderAssignment {
    pub fn new(id: impl Into<String>, order: i64) -> Self {
        OrderAssignment {
            id: id.into(),
            order,
        }
    }
}

/// Body of a reorder request: either the full sequence after the drop, or a
/// single move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(untagged)]
pub enum ReorderRequest {
    Sequence {
        ids: Vec<String>,
    },
    Move {
        id: String,
        #[serde(rename = "toIndex")]
        to_index: usize,
    },
}

impl ReorderRequest {
    /// Changed rows needed to satisfy the request against `current`.
    pub fn plan(&self, current: &[OrderAssignment]) -> CoreResult<Vec<OrderAssignment>> {
        match self {
            ReorderRequest::Sequence { ids } => apply_order(current, ids),
            ReorderRequest::Move { id, to_index } => move_item(current, id, *to_index),
        }
    }
}

/// Sorts persisted rows by `(order, id)` so ties resolve the same way every time.
fn canonical(current: &[OrderAssignment]) -> Vec<&OrderAssignment> {
    let mut rows: Vec<&OrderAssignment> = current.iter().collect();
    rows.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
    rows
}

/// Assignments that take `current` to `desired` (ids in their new sequence).
fn diff(current: &[OrderAssignment], desired: &[&str]) -> Vec<OrderAssignment> {
    desired
        .iter()
        .enumerate()
        .filter_map(|(index, id)| {
            let order = index as i64;
            let unchanged = current
                .iter()
                .any(|row| row.id == *id && row.order == order);
            (!unchanged).then(|| OrderAssignment::new(*id, order))
        })
        .collect()
}

/// Moves `id` to `to_index` (clamped to the list) and returns the changed rows.
///
/// ## Example
/// ```rust
/// use moto_core::ordering::{move_item, OrderAssignment};
///
/// let current = vec![
///     OrderAssignment::new("a", 0),
///     OrderAssignment::new("b", 1),
///     OrderAssignment::new("c", 2),
/// ];
///
/// let changes = move_item(&current, "c", 0).unwrap();
/// assert_eq!(
///     changes,
///     vec![
///         OrderAssignment::new("c", 0),
///         OrderAssignment::new("a", 1),
///         OrderAssignment::new("b", 2),
///     ]
/// );
/// ```
pub fn move_item(
    current: &[OrderAssignment],
    id: &str,
    to_index: usize,
) -> CoreResult<Vec<OrderAssignment>> {
    let mut sequence: Vec<&str> = canonical(current).iter().map(|row| row.id.as_str()).collect();

    let from = sequence
        .iter()
        .position(|candidate| *candidate == id)
        .ok_or_else(|| CoreError::invalid_reorder(format!("unknown id {id}")))?;

    let moved = sequence.remove(from);
    let to = to_index.min(sequence.len());
    sequence.insert(to, moved);

    Ok(diff(current, &sequence))
}

/// Applies a full requested sequence and returns the changed rows.
///
/// `requested` must be a permutation of the persisted ids: same length, no
/// duplicates, no unknown ids.
pub fn apply_order(
    current: &[OrderAssignment],
    requested: &[String],
) -> CoreResult<Vec<OrderAssignment>> {
    if requested.len() != current.len() {
        return Err(CoreError::invalid_reorder(format!(
            "expected {} ids, got {}",
            current.len(),
            requested.len()
        )));
    }

    let known: HashSet<&str> = current.iter().map(|row| row.id.as_str()).collect();
    let mut seen = HashSet::with_capacity(requested.len());

    for id in requested {
        if !known.contains(id.as_str()) {
            return Err(CoreError::invalid_reorder(format!("unknown id {id}")));
        }
        if !seen.insert(id.as_str()) {
            return Err(CoreError::invalid_reorder(format!("duplicate id {id}")));
        }
    }

    let sequence: Vec<&str> = requested.iter().map(String::as_str).collect();
    Ok(diff(current, &sequence))
}

/// Closes gaps left by deletions, keeping relative order.
pub fn compact(current: &[OrderAssignment]) -> Vec<OrderAssignment> {
    let sequence: Vec<&str> = canonical(current).iter().map(|row| row.id.as_str()).collect();
    diff(current, &sequence)
}

/// Order for a row appended at the end: one past the max, 0 for an empty list.
pub fn next_order(existing: &[i64]) -> i64 {
    existing.iter().max().map_or(0, |max| max + 1)
}

// =============================================================================
// Unit Tests
// =============================================================================
