//! # Ordered Lists
//!
//! Shared persistence for every drag-and-drop list (brands, models, colors,
//! branches, payment methods, bank cards).
//!
//! ```text
//! BEGIN
//!   SELECT id, sort_order FROM <table> WHERE <scope>     (load)
//!   plan with moto_core::ordering                       (pure)
//!   UPDATE <table> SET sort_order = ? WHERE id = ? ...  (changed rows only)
//! COMMIT
//! ```

use moto_core::ordering::{self, OrderAssignment, ReorderRequest};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

/// One organization-scoped ordered list.
///
/// `scope` holds SQL conditions with a single `?` each, joined with `AND`.
#[derive(Debug, Clone)]
pub(crate) struct OrderedList {
    pub table: &'static str,
    pub id_column: &'static str,
    pub scope: Vec<(&'static str, String)>,
}

impl OrderedList {
    pub fn new(table: &'static str, id_column: &'static str) -> Self {
        OrderedList {
            table,
            id_column,
            scope: Vec::new(),
        }
    }

    pub fn scoped(mut self, condition: &'static str, value: impl Into<String>) -> Self {
        self.scope.push((condition, value.into()));
        self
    }

    fn where_clause(&self) -> String {
        if self.scope.is_empty() {
            return "1 = 1".to_string();
        }
        self.scope
            .iter()
            .map(|(condition, _)| *condition)
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Persisted `(id, sort_order)` rows.
    pub async fn load(&self, conn: &mut SqliteConnection) -> DbResult<Vec<OrderAssignment>> {
        let sql = format!(
            "SELECT {id} AS id, sort_order FROM {table} WHERE {scope} ORDER BY sort_order, {id}",
            id = self.id_column,
            table = self.table,
            scope = self.where_clause(),
        );

        let mut query = sqlx::query_as::<_, OrderAssignment>(&sql);
        for (_, value) in &self.scope {
            query = query.bind(value.clone());
        }
        Ok(query.fetch_all(&mut *conn).await?)
    }

    /// Writes `changes`, returning the number of rows touched.
    pub async fn write(
        &self,
        conn: &mut SqliteConnection,
        changes: &[OrderAssignment],
    ) -> DbResult<usize> {
        let sql = format!(
            "UPDATE {table} SET sort_order = ? WHERE {id} = ? AND {scope}",
            table = self.table,
            id = self.id_column,
            scope = self.where_clause(),
        );

        for change in changes {
            let mut query = sqlx::query(&sql).bind(change.order).bind(change.id.clone());
            for (_, value) in &self.scope {
                query = query.bind(value.clone());
            }
            query.execute(&mut *conn).await?;
        }
        Ok(changes.len())
    }

    /// Order for a row appended at the end of the list.
    pub async fn next_order(&self, conn: &mut SqliteConnection) -> DbResult<i64> {
        let orders: Vec<i64> = self.load(conn).await?.into_iter().map(|row| row.order).collect();
        Ok(ordering::next_order(&orders))
    }

    /// Closes gaps left by a deletion.
    pub async fn compact(&self, conn: &mut SqliteConnection) -> DbResult<usize> {
        let current = self.load(conn).await?;
        let changes = ordering::compact(&current);
        self.write(conn, &changes).await
    }

    /// Applies a reorder request in one transaction.
    pub async fn apply(&self, pool: &SqlitePool, request: &ReorderRequest) -> DbResult<usize> {
        let mut tx = pool.begin().await?;

        let current = self.load(&mut tx).await?;
        let changes = request.plan(&current)?;
        let written = self.write(&mut tx, &changes).await?;

        tx.commit().await?;

        debug!(table = self.table, written, "Reorder applied");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_clause_joins_conditions() {
        let list = OrderedList::new("organization_models", "model_id")
            .scoped("organization_id = ?", "org")
            .scoped("model_id IN (SELECT id FROM models WHERE brand_id = ?)", "brand");
        assert_eq!(
            list.where_clause(),
            "organization_id = ? AND model_id IN (SELECT id FROM models WHERE brand_id = ?)"
        );
        assert_eq!(OrderedList::new("colors", "id").where_clause(), "1 = 1");
    }
}
