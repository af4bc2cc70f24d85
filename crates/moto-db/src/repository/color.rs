//! # Color Repository
//!
//! Paint colors offered by an organization, kept in user order.

use moto_core::ordering::ReorderRequest;
use moto_core::{Color, ColorInput};
use sqlx::SqlitePool;
use tracing::info;

use super::new_id;
use super::reorder::OrderedList;
use crate::error::{DbError, DbResult};

const COLOR_COLUMNS: &str = "id, organization_id, name, hex, kind, sort_order";

#[derive(Debug, Clone)]
pub struct ColorRepository {
    pool: SqlitePool,
}

impl ColorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ColorRepository { pool }
    }

    fn ordered(organization_id: &str) -> OrderedList {
        OrderedList::new("colors", "id").scoped("organization_id = ?", organization_id)
    }

    pub async fn list(&self, organization_id: &str) -> DbResult<Vec<Color>> {
        let sql = format!("SELECT {COLOR_COLUMNS} FROM colors WHERE organization_id = ? ORDER BY sort_order, name");
        let colors = sqlx::query_as::<_, Color>(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(colors)
    }

    pub async fn get(&self, organization_id: &str, id: &str) -> DbResult<Color> {
        let sql = format!("SELECT {COLOR_COLUMNS} FROM colors WHERE id = ? AND organization_id = ?");
        sqlx::query_as::<_, Color>(&sql)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Color", id))
    }

    /// Adds a color at the end of the list.
    pub async fn insert(&self, organization_id: &str, input: ColorInput) -> DbResult<Color> {
        let input = input.normalized();
        input.validate()?;

        let mut tx = self.pool.begin().await?;
        let order = Self::ordered(organization_id).next_order(&mut tx).await?;

        let id = new_id();
        sqlx::query("INSERT INTO colors (id, organization_id, name, hex, kind, sort_order) VALUES (?, ?, ?, ?, ?, ?)")
            .bind(&id)
            .bind(organization_id)
            .bind(&input.name)
            .bind(&input.hex)
            .bind(input.kind)
            .bind(order)
            .execute(&mut *tx)
            .await
            .map_err(duplicate_name)?;
        tx.commit().await?;

        info!(color_id = %id, name = %input.name, "Color created");
        self.get(organization_id, &id).await
    }

    pub async fn update(&self, organization_id: &str, id: &str, input: ColorInput) -> DbResult<Color> {
        let input = input.normalized();
        input.validate()?;

        let result = sqlx::query("UPDATE colors SET name = ?, hex = ?, kind = ? WHERE id = ? AND organization_id = ?")
            .bind(&input.name)
            .bind(&input.hex)
            .bind(input.kind)
            .bind(id)
            .bind(organization_id)
            .execute(&self.pool)
            .await
            .map_err(duplicate_name)?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Color", id));
        }

        info!(color_id = %id, "Color updated");
        self.get(organization_id, id).await
    }

    /// Deletes a color and closes the gap. Units painted with it keep no color.
    pub async fn delete(&self, organization_id: &str, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM colors WHERE id = ? AND organization_id = ?")
            .bind(id)
            .bind(organization_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Color", id));
        }

        Self::ordered(organization_id).compact(&mut tx).await?;
        tx.commit().await?;

        info!(color_id = %id, "Color deleted");
        Ok(())
    }

    pub async fn reorder(&self, organization_id: &str, request: &ReorderRequest) -> DbResult<Vec<Color>> {
        Self::ordered(organization_id).apply(&self.pool, request).await?;
        self.list(organization_id).await
    }
}

fn duplicate_name(err: sqlx::Error) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("name"),
        other => other,
    }
}
