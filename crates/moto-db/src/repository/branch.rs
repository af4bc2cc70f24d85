//! # Branch Repository
//!
//! Physical locations of an organization, kept in user order.

use moto_core::ordering::ReorderRequest;
use moto_core::{Branch, BranchInput};
use sqlx::SqlitePool;
use tracing::info;

use super::new_id;
use super::reorder::OrderedList;
use crate::error::{DbError, DbResult};

const BRANCH_COLUMNS: &str = "id, organization_id, name, address, phone, sort_order, is_active";

#[derive(Debug, Clone)]
pub struct BranchRepository {
    pool: SqlitePool,
}

impl BranchRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BranchRepository { pool }
    }

    fn ordered(organization_id: &str) -> OrderedList {
        OrderedList::new("branches", "id").scoped("organization_id = ?", organization_id)
    }

    pub async fn list(&self, organization_id: &str) -> DbResult<Vec<Branch>> {
        let sql = format!("SELECT {BRANCH_COLUMNS} FROM branches WHERE organization_id = ? ORDER BY sort_order, name");
        let branches = sqlx::query_as::<_, Branch>(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(branches)
    }

    pub async fn get(&self, organization_id: &str, id: &str) -> DbResult<Branch> {
        let sql = format!("SELECT {BRANCH_COLUMNS} FROM branches WHERE id = ? AND organization_id = ?");
        sqlx::query_as::<_, Branch>(&sql)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Branch", id))
    }

    /// Adds a branch at the end of the list.
    pub async fn insert(&self, organization_id: &str, input: BranchInput) -> DbResult<Branch> {
        let input = input.normalized();
        input.validate()?;

        let mut tx = self.pool.begin().await?;
        let order = Self::ordered(organization_id).next_order(&mut tx).await?;

        let id = new_id();
        sqlx::query(
            r#"
            INSERT INTO branches (id, organization_id, name, address, phone, sort_order, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(organization_id)
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(order)
        .bind(input.is_active)
        .execute(&mut *tx)
        .await
        .map_err(duplicate_name)?;
        tx.commit().await?;

        info!(branch_id = %id, name = %input.name, "Branch created");
        self.get(organization_id, &id).await
    }

    pub async fn update(&self, organization_id: &str, id: &str, input: BranchInput) -> DbResult<Branch> {
        let input = input.normalized();
        input.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE branches SET name = ?, address = ?, phone = ?, is_active = ?
            WHERE id = ? AND organization_id = ?
            "#,
        )
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(input.is_active)
        .bind(id)
        .bind(organization_id)
        .execute(&self.pool)
        .await
        .map_err(duplicate_name)?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Branch", id));
        }

        info!(branch_id = %id, "Branch updated");
        self.get(organization_id, id).await
    }

    /// Deletes a branch and closes the gap. Units and sales keep no branch.
    pub async fn delete(&self, organization_id: &str, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM branches WHERE id = ? AND organization_id = ?")
            .bind(id)
            .bind(organization_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Branch", id));
        }

        Self::ordered(organization_id).compact(&mut tx).await?;
        tx.commit().await?;

        info!(branch_id = %id, "Branch deleted");
        Ok(())
    }

    pub async fn reorder(&self, organization_id: &str, request: &ReorderRequest) -> DbResult<Vec<Branch>> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::motorcycle::tests::{catalog_fixture, moto_input};
    use crate::repository::test_support::setup;

    fn branch(name: &str) -> BranchInput {
        BranchInput {
            name: name.into(),
            address: None,
            phone: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_move_and_delete() {
        let (db, org) = setup().await;
        let repo = db.branches();

        let centro = repo.insert(&org.id, branch("Centro")).await.unwrap();
        let norte = repo.insert(&org.id, branch("Norte")).await.unwrap();
        let sur = repo.insert(&org.id, branch("Sur")).await.unwrap();

        let request = ReorderRequest::Move {
            id: centro.id.clone(),
            to_index: 2,
        };
        let branches = repo.reorder(&org.id, &request).await.unwrap();
        let names: Vec<_> = branches.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Norte", "Sur", "Centro"]);

        repo.delete(&org.id, &norte.id).await.unwrap();
        let branches = repo.list(&org.id).await.unwrap();
        let orders: Vec<_> = branches.iter().map(|b| (b.id.clone(), b.order)).collect();
        assert_eq!(orders, vec![(sur.id.clone(), 0), (centro.id.clone(), 1)]);
    }

    #[tokio::test]
    async fn test_deleting_branch_detaches_units() {
        let (db, org) = setup().await;
        let (brand, model) = catalog_fixture(&db, &org).await;

        let centro = db.branches().insert(&org.id, branch("Centro")).await.unwrap();
        let moto = db
            .motorcycles()
            .insert(
                &org.id,
                moto_core::MotorcycleInput {
                    branch_id: Some(centro.id.clone()),
                    ..moto_input(&brand, &model, "AAA111", 100)
                },
            )
            .await
            .unwrap();
        assert_eq!(moto.branch_id.as_deref(), Some(centro.id.as_str()));

        db.branches().delete(&org.id, &centro.id).await.unwrap();
        let moto = db.motorcycles().get(&org.id, &moto.id).await.unwrap();
        assert!(moto.branch_id.is_none());
    }
}
