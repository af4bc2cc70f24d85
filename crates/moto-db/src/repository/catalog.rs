//! # Catalog Repository
//!
//! Brands and models are shared across organizations; each organization
//! associates the ones it sells and orders them.
//!
//! ```text
//! brands ──< models                      (global)
//!   │          │
//!   ▼          ▼
//! organization_brands  organization_models   (per organization, sort_order)
//! ```
//!
//! Models are ordered within their brand. Dissociating a brand also
//! dissociates its models for that organization.

use chrono::{Datelike, Utc};
use moto_core::ordering::ReorderRequest;
use moto_core::{Brand, BrandInput, Model, ModelInput, OrganizationBrand, OrganizationModel};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use super::new_id;
use super::reorder::OrderedList;
use crate::error::{DbError, DbResult};

const ORG_BRAND_SELECT: &str = r#"
    SELECT ob.organization_id, ob.brand_id, b.name, b.logo_url, ob.color, ob.sort_order
    FROM organization_brands ob
    INNER JOIN brands b ON b.id = ob.brand_id
"#;

const ORG_MODEL_SELECT: &str = r#"
    SELECT om.organization_id, om.model_id, m.brand_id, m.name, m.year, m.displacement_cc, om.sort_order
    FROM organization_models om
    INNER JOIN models m ON m.id = om.model_id
"#;

#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    fn brand_list(organization_id: &str) -> OrderedList {
        OrderedList::new("organization_brands", "brand_id")
            .scoped("organization_id = ?", organization_id)
    }

    fn model_list(organization_id: &str, brand_id: &str) -> OrderedList {
        OrderedList::new("organization_models", "model_id")
            .scoped("organization_id = ?", organization_id)
            .scoped("model_id IN (SELECT id FROM models WHERE brand_id = ?)", brand_id)
    }

    // =========================================================================
    // Brands
    // =========================================================================

    /// Every brand in the shared catalog.
    pub async fn list_all_brands(&self) -> DbResult<Vec<Brand>> {
        let brands = sqlx::query_as::<_, Brand>(
            "SELECT id, name, logo_url, created_at FROM brands ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(brands)
    }

    /// Brands associated to the organization, in user order.
    pub async fn list_brands(&self, organization_id: &str) -> DbResult<Vec<OrganizationBrand>> {
        let sql = format!("{ORG_BRAND_SELECT} WHERE ob.organization_id = ? ORDER BY ob.sort_order, b.name");
        let brands = sqlx::query_as::<_, OrganizationBrand>(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(brands)
    }

    pub async fn get_brand(&self, organization_id: &str, brand_id: &str) -> DbResult<OrganizationBrand> {
        let sql = format!("{ORG_BRAND_SELECT} WHERE ob.organization_id = ? AND ob.brand_id = ?");
        sqlx::query_as::<_, OrganizationBrand>(&sql)
            .bind(organization_id)
            .bind(brand_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Brand", brand_id))
    }

    /// Creates the brand in the shared catalog (reusing an existing one with
    /// the same name) and associates it at the end of the organization's list.
    pub async fn create_brand(&self, organization_id: &str, input: BrandInput) -> DbResult<OrganizationBrand> {
        let input = input.normalized();
        input.validate()?;

        let mut tx = self.pool.begin().await?;

        let existing: Option<String> = sqlx::query_scalar("SELECT id FROM brands WHERE name = ?")
            .bind(&input.name)
            .fetch_optional(&mut *tx)
            .await?;

        let brand_id = match existing {
            Some(id) => id,
            None => {
                let id = new_id();
                sqlx::query("INSERT INTO brands (id, name, logo_url, created_at) VALUES (?, ?, ?, ?)")
                    .bind(&id)
                    .bind(&input.name)
                    .bind(&input.logo_url)
                    .bind(Utc::now())
                    .execute(&mut *tx)
                    .await?;
                info!(brand_id = %id, name = %input.name, "Brand created");
                id
            }
        };

        associate_brand_in(&mut tx, organization_id, &brand_id, input.color.as_deref()).await?;
        tx.commit().await?;

        self.get_brand(organization_id, &brand_id).await
    }

    /// Associates an existing catalog brand.
    pub async fn associate_brand(
        &self,
        organization_id: &str,
        brand_id: &str,
        color: Option<String>,
    ) -> DbResult<OrganizationBrand> {
        let color = color
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty());
        if let Some(color) = &color {
            moto_core::validation::validate_hex_color(color)?;
        }

        let mut tx = self.pool.begin().await?;
        associate_brand_in(&mut tx, organization_id, brand_id, color.as_deref()).await?;
        tx.commit().await?;

        self.get_brand(organization_id, brand_id).await
    }

    /// Removes the association (and the brand's model associations), then
    /// closes the gap in the brand order.
    pub async fn dissociate_brand(&self, organization_id: &str, brand_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM organization_brands WHERE organization_id = ? AND brand_id = ?")
            .bind(organization_id)
            .bind(brand_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Brand", brand_id));
        }

        let models = sqlx::query(
            r#"
            DELETE FROM organization_models
            WHERE organization_id = ? AND model_id IN (SELECT id FROM models WHERE brand_id = ?)
            "#,
        )
        .bind(organization_id)
        .bind(brand_id)
        .execute(&mut *tx)
        .await?;

        Self::brand_list(organization_id).compact(&mut tx).await?;
        tx.commit().await?;

        info!(
            organization_id = %organization_id,
            brand_id = %brand_id,
            models = models.rows_affected(),
            "Brand dissociated"
        );
        Ok(())
    }

    pub async fn reorder_brands(
        &self,
        organization_id: &str,
        request: &ReorderRequest,
    ) -> DbResult<Vec<OrganizationBrand>> {
        Self::brand_list(organization_id).apply(&self.pool, request).await?;
        self.list_brands(organization_id).await
    }

    // =========================================================================
    // Models
    // =========================================================================

    /// Every model of a brand in the shared catalog.
    pub async fn list_all_models(&self, brand_id: &str) -> DbResult<Vec<Model>> {
        let models = sqlx::query_as::<_, Model>(
            "SELECT id, brand_id, name, year, displacement_cc, created_at FROM models WHERE brand_id = ? ORDER BY name",
        )
        .bind(brand_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(models)
    }

    /// Models of `brand_id` associated to the organization, in user order.
    pub async fn list_models(&self, organization_id: &str, brand_id: &str) -> DbResult<Vec<OrganizationModel>> {
        let sql = format!(
            "{ORG_MODEL_SELECT} WHERE om.organization_id = ? AND m.brand_id = ? ORDER BY om.sort_order, m.name"
        );
        let models = sqlx::query_as::<_, OrganizationModel>(&sql)
            .bind(organization_id)
            .bind(brand_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(models)
    }

    pub async fn get_model(&self, organization_id: &str, model_id: &str) -> DbResult<OrganizationModel> {
        let sql = format!("{ORG_MODEL_SELECT} WHERE om.organization_id = ? AND om.model_id = ?");
        sqlx::query_as::<_, OrganizationModel>(&sql)
            .bind(organization_id)
            .bind(model_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Model", model_id))
    }

    /// Creates a model under an associated brand (reusing an existing one
    /// with the same name) and associates it.
    pub async fn create_model(
        &self,
        organization_id: &str,
        brand_id: &str,
        input: ModelInput,
    ) -> DbResult<OrganizationModel> {
        let input = input.normalized();
        input.validate(Utc::now().year())?;

        let mut tx = self.pool.begin().await?;
        ensure_brand_associated(&mut tx, organization_id, brand_id).await?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT id FROM models WHERE brand_id = ? AND name = ?")
                .bind(brand_id)
                .bind(&input.name)
                .fetch_optional(&mut *tx)
                .await?;

        let model_id = match existing {
            Some(id) => id,
            None => {
                let id = new_id();
                sqlx::query(
                    "INSERT INTO models (id, brand_id, name, year, displacement_cc, created_at) VALUES (?, ?, ?, ?, ?, ?)",
                )
                .bind(&id)
                .bind(brand_id)
                .bind(&input.name)
                .bind(input.year)
                .bind(input.displacement_cc)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;
                info!(model_id = %id, name = %input.name, "Model created");
                id
            }
        };

        associate_model_in(&mut tx, organization_id, brand_id, &model_id).await?;
        tx.commit().await?;

        self.get_model(organization_id, &model_id).await
    }

    /// Associates an existing catalog model. Its brand must be associated.
    pub async fn associate_model(&self, organization_id: &str, model_id: &str) -> DbResult<OrganizationModel> {
        let mut tx = self.pool.begin().await?;

        let brand_id: String = sqlx::query_scalar("SELECT brand_id FROM models WHERE id = ?")
            .bind(model_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Model", model_id))?;
        ensure_brand_associated(&mut tx, organization_id, &brand_id).await?;
        associate_model_in(&mut tx, organization_id, &brand_id, model_id).await?;

        tx.commit().await?;
        self.get_model(organization_id, model_id).await
    }

    pub async fn dissociate_model(&self, organization_id: &str, model_id: &str) -> DbResult<()> {
        let model = self.get_model(organization_id, model_id).await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM organization_models WHERE organization_id = ? AND model_id = ?")
            .bind(organization_id)
            .bind(model_id)
            .execute(&mut *tx)
            .await?;
        Self::model_list(organization_id, &model.brand_id)
            .compact(&mut tx)
            .await?;
        tx.commit().await?;

        info!(organization_id = %organization_id, model_id = %model_id, "Model dissociated");
        Ok(())
    }

    pub async fn reorder_models(
        &self,
        organization_id: &str,
        brand_id: &str,
        request: &ReorderRequest,
    ) -> DbResult<Vec<OrganizationModel>> {
        Self::model_list(organization_id, brand_id)
            .apply(&self.pool, request)
            .await?;
        self.list_models(organization_id, brand_id).await
    }

    /// Catalog brand and model names, whether or not they are still associated.
    pub async fn names(&self, brand_id: &str, model_id: &str) -> DbResult<(String, String)> {
        sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT b.name, m.name
            FROM models m
            INNER JOIN brands b ON b.id = m.brand_id
            WHERE b.id = ? AND m.id = ?
            "#,
        )
        .bind(brand_id)
        .bind(model_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Model", model_id))
    }
}

async fn associate_brand_in(
    conn: &mut SqliteConnection,
    organization_id: &str,
    brand_id: &str,
    color: Option<&str>,
) -> DbResult<()> {
    let order = CatalogRepository::brand_list(organization_id)
        .next_order(conn)
        .await?;

    sqlx::query(
        "INSERT INTO organization_brands (organization_id, brand_id, color, sort_order) VALUES (?, ?, ?, ?)",
    )
    .bind(organization_id)
    .bind(brand_id)
    .bind(color)
    .bind(order)
    .execute(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::UniqueViolation { .. } => DbError::duplicate("brand"),
        DbError::ForeignKeyViolation { .. } => DbError::not_found("Brand", brand_id),
        other => other,
    })?;

    info!(organization_id = %organization_id, brand_id = %brand_id, order, "Brand associated");
    Ok(())
}

async fn associate_model_in(
    conn: &mut SqliteConnection,
    organization_id: &str,
    brand_id: &str,
    model_id: &str,
) -> DbResult<()> {
    let order = CatalogRepository::model_list(organization_id, brand_id)
        .next_order(conn)
        .await?;

    sqlx::query("INSERT INTO organization_models (organization_id, model_id, sort_order) VALUES (?, ?, ?)")
        .bind(organization_id)
        .bind(model_id)
        .bind(order)
        .execute(&mut *conn)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("model"),
            other => other,
        })?;

    info!(organization_id = %organization_id, model_id = %model_id, order, "Model associated");
    Ok(())
}

async fn ensure_brand_associated(
    conn: &mut SqliteConnection,
    organization_id: &str,
    brand_id: &str,
) -> DbResult<()> {
    let found: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM organization_brands WHERE organization_id = ? AND brand_id = ?",
    )
    .bind(organization_id)
    .bind(brand_id)
    .fetch_one(&mut *conn)
    .await?;

    if found == 0 {
        return Err(DbError::not_found("Brand", brand_id));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
