//! # Organization Repository
//!
//! Tenants. Every other repository filters by `organization_id`.

use chrono::Utc;
use moto_core::{validation, Organization, ValidationError};
use sqlx::SqlitePool;
use tracing::info;

use super::new_id;
use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    pool: SqlitePool,
}

impl OrganizationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrganizationRepository { pool }
    }

    /// Creates an organization.
    ///
    /// `slug` must be lowercase letters, digits and dashes.
    pub async fn create(&self, name: &str, slug: &str) -> DbResult<Organization> {
        let name = name.trim();
        let slug = slug.trim().to_lowercase();
        validation::validate_name("name", name, 120)?;
        validate_slug(&slug)?;

        let org = Organization {
            id: new_id(),
            name: name.to_string(),
            slug,
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO organizations (id, name, slug, created_at) VALUES (?, ?, ?, ?)")
            .bind(&org.id)
            .bind(&org.name)
            .bind(&org.slug)
            .bind(org.created_at)
            .execute(&self.pool)
            .await?;

        info!(organization_id = %org.id, slug = %org.slug, "Organization created");
        Ok(org)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Organization>> {
        let org = sqlx::query_as::<_, Organization>(
            "SELECT id, name, slug, created_at FROM organizations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(org)
    }

    pub async fn get_by_slug(&self, slug: &str) -> DbResult<Option<Organization>> {
        let org = sqlx::query_as::<_, Organization>(
            "SELECT id, name, slug, created_at FROM organizations WHERE slug = ?",
        )
        .bind(slug.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;
        Ok(org)
    }
}

fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let valid = !slug.is_empty()
        && slug.len() <= 60
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::invalid_format(
            "slug",
            "use lowercase letters, digits and dashes",
        ))
    }
}
