//! # Promotion Repository
//!
//! Banking promotions of an organization. Matching and pricing live in
//! `moto_core::promotion`; this module only stores them.

use chrono::{NaiveDate, Utc};
use moto_core::promotion::{applicable_promotions, PaymentSelection};
use moto_core::{BankingPromotion, PromotionInput};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::new_id;
use crate::error::{DbError, DbResult};

const PROMOTION_COLUMNS: &str = "id, organization_id, name, description, payment_method_id, bank_id, \
     card_type_id, discount_bps, surcharge_bps, interest_free_installments, weekdays, starts_on, ends_on, \
     is_enabled, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PromotionRepository {
    pool: SqlitePool,
}

impl PromotionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PromotionRepository { pool }
    }

    pub async fn list(&self, organization_id: &str) -> DbResult<Vec<BankingPromotion>> {
        let sql = format!(
            "SELECT {PROMOTION_COLUMNS} FROM banking_promotions WHERE organization_id = ? ORDER BY name, id"
        );
        let promotions = sqlx::query_as::<_, BankingPromotion>(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(promotions)
    }

    /// Enabled promotions only (date and weekday are checked by the caller).
    pub async fn list_enabled(&self, organization_id: &str) -> DbResult<Vec<BankingPromotion>> {
        let sql = format!(
            "SELECT {PROMOTION_COLUMNS} FROM banking_promotions WHERE organization_id = ? AND is_enabled = 1 ORDER BY name, id"
        );
        let promotions = sqlx::query_as::<_, BankingPromotion>(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(promotions)
    }

    /// Promotions that apply to `payment` on `date`.
    pub async fn list_applicable(
        &self,
        organization_id: &str,
        payment: &PaymentSelection,
        date: NaiveDate,
    ) -> DbResult<Vec<BankingPromotion>> {
        payment.validate()?;
        let enabled = self.list_enabled(organization_id).await?;
        let applicable: Vec<BankingPromotion> = applicable_promotions(&enabled, payment, date)
            .into_iter()
            .cloned()
            .collect();

        debug!(
            organization_id = %organization_id,
            enabled = enabled.len(),
            applicable = applicable.len(),
            "Matched promotions"
        );
        Ok(applicable)
    }

    pub async fn get(&self, organization_id: &str, id: &str) -> DbResult<BankingPromotion> {
        let sql = format!("SELECT {PROMOTION_COLUMNS} FROM banking_promotions WHERE id = ? AND organization_id = ?");
        sqlx::query_as::<_, BankingPromotion>(&sql)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Promotion", id))
    }

    pub async fn insert(&self, organization_id: &str, input: PromotionInput) -> DbResult<BankingPromotion> {
        let input = input.normalized();
        input.validate()?;

        let now = Utc::now();
        let id = new_id();

        sqlx::query(
            r#"
            INSERT INTO banking_promotions (
                id, organization_id, name, description, payment_method_id, bank_id, card_type_id,
                discount_bps, surcharge_bps, interest_free_installments, weekdays,
                starts_on, ends_on, is_enabled, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(organization_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.payment_method_id)
        .bind(&input.bank_id)
        .bind(&input.card_type_id)
        .bind(input.discount_bps)
        .bind(input.surcharge_bps)
        .bind(input.interest_free_installments)
        .bind(input.weekdays)
        .bind(input.starts_on)
        .bind(input.ends_on)
        .bind(input.is_enabled)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!(promotion_id = %id, name = %input.name, "Promotion created");
        self.get(organization_id, &id).await
    }

    pub async fn update(
        &self,
        organization_id: &str,
        id: &str,
        input: PromotionInput,
    ) -> DbResult<BankingPromotion> {
        let input = input.normalized();
        input.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE banking_promotions SET
                name = ?, description = ?, payment_method_id = ?, bank_id = ?, card_type_id = ?,
                discount_bps = ?, surcharge_bps = ?, interest_free_installments = ?, weekdays = ?,
                starts_on = ?, ends_on = ?, is_enabled = ?, updated_at = ?
            WHERE id = ? AND organization_id = ?
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.payment_method_id)
        .bind(&input.bank_id)
        .bind(&input.card_type_id)
        .bind(input.discount_bps)
        .bind(input.surcharge_bps)
        .bind(input.interest_free_installments)
        .bind(input.weekdays)
        .bind(input.starts_on)
        .bind(input.ends_on)
        .bind(input.is_enabled)
        .bind(Utc::now())
        .bind(id)
        .bind(organization_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Promotion", id));
        }

        info!(promotion_id = %id, "Promotion updated");
        self.get(organization_id, id).await
    }

    pub async fn set_enabled(&self, organization_id: &str, id: &str, enabled: bool) -> DbResult<BankingPromotion> {
        let result = sqlx::query(
            "UPDATE banking_promotions SET is_enabled = ?, updated_at = ? WHERE id = ? AND organization_id = ?",
        )
        .bind(enabled)
        .bind(Utc::now())
        .bind(id)
        .bind(organization_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Promotion", id));
        }

        info!(promotion_id = %id, enabled, "Promotion toggled");
        self.get(organization_id, id).await
    }

    /// Deletes a promotion. Sales that used it keep their amounts.
    pub async fn delete(&self, organization_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM banking_promotions WHERE id = ? AND organization_id = ?")
            .bind(id)
            .bind(organization_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Promotion", id));
        }

        info!(promotion_id = %id, "Promotion deleted");
        Ok(())
    }
}

/// Loads a promotion inside a running transaction.
pub(crate) async fn fetch(
    conn: &mut SqliteConnection,
    organization_id: &str,
    id: &str,
) -> DbResult<Option<BankingPromotion>> {
    let sql = format!("SELECT {PROMOTION_COLUMNS} FROM banking_promotions WHERE id = ? AND organization_id = ?");
    let promotion = sqlx::query_as::<_, BankingPromotion>(&sql)
        .bind(id)
        .bind(organization_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(promotion)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::repository::test_support::setup;
    use chrono::Weekday;
    use moto_core::WeekdaySet;

    pub(crate) const CREDIT: &str = "a1000000-0000-4000-8000-000000000003";
    pub(crate) const GALICIA: &str = "b1000000-0000-4000-8000-000000000002";
    pub(crate) const VISA: &str = "c1000000-0000-4000-8000-000000000001";

    pub(crate) fn promo(name: &str, discount_bps: u32) -> PromotionInput {
        PromotionInput {
            name: name.into(),
            description: None,
            payment_method_id: CREDIT.into(),
            bank_id: None,
            card_type_id: None,
            discount_bps,
            surcharge_bps: 0,
            interest_free_installments: 0,
            weekdays: WeekdaySet::empty(),
            starts_on: None,
            ends_on: None,
            is_enabled: true,
        }
    }

    #[tokio::test]
    async fn test_insert_roundtrips_every_field() {
        let (db, org) = setup().await;
        let repo = db.promotions();

        let input = PromotionInput {
            bank_id: Some(GALICIA.into()),
            card_type_id: Some(VISA.into()),
            interest_free_installments: 6,
            weekdays: WeekdaySet::from_days(&[Weekday::Tue, Weekday::Wed]),
            starts_on: NaiveDate::from_ymd_opt(2026, 3, 1),
            ends_on: NaiveDate::from_ymd_opt(2026, 3, 31),
            ..promo("Galicia Visa 6 cuotas", 1500)
        };
        let created = repo.insert(&org.id, input).await.unwrap();

        assert_eq!(created.discount_bps, 1500);
        assert_eq!(created.interest_free_installments, 6);
        assert_eq!(created.weekdays, WeekdaySet::from_days(&[Weekday::Tue, Weekday::Wed]));
        assert_eq!(created.starts_on, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert_eq!(created.bank_id.as_deref(), Some(GALICIA));
    }

    #[tokio::test]
    async fn test_applicable_filters_disabled_and_dates() {
        let (db, org) = setup().await;
        let repo = db.promotions();

        let active = repo.insert(&org.id, promo("Activa", 1000)).await.unwrap();
        let off = repo.insert(&org.id, promo("Apagada", 2000)).await.unwrap();
        repo.set_enabled(&org.id, &off.id, false).await.unwrap();
        repo.insert(
            &org.id,
            PromotionInput {
                ends_on: NaiveDate::from_ymd_opt(2020, 1, 1),
                ..promo("Vencida", 3000)
            },
        )
        .await
        .unwrap();

        let today = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();
        let payment = PaymentSelection::method(CREDIT);
        let applicable = repo.list_applicable(&org.id, &payment, today).await.unwrap();

        assert_eq!(applicable.len(), 1);
        assert_eq!(applicable[0].id, active.id);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (db, org) = setup().await;
        let repo = db.promotions();

        let created = repo.insert(&org.id, promo("Contado", 500)).await.unwrap();
        let updated = repo
            .update(&org.id, &created.id, promo("Contado 10%", 1000))
            .await
            .unwrap();
        assert_eq!(updated.name, "Contado 10%");
        assert_eq!(updated.discount_bps, 1000);

        repo.delete(&org.id, &created.id).await.unwrap();
        let err = repo.get(&org.id, &created.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_unknown_payment_method_rejected() {
        let (db, org) = setup().await;
        let input = PromotionInput {
            payment_method_id: "a1000000-0000-4000-8000-0000000000ff".into(),
            ..promo("Fantasma", 100)
        };
        let err = db.promotions().insert(&org.id, input).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
