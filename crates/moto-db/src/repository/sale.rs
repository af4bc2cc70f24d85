//! # Sale Repository
//!
//! Closing a sale touches three tables; everything runs in one transaction.
//!
//! ## Record Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Load motorcycle          ──►  must be able to move to Sold         │
//! │  2. Reserved?                ──►  only for the reservation's client    │
//! │  3. Promotion (optional)     ──►  must match payment and today         │
//! │  4. Price                                                              │
//! │       list − promo discount + promo surcharge − seller discount  ≥ 0   │
//! │  5. Motorcycle → Sold (client_id set)                                  │
//! │  6. Active reservation → Completed                                     │
//! │  7. INSERT sale                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use moto_core::listing::{Page, PageRequest};
use moto_core::promotion::{PaymentSelection, PromotionEffect};
use moto_core::{CoreError, Money, MotorcycleState, ReservationStatus, Sale, SaleInput};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::motorcycle::{fetch as fetch_motorcycle, write_state};
use super::new_id;
use super::promotion::fetch as fetch_promotion;
use super::reservation::{active_for_motorcycle, ensure_client, set_status};
use crate::error::{DbError, DbResult};

const SALE_COLUMNS: &str = "id, organization_id, motorcycle_id, client_id, seller_id, branch_id, \
     payment_method_id, promotion_id, list_price_cents, discount_cents, surcharge_cents, total_cents, \
     installments, notes, created_at";

#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Sells a unit. See the module docs for the steps.
    pub async fn record_sale(
        &self,
        organization_id: &str,
        motorcycle_id: &str,
        seller_id: Option<&str>,
        input: SaleInput,
    ) -> DbResult<Sale> {
        input.validate()?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let moto = fetch_motorcycle(&mut tx, organization_id, motorcycle_id)
            .await?
            .ok_or_else(|| DbError::not_found("Motorcycle", motorcycle_id))?;
        MotorcycleState::transition(moto.state, MotorcycleState::Sold)?;

        let reservation = active_for_motorcycle(&mut tx, organization_id, motorcycle_id).await?;
        if moto.state == MotorcycleState::Reserved
            && moto.client_id.as_deref() != Some(input.client_id.as_str())
        {
            return Err(CoreError::MotorcycleUnavailable {
                id: moto.id,
                state: moto.state,
            }
            .into());
        }
        ensure_client(&mut tx, organization_id, &input.client_id).await?;

        let list_price = moto.retail_price();
        let effect = match (&input.promotion_id, &input.payment_method_id) {
            (Some(promotion_id), Some(payment_method_id)) => {
                let promotion = fetch_promotion(&mut tx, organization_id, promotion_id)
                    .await?
                    .ok_or_else(|| DbError::not_found("Promotion", promotion_id))?;
                let payment = PaymentSelection {
                    payment_method_id: payment_method_id.clone(),
                    bank_id: input.bank_id.clone(),
                    card_type_id: input.card_type_id.clone(),
                };
                if !promotion.is_active_on(now.date_naive()) || !promotion.matches(&payment) {
                    return Err(CoreError::PromotionNotApplicable {
                        id: promotion_id.clone(),
                    }
                    .into());
                }
                promotion.effect(list_price)
            }
            _ => PromotionEffect::default(),
        };

        // The seller discount stops at zero so list - discount + surcharge = total
        let promo_price = effect.apply_to(list_price).clamp_non_negative();
        let seller_discount = Money::from_cents(input.discount_cents).min(promo_price);
        let total = promo_price - seller_discount;
        let discount = list_price + effect.surcharge - total;

        debug!(
            motorcycle_id = %motorcycle_id,
            list_price = %list_price,
            discount = %discount,
            surcharge = %effect.surcharge,
            total = %total,
            "Sale priced"
        );

        write_state(&mut tx, &moto, MotorcycleState::Sold, Some(&input.client_id)).await?;
        if let Some(reservation) = &reservation {
            set_status(&mut tx, reservation, ReservationStatus::Completed).await?;
        }

        let id = new_id();
        sqlx::query(
            r#"
            INSERT INTO sales (
                id, organization_id, motorcycle_id, client_id, seller_id, branch_id,
                payment_method_id, promotion_id, list_price_cents, discount_cents,
                surcharge_cents, total_cents, installments, notes, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(organization_id)
        .bind(motorcycle_id)
        .bind(&input.client_id)
        .bind(seller_id)
        .bind(input.branch_id.as_ref().or(moto.branch_id.as_ref()))
        .bind(&input.payment_method_id)
        .bind(&input.promotion_id)
        .bind(list_price.cents())
        .bind(discount.cents())
        .bind(effect.surcharge.cents())
        .bind(total.cents())
        .bind(input.installments)
        .bind(&input.notes)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            sale_id = %id,
            motorcycle_id = %motorcycle_id,
            client_id = %input.client_id,
            total = %total,
            "Sale recorded"
        );
        self.get(organization_id, &id).await
    }

    /// Sales newest first.
    pub async fn list(&self, organization_id: &str, page: PageRequest) -> DbResult<Page<Sale>> {
        let page = page.normalized();

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE organization_id = ?")
            .bind(organization_id)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE organization_id = ? \
             ORDER BY created_at DESC, id LIMIT ? OFFSET ?"
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(organization_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(sales, total, &page))
    }

    /// Every sale made to one client.
    pub async fn list_for_client(&self, organization_id: &str, client_id: &str) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE organization_id = ? AND client_id = ? \
             ORDER BY created_at DESC, id"
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(organization_id)
            .bind(client_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(sales)
    }

    pub async fn get(&self, organization_id: &str, id: &str) -> DbResult<Sale> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ? AND organization_id = ?");
        sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Database;
    use crate::repository::motorcycle::tests::{catalog_fixture, moto_input};
    use crate::repository::promotion::tests::{promo, CREDIT, GALICIA, VISA};
    use crate::repository::test_support::setup;
    use moto_core::{ClientInput, Motorcycle, PromotionInput, ReservationInput};

    async fn fixture() -> (Database, String, Motorcycle, String) {
        let (db, org) = setup().await;
        let (brand, model) = catalog_fixture(&db, &org).await;
        let moto = db
            .motorcycles()
            .insert(&org.id, moto_input(&brand, &model, "AAA111", 1_000_000))
            .await
            .unwrap();
        let client = new_client(&db, &org.id, "Ana").await;
        (db, org.id, moto, client)
    }

    async fn new_client(db: &Database, org: &str, name: &str) -> String {
        db.clients()
            .insert(
                org,
                ClientInput {
                    first_name: name.into(),
                    last_name: "Gómez".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .id
    }

    fn sale(client_id: &str) -> SaleInput {
        SaleInput {
            client_id: client_id.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_plain_sale() {
        let (db, org, moto, client) = fixture().await;

        let input = SaleInput {
            discount_cents: 50_000,
            ..sale(&client)
        };
        let recorded = db.sales().record_sale(&org, &moto.id, None, input).await.unwrap();
        assert_eq!(recorded.list_price_cents, 1_000_000);
        assert_eq!(recorded.discount_cents, 50_000);
        assert_eq!(recorded.total_cents, 950_000);

        let moto = db.motorcycles().get(&org, &moto.id).await.unwrap();
        assert_eq!(moto.state, MotorcycleState::Sold);
        assert_eq!(moto.client_id.as_deref(), Some(client.as_str()));
    }

    #[tokio::test]
    async fn test_sale_with_promotion() {
        let (db, org, moto, client) = fixture().await;
        let promotion = db
            .promotions()
            .insert(
                &org,
                PromotionInput {
                    bank_id: Some(GALICIA.into()),
                    surcharge_bps: 500,
                    ..promo("Galicia 20%", 2000)
                },
            )
            .await
            .unwrap();

        let input = SaleInput {
            payment_method_id: Some(CREDIT.into()),
            bank_id: Some(GALICIA.into()),
            card_type_id: Some(VISA.into()),
            promotion_id: Some(promotion.id.clone()),
            installments: 6,
            ..sale(&client)
        };
        let recorded = db.sales().record_sale(&org, &moto.id, None, input).await.unwrap();

        assert_eq!(recorded.discount_cents, 200_000);
        assert_eq!(recorded.surcharge_cents, 50_000);
        assert_eq!(recorded.total_cents, 850_000);
        assert_eq!(recorded.installments, 6);
    }

    #[tokio::test]
    async fn test_mismatched_promotion_rolls_back() {
        let (db, org, moto, client) = fixture().await;
        let promotion = db
            .promotions()
            .insert(
                &org,
                PromotionInput {
                    bank_id: Some(GALICIA.into()),
                    ..promo("Solo Galicia", 1000)
                },
            )
            .await
            .unwrap();

        let input = SaleInput {
            payment_method_id: Some(CREDIT.into()),
            promotion_id: Some(promotion.id),
            ..sale(&client)
        };
        let err = db.sales().record_sale(&org, &moto.id, None, input).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::PromotionNotApplicable { .. })));

        let moto = db.motorcycles().get(&org, &moto.id).await.unwrap();
        assert_eq!(moto.state, MotorcycleState::InStock);
        assert_eq!(db.sales().list(&org, PageRequest::default()).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_reserved_unit_sells_only_to_holder() {
        let (db, org, moto, client) = fixture().await;
        let other = new_client(&db, &org, "Bruno").await;

        let reservation = db
            .reservations()
            .create(
                &org,
                &moto.id,
                ReservationInput {
                    client_id: client.clone(),
                    amount_cents: 100_000,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = db
            .sales()
            .record_sale(&org, &moto.id, None, sale(&other))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::MotorcycleUnavailable { .. })));

        db.sales().record_sale(&org, &moto.id, None, sale(&client)).await.unwrap();
        let reservation = db.reservations().get(&org, &reservation.id).await.unwrap();
        assert_eq!(reservation.status, ReservationStatus::Completed);
    }

    #[tokio::test]
    async fn test_cannot_sell_twice() {
        let (db, org, moto, client) = fixture().await;

        db.sales().record_sale(&org, &moto.id, None, sale(&client)).await.unwrap();
        let err = db
            .sales()
            .record_sale(&org, &moto.id, None, sale(&client))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidStateTransition { .. })));

        let sales = db.sales().list(&org, PageRequest::default()).await.unwrap();
        assert_eq!(sales.total, 1);
        assert_eq!(db.sales().list_for_client(&org, &client).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_discount_never_goes_negative() {
        let (db, org, moto, client) = fixture().await;

        let input = SaleInput {
            discount_cents: 5_000_000,
            ..sale(&client)
        };
        let recorded = db.sales().record_sale(&org, &moto.id, None, input).await.unwrap();
        assert_eq!(recorded.total_cents, 0);
        assert_eq!(recorded.discount_cents, 1_000_000);
    }

    #[tokio::test]
    async fn test_oversized_discount_keeps_price_breakdown() {
        let (db, org, moto, client) = fixture().await;
        let promotion = db
            .promotions()
            .insert(
                &org,
                PromotionInput {
                    surcharge_bps: 500,
                    ..promo("Crédito 20%", 2000)
                },
            )
            .await
            .unwrap();

        let input = SaleInput {
            payment_method_id: Some(CREDIT.into()),
            promotion_id: Some(promotion.id),
            discount_cents: 5_000_000,
            ..sale(&client)
        };
        let recorded = db.sales().record_sale(&org, &moto.id, None, input).await.unwrap();

        assert_eq!(recorded.surcharge_cents, 50_000);
        assert_eq!(recorded.total_cents, 0);
        assert_eq!(recorded.discount_cents, 1_050_000);
        assert_eq!(
            recorded.list_price_cents - recorded.discount_cents + recorded.surcharge_cents,
            recorded.total_cents
        );
    }
}
