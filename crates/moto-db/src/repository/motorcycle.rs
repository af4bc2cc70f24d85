//! # Motorcycle Repository
//!
//! Inventory units and their state transitions.
//!
//! ## Transitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  set_state            InStock ⇄ Paused, InStock ⇄ Processing,          │
//! │                       Reserved → InStock (cancels the reservation),     │
//! │                       Sold → InStock (cancelled sale), Sold → Delivered │
//! │  ReservationRepository::create      InStock → Reserved                 │
//! │  SaleRepository::record_sale        InStock | Reserved | Processing    │
//! │                                       → Sold                           │
//! │                                                                         │
//! │  Every write is a compare-and-swap on the state read in the same       │
//! │  transaction, so two sellers can't both reserve the same unit.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Datelike, Utc};
use moto_core::listing::{
    fold_search_text, MotorcycleFilter, MotorcycleSortKey, Page, PageRequest, SortSpec,
};
use moto_core::{
    CoreError, Motorcycle, MotorcycleInput, MotorcycleState, ValidationError,
};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::{like_pattern, new_id, stale_write_error};
use crate::error::{DbError, DbResult};

pub(crate) const MOTORCYCLE_COLUMNS: &str = "id, organization_id, brand_id, model_id, color_id, branch_id, \
     year, chassis_number, engine_number, license_plate, mileage_km, currency, retail_price_cents, \
     cost_price_cents, state, client_id, notes, created_at, updated_at, version";

#[derive(Debug, Clone)]
pub struct MotorcycleRepository {
    pool: SqlitePool,
}

impl MotorcycleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MotorcycleRepository { pool }
    }

    /// Lists units matching `filter`, sorted and paged.
    pub async fn list(
        &self,
        organization_id: &str,
        filter: &MotorcycleFilter,
        sort: SortSpec<MotorcycleSortKey>,
        page: PageRequest,
    ) -> DbResult<Page<Motorcycle>> {
        let filter = filter.clone().normalized()?;
        let page = page.normalized();

        debug!(
            organization_id = %organization_id,
            state = ?filter.state,
            search = ?filter.search,
            "Listing motorcycles"
        );

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM motorcycles");
        push_filters(&mut count, organization_id, &filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select =
            QueryBuilder::<Sqlite>::new(format!("SELECT {MOTORCYCLE_COLUMNS} FROM motorcycles"));
        push_filters(&mut select, organization_id, &filter);
        select
            .push(" ORDER BY ")
            .push(sort.order_by())
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items: Vec<Motorcycle> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok(Page::new(items, total, &page))
    }

    pub async fn get_by_id(&self, organization_id: &str, id: &str) -> DbResult<Option<Motorcycle>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, organization_id, id).await
    }

    pub async fn get(&self, organization_id: &str, id: &str) -> DbResult<Motorcycle> {
        self.get_by_id(organization_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Motorcycle", id))
    }

    /// Adds a unit to stock.
    ///
    /// The model must belong to the brand; color and branch must belong to
    /// the organization.
    pub async fn insert(&self, organization_id: &str, input: MotorcycleInput) -> DbResult<Motorcycle> {
        let input = input.normalized();
        input.validate(Utc::now().year())?;
        let search_text = self.check_references(organization_id, &input).await?;

        let now = Utc::now();
        let id = new_id();

        sqlx::query(
            r#"
            INSERT INTO motorcycles (
                id, organization_id, brand_id, model_id, color_id, branch_id,
                year, chassis_number, engine_number, license_plate, mileage_km,
                currency, retail_price_cents, cost_price_cents, state, client_id,
                notes, search_text, created_at, updated_at, version
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?, ?, ?, 1)
            "#,
        )
        .bind(&id)
        .bind(organization_id)
        .bind(&input.brand_id)
        .bind(&input.model_id)
        .bind(&input.color_id)
        .bind(&input.branch_id)
        .bind(input.year)
        .bind(&input.chassis_number)
        .bind(&input.engine_number)
        .bind(&input.license_plate)
        .bind(input.mileage_km)
        .bind(input.currency)
        .bind(input.retail_price_cents)
        .bind(input.cost_price_cents)
        .bind(MotorcycleState::InStock)
        .bind(&input.notes)
        .bind(search_text)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(duplicate_chassis)?;

        info!(motorcycle_id = %id, chassis = %input.chassis_number, "Motorcycle added to stock");
        self.get(organization_id, &id).await
    }

    /// Replaces the editable fields. State and client are untouched.
    pub async fn update(
        &self,
        organization_id: &str,
        id: &str,
        input: MotorcycleInput,
        expected_version: Option<i64>,
    ) -> DbResult<Motorcycle> {
        let input = input.normalized();
        input.validate(Utc::now().year())?;
        let search_text = self.check_references(organization_id, &input).await?;

        let result = sqlx::query(
            r#"
            UPDATE motorcycles SET
                brand_id = ?, model_id = ?, color_id = ?, branch_id = ?, year = ?,
                chassis_number = ?, engine_number = ?, license_plate = ?, mileage_km = ?,
                currency = ?, retail_price_cents = ?, cost_price_cents = ?, notes = ?,
                search_text = ?, updated_at = ?, version = version + 1
            WHERE id = ? AND organization_id = ? AND (? IS NULL OR version = ?)
            "#,
        )
        .bind(&input.brand_id)
        .bind(&input.model_id)
        .bind(&input.color_id)
        .bind(&input.branch_id)
        .bind(input.year)
        .bind(&input.chassis_number)
        .bind(&input.engine_number)
        .bind(&input.license_plate)
        .bind(input.mileage_km)
        .bind(input.currency)
        .bind(input.retail_price_cents)
        .bind(input.cost_price_cents)
        .bind(&input.notes)
        .bind(search_text)
        .bind(Utc::now())
        .bind(id)
        .bind(organization_id)
        .bind(expected_version)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(duplicate_chassis)?;

        if result.rows_affected() == 0 {
            return Err(stale_write_error(
                &self.pool,
                "motorcycles",
                "Motorcycle",
                organization_id,
                id,
                expected_version,
            )
            .await);
        }

        info!(motorcycle_id = %id, "Motorcycle updated");
        self.get(organization_id, id).await
    }

    /// Moves a unit along the state machine.
    ///
    /// Reserving and selling need a client and go through
    /// [`ReservationRepository`](super::ReservationRepository) and
    /// [`SaleRepository`](super::SaleRepository) instead. Leaving `Reserved`
    /// cancels the active reservation; returning to `InStock` clears the client.
    pub async fn set_state(
        &self,
        organization_id: &str,
        id: &str,
        to: MotorcycleState,
    ) -> DbResult<Motorcycle> {
        if matches!(to, MotorcycleState::Reserved | MotorcycleState::Sold) {
            return Err(ValidationError::NotAllowed {
                field: "state".to_string(),
                allowed: ["in_stock", "paused", "processing", "delivered"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }
            .into());
        }

        let mut tx = self.pool.begin().await?;

        let moto = fetch(&mut tx, organization_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Motorcycle", id))?;
        MotorcycleState::transition(moto.state, to)?;

        let client_id = if to == MotorcycleState::InStock {
            None
        } else {
            moto.client_id.as_deref()
        };
        write_state(&mut tx, &moto, to, client_id).await?;

        if moto.state == MotorcycleState::Reserved {
            sqlx::query(
                r#"
                UPDATE reservations SET status = 'cancelled', updated_at = ?
                WHERE motorcycle_id = ? AND organization_id = ? AND status = 'active'
                "#,
            )
            .bind(Utc::now())
            .bind(id)
            .bind(organization_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(motorcycle_id = %id, from = %moto.state, to = %to, "Motorcycle state changed");
        self.get(organization_id, id).await
    }

    /// Deletes a unit. Only units in stock can be deleted.
    pub async fn delete(&self, organization_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "DELETE FROM motorcycles WHERE id = ? AND organization_id = ? AND state = 'in_stock'",
        )
        .bind(id)
        .bind(organization_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let moto = self.get(organization_id, id).await?;
            return Err(CoreError::MotorcycleUnavailable {
                id: moto.id,
                state: moto.state,
            }
            .into());
        }

        info!(motorcycle_id = %id, "Motorcycle deleted");
        Ok(())
    }

    /// Unit count per state, every state included, in display order.
    pub async fn state_summary(&self, organization_id: &str) -> DbResult<Vec<(MotorcycleState, i64)>> {
        let rows: Vec<(MotorcycleState, i64)> = sqlx::query_as(
            "SELECT state, COUNT(*) FROM motorcycles WHERE organization_id = ? GROUP BY state",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(MotorcycleState::ALL
            .iter()
            .map(|state| {
                let count = rows
                    .iter()
                    .find(|(s, _)| s == state)
                    .map_or(0, |(_, count)| *count);
                (*state, count)
            })
            .collect())
    }

    /// Checks cross-row references and returns the folded search text.
    async fn check_references(&self, organization_id: &str, input: &MotorcycleInput) -> DbResult<String> {
        let names: Option<(String, String)> = sqlx::query_as(
            r#"
            SELECT b.name, m.name
            FROM models m
            INNER JOIN brands b ON b.id = m.brand_id
            WHERE m.id = ? AND b.id = ?
            "#,
        )
        .bind(&input.model_id)
        .bind(&input.brand_id)
        .fetch_optional(&self.pool)
        .await?;

        let (brand_name, model_name) = names.ok_or_else(|| {
            ValidationError::invalid_format("model_id", "model does not belong to the brand")
        })?;

        for (field, table, value) in [
            ("color_id", "colors", &input.color_id),
            ("branch_id", "branches", &input.branch_id),
        ] {
            if let Some(value) = value {
                let sql = format!("SELECT COUNT(*) FROM {table} WHERE id = ? AND organization_id = ?");
                let found: i64 = sqlx::query_scalar(&sql)
                    .bind(value)
                    .bind(organization_id)
                    .fetch_one(&self.pool)
                    .await?;
                if found == 0 {
                    return Err(DbError::not_found(field, value.clone()));
                }
            }
        }

        let parts = [
            Some(brand_name.as_str()),
            Some(model_name.as_str()),
            Some(input.chassis_number.as_str()),
            input.engine_number.as_deref(),
            input.license_plate.as_deref(),
        ];
        let joined: Vec<&str> = parts.into_iter().flatten().collect();
        Ok(format!("{} {}", fold_search_text(&joined.join(" ")), input.year))
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Reads a unit on an existing connection (usually a transaction).
pub(crate) async fn fetch(
    conn: &mut SqliteConnection,
    organization_id: &str,
    id: &str,
) -> DbResult<Option<Motorcycle>> {
    let sql = format!("SELECT {MOTORCYCLE_COLUMNS} FROM motorcycles WHERE id = ? AND organization_id = ?");
    let moto = sqlx::query_as::<_, Motorcycle>(&sql)
        .bind(id)
        .bind(organization_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(moto)
}

/// Writes a new state, swapping only if the row still has the state and
/// version that `moto` was read with.
pub(crate) async fn write_state(
    conn: &mut SqliteConnection,
    moto: &Motorcycle,
    to: MotorcycleState,
    client_id: Option<&str>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE motorcycles SET state = ?, client_id = ?, updated_at = ?, version = version + 1
        WHERE id = ? AND organization_id = ? AND state = ? AND version = ?
        "#,
    )
    .bind(to)
    .bind(client_id)
    .bind(Utc::now())
    .bind(&moto.id)
    .bind(&moto.organization_id)
    .bind(moto.state)
    .bind(moto.version)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let actual: Option<i64> =
            sqlx::query_scalar("SELECT version FROM motorcycles WHERE id = ? AND organization_id = ?")
                .bind(&moto.id)
                .bind(&moto.organization_id)
                .fetch_optional(&mut *conn)
                .await?;
        return Err(match actual {
            Some(actual) => CoreError::VersionConflict {
                entity: "Motorcycle",
                id: moto.id.clone(),
                expected: moto.version,
                actual,
            }
            .into(),
            None => DbError::not_found("Motorcycle", moto.id.clone()),
        });
    }

    Ok(())
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, organization_id: &str, filter: &MotorcycleFilter) {
    qb.push(" WHERE organization_id = ")
        .push_bind(organization_id.to_string());

    if let Some(state) = filter.state {
        qb.push(" AND state = ").push_bind(state);
    }
    if let Some(brand_id) = &filter.brand_id {
        qb.push(" AND brand_id = ").push_bind(brand_id.clone());
    }
    if let Some(model_id) = &filter.model_id {
        qb.push(" AND model_id = ").push_bind(model_id.clone());
    }
    if let Some(branch_id) = &filter.branch_id {
        qb.push(" AND branch_id = ").push_bind(branch_id.clone());
    }
    if let Some(year_min) = filter.year_min {
        qb.push(" AND year >= ").push_bind(year_min);
    }
    if let Some(year_max) = filter.year_max {
        qb.push(" AND year <= ").push_bind(year_max);
    }
    if let Some(price_min) = filter.price_min {
        qb.push(" AND retail_price_cents >= ").push_bind(price_min);
    }
    if let Some(price_max) = filter.price_max {
        qb.push(" AND retail_price_cents <= ").push_bind(price_max);
    }
    if let Some(search) = &filter.search {
        for term in search.split_whitespace() {
            qb.push(" AND search_text LIKE ")
                .push_bind(like_pattern(term))
                .push(" ESCAPE '\\'");
        }
    }
}

fn duplicate_chassis(err: sqlx::Error) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("chassis_number"),
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pool::Database;
    use crate::repository::test_support::setup;
    use moto_core::listing::SortDirection;
    use moto_core::{BrandInput, Currency, ModelInput, Organization};

    /// Brand + model associated to `org`, returned as `(brand_id, model_id)`.
    pub(crate) async fn catalog_fixture(db: &Database, org: &Organization) -> (String, String) {
        let brand = db
            .catalog()
            .create_brand(
                &org.id,
                BrandInput {
                    name: "Honda".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let model = db
            .catalog()
            .create_model(
                &org.id,
                &brand.brand_id,
                ModelInput {
                    name: "CB 190R".into(),
                    year: Some(2024),
                    displacement_cc: Some(184),
                },
            )
            .await
            .unwrap();
        (brand.brand_id, model.model_id)
    }

    pub(crate) fn moto_input(brand_id: &str, model_id: &str, chassis: &str, price: i64) -> MotorcycleInput {
        MotorcycleInput {
            brand_id: brand_id.to_string(),
            model_id: model_id.to_string(),
            year: 2024,
            chassis_number: chassis.to_string(),
            currency: Currency::Ars,
            retail_price_cents: price,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_normalizes_and_starts_in_stock() {
        let (db, org) = setup().await;
        let (brand, model) = catalog_fixture(&db, &org).await;

        let moto = db
            .motorcycles()
            .insert(&org.id, moto_input(&brand, &model, " 9c2kc1670pr000123 ", 3_500_000_00))
            .await
            .unwrap();

        assert_eq!(moto.chassis_number, "9C2KC1670PR000123");
        assert_eq!(moto.state, MotorcycleState::InStock);
        assert_eq!(moto.version, 1);
        assert!(moto.client_id.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_chassis_rejected() {
        let (db, org) = setup().await;
        let (brand, model) = catalog_fixture(&db, &org).await;
        let repo = db.motorcycles();

        repo.insert(&org.id, moto_input(&brand, &model, "CHASSIS001", 100)).await.unwrap();
        let err = repo
            .insert(&org.id, moto_input(&brand, &model, "chassis001", 100))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field } if field == "chassis_number"));
    }

    #[tokio::test]
    async fn test_model_must_belong_to_brand() {
        let (db, org) = setup().await;
        let (_, model) = catalog_fixture(&db, &org).await;
        let other = db
            .catalog()
            .create_brand(
                &org.id,
                BrandInput {
                    name: "Yamaha".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = db
            .motorcycles()
            .insert(&org.id, moto_input(&other.brand_id, &model, "CHASSIS001", 100))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let (db, org) = setup().await;
        let (brand, model) = catalog_fixture(&db, &org).await;
        let repo = db.motorcycles();

        repo.insert(&org.id, moto_input(&brand, &model, "AAA111", 300)).await.unwrap();
        repo.insert(&org.id, moto_input(&brand, &model, "BBB222", 100)).await.unwrap();
        let paused = repo.insert(&org.id, moto_input(&brand, &model, "CCC333", 200)).await.unwrap();
        repo.set_state(&org.id, &paused.id, MotorcycleState::Paused).await.unwrap();

        let sort = SortSpec::new(MotorcycleSortKey::Price, SortDirection::Asc);
        let all = repo
            .list(&org.id, &MotorcycleFilter::default(), sort, PageRequest::default())
            .await
            .unwrap();
        let prices: Vec<i64> = all.items.iter().map(|m| m.retail_price_cents).collect();
        assert_eq!(prices, vec![100, 200, 300]);

        let in_stock = MotorcycleFilter {
            state: Some(MotorcycleState::InStock),
            price_min: Some(150),
            ..Default::default()
        };
        let page = repo.list(&org.id, &in_stock, sort, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].chassis_number, "AAA111");

        let by_model_name = MotorcycleFilter {
            search: Some("honda cb".into()),
            ..Default::default()
        };
        let page = repo.list(&org.id, &by_model_name, sort, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn test_set_state_follows_state_machine() {
        let (db, org) = setup().await;
        let (brand, model) = catalog_fixture(&db, &org).await;
        let repo = db.motorcycles();

        let moto = repo.insert(&org.id, moto_input(&brand, &model, "AAA111", 100)).await.unwrap();

        let paused = repo.set_state(&org.id, &moto.id, MotorcycleState::Paused).await.unwrap();
        assert_eq!(paused.state, MotorcycleState::Paused);
        assert_eq!(paused.version, 2);

        let err = repo
            .set_state(&org.id, &moto.id, MotorcycleState::Processing)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidStateTransition { .. })));

        let err = repo
            .set_state(&org.id, &moto.id, MotorcycleState::Sold)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (db, org) = setup().await;
        let (brand, model) = catalog_fixture(&db, &org).await;
        let repo = db.motorcycles();

        let moto = repo.insert(&org.id, moto_input(&brand, &model, "AAA111", 100)).await.unwrap();
        let updated = repo
            .update(&org.id, &moto.id, moto_input(&brand, &model, "AAA111", 150), Some(1))
            .await
            .unwrap();
        assert_eq!(updated.retail_price_cents, 150);

        let stale = repo
            .update(&org.id, &moto.id, moto_input(&brand, &model, "AAA111", 175), Some(1))
            .await
            .unwrap_err();
        assert!(matches!(stale, DbError::Domain(CoreError::VersionConflict { .. })));

        repo.set_state(&org.id, &moto.id, MotorcycleState::Paused).await.unwrap();
        let err = repo.delete(&org.id, &moto.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::MotorcycleUnavailable { .. })));

        repo.set_state(&org.id, &moto.id, MotorcycleState::InStock).await.unwrap();
        repo.delete(&org.id, &moto.id).await.unwrap();
        assert!(repo.get_by_id(&org.id, &moto.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_state_summary_includes_every_state() {
        let (db, org) = setup().await;
        let (brand, model) = catalog_fixture(&db, &org).await;
        let repo = db.motorcycles();

        repo.insert(&org.id, moto_input(&brand, &model, "AAA111", 100)).await.unwrap();
        repo.insert(&org.id, moto_input(&brand, &model, "BBB222", 100)).await.unwrap();

        let summary = repo.state_summary(&org.id).await.unwrap();
        assert_eq!(summary.len(), MotorcycleState::ALL.len());
        assert_eq!(summary[0], (MotorcycleState::InStock, 2));
        assert!(summary[1..].iter().all(|(_, count)| *count == 0));
    }
}
