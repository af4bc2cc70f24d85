//! # Reservation Repository
//!
//! Deposits holding a unit for a client.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create   ── tx ──►  motorcycle InStock → Reserved (client_id set)     │
//! │                      reservation Active                                │
//! │                                                                         │
//! │  cancel   ── tx ──►  reservation Cancelled                             │
//! │                      motorcycle Reserved → InStock (client cleared)    │
//! │                                                                         │
//! │  expire   ── tx ──►  every Active past expires_at → Expired,           │
//! │                      its motorcycle released like cancel               │
//! │                                                                         │
//! │  SaleRepository::record_sale completes the Active reservation          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use moto_core::{
    CoreError, MotorcycleState, Reservation, ReservationInput, ReservationStatus, ValidationError,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

use super::motorcycle::{fetch as fetch_motorcycle, write_state};
use super::new_id;
use crate::error::{DbError, DbResult};

const RESERVATION_COLUMNS: &str = "id, organization_id, motorcycle_id, client_id, amount_cents, \
     payment_method_id, status, notes, expires_at, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct ReservationRepository {
    pool: SqlitePool,
}

impl ReservationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReservationRepository { pool }
    }

    /// Reserves an in-stock unit for a client.
    pub async fn create(
        &self,
        organization_id: &str,
        motorcycle_id: &str,
        input: ReservationInput,
    ) -> DbResult<Reservation> {
        let now = Utc::now();
        input.validate(now)?;

        let mut tx = self.pool.begin().await?;

        let moto = fetch_motorcycle(&mut tx, organization_id, motorcycle_id)
            .await?
            .ok_or_else(|| DbError::not_found("Motorcycle", motorcycle_id))?;
        if !moto.is_available() {
            return Err(CoreError::MotorcycleUnavailable {
                id: moto.id,
                state: moto.state,
            }
            .into());
        }
        ensure_client(&mut tx, organization_id, &input.client_id).await?;

        write_state(&mut tx, &moto, MotorcycleState::Reserved, Some(&input.client_id)).await?;

        let id = new_id();
        sqlx::query(
            r#"
            INSERT INTO reservations (
                id, organization_id, motorcycle_id, client_id, amount_cents,
                payment_method_id, status, notes, expires_at, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(organization_id)
        .bind(motorcycle_id)
        .bind(&input.client_id)
        .bind(input.amount_cents)
        .bind(&input.payment_method_id)
        .bind(ReservationStatus::Active)
        .bind(&input.notes)
        .bind(input.expires_at)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            reservation_id = %id,
            motorcycle_id = %motorcycle_id,
            client_id = %input.client_id,
            "Motorcycle reserved"
        );
        self.get(organization_id, &id).await
    }

    /// Reservations newest first, optionally narrowed to one status.
    pub async fn list(
        &self,
        organization_id: &str,
        status: Option<ReservationStatus>,
    ) -> DbResult<Vec<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations \
             WHERE organization_id = ? AND (? IS NULL OR status = ?) \
             ORDER BY created_at DESC, id"
        );
        let reservations = sqlx::query_as::<_, Reservation>(&sql)
            .bind(organization_id)
            .bind(status)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(reservations)
    }

    pub async fn get(&self, organization_id: &str, id: &str) -> DbResult<Reservation> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, organization_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Reservation", id))
    }

    /// Cancels an active reservation and puts the unit back in stock.
    pub async fn cancel(&self, organization_id: &str, id: &str) -> DbResult<Reservation> {
        let mut tx = self.pool.begin().await?;

        let reservation = fetch(&mut tx, organization_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Reservation", id))?;
        if reservation.status != ReservationStatus::Active {
            return Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec!["active".to_string()],
            }
            .into());
        }

        close(&mut tx, &reservation, ReservationStatus::Cancelled).await?;
        tx.commit().await?;

        info!(reservation_id = %id, "Reservation cancelled");
        self.get(organization_id, id).await
    }

    /// Expires the organization's overdue reservations and releases their units.
    pub async fn expire_due(&self, organization_id: &str, now: DateTime<Utc>) -> DbResult<Vec<Reservation>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations \
             WHERE organization_id = ? AND status = 'active' AND expires_at IS NOT NULL"
        );
        let candidates = sqlx::query_as::<_, Reservation>(&sql)
            .bind(organization_id)
            .fetch_all(&mut *tx)
            .await?;

        let mut expired = Vec::new();
        for reservation in candidates.into_iter().filter(|r| r.is_expired(now)) {
            close(&mut tx, &reservation, ReservationStatus::Expired).await?;
            expired.push(Reservation {
                status: ReservationStatus::Expired,
                updated_at: now,
                ..reservation
            });
        }

        tx.commit().await?;

        if !expired.is_empty() {
            info!(organization_id = %organization_id, count = expired.len(), "Reservations expired");
        }
        Ok(expired)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

pub(crate) async fn fetch(
    conn: &mut SqliteConnection,
    organization_id: &str,
    id: &str,
) -> DbResult<Option<Reservation>> {
    let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = ? AND organization_id = ?");
    let reservation = sqlx::query_as::<_, Reservation>(&sql)
        .bind(id)
        .bind(organization_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(reservation)
}

/// The active reservation holding a unit, if any.
pub(crate) async fn active_for_motorcycle(
    conn: &mut SqliteConnection,
    organization_id: &str,
    motorcycle_id: &str,
) -> DbResult<Option<Reservation>> {
    let sql = format!(
        "SELECT {RESERVATION_COLUMNS} FROM reservations \
         WHERE organization_id = ? AND motorcycle_id = ? AND status = 'active' \
         ORDER BY created_at DESC LIMIT 1"
    );
    let reservation = sqlx::query_as::<_, Reservation>(&sql)
        .bind(organization_id)
        .bind(motorcycle_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(reservation)
}

pub(crate) async fn set_status(
    conn: &mut SqliteConnection,
    reservation: &Reservation,
    status: ReservationStatus,
) -> DbResult<()> {
    sqlx::query("UPDATE reservations SET status = ?, updated_at = ? WHERE id = ? AND organization_id = ?")
        .bind(status)
        .bind(Utc::now())
        .bind(&reservation.id)
        .bind(&reservation.organization_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Ends a reservation and releases its unit when it still holds it.
async fn close(
    conn: &mut SqliteConnection,
    reservation: &Reservation,
    status: ReservationStatus,
) -> DbResult<()> {
    set_status(conn, reservation, status).await?;

    let moto = fetch_motorcycle(conn, &reservation.organization_id, &reservation.motorcycle_id).await?;
    match moto {
        Some(moto)
            if moto.state == MotorcycleState::Reserved
                && moto.client_id.as_deref() == Some(reservation.client_id.as_str()) =>
        {
            write_state(conn, &moto, MotorcycleState::InStock, None).await?;
        }
        _ => {
            warn!(
                reservation_id = %reservation.id,
                motorcycle_id = %reservation.motorcycle_id,
                "Reservation closed without holding its motorcycle"
            );
        }
    }
    Ok(())
}

pub(crate) async fn ensure_client(
    conn: &mut SqliteConnection,
    organization_id: &str,
    client_id: &str,
) -> DbResult<()> {
    let found: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients WHERE id = ? AND organization_id = ?")
        .bind(client_id)
        .bind(organization_id)
        .fetch_one(&mut *conn)
        .await?;
    if found == 0 {
        return Err(DbError::not_found("Client", client_id));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::motorcycle::tests::{catalog_fixture, moto_input};
    use crate::repository::test_support::setup;
    use chrono::Duration;
    use moto_core::{Client, ClientInput, Motorcycle};

    async fn fixture() -> (crate::pool::Database, String, Motorcycle, Client) {
        let (db, org) = setup().await;
        let (brand, model) = catalog_fixture(&db, &org).await;
        let moto = db
            .motorcycles()
            .insert(&org.id, moto_input(&brand, &model, "AAA111", 100_000))
            .await
            .unwrap();
        let client = db
            .clients()
            .insert(
                &org.id,
                ClientInput {
                    first_name: "Ana".into(),
                    last_name: "Gómez".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        (db, org.id, moto, client)
    }

    fn deposit(client_id: &str) -> ReservationInput {
        ReservationInput {
            client_id: client_id.to_string(),
            amount_cents: 10_000,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_reserves_motorcycle() {
        let (db, org, moto, client) = fixture().await;

        let reservation = db
            .reservations()
            .create(&org, &moto.id, deposit(&client.id))
            .await
            .unwrap();
        assert_eq!(reservation.status, ReservationStatus::Active);

        let moto = db.motorcycles().get(&org, &moto.id).await.unwrap();
        assert_eq!(moto.state, MotorcycleState::Reserved);
        assert_eq!(moto.client_id.as_deref(), Some(client.id.as_str()));
    }

    #[tokio::test]
    async fn test_cannot_reserve_twice() {
        let (db, org, moto, client) = fixture().await;
        let repo = db.reservations();

        repo.create(&org, &moto.id, deposit(&client.id)).await.unwrap();
        let err = repo.create(&org, &moto.id, deposit(&client.id)).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::MotorcycleUnavailable { state: MotorcycleState::Reserved, .. })
        ));
        assert_eq!(repo.list(&org, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_client_rolls_back() {
        let (db, org, moto, _) = fixture().await;

        let err = db
            .reservations()
            .create(&org, &moto.id, deposit("550e8400-e29b-41d4-a716-446655440000"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let moto = db.motorcycles().get(&org, &moto.id).await.unwrap();
        assert_eq!(moto.state, MotorcycleState::InStock);
    }

    #[tokio::test]
    async fn test_cancel_releases_motorcycle() {
        let (db, org, moto, client) = fixture().await;
        let repo = db.reservations();

        let reservation = repo.create(&org, &moto.id, deposit(&client.id)).await.unwrap();
        let cancelled = repo.cancel(&org, &reservation.id).await.unwrap();
        assert_eq!(cancelled.status, ReservationStatus::Cancelled);

        let moto = db.motorcycles().get(&org, &moto.id).await.unwrap();
        assert_eq!(moto.state, MotorcycleState::InStock);
        assert!(moto.client_id.is_none());

        let err = repo.cancel(&org, &reservation.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_expire_due() {
        let (db, org, moto, client) = fixture().await;
        let repo = db.reservations();

        let input = ReservationInput {
            expires_at: Some(Utc::now() + Duration::hours(1)),
            ..deposit(&client.id)
        };
        let reservation = repo.create(&org, &moto.id, input).await.unwrap();

        assert!(repo.expire_due(&org, Utc::now()).await.unwrap().is_empty());

        let later = Utc::now() + Duration::hours(2);
        let expired = repo.expire_due(&org, later).await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, reservation.id);

        let stored = repo.get(&org, &reservation.id).await.unwrap();
        assert_eq!(stored.status, ReservationStatus::Expired);
        let moto = db.motorcycles().get(&org, &moto.id).await.unwrap();
        assert_eq!(moto.state, MotorcycleState::InStock);

        let active = repo.list(&org, Some(ReservationStatus::Active)).await.unwrap();
        assert!(active.is_empty());
    }

    #[tokio::test]
    async fn test_manual_release_cancels_reservation() {
        let (db, org, moto, client) = fixture().await;

        let reservation = db
            .reservations()
            .create(&org, &moto.id, deposit(&client.id))
            .await
            .unwrap();
        db.motorcycles()
            .set_state(&org, &moto.id, MotorcycleState::InStock)
            .await
            .unwrap();

        let stored = db.reservations().get(&org, &reservation.id).await.unwrap();
        assert_eq!(stored.status, ReservationStatus::Cancelled);
    }
}
