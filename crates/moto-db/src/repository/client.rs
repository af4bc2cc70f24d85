//! # Client Repository
//!
//! Customers of an organization: filtered, sorted and paged listings plus
//! versioned updates.
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert/update                                                         │
//! │    "José Pérez" + email + document ──fold──► search_text               │
//! │                                              "jose perez jp@x.com ..." │
//! │  list                                                                  │
//! │    ?search=PEREZ jo ──fold──► "perez jo"                               │
//! │       ──► search_text LIKE '%perez%' AND search_text LIKE '%jo%'       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use moto_core::listing::{fold_search_text, ClientFilter, ClientSortKey, Page, PageRequest, SortSpec};
use moto_core::{Client, ClientInput};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use super::{like_pattern, new_id, stale_write_error};
use crate::error::{DbError, DbResult};

const CLIENT_COLUMNS: &str = "id, organization_id, first_name, last_name, email, phone, \
     document_type, document_number, address, city, status, notes, created_at, updated_at, version";

#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Lists clients matching `filter`, sorted and paged.
    pub async fn list(
        &self,
        organization_id: &str,
        filter: &ClientFilter,
        sort: SortSpec<ClientSortKey>,
        page: PageRequest,
    ) -> DbResult<Page<Client>> {
        let filter = filter.clone().normalized()?;
        let page = page.normalized();

        debug!(
            organization_id = %organization_id,
            search = ?filter.search,
            page = page.page,
            "Listing clients"
        );

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM clients");
        push_filters(&mut count, organization_id, &filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {CLIENT_COLUMNS} FROM clients"));
        push_filters(&mut select, organization_id, &filter);
        select
            .push(" ORDER BY ")
            .push(sort.order_by())
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items: Vec<Client> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok(Page::new(items, total, &page))
    }

    pub async fn get_by_id(&self, organization_id: &str, id: &str) -> DbResult<Option<Client>> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ? AND organization_id = ?");
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(client)
    }

    /// Like [`get_by_id`](Self::get_by_id) but a missing client is an error.
    pub async fn get(&self, organization_id: &str, id: &str) -> DbResult<Client> {
        self.get_by_id(organization_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Client", id))
    }

    pub async fn insert(&self, organization_id: &str, input: ClientInput) -> DbResult<Client> {
        let input = input.normalized();
        input.validate()?;

        let now = Utc::now();
        let id = new_id();

        sqlx::query(
            r#"
            INSERT INTO clients (
                id, organization_id, first_name, last_name, email, phone,
                document_type, document_number, address, city, status, notes,
                search_text, created_at, updated_at, version
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1)
            "#,
        )
        .bind(&id)
        .bind(organization_id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.document_type)
        .bind(&input.document_number)
        .bind(&input.address)
        .bind(&input.city)
        .bind(input.status)
        .bind(&input.notes)
        .bind(search_text(&input))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(duplicate_document)?;

        info!(client_id = %id, "Client created");
        self.get(organization_id, &id).await
    }

    /// Replaces the editable fields.
    ///
    /// With `expected_version` set, the write only lands if nobody else
    /// updated the client since it was read.
    pub async fn update(
        &self,
        organization_id: &str,
        id: &str,
        input: ClientInput,
        expected_version: Option<i64>,
    ) -> DbResult<Client> {
        let input = input.normalized();
        input.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE clients SET
                first_name = ?, last_name = ?, email = ?, phone = ?,
                document_type = ?, document_number = ?, address = ?, city = ?,
                status = ?, notes = ?, search_text = ?,
                updated_at = ?, version = version + 1
            WHERE id = ? AND organization_id = ? AND (? IS NULL OR version = ?)
            "#,
        )
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.document_type)
        .bind(&input.document_number)
        .bind(&input.address)
        .bind(&input.city)
        .bind(input.status)
        .bind(&input.notes)
        .bind(search_text(&input))
        .bind(Utc::now())
        .bind(id)
        .bind(organization_id)
        .bind(expected_version)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(duplicate_document)?;

        if result.rows_affected() == 0 {
            return Err(stale_write_error(
                &self.pool,
                "clients",
                "Client",
                organization_id,
                id,
                expected_version,
            )
            .await);
        }

        info!(client_id = %id, "Client updated");
        self.get(organization_id, id).await
    }

    /// Deletes a client. Fails with a foreign-key error while sales or
    /// reservations reference them.
    pub async fn delete(&self, organization_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM clients WHERE id = ? AND organization_id = ?")
            .bind(id)
            .bind(organization_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }

        info!(client_id = %id, "Client deleted");
        Ok(())
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, organization_id: &str, filter: &ClientFilter) {
    qb.push(" WHERE organization_id = ")
        .push_bind(organization_id.to_string());

    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }

    if let Some(search) = &filter.search {
        for term in search.split_whitespace() {
            qb.push(" AND search_text LIKE ")
                .push_bind(like_pattern(term))
                .push(" ESCAPE '\\'");
        }
    }
}

fn search_text(input: &ClientInput) -> String {
    let parts = [
        Some(input.first_name.as_str()),
        Some(input.last_name.as_str()),
        input.email.as_deref(),
        input.phone.as_deref(),
        input.document_number.as_deref(),
        input.city.as_deref(),
    ];
    let joined: Vec<&str> = parts.into_iter().flatten().collect();
    fold_search_text(&joined.join(" "))
}

fn duplicate_document(err: sqlx::Error) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("document_number"),
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
