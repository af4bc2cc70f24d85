//! # Payment Repository
//!
//! Payment configuration of an organization.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Global catalogs           Organization (ordered, enable/disable)      │
//! │  ───────────────           ──────────────────────────────────────      │
//! │  payment_methods   ──────► organization_payment_methods                │
//! │  banks ──┐                                                             │
//! │          ├───────────────► bank_cards (bank + card type)               │
//! │  card_types ─┘                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use moto_core::ordering::ReorderRequest;
use moto_core::{validation, Bank, BankCard, CardNetwork, CardType, OrganizationPaymentMethod, PaymentMethod};
use sqlx::SqlitePool;
use tracing::info;

use super::new_id;
use super::reorder::OrderedList;
use crate::error::{DbError, DbResult};

const ORG_METHOD_SELECT: &str = r#"
    SELECT opm.organization_id, opm.payment_method_id, pm.name, pm.kind, opm.sort_order, opm.is_enabled
    FROM organization_payment_methods opm
    INNER JOIN payment_methods pm ON pm.id = opm.payment_method_id
"#;

const BANK_CARD_SELECT: &str = r#"
    SELECT bc.id, bc.organization_id, bc.bank_id, bc.card_type_id,
           b.name AS bank_name, ct.name AS card_name, bc.sort_order, bc.is_enabled
    FROM bank_cards bc
    INNER JOIN banks b ON b.id = bc.bank_id
    INNER JOIN card_types ct ON ct.id = bc.card_type_id
"#;

#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    fn methods(organization_id: &str) -> OrderedList {
        OrderedList::new("organization_payment_methods", "payment_method_id")
            .scoped("organization_id = ?", organization_id)
    }

    fn cards(organization_id: &str) -> OrderedList {
        OrderedList::new("bank_cards", "id").scoped("organization_id = ?", organization_id)
    }

    // =========================================================================
    // Payment Methods
    // =========================================================================

    /// The global payment method catalog.
    pub async fn list_catalog(&self) -> DbResult<Vec<PaymentMethod>> {
        let methods = sqlx::query_as::<_, PaymentMethod>(
            "SELECT id, name, kind, created_at FROM payment_methods ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(methods)
    }

    /// Methods the organization accepts, in user order.
    pub async fn list_for_org(&self, organization_id: &str) -> DbResult<Vec<OrganizationPaymentMethod>> {
        let sql = format!("{ORG_METHOD_SELECT} WHERE opm.organization_id = ? ORDER BY opm.sort_order, pm.name");
        let methods = sqlx::query_as::<_, OrganizationPaymentMethod>(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(methods)
    }

    pub async fn get_for_org(
        &self,
        organization_id: &str,
        payment_method_id: &str,
    ) -> DbResult<OrganizationPaymentMethod> {
        let sql = format!("{ORG_METHOD_SELECT} WHERE opm.organization_id = ? AND opm.payment_method_id = ?");
        sqlx::query_as::<_, OrganizationPaymentMethod>(&sql)
            .bind(organization_id)
            .bind(payment_method_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("PaymentMethod", payment_method_id))
    }

    /// Accepts a catalog method, appended at the end and enabled.
    pub async fn associate(
        &self,
        organization_id: &str,
        payment_method_id: &str,
    ) -> DbResult<OrganizationPaymentMethod> {
        let mut tx = self.pool.begin().await?;
        let order = Self::methods(organization_id).next_order(&mut tx).await?;

        sqlx::query(
            r#"
            INSERT INTO organization_payment_methods (organization_id, payment_method_id, sort_order, is_enabled)
            VALUES (?, ?, ?, 1)
            "#,
        )
        .bind(organization_id)
        .bind(payment_method_id)
        .bind(order)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("payment_method"),
            DbError::ForeignKeyViolation { .. } => DbError::not_found("PaymentMethod", payment_method_id),
            other => other,
        })?;
        tx.commit().await?;

        info!(organization_id = %organization_id, payment_method_id = %payment_method_id, "Payment method associated");
        self.get_for_org(organization_id, payment_method_id).await
    }

    pub async fn dissociate(&self, organization_id: &str, payment_method_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "DELETE FROM organization_payment_methods WHERE organization_id = ? AND payment_method_id = ?",
        )
        .bind(organization_id)
        .bind(payment_method_id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PaymentMethod", payment_method_id));
        }

        Self::methods(organization_id).compact(&mut tx).await?;
        tx.commit().await?;

        info!(organization_id = %organization_id, payment_method_id = %payment_method_id, "Payment method dissociated");
        Ok(())
    }

    /// Disabled methods keep their place in the order.
    pub async fn set_enabled(
        &self,
        organization_id: &str,
        payment_method_id: &str,
        enabled: bool,
    ) -> DbResult<OrganizationPaymentMethod> {
        let result = sqlx::query(
            "UPDATE organization_payment_methods SET is_enabled = ? WHERE organization_id = ? AND payment_method_id = ?",
        )
        .bind(enabled)
        .bind(organization_id)
        .bind(payment_method_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PaymentMethod", payment_method_id));
        }
        self.get_for_org(organization_id, payment_method_id).await
    }

    pub async fn reorder(
        &self,
        organization_id: &str,
        request: &ReorderRequest,
    ) -> DbResult<Vec<OrganizationPaymentMethod>> {
        Self::methods(organization_id).apply(&self.pool, request).await?;
        self.list_for_org(organization_id).await
    }

    // =========================================================================
    // Banks & Card Types
    // =========================================================================

    pub async fn list_banks(&self) -> DbResult<Vec<Bank>> {
        let banks = sqlx::query_as::<_, Bank>("SELECT id, name FROM banks ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(banks)
    }

    pub async fn create_bank(&self, name: &str) -> DbResult<Bank> {
        let name = name.trim();
        validation::validate_name("name", name, 80)?;

        let bank = Bank {
            id: new_id(),
            name: name.to_string(),
        };
        sqlx::query("INSERT INTO banks (id, name) VALUES (?, ?)")
            .bind(&bank.id)
            .bind(&bank.name)
            .execute(&self.pool)
            .await
            .map_err(duplicate_name)?;

        info!(bank_id = %bank.id, name = %bank.name, "Bank created");
        Ok(bank)
    }

    pub async fn list_card_types(&self) -> DbResult<Vec<CardType>> {
        let cards = sqlx::query_as::<_, CardType>("SELECT id, name, network FROM card_types ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(cards)
    }

    pub async fn create_card_type(&self, name: &str, network: CardNetwork) -> DbResult<CardType> {
        let name = name.trim();
        validation::validate_name("name", name, 80)?;

        let card = CardType {
            id: new_id(),
            name: name.to_string(),
            network,
        };
        sqlx::query("INSERT INTO card_types (id, name, network) VALUES (?, ?, ?)")
            .bind(&card.id)
            .bind(&card.name)
            .bind(card.network)
            .execute(&self.pool)
            .await
            .map_err(duplicate_name)?;

        info!(card_type_id = %card.id, name = %card.name, "Card type created");
        Ok(card)
    }

    // =========================================================================
    // Bank Cards
    // =========================================================================

    pub async fn list_bank_cards(&self, organization_id: &str) -> DbResult<Vec<BankCard>> {
        let sql = format!("{BANK_CARD_SELECT} WHERE bc.organization_id = ? ORDER BY bc.sort_order, b.name, ct.name");
        let cards = sqlx::query_as::<_, BankCard>(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(cards)
    }

    pub async fn get_bank_card(&self, organization_id: &str, id: &str) -> DbResult<BankCard> {
        let sql = format!("{BANK_CARD_SELECT} WHERE bc.organization_id = ? AND bc.id = ?");
        sqlx::query_as::<_, BankCard>(&sql)
            .bind(organization_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("BankCard", id))
    }

    /// Accepts a bank + card type pair, appended at the end and enabled.
    pub async fn add_bank_card(
        &self,
        organization_id: &str,
        bank_id: &str,
        card_type_id: &str,
    ) -> DbResult<BankCard> {
        validation::validate_uuid_field("bank_id", bank_id)?;
        validation::validate_uuid_field("card_type_id", card_type_id)?;

        let mut tx = self.pool.begin().await?;
        let order = Self::cards(organization_id).next_order(&mut tx).await?;

        let id = new_id();
        sqlx::query(
            r#"
            INSERT INTO bank_cards (id, organization_id, bank_id, card_type_id, sort_order, is_enabled)
            VALUES (?, ?, ?, ?, ?, 1)
            "#,
        )
        .bind(&id)
        .bind(organization_id)
        .bind(bank_id)
        .bind(card_type_id)
        .bind(order)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("bank_card"),
            other => other,
        })?;
        tx.commit().await?;

        info!(bank_card_id = %id, bank_id = %bank_id, card_type_id = %card_type_id, "Bank card added");
        self.get_bank_card(organization_id, &id).await
    }

    pub async fn remove_bank_card(&self, organization_id: &str, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM bank_cards WHERE id = ? AND organization_id = ?")
            .bind(id)
            .bind(organization_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("BankCard", id));
        }

        Self::cards(organization_id).compact(&mut tx).await?;
        tx.commit().await?;

        info!(bank_card_id = %id, "Bank card removed");
        Ok(())
    }

    pub async fn set_bank_card_enabled(&self, organization_id: &str, id: &str, enabled: bool) -> DbResult<BankCard> {
        let result = sqlx::query("UPDATE bank_cards SET is_enabled = ? WHERE id = ? AND organization_id = ?")
            .bind(enabled)
            .bind(id)
            .bind(organization_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("BankCard", id));
        }
        self.get_bank_card(organization_id, id).await
    }

    pub async fn reorder_bank_cards(
        &self,
        organization_id: &str,
        request: &ReorderRequest,
    ) -> DbResult<Vec<BankCard>> {
        Self::cards(organization_id).apply(&self.pool, request).await?;
        self.list_bank_cards(organization_id).await
    }
}

fn duplicate_name(err: sqlx::Error) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("name"),
        other => other,
    }
}
