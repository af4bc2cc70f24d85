//! # User Repository
//!
//! Dealership accounts. Passwords are stored as Argon2 PHC strings and only
//! ever compared through [`UserRepository::verify_credentials`].

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::Utc;
use moto_core::{validation, Role, User};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::new_id;
use crate::error::{DbError, DbResult};

const USER_COLUMNS: &str =
    "id, organization_id, email, name, role, password_hash, is_active, created_at";

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates a user with a freshly hashed password.
    ///
    /// Emails are unique across organizations so login needs no tenant hint.
    pub async fn create(
        &self,
        organization_id: &str,
        email: &str,
        name: &str,
        role: Role,
        password: &str,
    ) -> DbResult<User> {
        let email = email.trim().to_lowercase();
        let name = name.trim();
        validation::validate_email(&email)?;
        validation::validate_name("name", name, 100)?;
        validation::validate_password(password)?;

        let user = User {
            id: new_id(),
            organization_id: organization_id.to_string(),
            email,
            name: name.to_string(),
            role,
            password_hash: hash_password(password)?,
            is_active: true,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, organization_id, email, name, role, password_hash, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.organization_id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        info!(user_id = %user.id, role = user.role.as_str(), "User created");
        Ok(user)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn list(&self, organization_id: &str) -> DbResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE organization_id = ? ORDER BY name, id");
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    /// Returns the user when the email exists, the account is active and the
    /// password matches. Any mismatch yields `None`.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> DbResult<Option<User>> {
        let Some(user) = self.get_by_email(email).await? else {
            debug!("Login for unknown email");
            return Ok(None);
        };

        if !user.is_active || !verify_password(password, &user.password_hash) {
            debug!(user_id = %user.id, "Login rejected");
            return Ok(None);
        }

        Ok(Some(user))
    }
}

// =============================================================================
// Password Hashing
// =============================================================================

fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
