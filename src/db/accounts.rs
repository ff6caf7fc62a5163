//! Account and session tables backing the authentication provider.

use chrono::{DateTime, Duration, Utc};
use sqlx::{Row, SqlitePool};

use super::now_timestamp;
use crate::errors::AppError;
use crate::models::Identity;

/// A stored account.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub email: String,
    pub password_hash: String,
    pub role: Option<String>,
}

/// Persistence for users and sessions.
#[derive(Clone)]
pub struct AccountStore {
    pool: SqlitePool,
}

impl AccountStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a user by normalized email.
    pub async fn find_user(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let row = sqlx::query("SELECT email, password_hash, role FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| UserRecord {
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            role: row.get("role"),
        }))
    }

    /// Insert a user. Fails with a validation error if the email is taken.
    pub async fn insert_user(&self, user: &UserRecord) -> Result<(), AppError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO users (email, password_hash, role, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Validation(format!(
                "An account for {} already exists",
                user.email
            )));
        }
        Ok(())
    }

    /// Store a new session token valid for `ttl`. Returns the expiry timestamp.
    pub async fn insert_session(
        &self,
        token: &str,
        email: &str,
        ttl: Duration,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = (now + ttl).to_rfc3339_opts(chrono::SecondsFormat::Micros, true);

        sqlx::query("INSERT INTO sessions (token, email, created_at, expires_at) VALUES (?, ?, ?, ?)")
            .bind(token)
            .bind(email)
            .bind(now.to_rfc3339_opts(chrono::SecondsFormat::Micros, true))
            .bind(&expires_at)
            .execute(&self.pool)
            .await?;

        Ok(expires_at)
    }

    /// Resolve a token to the identity behind it. Expired sessions resolve to `None`.
    pub async fn find_session(&self, token: &str) -> Result<Option<Identity>, AppError> {
        let row = sqlx::query(
            "SELECT s.expires_at, u.email, u.role FROM sessions s JOIN users u ON u.email = s.email WHERE s.token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at: String = row.get("expires_at");
        let expired = DateTime::parse_from_rfc3339(&expires_at)
            .map(|t| t.with_timezone(&Utc) <= Utc::now())
            .unwrap_or(true);
        if expired {
            self.delete_session(token).await?;
            return Ok(None);
        }

        Ok(Some(Identity {
            email: row.get("email"),
            role: row.get("role"),
        }))
    }

    /// Remove a session. Removing an unknown token is not an error.
    pub async fn delete_session(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
