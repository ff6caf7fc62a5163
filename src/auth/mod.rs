//! Authentication and admin authorization.
//!
//! Sessions are opaque bearer tokens issued by an [`AuthProvider`]. Admin rights are never
//! stored: they are recomputed from the allow-list and the account role on every check.

mod guard;
mod middleware;

pub use guard::*;
pub use middleware::*;

use std::collections::BTreeSet;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use chrono::Duration;

use crate::db::{AccountStore, UserRecord};
use crate::errors::{AppError, ACCESS_DENIED};
use crate::models::{Identity, Session, ADMIN_ROLE};

/// Message returned for any unknown email / wrong password combination.
pub const INVALID_CREDENTIALS: &str = "Invalid login credentials";

const MIN_PASSWORD_LEN: usize = 8;

/// Configured set of admin email addresses, stored lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminAllowList {
    emails: BTreeSet<String>,
}

impl AdminAllowList {
    /// Parse a comma-separated list. Blank entries are ignored.
    pub fn parse(raw: &str) -> Self {
        Self::from_emails(raw.split(','))
    }

    pub fn from_emails<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            emails: emails
                .into_iter()
                .map(|e| normalize_email(e.as_ref()))
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(&normalize_email(email))
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }
}

/// Admin if the email is allow-listed or the account carries the admin role.
pub fn is_admin(identity: &Identity, allow_list: &AdminAllowList) -> bool {
    allow_list.contains(&identity.email) || identity.role.as_deref() == Some(ADMIN_ROLE)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Authentication provider contract.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verify credentials and open a session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError>;

    /// Who holds this session, if it is still valid.
    async fn current_identity(&self, token: &str) -> Result<Option<Identity>, AppError>;

    /// Close a session.
    async fn sign_out(&self, token: &str) -> Result<(), AppError>;
}

/// Check that `token` belongs to an admin. Any failure while resolving the session denies access.
pub async fn authorize(
    auth: &dyn AuthProvider,
    allow_list: &AdminAllowList,
    token: Option<&str>,
) -> Result<Identity, AppError> {
    let token = token.ok_or_else(|| AppError::Auth("Authentication required".to_string()))?;

    let identity = match auth.current_identity(token).await {
        Ok(Some(identity)) => identity,
        Ok(None) => return Err(AppError::Auth("Session expired or invalid".to_string())),
        Err(e) => {
            tracing::warn!("Session lookup failed, denying access: {}", e);
            return Err(AppError::Auth("Unable to verify session".to_string()));
        }
    };

    if is_admin(&identity, allow_list) {
        Ok(identity)
    } else {
        Err(AppError::Forbidden(ACCESS_DENIED.to_string()))
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// [`AuthProvider`] over the local account tables with argon2 password hashes.
#[derive(Clone)]
pub struct AuthService {
    accounts: AccountStore,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(accounts: AccountStore, session_ttl_hours: i64) -> Self {
        Self {
            accounts,
            session_ttl: Duration::hours(session_ttl_hours),
        }
    }

    /// Register an account. Allow-listed emails get the admin role, everyone else `user`.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        allow_list: &AdminAllowList,
    ) -> Result<Identity, AppError> {
        let email = normalize_email(email);
        if !email.contains('@') {
            return Err(AppError::Validation("A valid email is required".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let role = if allow_list.contains(&email) {
            ADMIN_ROLE
        } else {
            "user"
        };

        self.accounts
            .insert_user(&UserRecord {
                email: email.clone(),
                password_hash: hash_password(password)?,
                role: Some(role.to_string()),
            })
            .await?;

        tracing::info!(email = %email, role = %role, "Account created");
        Ok(Identity {
            email,
            role: Some(role.to_string()),
        })
    }
}

#[async_trait]
impl AuthProvider for AuthService {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let email = normalize_email(email);
        let user = self
            .accounts
            .find_user(&email)
            .await?
            .ok_or_else(|| AppError::Auth(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(password, &user.password_hash) {
            tracing::warn!(email = %email, "Sign-in rejected");
            return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()));
        }

        let token = new_session_token();
        let expires_at = self
            .accounts
            .insert_session(&token, &user.email, self.session_ttl)
            .await?;

        Ok(Session {
            token,
            identity: Identity {
                email: user.email,
                role: user.role,
            },
            expires_at,
        })
    }

    async fn current_identity(&self, token: &str) -> Result<Option<Identity>, AppError> {
        self.accounts.find_session(token).await
    }

    async fn sign_out(&self, token: &str) -> Result<(), AppError> {
        self.accounts.delete_session(token).await
    }
}

fn new_session_token() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
