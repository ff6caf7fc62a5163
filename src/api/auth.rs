//! Sign-in, sign-up and session endpoints.

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap};

use super::{success, ApiResult, ValidJson};
use crate::auth::{bearer_token, is_admin, AccessGuard, AuthProvider};
use crate::errors::AppError;
use crate::models::{Credentials, SessionInfo};
use crate::AppState;

/// POST /api/auth/sign-in - Admin sign-in.
pub async fn sign_in(
    State(state): State<AppState>,
    ValidJson(credentials): ValidJson<Credentials>,
) -> ApiResult<SessionInfo> {
    let provider: Arc<dyn AuthProvider> = state.auth.clone();
    let mut guard = AccessGuard::new(provider, state.config.admin_emails.clone());

    let session = guard
        .sign_in(&credentials.email, &credentials.password)
        .await?;
    let identity = guard
        .identity()
        .cloned()
        .unwrap_or_else(|| session.identity.clone());

    success(SessionInfo {
        token: Some(session.token),
        email: identity.email,
        role: identity.role,
        is_admin: true,
    })
}

/// POST /api/auth/sign-up - Create an account.
pub async fn sign_up(
    State(state): State<AppState>,
    ValidJson(credentials): ValidJson<Credentials>,
) -> ApiResult<SessionInfo> {
    let identity = state
        .auth
        .sign_up(
            &credentials.email,
            &credentials.password,
            &state.config.admin_emails,
        )
        .await?;
    let admin = is_admin(&identity, &state.config.admin_emails);

    success(SessionInfo {
        token: None,
        email: identity.email,
        role: identity.role,
        is_admin: admin,
    })
}

/// GET /api/auth/session - Who holds the bearer token.
pub async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<SessionInfo> {
    let token = bearer_token(&headers)
        .ok_or_else(|| AppError::Auth("Authentication required".to_string()))?;
    let identity = state
        .auth
        .current_identity(&token)
        .await?
        .ok_or_else(|| AppError::Auth("Session expired or invalid".to_string()))?;
    let admin = is_admin(&identity, &state.config.admin_emails);

    success(SessionInfo {
        token: None,
        email: identity.email,
        role: identity.role,
        is_admin: admin,
    })
}

/// POST /api/auth/sign-out - Revoke the bearer token.
pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<()> {
    let token = bearer_token(&headers)
        .ok_or_else(|| AppError::Auth("Authentication required".to_string()))?;
    state.auth.sign_out(&token).await?;
    tracing::info!("Session closed");
    success(())
}
