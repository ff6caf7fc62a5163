//! Admin authorization middleware.
//!
//! Every request under the admin routes is re-authorized against the session store and the
//! allow-list. Nothing is cached between requests.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::{bearer_token, AccessGuard};
use crate::errors::AppError;
use crate::models::Identity;
use crate::AppState;

/// Admin identity injected into request extensions by [`require_admin`].
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub identity: Identity,
}

/// Reject the request unless it carries a bearer token for an admin session.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers());
    let mut guard = AccessGuard::new(state.auth.clone(), state.config.admin_emails.clone());

    match guard.resolve(token.as_deref()).await {
        Ok(identity) => {
            req.extensions_mut().insert(AdminContext { identity });
            Ok(next.run(req).await)
        }
        Err(e) => {
            tracing::warn!(
                uri = %req.uri(),
                state = ?guard.state(),
                "Admin request rejected: {}",
                e
            );
            Err(e)
        }
    }
}
