//! Admin access guard.
//!
//! `Loading -> {Unauthenticated, Authenticated}`, `Authenticated -> Unauthenticated` on
//! sign-out. A guard starts in `Loading` every time it is created; nothing privileged may be
//! shown until [`AccessGuard::resolve`] has settled it.

use std::sync::Arc;

use super::{authorize, is_admin, AdminAllowList, AuthProvider};
use crate::errors::{AppError, ACCESS_DENIED};
use crate::models::{Identity, Session};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Loading,
    Unauthenticated { message: Option<String> },
    Authenticated { identity: Identity, token: String },
}

pub struct AccessGuard {
    auth: Arc<dyn AuthProvider>,
    allow_list: AdminAllowList,
    state: GuardState,
}

impl AccessGuard {
    pub fn new(auth: Arc<dyn AuthProvider>, allow_list: AdminAllowList) -> Self {
        Self {
            auth,
            allow_list,
            state: GuardState::Loading,
        }
    }

    pub fn state(&self) -> &GuardState {
        &self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            GuardState::Authenticated { identity, .. } => Some(identity),
            _ => None,
        }
    }

    /// Settle the guard from an existing session token. Errors fail closed.
    pub async fn resolve(&mut self, token: Option<&str>) -> Result<Identity, AppError> {
        let result = authorize(self.auth.as_ref(), &self.allow_list, token).await;
        self.state = match &result {
            Ok(identity) => GuardState::Authenticated {
                identity: identity.clone(),
                token: token.unwrap_or_default().to_string(),
            },
            Err(_) => GuardState::Unauthenticated { message: None },
        };
        result
    }

    /// Attempt a credential sign-in.
    ///
    /// Provider errors are surfaced verbatim. A valid login without admin rights is signed
    /// out again before returning `Forbidden`, so it never leaves an open session behind.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<Session, AppError> {
        let session = match self.auth.sign_in(email, password).await {
            Ok(session) => session,
            Err(e) => {
                self.state = GuardState::Unauthenticated {
                    message: Some(e.message()),
                };
                return Err(e);
            }
        };

        let admin = match self.auth.current_identity(&session.token).await {
            Ok(Some(identity)) => is_admin(&identity, &self.allow_list).then_some(identity),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Admin check after sign-in failed: {}", e);
                None
            }
        };

        match admin {
            Some(identity) => {
                tracing::info!(email = %identity.email, "Admin signed in");
                self.state = GuardState::Authenticated {
                    identity,
                    token: session.token.clone(),
                };
                Ok(session)
            }
            None => {
                if let Err(e) = self.auth.sign_out(&session.token).await {
                    tracing::error!("Forced sign-out of non-admin session failed: {}", e);
                }
                tracing::warn!(email = %session.identity.email, "Non-admin sign-in denied");
                self.state = GuardState::Unauthenticated {
                    message: Some(ACCESS_DENIED.to_string()),
                };
                Err(AppError::Forbidden(ACCESS_DENIED.to_string()))
            }
        }
    }

    /// Close the current session and return to the unauthenticated state.
    pub async fn sign_out(&mut self) -> Result<(), AppError> {
        let previous = std::mem::replace(
            &mut self.state,
            GuardState::Unauthenticated { message: None },
        );
        match previous {
            GuardState::Authenticated { token, .. } => self.auth.sign_out(&token).await,
            _ => Ok(()),
        }
    }
}
