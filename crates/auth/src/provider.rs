//! Collaborator contracts: identity provider, role store, notification surface.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ledgerdesk_core::UserId;

use crate::roles::{Role, RoleParseError};
use crate::session::Session;
use crate::subscription::AuthSubscription;

/// Failure reported by the identity provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("identity provider error: {0}")]
    Provider(String),

    #[error("network error: {0}")]
    Network(String),
}

/// Failure looking up a role record. "No record" is not an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoleLookupError {
    #[error("network error: {0}")]
    Network(String),

    #[error("role store error: {0}")]
    Store(String),

    #[error(transparent)]
    UnknownRole(#[from] RoleParseError),
}

/// External identity/session service.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register for auth-state notifications. The returned handle releases the
    /// registration when dropped.
    fn on_auth_state_change(&self) -> AuthSubscription;

    /// One-shot read of the current session.
    async fn current_session(&self) -> Result<Option<Session>, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;
}

#[async_trait::async_trait]
impl<P> IdentityProvider for Arc<P>
where
    P: IdentityProvider + ?Sized,
{
    fn on_auth_state_change(&self) -> AuthSubscription {
        (**self).on_auth_state_change()
    }

    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        (**self).current_session().await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        (**self).sign_out().await
    }
}

/// Store of role records keyed by user id.
#[async_trait::async_trait]
pub trait RoleStore: Send + Sync {
    /// `Ok(None)` when the user has no role record.
    async fn lookup_role(&self, user_id: UserId) -> Result<Option<Role>, RoleLookupError>;
}

#[async_trait::async_trait]
impl<S> RoleStore for Arc<S>
where
    S: RoleStore + ?Sized,
{
    async fn lookup_role(&self, user_id: UserId) -> Result<Option<Role>, RoleLookupError> {
        (**self).lookup_role(user_id).await
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
}

/// User-visible toast surface. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, kind: NotificationKind);
}
