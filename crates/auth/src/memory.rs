//! In-memory collaborators for tests and local development.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;

use ledgerdesk_core::UserId;

use crate::provider::{
    AuthError, IdentityProvider, NotificationKind, Notifier, RoleLookupError, RoleStore,
};
use crate::roles::Role;
use crate::session::{AuthEvent, AuthStateChange, Session};
use crate::subscription::{AuthSubscription, SubscriberRegistry};

/// Identity provider backed by a single in-process session slot.
///
/// Expired sessions are not returned by `current_session`.
#[derive(Debug)]
pub struct InMemoryIdentityProvider {
    registry: Arc<SubscriberRegistry<AuthStateChange>>,
    session: Mutex<Option<Session>>,
    session_fetch_failure: Mutex<Option<AuthError>>,
    sign_out_failure: Mutex<Option<AuthError>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        let provider = Self::new();
        *lock(&provider.session) = Some(session);
        provider
    }

    /// Store `session` and notify subscribers with `SignedIn`.
    pub fn sign_in(&self, session: Session) {
        self.emit(AuthStateChange::signed_in(session));
    }

    /// Replace the session (e.g. new expiry) and notify with `TokenRefreshed`.
    pub fn refresh(&self, session: Session) {
        self.emit(AuthStateChange {
            event: AuthEvent::TokenRefreshed,
            session: Some(session),
        });
    }

    /// Store the change's session and publish it as-is.
    pub fn emit(&self, change: AuthStateChange) {
        *lock(&self.session) = change.session.clone();
        let delivered = self.registry.publish(change);
        tracing::debug!(delivered, "auth state change published");
    }

    /// Make `current_session` fail with `failure` until cleared with `None`.
    pub fn fail_session_fetch(&self, failure: Option<AuthError>) {
        *lock(&self.session_fetch_failure) = failure;
    }

    /// Make `sign_out` fail with `failure` until cleared with `None`.
    pub fn fail_sign_out(&self, failure: Option<AuthError>) {
        *lock(&self.sign_out_failure) = failure;
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self {
            registry: SubscriberRegistry::new(),
            session: Mutex::new(None),
            session_fetch_failure: Mutex::new(None),
            sign_out_failure: Mutex::new(None),
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    fn on_auth_state_change(&self) -> AuthSubscription {
        self.registry.subscribe()
    }

    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        if let Some(err) = lock(&self.session_fetch_failure).clone() {
            return Err(err);
        }

        let now = Utc::now();
        Ok(lock(&self.session)
            .clone()
            .filter(|session| !session.is_expired_at(now)))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(err) = lock(&self.sign_out_failure).clone() {
            return Err(err);
        }
        self.emit(AuthStateChange::signed_out());
        Ok(())
    }
}

/// Role store holding textual role records, as a remote table would.
#[derive(Debug, Default)]
pub struct InMemoryRoleStore {
    records: Mutex<HashMap<UserId, String>>,
    failures: Mutex<HashMap<UserId, RoleLookupError>>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_role(&self, user_id: UserId, role: Role) {
        self.set_record(user_id, role.as_str());
    }

    /// Store a raw record; unknown values surface as `RoleLookupError::UnknownRole`.
    pub fn set_record(&self, user_id: UserId, record: impl Into<String>) {
        lock(&self.records).insert(user_id, record.into());
    }

    pub fn remove(&self, user_id: UserId) {
        lock(&self.records).remove(&user_id);
    }

    pub fn fail_lookup(&self, user_id: UserId, failure: RoleLookupError) {
        lock(&self.failures).insert(user_id, failure);
    }

    pub fn clear_failure(&self, user_id: UserId) {
        lock(&self.failures).remove(&user_id);
    }
}

#[async_trait::async_trait]
impl RoleStore for InMemoryRoleStore {
    async fn lookup_role(&self, user_id: UserId) -> Result<Option<Role>, RoleLookupError> {
        if let Some(err) = lock(&self.failures).get(&user_id) {
            return Err(err.clone());
        }

        match lock(&self.records).get(&user_id) {
            Some(record) => Ok(Some(record.parse()?)),
            None => Ok(None),
        }
    }
}

/// Notifier that records every toast.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<(String, NotificationKind)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<(String, NotificationKind)> {
        lock(&self.notifications).clone()
    }

    pub fn last(&self) -> Option<(String, NotificationKind)> {
        lock(&self.notifications).last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, kind: NotificationKind) {
        lock(&self.notifications).push((message.to_string(), kind));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::roles::RoleParseError;

    #[tokio::test]
    async fn expired_session_is_not_current() {
        let expired = Session::new(UserId::new()).with_expiry(Utc::now() - Duration::minutes(1));
        let provider = InMemoryIdentityProvider::with_session(expired);
        assert_eq!(provider.current_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn refresh_publishes_token_refreshed() {
        let provider = InMemoryIdentityProvider::new();
        let mut sub = provider.on_auth_state_change();
        let session = Session::new(UserId::new()).with_expiry(Utc::now() + Duration::hours(1));

        provider.refresh(session.clone());

        let change = sub.try_recv().unwrap();
        assert_eq!(change.event, AuthEvent::TokenRefreshed);
        assert_eq!(provider.current_session().await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn role_store_distinguishes_missing_unknown_and_failed() {
        let store = InMemoryRoleStore::new();
        let missing = UserId::new();
        let unknown = UserId::new();
        let failing = UserId::new();
        store.set_record(unknown, "owner");
        store.fail_lookup(failing, RoleLookupError::Store("permission denied".to_string()));

        assert_eq!(store.lookup_role(missing).await, Ok(None));
        assert_eq!(
            store.lookup_role(unknown).await,
            Err(RoleLookupError::UnknownRole(RoleParseError("owner".to_string())))
        );
        assert!(matches!(
            store.lookup_role(failing).await,
            Err(RoleLookupError::Store(_))
        ));

        store.clear_failure(failing);
        store.set_role(failing, Role::Admin);
        assert_eq!(store.lookup_role(failing).await, Ok(Some(Role::Admin)));

        store.remove(failing);
        assert_eq!(store.lookup_role(failing).await, Ok(None));
    }

    #[test]
    fn recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        notifier.notify("one", NotificationKind::Success);
        notifier.notify("two", NotificationKind::Error);
        assert_eq!(
            notifier.notifications(),
            vec![
                ("one".to_string(), NotificationKind::Success),
                ("two".to_string(), NotificationKind::Error),
            ]
        );
    }
}
