//! Route gate and role guard driven together.
//!
//! [`AccessControl`] owns a [`SessionGate`] and a [`RoleGuard`] and re-runs
//! the role fetch for every auth-state change the gate applies. The guard's
//! state is reset in the same step that applies the change, so `has_role`
//! never answers for a session the gate no longer shows.

use crate::gate::{AccessView, SessionGate, SignInSurface};
use crate::guard::{RoleGuard, RoleSnapshot};
use crate::provider::{IdentityProvider, Notifier, RoleStore};
use crate::roles::RoleRequirement;
use crate::session::Session;

pub struct AccessControl<P: IdentityProvider, S: RoleStore> {
    gate: SessionGate<P>,
    guard: RoleGuard<S>,
}

impl<P: IdentityProvider, S: RoleStore> AccessControl<P, S> {
    /// Subscribe to the provider. Both decision points start out loading.
    pub fn attach(provider: P, store: S) -> Self {
        Self {
            gate: SessionGate::attach(provider),
            guard: RoleGuard::new(store),
        }
    }

    /// Attach, resolve the session, then resolve its role.
    pub async fn activate(provider: P, store: S) -> Self {
        let mut access = Self::attach(provider, store);
        access.resolve().await;
        access
    }

    /// Resolve the gate's first signal and fetch the role for the result.
    pub async fn resolve(&mut self) -> RoleSnapshot {
        self.gate.resolve().await;
        self.guard.follow(&self.gate).await
    }

    /// Wait for the next auth-state notification, apply it, and refetch the role.
    ///
    /// Returns `None` once the provider has gone away.
    pub async fn next_change(&mut self) -> Option<RoleSnapshot> {
        self.gate.next_change().await?;
        Some(self.guard.follow(&self.gate).await)
    }

    /// Apply every queued notification, then refetch the role once for the
    /// session that remains. Returns how many notifications were applied.
    pub async fn poll_changes(&mut self) -> usize {
        let applied = self.gate.poll_changes();
        if applied > 0 {
            self.guard.follow(&self.gate).await;
        }
        applied
    }

    pub fn view(&self) -> &AccessView {
        self.gate.view()
    }

    pub fn session(&self) -> Option<&Session> {
        self.gate.session()
    }

    pub fn gate(&self) -> &SessionGate<P> {
        &self.gate
    }

    pub fn guard(&self) -> &RoleGuard<S> {
        &self.guard
    }

    /// False unless a session is showing and its role is resolved and ranks
    /// at least `required`.
    pub fn has_role(&self, required: impl Into<RoleRequirement>) -> bool {
        self.gate.view().is_authenticated() && self.guard.has_role(required)
    }

    pub fn render<T>(
        &self,
        loading: impl FnOnce() -> T,
        sign_in: impl FnOnce(SignInSurface) -> T,
        children: impl FnOnce(&Session) -> T,
    ) -> T {
        self.gate.render(loading, sign_in, children)
    }

    pub fn show_password_recovery(&mut self) -> bool {
        self.gate.show_password_recovery()
    }

    pub fn show_sign_in(&mut self) -> bool {
        self.gate.show_sign_in()
    }

    /// Ask the provider to end the session. The gate and guard follow the
    /// resulting `SignedOut` notification on the next `next_change` or
    /// `poll_changes`.
    pub async fn sign_out(&self, notifier: &dyn Notifier) {
        self.gate.sign_out(notifier).await;
    }

    /// Release the subscription.
    pub fn deactivate(self) {
        self.gate.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ledgerdesk_core::UserId;

    use super::*;
    use crate::memory::{InMemoryIdentityProvider, InMemoryRoleStore, RecordingNotifier};
    use crate::roles::Role;

    #[tokio::test]
    async fn sign_out_revokes_role_as_soon_as_it_is_applied() {
        let admin = UserId::new();
        let store = InMemoryRoleStore::new();
        store.set_role(admin, Role::Admin);
        let provider = Arc::new(InMemoryIdentityProvider::new());
        let mut access = AccessControl::activate(provider.clone(), store).await;
        assert!(!access.has_role(Role::User));

        provider.sign_in(Session::new(admin));
        access.next_change().await;
        assert!(access.has_role(Role::Admin));

        provider.sign_out().await.unwrap();
        let snapshot = access.next_change().await.unwrap();
        assert_eq!(snapshot, RoleSnapshot { role: None, loading: false });
        assert!(!access.has_role(Role::User));
        assert!(!access.guard().has_role(Role::Admin));
    }

    #[tokio::test]
    async fn switching_users_refetches_role() {
        let admin = UserId::new();
        let clerk = UserId::new();
        let store = InMemoryRoleStore::new();
        store.set_role(admin, Role::Admin);
        let provider = Arc::new(InMemoryIdentityProvider::with_session(Session::new(admin)));
        let mut access = AccessControl::activate(provider.clone(), store).await;
        assert!(access.has_role(Role::Admin));

        provider.sign_in(Session::new(clerk));
        assert_eq!(access.poll_changes().await, 1);
        assert_eq!(access.guard().role(), Some(Role::User));
        assert!(!access.has_role(Role::Manager));
    }

    #[tokio::test]
    async fn token_refresh_picks_up_changed_role() {
        let user = UserId::new();
        let store = Arc::new(InMemoryRoleStore::new());
        store.set_role(user, Role::User);
        let session = Session::new(user);
        let provider = Arc::new(InMemoryIdentityProvider::with_session(session.clone()));
        let mut access = AccessControl::activate(provider.clone(), store.clone()).await;
        assert!(!access.has_role(Role::Manager));

        store.set_role(user, Role::Manager);
        provider.refresh(session);
        access.next_change().await;
        assert!(access.has_role(Role::Manager));
    }

    #[tokio::test]
    async fn nothing_queued_keeps_role() {
        let user = UserId::new();
        let store = InMemoryRoleStore::new();
        store.set_role(user, Role::Manager);
        let provider = Arc::new(InMemoryIdentityProvider::with_session(Session::new(user)));
        let mut access = AccessControl::activate(provider.clone(), store).await;

        assert_eq!(access.poll_changes().await, 0);
        assert!(access.has_role(Role::Manager));
    }

    #[tokio::test]
    async fn sign_out_notifies_and_deactivate_releases_subscription() {
        let session = Session::new(UserId::new());
        let provider = Arc::new(InMemoryIdentityProvider::with_session(session));
        let mut access = AccessControl::activate(provider.clone(), InMemoryRoleStore::new()).await;
        let notifier = RecordingNotifier::new();

        access.sign_out(&notifier).await;
        access.poll_changes().await;
        assert!(access.show_password_recovery());
        assert_eq!(
            access.render(|| None, Some, |_| None),
            Some(SignInSurface::PasswordRecovery)
        );
        assert_eq!(notifier.notifications().len(), 1);

        assert_eq!(provider.subscriber_count(), 1);
        access.deactivate();
        assert_eq!(provider.subscriber_count(), 0);
    }
}
