//! End-to-end access flow: route gate + role guard against in-memory collaborators.

use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use ledgerdesk_auth::{
    AccessControl, AccessView, AuthError, AuthSubscription, IdentityProvider,
    InMemoryIdentityProvider, InMemoryRoleStore, RecordingNotifier, Role, RoleGuard,
    RoleLookupError, Session, SessionGate, SignInSurface,
};
use ledgerdesk_core::UserId;

/// Provider whose one-shot fetch reads the session, then stalls until released.
struct StallingProvider {
    inner: InMemoryIdentityProvider,
    started: Mutex<Option<oneshot::Sender<usize>>>,
    release: Mutex<Option<oneshot::Receiver<()>>>,
}

#[async_trait::async_trait]
impl IdentityProvider for StallingProvider {
    fn on_auth_state_change(&self) -> AuthSubscription {
        self.inner.on_auth_state_change()
    }

    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let snapshot = self.inner.current_session().await;
        if let Some(started) = self.started.lock().unwrap().take() {
            let _ = started.send(self.inner.subscriber_count());
        }
        let release = self.release.lock().unwrap().take();
        if let Some(release) = release {
            let _ = release.await;
        }
        snapshot
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.inner.sign_out().await
    }
}

#[tokio::test]
async fn sign_in_during_initial_fetch_is_not_lost() -> anyhow::Result<()> {
    ledgerdesk_observability::init();

    let (started_tx, started_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel();
    let provider = Arc::new(StallingProvider {
        inner: InMemoryIdentityProvider::new(),
        started: Mutex::new(Some(started_tx)),
        release: Mutex::new(Some(release_rx)),
    });

    let mut gate = SessionGate::attach(provider.clone());
    assert!(gate.is_loading());

    let session = Session::new(UserId::new());
    let signer = {
        let provider = provider.clone();
        let session = session.clone();
        async move {
            let subscribers_at_fetch = started_rx.await.unwrap_or_default();
            provider.inner.sign_in(session);
            let _ = release_tx.send(());
            subscribers_at_fetch
        }
    };

    let (view, subscribers_at_fetch) = tokio::join!(
        async { gate.resolve().await.clone() },
        signer
    );

    assert_eq!(subscribers_at_fetch, 1, "subscription must exist before the fetch");
    assert_eq!(view, AccessView::Authenticated(session));
    Ok(())
}

#[tokio::test]
async fn role_restricted_region_follows_session_lifecycle() -> anyhow::Result<()> {
    ledgerdesk_observability::init();

    let manager = UserId::new();
    let roles = Arc::new(InMemoryRoleStore::new());
    roles.set_role(manager, Role::Manager);

    let provider = Arc::new(InMemoryIdentityProvider::new());
    let mut access = AccessControl::activate(provider.clone(), roles.clone()).await;
    let notifier = RecordingNotifier::new();

    assert_eq!(access.view(), &AccessView::Unauthenticated(SignInSurface::SignIn));
    assert!(!access.has_role(Role::User));

    provider.sign_in(Session::new(manager).with_email("manager@ledgerdesk.test"));
    access.next_change().await;
    assert_eq!(access.guard().gate(Role::Manager, "reports", "hidden"), "reports");
    assert_eq!(access.guard().gate(Role::Admin, "user admin", "hidden"), "hidden");

    access.sign_out(&notifier).await;
    access.next_change().await;
    assert!(!access.view().is_authenticated());
    assert!(!access.guard().has_role(Role::User));
    assert_eq!(notifier.notifications().len(), 1);

    Ok(())
}

#[tokio::test]
async fn every_resolved_session_gets_a_role() -> anyhow::Result<()> {
    ledgerdesk_observability::init();

    let roles = Arc::new(InMemoryRoleStore::new());
    let guard = RoleGuard::new(roles.clone());

    let cases = [
        (UserId::new(), None, None),
        (UserId::new(), Some("admin"), None),
        (UserId::new(), Some("root"), None),
        (UserId::new(), Some("manager"), Some(RoleLookupError::Network("reset".into()))),
    ];

    for (user, record, failure) in cases {
        if let Some(record) = record {
            roles.set_record(user, record);
        }
        if let Some(failure) = failure {
            roles.fail_lookup(user, failure);
        }

        let snapshot = guard.fetch_role(Some(&Session::new(user))).await;
        assert!(!snapshot.loading);
        assert!(snapshot.role.is_some(), "role must resolve for {user}");
    }

    Ok(())
}
