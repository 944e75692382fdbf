//! Route-level gate: loading surface, sign-in surface, or protected children.
//!
//! Lifecycle:
//!
//! ```text
//! attach ──▶ Loading ──first signal──▶ Unauthenticated(SignIn) ⇄ Authenticated
//!                                             │  ▲
//!                          show_password_recovery / show_sign_in
//!                                             ▼  │
//!                               Unauthenticated(PasswordRecovery)
//! ```
//!
//! The subscription is taken in [`SessionGate::attach`], strictly before the
//! one-shot session fetch in [`SessionGate::resolve`], so a sign-in or
//! sign-out racing the fetch is queued rather than lost. Dropping the gate
//! releases the subscription.

use crate::provider::{AuthError, IdentityProvider, NotificationKind, Notifier};
use crate::session::{AuthStateChange, Session};
use crate::subscription::AuthSubscription;

/// Which surface an unauthenticated visitor sees.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SignInSurface {
    #[default]
    SignIn,
    PasswordRecovery,
}

/// Render decision of the route-level gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessView {
    /// No verdict yet.
    Loading,
    Unauthenticated(SignInSurface),
    Authenticated(Session),
}

impl AccessView {
    pub fn is_loading(&self) -> bool {
        matches!(self, AccessView::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AccessView::Authenticated(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            AccessView::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AccessView::Loading => "loading",
            AccessView::Unauthenticated(SignInSurface::SignIn) => "sign_in",
            AccessView::Unauthenticated(SignInSurface::PasswordRecovery) => "password_recovery",
            AccessView::Authenticated(_) => "authenticated",
        }
    }
}

enum FirstSignal {
    Fetched(Result<Option<Session>, AuthError>),
    Changed(AuthStateChange),
}

/// Route-level access gate bound to one identity provider.
pub struct SessionGate<P: IdentityProvider> {
    provider: P,
    subscription: AuthSubscription,
    view: AccessView,
}

impl<P: IdentityProvider> SessionGate<P> {
    /// Subscribe to auth-state changes. The view stays `Loading` until the
    /// first signal is applied.
    pub fn attach(provider: P) -> Self {
        let subscription = provider.on_auth_state_change();
        Self {
            provider,
            subscription,
            view: AccessView::Loading,
        }
    }

    /// Attach and resolve in one step.
    pub async fn activate(provider: P) -> Self {
        let mut gate = Self::attach(provider);
        gate.resolve().await;
        gate
    }

    /// Issue the one-shot session fetch and apply whichever signal arrives
    /// first: the fetch result or an auth-state notification. A notification
    /// that wins the race abandons the fetch. Notifications queued behind the
    /// winner are applied afterwards, so the newest state is what remains.
    ///
    /// A failed fetch is logged and resolves to the sign-in surface.
    pub async fn resolve(&mut self) -> &AccessView {
        if !self.view.is_loading() {
            return &self.view;
        }

        let first = {
            let fetch = self.provider.current_session();
            tokio::pin!(fetch);

            tokio::select! {
                fetched = &mut fetch => FirstSignal::Fetched(fetched),
                change = self.subscription.recv() => match change {
                    Some(change) => FirstSignal::Changed(change),
                    None => FirstSignal::Fetched(fetch.await),
                },
            }
        };

        match first {
            FirstSignal::Fetched(Ok(session)) => self.apply_session(session),
            FirstSignal::Fetched(Err(err)) => {
                tracing::warn!(error = %err, "session fetch failed; showing sign-in");
                self.apply_session(None);
            }
            FirstSignal::Changed(change) => self.apply_change(change),
        }

        self.poll_changes();
        &self.view
    }

    /// Wait for the next auth-state notification and apply it.
    ///
    /// Returns `None` once the provider has gone away.
    pub async fn next_change(&mut self) -> Option<&AccessView> {
        let change = self.subscription.recv().await?;
        self.apply_change(change);
        Some(&self.view)
    }

    /// Apply every queued notification without waiting. Returns how many were applied.
    pub fn poll_changes(&mut self) -> usize {
        let mut applied = 0;
        while let Some(change) = self.subscription.try_recv() {
            self.apply_change(change);
            applied += 1;
        }
        applied
    }

    pub fn view(&self) -> &AccessView {
        &self.view
    }

    pub fn session(&self) -> Option<&Session> {
        self.view.session()
    }

    pub fn is_loading(&self) -> bool {
        self.view.is_loading()
    }

    /// Pick what to render for the current view.
    pub fn render<T>(
        &self,
        loading: impl FnOnce() -> T,
        sign_in: impl FnOnce(SignInSurface) -> T,
        children: impl FnOnce(&Session) -> T,
    ) -> T {
        match &self.view {
            AccessView::Loading => loading(),
            AccessView::Unauthenticated(surface) => sign_in(*surface),
            AccessView::Authenticated(session) => children(session),
        }
    }

    /// Switch the sign-in surface to password recovery. No-op unless signed out.
    pub fn show_password_recovery(&mut self) -> bool {
        self.set_surface(SignInSurface::PasswordRecovery)
    }

    /// Return from password recovery to the sign-in form. No-op unless signed out.
    pub fn show_sign_in(&mut self) -> bool {
        self.set_surface(SignInSurface::SignIn)
    }

    /// Ask the provider to end the session and tell the user how it went.
    ///
    /// The view is not touched here; it follows the provider's `SignedOut`
    /// notification like any other change.
    pub async fn sign_out(&self, notifier: &dyn Notifier) {
        match self.provider.sign_out().await {
            Ok(()) => {
                tracing::info!("signed out");
                notifier.notify("Signed out", NotificationKind::Success);
            }
            Err(err) => {
                tracing::error!(error = %err, "sign-out failed");
                notifier.notify(&format!("Sign out failed: {err}"), NotificationKind::Error);
            }
        }
    }

    /// Release the subscription.
    pub fn deactivate(self) {
        tracing::debug!(subscription_id = self.subscription.id(), "session gate deactivated");
    }

    fn set_surface(&mut self, surface: SignInSurface) -> bool {
        match &mut self.view {
            AccessView::Unauthenticated(current) => {
                *current = surface;
                true
            }
            _ => false,
        }
    }

    fn apply_change(&mut self, change: AuthStateChange) {
        tracing::debug!(event = ?change.event, "auth state changed");
        self.apply_session(change.session);
    }

    fn apply_session(&mut self, session: Option<Session>) {
        let next = match session {
            Some(session) => AccessView::Authenticated(session),
            // A repeated sign-out keeps whichever sign-in surface is showing.
            None => match self.view {
                AccessView::Unauthenticated(surface) => AccessView::Unauthenticated(surface),
                _ => AccessView::Unauthenticated(SignInSurface::SignIn),
            },
        };

        if next.label() != self.view.label() {
            tracing::info!(from = self.view.label(), to = next.label(), "access view changed");
        }
        self.view = next;
    }
}
