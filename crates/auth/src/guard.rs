//! Role-level guard.
//!
//! Resolves the signed-in user's role from the [`RoleStore`] and answers
//! "does the user rank at least R?" for role-restricted regions.
//!
//! Every fetch takes a ticket keyed to the session that triggered it. When a
//! lookup resolves, its result is applied only if that ticket is still the
//! current one; a slow lookup for a previous session is discarded. Lookup
//! failures and missing records both resolve to [`Role::DEFAULT`].

use std::sync::{Mutex, PoisonError};

use ledgerdesk_core::SessionId;

use crate::gate::SessionGate;
use crate::provider::{IdentityProvider, RoleStore};
use crate::roles::{Role, RoleRequirement};
use crate::session::Session;

/// Point-in-time view of the guard.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RoleSnapshot {
    pub role: Option<Role>,
    pub loading: bool,
}

#[derive(Debug)]
struct RoleState {
    ticket: u64,
    session: Option<SessionId>,
    role: Option<Role>,
    loading: bool,
}

impl RoleState {
    fn snapshot(&self) -> RoleSnapshot {
        RoleSnapshot {
            role: self.role,
            loading: self.loading,
        }
    }
}

pub struct RoleGuard<S: RoleStore> {
    store: S,
    state: Mutex<RoleState>,
}

impl<S: RoleStore> RoleGuard<S> {
    /// A fresh guard is loading until its first fetch completes.
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: Mutex::new(RoleState {
                ticket: 0,
                session: None,
                role: None,
                loading: true,
            }),
        }
    }

    /// Resolve the role for `session`.
    ///
    /// - No session: role is cleared and loading ends immediately.
    /// - Record found: that role.
    /// - No record, unknown record, or lookup failure: [`Role::DEFAULT`].
    ///
    /// Returns the guard's snapshot after this fetch settles, which is the
    /// newer session's state if this fetch went stale.
    pub async fn fetch_role(&self, session: Option<&Session>) -> RoleSnapshot {
        let Some(session) = session else {
            let mut state = self.lock();
            state.ticket += 1;
            state.session = None;
            state.role = None;
            state.loading = false;
            return state.snapshot();
        };

        let ticket = {
            let mut state = self.lock();
            state.ticket += 1;
            if state.session != Some(session.id) {
                state.role = None;
            }
            state.session = Some(session.id);
            state.loading = true;
            state.ticket
        };

        let resolved = match self.store.lookup_role(session.user_id).await {
            Ok(Some(role)) => role,
            Ok(None) => {
                tracing::debug!(user_id = %session.user_id, "no role record; using default role");
                Role::DEFAULT
            }
            Err(err) => {
                tracing::warn!(
                    user_id = %session.user_id,
                    error = %err,
                    "role lookup failed; using default role"
                );
                Role::DEFAULT
            }
        };

        let mut state = self.lock();
        if state.ticket != ticket || state.session != Some(session.id) {
            tracing::debug!(session_id = %session.id, "discarding stale role lookup");
            return state.snapshot();
        }

        state.role = Some(resolved);
        state.loading = false;
        tracing::debug!(session_id = %session.id, role = %resolved, "role resolved");
        state.snapshot()
    }

    /// Re-run the fetch for whatever session `gate` currently shows.
    pub async fn follow<P: IdentityProvider>(&self, gate: &SessionGate<P>) -> RoleSnapshot {
        self.fetch_role(gate.session()).await
    }

    /// True iff a role is resolved, not loading, and ranks at least `required`.
    pub fn has_role(&self, required: impl Into<RoleRequirement>) -> bool {
        let state = self.lock();
        !state.loading && required.into().is_satisfied_by(state.role)
    }

    /// `children` when `has_role(required)` holds, otherwise `fallback`.
    pub fn gate<T>(&self, required: impl Into<RoleRequirement>, children: T, fallback: T) -> T {
        if self.has_role(required) {
            children
        } else {
            fallback
        }
    }

    pub fn snapshot(&self) -> RoleSnapshot {
        self.lock().snapshot()
    }

    pub fn role(&self) -> Option<Role> {
        self.lock().role
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RoleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
