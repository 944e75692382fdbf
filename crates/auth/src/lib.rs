//! `ledgerdesk-auth` — session-gated access control for the dashboard.
//!
//! Two decision points live here:
//!
//! - [`SessionGate`] decides between the loading surface, the sign-in surface
//!   and the protected children, following the identity provider's live
//!   auth-state notifications.
//! - [`RoleGuard`] resolves the signed-in user's [`Role`] from the role store
//!   and answers `has_role` for role-restricted regions.
//!
//! [`AccessControl`] drives both from one subscription and refetches the role
//! for every auth-state change it applies.
//!
//! Neither decision point surfaces errors to the rendering layer: every failure
//! degrades to the signed-out view or the minimum-privilege role.
//!
//! This crate is decoupled from any concrete identity service; collaborators
//! are reached through the traits in [`provider`].

pub mod access;
pub mod gate;
pub mod guard;
pub mod memory;
pub mod provider;
pub mod roles;
pub mod session;
pub mod subscription;

pub use access::AccessControl;
pub use gate::{AccessView, SessionGate, SignInSurface};
pub use guard::{RoleGuard, RoleSnapshot};
pub use memory::{InMemoryIdentityProvider, InMemoryRoleStore, RecordingNotifier};
pub use provider::{
    AuthError, IdentityProvider, NotificationKind, Notifier, RoleLookupError, RoleStore,
};
pub use roles::{Role, RoleParseError, RoleRequirement};
pub use session::{AuthEvent, AuthStateChange, Session};
pub use subscription::{AuthSubscription, SubscriberRegistry, Subscription};
