//! `ledgerdesk-core` — shared identifiers and the domain error model.
//!
//! This crate has no IO and no async; the auth crate builds on it.

pub mod error;
pub mod id;

pub use error::DomainError;
pub use id::{SessionId, UserId};
