//! Domain error model.

use thiserror::Error;

/// Domain-level error.
///
/// Transport failures of the identity provider or role store have their own
/// error types in `ledgerdesk-auth`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_the_identifier() {
        assert_eq!(DomainError::invalid_id("UserId").to_string(), "invalid identifier: UserId");
    }
}
