//! `ledgerdesk-content` — safe rendering of user-authored text.
//!
//! - [`sanitize_markup`]: rich text through a fixed allow-list.
//! - [`escape_text`]: plain text for literal display.
//! - [`merge_template`]: sanitized template body with escaped merge values.
//!
//! Everything here is pure and synchronous. The only shared state is the
//! immutable [`SanitizationPolicy::global`].

pub mod escape;
pub mod input;
pub mod policy;
pub mod sanitize;
pub mod template;

pub use escape::escape_text;
pub use input::TextInput;
pub use policy::SanitizationPolicy;
pub use sanitize::{sanitize_markup, sanitize_with};
pub use template::{merge_template, missing_values, placeholders};
