//! The fixed allow-list governing which markup survives sanitization.

use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Allow/deny configuration for [`crate::sanitize_with`].
///
/// Tag and attribute names are lower-case. The process-wide instance is
/// built once by [`SanitizationPolicy::global`] and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizationPolicy {
    pub allowed_tags: BTreeSet<&'static str>,
    pub allowed_attributes: BTreeSet<&'static str>,
    /// Removed together with everything inside them.
    pub forbidden_tags: BTreeSet<&'static str>,
    pub forbidden_attributes: BTreeSet<&'static str>,
    /// Keep the inner text of stripped (not forbidden) tags.
    pub keep_content: bool,
}

const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "div", "span", "b", "i", "u", "strong", "em", "ul", "ol", "li", "table", "tr",
    "td", "th", "thead", "tbody", "h1", "h2", "h3", "h4", "h5", "h6",
];

const ALLOWED_ATTRIBUTES: &[&str] = &["style", "class"];

const FORBIDDEN_TAGS: &[&str] = &[
    "script", "object", "embed", "iframe", "form", "input", "textarea",
    // Never-rendered or foreign-content containers: their text is not prose.
    "style", "noscript", "template", "title", "svg", "math", "xmp", "noembed", "noframes",
];

const FORBIDDEN_ATTRIBUTES: &[&str] = &[
    "onclick",
    "onerror",
    "onload",
    "onmouseover",
    "onfocus",
    "onblur",
    "onchange",
    "onsubmit",
];

/// Elements whose content is raw text up to the matching end tag.
const RAW_TEXT_TAGS: &[&str] = &[
    "script", "style", "textarea", "title", "xmp", "iframe", "noembed", "noframes", "noscript",
];

/// Elements that never have content or an end tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

static GLOBAL: OnceLock<SanitizationPolicy> = OnceLock::new();

impl SanitizationPolicy {
    pub fn default_policy() -> Self {
        Self {
            allowed_tags: ALLOWED_TAGS.iter().copied().collect(),
            allowed_attributes: ALLOWED_ATTRIBUTES.iter().copied().collect(),
            forbidden_tags: FORBIDDEN_TAGS.iter().copied().collect(),
            forbidden_attributes: FORBIDDEN_ATTRIBUTES.iter().copied().collect(),
            keep_content: true,
        }
    }

    /// The process-wide policy used by [`crate::sanitize_markup`].
    pub fn global() -> &'static SanitizationPolicy {
        GLOBAL.get_or_init(Self::default_policy)
    }

    pub fn allows_tag(&self, tag: &str) -> bool {
        self.allowed_tags.contains(tag) && !self.forbidden_tags.contains(tag)
    }

    pub fn forbids_tag(&self, tag: &str) -> bool {
        self.forbidden_tags.contains(tag)
    }

    /// Event handlers and `data-*` are rejected even if allow-listed.
    pub fn allows_attribute(&self, name: &str) -> bool {
        self.allowed_attributes.contains(name)
            && !self.forbidden_attributes.contains(name)
            && !name.starts_with("on")
            && !name.starts_with("data-")
    }

    pub(crate) fn is_raw_text(tag: &str) -> bool {
        RAW_TEXT_TAGS.contains(&tag)
    }

    pub(crate) fn is_void(tag: &str) -> bool {
        VOID_TAGS.contains(&tag)
    }
}

impl Default for SanitizationPolicy {
    fn default() -> Self {
        Self::default_policy()
    }
}
