//! Template merge: sanitized body, escaped merge values.
//!
//! Placeholders are `{{key}}` with the key matched literally. Values are
//! substituted in one pass over the sanitized body, so a value that happens to
//! contain another `{{key}}` is never expanded.
//!
//! Keys are normalized the way the body's text is (`&` and `>` escaped), so
//! `{{a&b}}` is filled by the key `a&b`. A key containing `<` cannot match: the
//! sanitizer reads `<` followed by a letter as the start of a tag.

use std::collections::BTreeMap;

use crate::escape::escape_text;
use crate::input::TextInput;
use crate::sanitize::{normalize_text, sanitize_markup};

/// Sanitize `content`, then replace every `{{key}}` with the escaped value.
///
/// When a key appears more than once in `values`, the last value wins. Keys
/// with no placeholder are ignored; placeholders with no key are left as-is.
/// A `style` attribute that becomes unsafe once its placeholders are filled is
/// dropped.
pub fn merge_template<K, V>(
    content: impl TextInput,
    values: impl IntoIterator<Item = (K, V)>,
) -> String
where
    K: AsRef<str>,
    V: TextInput,
{
    let sanitized = sanitize_markup(content);

    let by_token: BTreeMap<String, String> = values
        .into_iter()
        .map(|(key, value)| (placeholder_token(key.as_ref()), escape_text(value)))
        .collect();
    if by_token.is_empty() {
        return sanitized;
    }

    // Longest token first, so a key containing "}}" is not shadowed by its prefix.
    let mut tokens: Vec<(&str, &str)> = by_token
        .iter()
        .map(|(token, value)| (token.as_str(), value.as_str()))
        .collect();
    tokens.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

    let mut out = String::with_capacity(sanitized.len());
    let mut rest = sanitized.as_str();
    while let Some(offset) = rest.find("{{") {
        out.push_str(&rest[..offset]);
        let candidate = &rest[offset..];
        match tokens.iter().find(|(token, _)| candidate.starts_with(token)) {
            Some((token, value)) => {
                out.push_str(value);
                rest = &candidate[token.len()..];
            }
            None => {
                out.push('{');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);

    // Escaped values cannot open tags, but they can complete a style
    // declaration; the second pass drops styles that became unsafe.
    sanitize_markup(out)
}

fn placeholder_token(key: &str) -> String {
    format!("{{{{{}}}}}", normalize_text(key))
}

/// Distinct placeholder keys in the sanitized `content`, in order of first
/// appearance. These are exactly the keys [`merge_template`] can fill.
pub fn placeholders(content: impl TextInput) -> Vec<String> {
    let sanitized = sanitize_markup(content);
    let mut keys: Vec<String> = Vec::new();

    let mut rest = sanitized.as_str();
    while let Some(offset) = rest.find("{{") {
        let after_open = &rest[offset + 2..];
        match after_open.find("}}") {
            Some(close) => {
                let key = &after_open[..close];
                if !key.is_empty() && !key.contains(['{', '}']) {
                    if !keys.iter().any(|k| k == key) {
                        keys.push(key.to_string());
                    }
                    rest = &after_open[close + 2..];
                } else {
                    rest = &rest[offset + 1..];
                }
            }
            None => break,
        }
    }
    keys
}

/// Placeholder keys in `content` that `keys` does not cover.
pub fn missing_values<K>(content: impl TextInput, keys: impl IntoIterator<Item = K>) -> Vec<String>
where
    K: AsRef<str>,
{
    let provided: Vec<K> = keys.into_iter().collect();
    placeholders(content)
        .into_iter()
        .filter(|key| {
            !provided
                .iter()
                .any(|k| k.as_ref() == key.as_str() || normalize_text(k.as_ref()) == *key)
        })
        .collect()
}
