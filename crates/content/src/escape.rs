//! Plain-text escaping.

use crate::input::TextInput;

/// Escape `& < > " '` for literal display in markup.
///
/// Single left-to-right pass: entities produced here are never re-escaped.
pub fn escape_text(input: impl TextInput) -> String {
    let text = input.as_text();
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
