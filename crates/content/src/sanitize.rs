//! Allow-list markup sanitizer.
//!
//! A single forward scan over the input. Text is normalized (bare `&`, `<`,
//! `>` escaped; existing character references kept), allowed tags are
//! re-emitted in canonical form with only allowed attributes, every other tag
//! is stripped, and forbidden elements are skipped together with their
//! content. Allowed elements are kept properly nested: an end tag closes any
//! elements still open inside it, stray end tags are dropped, and anything
//! still open at the end is closed.
//!
//! The output is itself valid input that sanitizes to the same bytes.

use crate::input::TextInput;
use crate::policy::SanitizationPolicy;

/// Sanitize untrusted rich text with the process-wide policy.
pub fn sanitize_markup(input: impl TextInput) -> String {
    sanitize_with(SanitizationPolicy::global(), input.as_text())
}

/// Sanitize `input` with an explicit policy.
pub fn sanitize_with(policy: &SanitizationPolicy, input: &str) -> String {
    let sanitizer = Sanitizer {
        policy,
        input,
        pos: 0,
        out: String::with_capacity(input.len()),
        open: Vec::new(),
        removed: 0,
    };
    sanitizer.run()
}

struct Tag {
    name: String,
    attrs: Vec<(String, String)>,
    /// Byte offset just past the closing `>`.
    end: usize,
}

struct Sanitizer<'a> {
    policy: &'a SanitizationPolicy,
    input: &'a str,
    pos: usize,
    out: String,
    open: Vec<String>,
    removed: usize,
}

impl Sanitizer<'_> {
    fn run(mut self) -> String {
        let input = self.input;
        while self.pos < input.len() {
            let rest = &input[self.pos..];
            match rest.find('<') {
                Some(offset) => {
                    push_normalized(&mut self.out, &rest[..offset], false);
                    self.pos += offset;
                    self.markup();
                }
                None => {
                    push_normalized(&mut self.out, rest, false);
                    self.pos = input.len();
                }
            }
        }

        while let Some(name) = self.open.pop() {
            push_end_tag(&mut self.out, &name);
        }

        if self.removed > 0 {
            tracing::debug!(removed = self.removed, "stripped disallowed markup");
        }
        self.out
    }

    /// Handle the construct starting at the `<` under `self.pos`.
    fn markup(&mut self) {
        let input = self.input;
        let bytes = input.as_bytes();
        let at = self.pos;
        let rest = &input[at..];

        if rest.starts_with("<!--") {
            self.removed += 1;
            self.pos = comment_end(input, at);
            return;
        }

        if rest.starts_with("<!") || rest.starts_with("<?") {
            self.removed += 1;
            self.pos = skip_past_gt(input, at + 2);
            return;
        }

        if rest.starts_with("</") {
            match bytes.get(at + 2) {
                Some(b) if b.is_ascii_alphabetic() => match parse_tag(input, at + 2) {
                    Some(tag) => {
                        self.pos = tag.end;
                        self.end_tag(&tag.name);
                    }
                    None => self.pos = input.len(),
                },
                Some(b'>') => self.pos = at + 3,
                Some(_) => {
                    self.removed += 1;
                    self.pos = skip_past_gt(input, at + 2);
                }
                None => {
                    self.out.push_str("&lt;/");
                    self.pos = input.len();
                }
            }
            return;
        }

        match bytes.get(at + 1) {
            Some(b) if b.is_ascii_alphabetic() => match parse_tag(input, at + 1) {
                Some(tag) => {
                    self.pos = tag.end;
                    self.start_tag(tag);
                }
                // Unterminated tag at end of input.
                None => self.pos = input.len(),
            },
            _ => {
                self.out.push_str("&lt;");
                self.pos = at + 1;
            }
        }
    }

    fn start_tag(&mut self, tag: Tag) {
        if self.policy.allows_tag(&tag.name) {
            self.emit_start_tag(&tag);
            if !SanitizationPolicy::is_void(&tag.name) {
                self.open.push(tag.name);
            }
            return;
        }

        self.removed += 1;
        let drop_content = self.policy.forbids_tag(&tag.name) || !self.policy.keep_content;
        if !drop_content || SanitizationPolicy::is_void(&tag.name) {
            return;
        }

        self.pos = if SanitizationPolicy::is_raw_text(&tag.name) {
            skip_raw_text(self.input, &tag.name, self.pos)
        } else {
            skip_element(self.input, &tag.name, self.pos)
        };
    }

    fn end_tag(&mut self, name: &str) {
        let position = if self.policy.allows_tag(name) && !SanitizationPolicy::is_void(name) {
            self.open.iter().rposition(|open| open == name)
        } else {
            None
        };

        let Some(index) = position else {
            self.removed += 1;
            return;
        };

        while self.open.len() > index {
            if let Some(open) = self.open.pop() {
                push_end_tag(&mut self.out, &open);
            }
        }
    }

    fn emit_start_tag(&mut self, tag: &Tag) {
        self.out.push('<');
        self.out.push_str(&tag.name);

        // First occurrence of an attribute name wins, kept or not.
        let mut seen: Vec<&str> = Vec::with_capacity(tag.attrs.len());
        for (name, raw) in &tag.attrs {
            if seen.contains(&name.as_str()) {
                continue;
            }
            seen.push(name);

            if !self.policy.allows_attribute(name) {
                self.removed += 1;
                continue;
            }

            let mut value = String::with_capacity(raw.len());
            push_normalized(&mut value, raw, true);
            if name == "style" && !is_safe_style(&value) {
                self.removed += 1;
                continue;
            }

            self.out.push(' ');
            self.out.push_str(name);
            self.out.push_str("=\"");
            self.out.push_str(&value);
            self.out.push('"');
        }

        self.out.push('>');
    }
}

fn push_end_tag(out: &mut String, name: &str) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn is_tag_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'/' || b == b'>'
}

/// Parse a start or end tag whose name begins at `start`.
///
/// `None` when the input ends before the closing `>`.
fn parse_tag(input: &str, start: usize) -> Option<Tag> {
    let bytes = input.as_bytes();
    let len = bytes.len();

    let mut i = start;
    while i < len && !is_tag_delimiter(bytes[i]) {
        i += 1;
    }
    let name = input[start..i].to_ascii_lowercase();

    let mut attrs = Vec::new();
    loop {
        while i < len && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        if i >= len {
            return None;
        }
        if bytes[i] == b'>' {
            return Some(Tag {
                name,
                attrs,
                end: i + 1,
            });
        }

        // A leading '=' belongs to the attribute name.
        let name_start = i;
        i += 1;
        while i < len && !is_tag_delimiter(bytes[i]) && bytes[i] != b'=' {
            i += 1;
        }
        let attr_name = input[name_start..i].to_ascii_lowercase();

        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let mut value = "";
        if i < len && bytes[i] == b'=' {
            i += 1;
            while i < len && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i < len && (bytes[i] == b'"' || bytes[i] == b'\'') {
                let quote = bytes[i];
                let value_start = i + 1;
                let close = bytes[value_start..].iter().position(|&b| b == quote)?;
                value = &input[value_start..value_start + close];
                i = value_start + close + 1;
            } else {
                let value_start = i;
                while i < len && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                value = &input[value_start..i];
            }
        }

        attrs.push((attr_name, value.to_string()));
    }
}

/// End of the comment opened by the `<!--` at `at`. `<!-->` and `<!--->` are
/// complete empty comments.
fn comment_end(input: &str, at: usize) -> usize {
    let body = &input[at + 4..];
    if body.starts_with('>') {
        return at + 5;
    }
    if body.starts_with("->") {
        return at + 6;
    }
    body.find("-->").map_or(input.len(), |end| at + 4 + end + 3)
}

fn skip_past_gt(input: &str, from: usize) -> usize {
    input[from..]
        .find('>')
        .map_or(input.len(), |offset| from + offset + 1)
}

/// Skip raw-text content up to and including `</name>`.
fn skip_raw_text(input: &str, name: &str, from: usize) -> usize {
    let haystack = input[from..].to_ascii_lowercase();
    let needle = format!("</{name}");
    let bytes = haystack.as_bytes();

    let mut search = 0;
    while let Some(offset) = haystack[search..].find(&needle) {
        let at = search + offset;
        let after = at + needle.len();
        match bytes.get(after) {
            None => return input.len(),
            Some(&b) if is_tag_delimiter(b) => return skip_past_gt(input, from + after),
            Some(_) => search = after,
        }
    }
    input.len()
}

/// Skip a normal element's content up to its matching end tag, counting
/// nested elements of the same name.
fn skip_element(input: &str, name: &str, from: usize) -> usize {
    let bytes = input.as_bytes();
    let mut depth = 1usize;
    let mut i = from;

    while let Some(offset) = input[i..].find('<') {
        let at = i + offset;
        let rest = &input[at..];

        if rest.starts_with("<!--") {
            i = comment_end(input, at);
            continue;
        }

        let (closing, name_at) = if rest.starts_with("</") {
            (true, at + 2)
        } else {
            (false, at + 1)
        };

        if !bytes.get(name_at).is_some_and(u8::is_ascii_alphabetic) {
            i = at + 1;
            continue;
        }

        let Some(tag) = parse_tag(input, name_at) else {
            return input.len();
        };
        if tag.name == name {
            if closing {
                depth -= 1;
                if depth == 0 {
                    return tag.end;
                }
            } else {
                depth += 1;
            }
        }
        i = tag.end;
    }
    input.len()
}

/// Length of a character reference (`&name;`, `&#123;`, `&#x1F;`) at the
/// start of `s`, if there is one.
fn reference_len(s: &str) -> Option<usize> {
    let b = s.as_bytes();
    if b.first() != Some(&b'&') {
        return None;
    }

    if b.get(1) == Some(&b'#') {
        let hex = matches!(b.get(2), Some(b'x' | b'X'));
        let (start, max) = if hex { (3, 6) } else { (2, 7) };
        let digits = b
            .get(start..)
            .unwrap_or(&[])
            .iter()
            .take_while(|d| if hex { d.is_ascii_hexdigit() } else { d.is_ascii_digit() })
            .count();
        if digits == 0 || digits > max || b.get(start + digits) != Some(&b';') {
            return None;
        }
        return Some(start + digits + 1);
    }

    if !b.get(1).is_some_and(u8::is_ascii_alphabetic) {
        return None;
    }
    let name_len = b[1..].iter().take_while(|c| c.is_ascii_alphanumeric()).count();
    if name_len > 31 || b.get(1 + name_len) != Some(&b';') {
        return None;
    }
    Some(name_len + 2)
}

/// `text` as it reads once normalized outside of a tag.
pub(crate) fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_normalized(&mut out, text, false);
    out
}

/// Append `text` with bare `&`, `<`, `>` (and `"` inside attribute values)
/// escaped. Existing character references are kept; NULs are dropped.
fn push_normalized(out: &mut String, text: &str, attribute: bool) {
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        let Some(c) = rest.chars().next() else {
            break;
        };
        match c {
            '&' => match reference_len(rest) {
                Some(n) => {
                    out.push_str(&rest[..n]);
                    i += n;
                    continue;
                }
                None => out.push_str("&amp;"),
            },
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\0' => {}
            _ => out.push(c),
        }
        i += c.len_utf8();
    }
}

const UNSAFE_STYLE_PATTERNS: &[&str] = &[
    "expression(",
    "javascript:",
    "vbscript:",
    "url(",
    "behavior:",
    "-moz-binding",
    "@import",
    // Character references could spell any of the above once decoded.
    "&",
];

/// Inline styles may not load resources or run script.
fn is_safe_style(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\\')
        .flat_map(char::to_lowercase)
        .collect();
    !UNSAFE_STYLE_PATTERNS.iter().any(|p| compact.contains(p))
}
