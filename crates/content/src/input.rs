//! Normalization of "maybe text" inputs.
//!
//! Callers hand over whatever they have: a `&str`, an optional field, or a
//! JSON value from a form payload. Absent and non-string values read as "".

use std::borrow::Cow;

pub trait TextInput {
    fn as_text(&self) -> &str;
}

impl TextInput for str {
    fn as_text(&self) -> &str {
        self
    }
}

impl TextInput for String {
    fn as_text(&self) -> &str {
        self
    }
}

impl TextInput for Cow<'_, str> {
    fn as_text(&self) -> &str {
        self
    }
}

impl<T: TextInput + ?Sized> TextInput for &T {
    fn as_text(&self) -> &str {
        (**self).as_text()
    }
}

impl<T: TextInput> TextInput for Option<T> {
    fn as_text(&self) -> &str {
        self.as_ref().map_or("", |value| value.as_text())
    }
}

impl TextInput for serde_json::Value {
    fn as_text(&self) -> &str {
        self.as_str().unwrap_or("")
    }
}
