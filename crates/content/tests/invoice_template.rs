//! Merging a user-authored invoice template with form data.

use serde_json::json;

use ledgerdesk_content::{
    escape_text, merge_template, missing_values, placeholders, sanitize_markup,
};

const TEMPLATE: &str = r#"<h2 class="title">Invoice {{number}}</h2>
<p>Dear {{customer}},</p>
<p onmouseover="steal()">Amount due: <b>{{amount}}</b></p>
<iframe src="https://evil.example">{{customer}}</iframe>
<table><tr><td>{{memo}}</td></tr></table>"#;

#[test]
fn merges_json_form_payload() {
    ledgerdesk_observability::init();

    let payload = json!({
        "number": "INV-0042",
        "customer": "O'Brien & Sons",
        "amount": 1250,
        "memo": "<script>alert('x')</script>",
    });
    let values = payload.as_object().expect("object payload");

    let merged = merge_template(TEMPLATE, values.iter());

    assert!(merged.contains(r#"<h2 class="title">Invoice INV-0042</h2>"#));
    assert!(merged.contains("<p>Dear O&#39;Brien &amp; Sons,</p>"));
    // Non-string values render empty.
    assert!(merged.contains("<p>Amount due: <b></b></p>"));
    assert!(merged.contains("<td>&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;</td>"));
    assert!(!merged.contains("iframe"));
    assert!(!merged.contains("onmouseover"));
}

#[test]
fn editor_can_list_and_check_merge_fields() {
    ledgerdesk_observability::init();

    assert_eq!(
        placeholders(TEMPLATE),
        vec!["number", "customer", "amount", "memo"]
    );
    assert_eq!(
        missing_values(TEMPLATE, ["number", "customer"]),
        vec!["amount", "memo"]
    );
}

#[test]
fn rendering_helpers_agree_on_plain_text() {
    ledgerdesk_observability::init();

    let name = "Tom & Jerry <LLC>";
    assert_eq!(sanitize_markup(escape_text(name)), escape_text(name));
}
