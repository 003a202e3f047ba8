use serde_json::Value;

/// Trim a string and escape HTML metacharacters
///
/// Escapes `&`, `<`, `>`, `"`, `'`, `/`, `\`, backtick and `:`. Escaping the
/// colon keeps a URL scheme such as `javascript:` from surviving as a
/// prefix of the escaped text. It also rewrites times and ISO dates:
/// `2024-05-01T10:30:00Z` becomes `2024-05-01T10&#x3A;30&#x3A;00Z`.
///
/// Not idempotent: `&` becomes `&amp;`, and a second pass turns that into
/// `&amp;amp;`. A value must cross this function exactly once.
pub fn sanitize_string(input: &str) -> String {
    let trimmed = input.trim();
    let mut escaped = String::with_capacity(trimmed.len());

    for ch in trimmed.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '/' => escaped.push_str("&#x2F;"),
            '\\' => escaped.push_str("&#x5C;"),
            '`' => escaped.push_str("&#96;"),
            ':' => escaped.push_str("&#x3A;"),
            other => escaped.push(other),
        }
    }

    escaped
}

/// Escape a JSON string leaf, returning any other value unchanged
///
/// Non-string input is neither coerced nor rejected.
pub fn sanitize_string_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_string(s)),
        other => other.clone(),
    }
}
