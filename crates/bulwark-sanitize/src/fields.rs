use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::escape::sanitize_string;

/// Normalize an email address
///
/// Trims, lowercases and strips angle brackets. This does not check that the
/// result is a syntactically valid address.
pub fn sanitize_email(input: &str) -> String {
    input.trim().to_lowercase().replace(['<', '>'], "")
}

/// Canonicalize an `http`/`https` URL, escaping anything else as text
///
/// Values that fail to parse and values with any other scheme both fall
/// back to [`sanitize_string`]; the result does not say which path ran.
pub fn sanitize_url(input: &str) -> String {
    match Url::parse(input.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url.into(),
        _ => sanitize_string(input),
    }
}

/// Check for the `8-4-4-4-12` hex grouping of a UUID
///
/// Any version and variant is accepted, in either letter case.
pub fn is_valid_uuid(input: &str) -> bool {
    fn re() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| {
            Regex::new(r"^(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
                .expect("must be valid regex")
        })
    }

    re().is_match(input)
}
