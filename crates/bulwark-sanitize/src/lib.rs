//! Sanitization engine for untrusted request input
//!
//! Every function here is pure: inputs are borrowed and a fresh value is
//! returned. String leaves are trimmed and HTML-escaped, HTML fragments are
//! rebuilt against an allow-list, and a handful of field normalizers cover
//! emails, URLs and UUIDs.

#![allow(clippy::must_use_candidate)]

mod error;
mod escape;
mod fields;
mod html;
mod value;

pub use error::SanitizeError;
pub use escape::{sanitize_string, sanitize_string_value};
pub use fields::{is_valid_uuid, sanitize_email, sanitize_url};
pub use html::{PolicyOverride, SanitizationPolicy, sanitize_html};
pub use value::{DEFAULT_MAX_DEPTH, sanitize_value, sanitize_value_with_depth};
