use serde::Deserialize;

use crate::error::{ApiError, FieldErrors, messages};

const UNKNOWN_FIELD: &str = "unknown";

/// One failed check reported by an external validator
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FieldFailure {
    /// Path segments to the offending field, e.g. `["address", "zip"]`
    #[serde(default)]
    pub path: Option<Vec<String>>,
    #[serde(default)]
    pub message: Option<String>,
}

impl FieldFailure {
    pub fn new<I, S>(path: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: Some(path.into_iter().map(Into::into).collect()),
            message: Some(message.into()),
        }
    }
}

/// Request extension carrying the validator's findings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationFailures(pub Vec<FieldFailure>);

/// Turn validator findings into a [`ApiError`] of kind `Validation`
///
/// Paths are joined with `.`; a missing or empty path is reported under
/// `"unknown"` and a missing message becomes `"Validation failed"`. When a
/// path repeats, the later message replaces the earlier one in place.
///
/// # Errors
///
/// Returns the validation error when `failures` is non-empty
pub fn check_validation(failures: &[FieldFailure]) -> Result<(), ApiError> {
    if failures.is_empty() {
        return Ok(());
    }

    let mut fields = FieldErrors::with_capacity(failures.len());
    for failure in failures {
        let key = match failure.path.as_deref() {
            Some(segments) if !segments.is_empty() => segments.join("."),
            _ => UNKNOWN_FIELD.to_owned(),
        };
        let message = failure.message.as_deref().unwrap_or(messages::VALIDATION);

        fields.insert(key, message.to_owned());
    }

    Err(ApiError::validation(messages::VALIDATION, Some(fields)))
}
