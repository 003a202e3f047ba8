use axum::extract::{FromRequestParts, RawPathParams};
use axum::response::Response;
use bulwark_sanitize::sanitize_string;
use http::request::Parts;
use indexmap::IndexMap;

use crate::sanitize::invalid_input;

/// Path parameters with every value escaped, in route order
///
/// ```ignore
/// async fn show(params: SanitizedParams) -> Result<String, Thrown> {
///     let id = params.get("id").unwrap_or_default();
///     ...
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizedParams(pub IndexMap<String, String>);

impl SanitizedParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl<S> FromRequestParts<S> for SanitizedParams
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let raw = RawPathParams::from_request_parts(parts, state).await.map_err(|rejection| {
            tracing::debug!(error = %rejection, "rejected request params");
            invalid_input("Invalid request params")
        })?;

        Ok(Self(
            raw.iter()
                .map(|(name, value)| (name.to_owned(), sanitize_string(value)))
                .collect(),
        ))
    }
}
