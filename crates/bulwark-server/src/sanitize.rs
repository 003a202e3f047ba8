use std::sync::Arc;

use axum::Json;
use axum::body::{Body, to_bytes};
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use bulwark_config::SanitizationConfig;
use bulwark_sanitize::{SanitizeError, sanitize_value_with_depth};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::uri::PathAndQuery;
use http::{HeaderMap, HeaderValue, StatusCode, Uri};
use serde_json::{Map, Value};
use thiserror::Error;
use url::form_urlencoded;

/// Limits applied while rewriting inbound payloads
#[derive(Debug, Clone, Copy)]
pub struct SanitizeSettings {
    pub max_depth: usize,
    pub body_limit: usize,
}

impl From<&SanitizationConfig> for SanitizeSettings {
    fn from(config: &SanitizationConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            body_limit: config.body_limit,
        }
    }
}

#[derive(Debug, Error)]
enum Rejection {
    #[error("Invalid request query")]
    Query { reason: String },
    #[error("Invalid request body")]
    Body { reason: String },
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let (Self::Query { reason } | Self::Body { reason }) = &self;
        tracing::debug!(%reason, "rejected inbound request: {self}");

        invalid_input(&self.to_string())
    }
}

/// `400 {"error": message}` sent when inbound data cannot be made safe
pub(crate) fn invalid_input(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Middleware escaping every string in the query and in JSON or form bodies
///
/// The rewritten request is forwarded; a request that cannot be rewritten
/// never reaches the handler.
pub async fn sanitize_middleware(settings: Arc<SanitizeSettings>, request: Request, next: Next) -> Response {
    match sanitize_request(&settings, request).await {
        Ok(request) => next.run(request).await,
        Err(rejection) => rejection.into_response(),
    }
}

async fn sanitize_request(settings: &SanitizeSettings, request: Request) -> Result<Request, Rejection> {
    let (mut parts, body) = request.into_parts();

    if let Some(query) = parts.uri.query() {
        let query =
            sanitize_urlencoded(query, settings.max_depth).map_err(|e| Rejection::Query { reason: e.to_string() })?;
        parts.uri = replace_query(&parts.uri, &query).map_err(|e| Rejection::Query { reason: e.to_string() })?;
    }

    let Some(kind) = body_kind(&parts.headers) else {
        return Ok(Request::from_parts(parts, body));
    };

    let bytes = to_bytes(body, settings.body_limit)
        .await
        .map_err(|e| Rejection::Body { reason: e.to_string() })?;

    if bytes.is_empty() {
        return Ok(Request::from_parts(parts, Body::empty()));
    }

    let rewritten = match kind {
        BodyKind::Json => {
            let payload: Value =
                serde_json::from_slice(&bytes).map_err(|e| Rejection::Body { reason: e.to_string() })?;
            let sanitized = sanitize_value_with_depth(&payload, settings.max_depth)
                .map_err(|e| Rejection::Body { reason: e.to_string() })?;
            serde_json::to_vec(&sanitized).map_err(|e| Rejection::Body { reason: e.to_string() })?
        }
        BodyKind::Form => {
            let form = std::str::from_utf8(&bytes).map_err(|e| Rejection::Body { reason: e.to_string() })?;
            sanitize_urlencoded(form, settings.max_depth)
                .map_err(|e| Rejection::Body { reason: e.to_string() })?
                .into_bytes()
        }
    };

    parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(rewritten.len()));

    Ok(Request::from_parts(parts, Body::from(rewritten)))
}

/// Escape every value of a query string or form body
///
/// Keys are kept verbatim, repeated keys keep all their values in order and
/// a bare key (`?flag`) stays bare.
fn sanitize_urlencoded(input: &str, max_depth: usize) -> Result<String, SanitizeError> {
    let mut params = Map::new();

    for segment in input.split('&').filter(|segment| !segment.is_empty()) {
        let Some((key, value)) = form_urlencoded::parse(segment.as_bytes()).next() else {
            continue;
        };
        // Null marks a key written without `=`
        let value = if segment.contains('=') {
            Value::String(value.into_owned())
        } else {
            Value::Null
        };

        match params.entry(key.into_owned()) {
            serde_json::map::Entry::Vacant(entry) => {
                entry.insert(value);
            }
            serde_json::map::Entry::Occupied(mut entry) => match entry.get_mut() {
                Value::Array(values) => values.push(value),
                existing => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            },
        }
    }

    let sanitized = sanitize_value_with_depth(&Value::Object(params), max_depth)?;

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if let Value::Object(params) = sanitized {
        for (key, value) in &params {
            let values = match value {
                Value::Array(values) => values.as_slice(),
                single => std::slice::from_ref(single),
            };
            for value in values {
                match value {
                    Value::String(value) => serializer.append_pair(key, value),
                    _ => serializer.append_key_only(key),
                };
            }
        }
    }

    Ok(serializer.finish())
}

fn replace_query(uri: &Uri, query: &str) -> Result<Uri, http::Error> {
    let path_and_query = if query.is_empty() {
        uri.path().to_owned()
    } else {
        format!("{}?{query}", uri.path())
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query)?);

    Ok(Uri::from_parts(parts)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
}

/// Bodies rewritten by the middleware: `application/json`, any
/// `application/*+json`, and `application/x-www-form-urlencoded`
fn body_kind(headers: &HeaderMap) -> Option<BodyKind> {
    let mime = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())?
        .trim()
        .to_ascii_lowercase();

    if mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json")) {
        Some(BodyKind::Json)
    } else if mime == "application/x-www-form-urlencoded" {
        Some(BodyKind::Form)
    } else {
        None
    }
}
