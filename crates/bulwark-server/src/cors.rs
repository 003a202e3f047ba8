use std::str::FromStr;

use bulwark_config::CorsConfig;
use http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// CORS layer for the configured origins, methods and headers
///
/// A `"*"` entry allows anything for its list. Credentials are only sent
/// with explicit lists; combined with a wildcard they are dropped with a
/// warning, since browsers refuse that pairing.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let wildcard = [&config.origins, &config.methods, &config.headers]
        .into_iter()
        .any(|list| CorsConfig::is_any(list));

    let credentials = config.credentials && !wildcard;
    if config.credentials && wildcard {
        tracing::warn!("CORS credentials disabled: a wildcard origin, method or header is configured");
    }

    let layer = CorsLayer::new()
        .allow_origin(allowed_origins(&config.origins))
        .allow_methods(allowed_methods(&config.methods))
        .allow_headers(allowed_headers(&config.headers))
        .allow_credentials(credentials);

    match config.max_age_duration() {
        Some(max_age) => layer.max_age(max_age),
        None => layer,
    }
}

fn allowed_origins(origins: &[String]) -> AllowOrigin {
    if CorsConfig::is_any(origins) {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(parse_entries::<HeaderValue>("origin", origins))
    }
}

fn allowed_methods(methods: &[String]) -> AllowMethods {
    if CorsConfig::is_any(methods) {
        AllowMethods::any()
    } else {
        AllowMethods::list(parse_entries::<Method>("method", methods))
    }
}

fn allowed_headers(headers: &[String]) -> AllowHeaders {
    if CorsConfig::is_any(headers) {
        AllowHeaders::any()
    } else {
        AllowHeaders::list(parse_entries::<HeaderName>("header", headers))
    }
}

/// Entries that fail to parse are skipped
fn parse_entries<T: FromStr>(kind: &'static str, entries: &[String]) -> Vec<T> {
    entries
        .iter()
        .filter_map(|entry| {
            let parsed = entry.trim().parse().ok();
            if parsed.is_none() {
                tracing::warn!(kind, entry = %entry, "ignoring invalid CORS entry");
            }
            parsed
        })
        .collect()
}
