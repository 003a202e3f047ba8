use std::net::SocketAddr;

use http::HeaderMap;
use serde::Serialize;

/// Identity inserted into request extensions by an upstream auth layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: String,
}

/// Request details attached to every error and warning record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestMeta {
    /// Path and query as received
    pub url: String,
    pub method: String,
    /// Client address, proxy headers first, then the socket peer
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    /// Set when an [`AuthenticatedUser`] extension is present
    pub user_id: Option<String>,
}

impl RequestMeta {
    /// Capture metadata from a request before it reaches any handler
    pub fn from_request<B>(request: &http::Request<B>, peer: Option<SocketAddr>) -> Self {
        let headers = request.headers();

        let url = request
            .uri()
            .path_and_query()
            .map_or_else(|| request.uri().path().to_owned(), ToString::to_string);

        Self {
            url,
            method: request.method().to_string(),
            ip: client_ip(headers).or_else(|| peer.map(|addr| addr.ip().to_string())),
            user_agent: header_str(headers, http::header::USER_AGENT.as_str()),
            user_id: request
                .extensions()
                .get::<AuthenticatedUser>()
                .map(|user| user.id.clone()),
        }
    }
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    // X-Forwarded-For lists the originating client first
    if let Some(forwarded) = header_str(headers, "x-forwarded-for")
        && let Some(first) = forwarded.split(',').next()
        && !first.trim().is_empty()
    {
        return Some(first.trim().to_owned());
    }

    header_str(headers, "x-real-ip").map(|ip| ip.trim().to_owned())
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned)
}
