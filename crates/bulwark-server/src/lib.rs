#![allow(clippy::must_use_candidate)]

mod boundary;
mod cors;
mod error_handler;
mod health;
mod params;
mod sanitize;
mod sink;
mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Request;
use axum::{Extension, Router};
use bulwark_config::Config;
use bulwark_core::RequestMeta;
use bulwark_sanitize::SanitizationPolicy;
use tower_http::trace::TraceLayer;

pub use boundary::{Thrown, catch_async, error_boundary};
pub use error_handler::{ErrorBody, ErrorEnvelope, ErrorHandler};
pub use params::SanitizedParams;
pub use sanitize::{SanitizeSettings, sanitize_middleware};
pub use sink::{LogContext, LogSink, TracingSink};
pub use validation::validation_middleware;

/// Assembled server: business routes behind the request-safety pipeline
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration, logging through `tracing`
    pub fn new(config: &Config, routes: Router) -> Self {
        Self::with_sink(config, routes, Arc::new(TracingSink))
    }

    /// Build the server with a custom log sink
    ///
    /// Handlers may read the configured HTML policy as
    /// `Extension<Arc<SanitizationPolicy>>`.
    pub fn with_sink(config: &Config, routes: Router, sink: Arc<dyn LogSink>) -> Self {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let handler = Arc::new(ErrorHandler::new(sink, config.environment));
        let settings = Arc::new(SanitizeSettings::from(&config.sanitization));
        let policy = Arc::new(SanitizationPolicy::merged(&config.sanitization.html));

        let mut app = routes;

        // Health check
        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health::health_handler));
        }

        // Route misses, including a known path with an unsupported method
        let route_miss = {
            let handler = Arc::clone(&handler);
            move |request: Request| {
                let handler = Arc::clone(&handler);
                async move {
                    let meta = request
                        .extensions()
                        .get::<RequestMeta>()
                        .cloned()
                        .unwrap_or_else(|| RequestMeta::from_request(&request, None));
                    handler.not_found(&meta)
                }
            }
        };
        app = app
            .fallback(route_miss.clone())
            .method_not_allowed_fallback(route_miss);

        // Apply middleware layers (innermost first)

        // Validation failures attached by an upstream validator
        app = app.layer(axum::middleware::from_fn(validation::validation_middleware));

        // Query, JSON and form body sanitization
        app = app.layer(axum::middleware::from_fn(move |req, next| {
            let settings = Arc::clone(&settings);
            async move { sanitize::sanitize_middleware(settings, req, next).await }
        }));

        // Error boundary, outermost of the pipeline so nothing escapes it
        app = app.layer(axum::middleware::from_fn(move |req, next| {
            let handler = Arc::clone(&handler);
            async move { boundary::error_boundary(handler, req, next).await }
        }));

        app = app.layer(Extension(policy));

        // Tracing
        app = app.layer(TraceLayer::new_for_http());

        // CORS
        if let Some(ref cors_config) = config.server.cors {
            app = app.layer(cors::cors_layer(cors_config));
        }

        Self {
            router: app,
            listen_address,
        }
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Wrap the assembled router, e.g. with an authentication layer that
    /// must run before request metadata is captured
    #[must_use]
    pub fn map_router(self, f: impl FnOnce(Router) -> Router) -> Self {
        Self {
            router: f(self.router),
            listen_address: self.listen_address,
        }
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(
            listener,
            self.router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            tracing::info!("graceful shutdown initiated");
        })
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::middleware::Next;
    use axum::routing::{get, post};
    use bulwark_config::Environment;
    use bulwark_core::{ApiError, AuthenticatedUser};
    use http::StatusCode;
    use http::header::CONTENT_TYPE;
    use tower::ServiceExt;

    use super::*;
    use crate::error_handler::tests::RecordingSink;

    fn routes() -> Router {
        Router::new()
            .route("/jobs/{id}", get(|params: SanitizedParams| async move {
                match params.get("id") {
                    Some("1") => Ok("job 1".to_owned()),
                    _ => Err(Thrown::from(ApiError::not_found("Job"))),
                }
            }))
            .route("/echo", post(|body: String| async move { body }))
            .route("/panic", get(|| async {
                if true {
                    panic!("handler exploded");
                }
                "unreachable"
            }))
            .route("/fault", get(|| async {
                Err::<(), _>(Thrown::from(anyhow::anyhow!("database unreachable")))
            }))
            .route(
                "/policy",
                post(|Extension(policy): Extension<Arc<SanitizationPolicy>>, body: String| async move {
                    policy.clean(&body)
                }),
            )
    }

    fn server(config: &Config) -> (Arc<RecordingSink>, Router) {
        let sink = Arc::new(RecordingSink::default());
        let router = Server::with_sink(config, routes(), sink.clone()).into_router();
        (sink, router)
    }

    async fn call(router: Router, request: Request) -> (StatusCode, String) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn get_request(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn envelope(body: &str) -> ErrorEnvelope {
        serde_json::from_str(body).unwrap()
    }

    #[tokio::test]
    async fn successful_handler_passes_through() {
        let (sink, router) = server(&Config::default());

        let (status, body) = call(router, get_request("/jobs/1")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "job 1");
        assert!(sink.records().is_empty());
    }

    #[tokio::test]
    async fn returned_error_reaches_handler_once() {
        let (sink, router) = server(&Config::default());

        let (status, body) = call(router, get_request("/jobs/2")).await;
        let body = envelope(&body);

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error.message, "Job not found");
        assert_eq!(body.error.code, "NOT_FOUND");

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url, "/jobs/2");
    }

    #[tokio::test]
    async fn panic_becomes_internal_error() {
        let (sink, router) = server(&Config::default());

        let (status, body) = call(router, get_request("/panic")).await;
        let body = envelope(&body);

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.code, "INTERNAL_SERVER_ERROR");
        assert_eq!(body.error.message, "Internal server error");

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].error.as_deref(), Some("handler exploded"));
    }

    #[tokio::test]
    async fn stack_follows_environment() {
        let config = Config {
            environment: Environment::Development,
            ..Config::default()
        };
        let (_, router) = server(&config);
        let (_, body) = call(router, get_request("/fault")).await;
        let stack = envelope(&body).error.stack.unwrap();
        assert!(stack.contains("database unreachable"));

        let (_, router) = server(&Config::default());
        let (_, body) = call(router, get_request("/fault")).await;
        assert_eq!(envelope(&body).error.stack, None);
    }

    #[tokio::test]
    async fn unknown_route_is_route_not_found() {
        let (sink, router) = server(&Config::default());

        for uri in ["/nope", "/jobs", "/a/b/c?x=1"] {
            let (status, body) = call(router.clone(), get_request(uri)).await;
            let body = envelope(&body);

            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body.error.code, "ROUTE_NOT_FOUND");
            assert_eq!(body.error.message, "Route not found");
        }

        let records = sink.records();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.level == "warn"));
    }

    #[tokio::test]
    async fn unsupported_method_is_route_not_found() {
        let (sink, router) = server(&Config::default());
        let request = Request::builder()
            .method("DELETE")
            .uri("/jobs/1")
            .body(Body::empty())
            .unwrap();

        let (status, body) = call(router, request).await;
        let body = envelope(&body);

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error.code, "ROUTE_NOT_FOUND");
        assert_eq!(body.error.status_code, 404);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, "warn");
        assert_eq!(records[0].message, "Route not found: DELETE /jobs/1");
    }

    #[tokio::test]
    async fn health_route_is_mounted() {
        let (_, router) = server(&Config::default());

        let (status, body) = call(router, get_request("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn health_route_can_be_disabled() {
        let mut config = Config::default();
        config.server.health.enabled = false;
        let (_, router) = server(&config);

        let (status, _) = call(router, get_request("/health")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn body_is_sanitized_before_handler() {
        let (_, router) = server(&Config::default());
        let request = Request::builder()
            .method("POST")
            .uri("/echo")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"bio":"<script>x</script>"}"#))
            .unwrap();

        let (status, body) = call(router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"bio":"&lt;script&gt;x&lt;&#x2F;script&gt;"}"#);
    }

    #[tokio::test]
    async fn configured_html_policy_is_shared() {
        let mut config = Config::default();
        config.sanitization.html.tags = Some(vec!["p".to_owned()]);
        let (_, router) = server(&config);
        let request = Request::builder()
            .method("POST")
            .uri("/policy")
            .body(Body::from("<p><b>hi</b></p>"))
            .unwrap();

        let (_, body) = call(router, request).await;
        assert_eq!(body, "<p>hi</p>");
    }

    #[tokio::test]
    async fn request_meta_reaches_sink() {
        let sink = Arc::new(RecordingSink::default());
        let router = Server::with_sink(&Config::default(), routes(), sink.clone())
            .map_router(|router| {
                router.layer(axum::middleware::from_fn(|mut req: Request, next: Next| {
                    req.extensions_mut().insert(AuthenticatedUser { id: "user-7".to_owned() });
                    next.run(req)
                }))
            })
            .into_router();
        let request = Request::builder()
            .uri("/jobs/9")
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap();

        call(router, request).await;

        let records = sink.records();
        assert_eq!(records[0].ip.as_deref(), Some("203.0.113.9"));
        assert_eq!(records[0].user_id.as_deref(), Some("user-7"));
    }

    #[test]
    fn listen_address_defaults() {
        let server = Server::new(&Config::default(), Router::new());
        assert_eq!(server.listen_address(), SocketAddr::from(([0, 0, 0, 0], 3000)));
    }
}
