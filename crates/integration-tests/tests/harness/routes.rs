//! Handlers exercising every failure path of the pipeline

use std::sync::Mutex;

use axum::extract::{Extension, Query, Request};
use axum::middleware::Next;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use bulwark_core::{ApiError, AuthenticatedUser, FieldFailure, ValidationFailures};
use bulwark_server::{LogContext, LogSink, SanitizedParams, Thrown, validation_middleware};
use serde_json::{Value, json};

pub fn router() -> Router {
    Router::new()
        .route("/echo", post(|Json(body): Json<Value>| async move { Json(body) }))
        .route("/raw", post(|body: String| async move { body }))
        .route(
            "/form",
            post(|Form(fields): Form<Vec<(String, String)>>| async move { Json(fields) }),
        )
        .route(
            "/search",
            get(|Query(query): Query<Vec<(String, String)>>| async move { Json(query) }),
        )
        .route(
            "/users/{name}",
            get(|params: SanitizedParams| async move { Json(json!({ "name": params.get("name") })) }),
        )
        .route("/errors/validation", get(validation_error))
        .route("/errors/unauthorized", get(|| fail(ApiError::unauthorized("Missing token"))))
        .route("/errors/forbidden", get(|| fail(ApiError::forbidden("Admins only"))))
        .route("/errors/conflict", get(|| fail(ApiError::conflict("Already applied"))))
        .route("/errors/rate-limit", get(|| fail(ApiError::rate_limit("Too many requests"))))
        .route("/errors/unavailable", get(|| fail(ApiError::service_unavailable("Maintenance"))))
        .route("/errors/internal", get(|| fail(ApiError::internal("Ledger mismatch"))))
        .route("/errors/not-found", get(|| fail(ApiError::not_found("Job"))))
        .route(
            "/errors/fault",
            get(|| async { Err::<(), Thrown>(anyhow::anyhow!("database unreachable").into()) }),
        )
        .route("/errors/value", get(|| async { Err::<(), Thrown>(Thrown::value(42_u32)) }))
        .route("/errors/panic", get(panicking))
        .route(
            "/validated",
            post(|| async { "accepted" })
                .layer(axum::middleware::from_fn(validation_middleware))
                .layer(axum::middleware::from_fn(attach_failures)),
        )
        .route(
            "/me",
            get(|user: Option<Extension<AuthenticatedUser>>| async move {
                match user {
                    Some(Extension(user)) => Err::<(), Thrown>(ApiError::forbidden(format!("{} is suspended", user.id)).into()),
                    None => Err(ApiError::unauthorized("Sign in first").into()),
                }
            }),
        )
}

async fn fail(error: ApiError) -> Result<(), Thrown> {
    Err(error.into())
}

async fn validation_error() -> Result<(), Thrown> {
    bulwark_core::check_validation(&[FieldFailure::new(["email"], "invalid")])?;
    Ok(())
}

async fn panicking() -> &'static str {
    let jobs: Vec<&'static str> = Vec::new();
    jobs[3]
}

/// Stand-in for an external validator: fails when `x-invalid` names a field
async fn attach_failures(mut request: Request, next: Next) -> Response {
    if let Some(field) = request.headers().get("x-invalid").and_then(|v| v.to_str().ok()) {
        let failures = vec![FieldFailure::new(field.split('.').map(str::to_owned), "is invalid")];
        request.extensions_mut().insert(ValidationFailures(failures));
    }

    next.run(request).await
}

/// Captured sink call
#[derive(Debug, Clone)]
pub struct Record {
    pub level: &'static str,
    pub message: String,
    pub code: Option<&'static str>,
    pub operational: Option<bool>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub user_id: Option<String>,
}

/// Sink keeping every record in memory
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<Record>>,
}

impl MemorySink {
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    fn push(&self, level: &'static str, context: &LogContext<'_>, message: &str) {
        self.records.lock().unwrap().push(Record {
            level,
            message: message.to_owned(),
            code: context.classification.map(|c| c.code),
            operational: context.classification.map(|c| c.is_operational),
            ip: context.request.ip.clone(),
            user_agent: context.request.user_agent.clone(),
            user_id: context.request.user_id.clone(),
        });
    }
}

impl LogSink for MemorySink {
    fn error(&self, context: &LogContext<'_>, message: &str) {
        self.push("error", context, message);
    }

    fn warn(&self, context: &LogContext<'_>, message: &str) {
        self.push("warn", context, message);
    }
}
