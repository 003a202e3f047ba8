use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::Json;
use axum::response::{IntoResponse, Response};
use bulwark_config::Environment;
use bulwark_core::{Classification, RequestMeta};
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::boundary::Thrown;
use crate::sink::{LogContext, LogSink};

const ROUTE_NOT_FOUND: &str = "ROUTE_NOT_FOUND";
const ROUTE_NOT_FOUND_MESSAGE: &str = "Route not found";

/// Error response envelope sent to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: String,
    pub code: String,
    pub status_code: u16,
    /// Diagnostic trace, development only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorEnvelope {
    fn new(status: StatusCode, code: &str, message: impl Into<String>, stack: Option<String>) -> Self {
        Self {
            error: ErrorBody {
                message: message.into(),
                code: code.to_owned(),
                status_code: status.as_u16(),
                stack,
            },
        }
    }

    fn into_response(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// Terminal handler turning any [`Thrown`] into one log record and one response
pub struct ErrorHandler {
    sink: Arc<dyn LogSink>,
    expose_stack: bool,
}

impl ErrorHandler {
    /// Stacks are exposed only in development
    pub fn new(sink: Arc<dyn LogSink>, environment: Environment) -> Self {
        Self {
            sink,
            expose_stack: environment.is_development(),
        }
    }

    /// Log the failure, then build the client response
    pub fn handle(&self, thrown: Thrown, request: &RequestMeta) -> Response {
        let classification = thrown.classify();

        self.emit(
            &LogContext {
                error: Some(&thrown),
                classification: Some(&classification),
                request,
            },
            &classification,
        );

        let stack = if self.expose_stack { thrown.trace() } else { None };

        let status = classification.status_code;
        ErrorEnvelope::new(status, classification.code, classification.message, stack).into_response(status)
    }

    /// Fallback for requests that matched no route
    pub fn not_found(&self, request: &RequestMeta) -> Response {
        let context = LogContext {
            error: None,
            classification: None,
            request,
        };
        let message = format!("Route not found: {} {}", request.method, request.url);

        if std::panic::catch_unwind(AssertUnwindSafe(|| self.sink.warn(&context, &message))).is_err() {
            tracing::error!(url = %request.url, "log sink panicked while recording a route miss");
        }

        ErrorEnvelope::new(StatusCode::NOT_FOUND, ROUTE_NOT_FOUND, ROUTE_NOT_FOUND_MESSAGE, None)
            .into_response(StatusCode::NOT_FOUND)
    }

    fn emit(&self, context: &LogContext<'_>, classification: &Classification) {
        let message = format!("{} ({})", classification.message, classification.code);

        if std::panic::catch_unwind(AssertUnwindSafe(|| self.sink.error(context, &message))).is_err() {
            tracing::error!(
                url = %context.request.url,
                method = %context.request.method,
                code = classification.code,
                "log sink panicked while recording an error"
            );
        }
    }
}
