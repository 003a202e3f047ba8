use http::StatusCode;
use indexmap::IndexMap;
use thiserror::Error;

/// Field path → message map carried by validation errors
pub type FieldErrors = IndexMap<String, String>;

/// Client-facing default messages
pub mod messages {
    pub const UNAUTHORIZED: &str = "Unauthorized";
    pub const FORBIDDEN: &str = "Forbidden";
    pub const RATE_LIMITED: &str = "Too many requests";
    pub const SERVICE_UNAVAILABLE: &str = "Service temporarily unavailable";
    pub const INTERNAL: &str = "Internal server error";
    pub const VALIDATION: &str = "Validation failed";
}

/// Trait for domain errors that can be converted to HTTP responses
///
/// The server layer reads these values when building the error envelope,
/// keeping domain errors decoupled from axum.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Machine-readable error code (e.g. `VALIDATION_ERROR`)
    fn error_code(&self) -> &'static str;

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;

    /// Whether the failure is expected rather than a fault worth alerting on
    fn is_operational(&self) -> bool;
}

/// Closed set of failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Unauthorized,
    Forbidden,
    Conflict,
    RateLimit,
    ServiceUnavailable,
    Internal,
    Unknown,
}

impl ErrorKind {
    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Conflict => StatusCode::CONFLICT,
            Self::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal | Self::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Conflict => "CONFLICT",
            Self::RateLimit => "RATE_LIMIT_EXCEEDED",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::Internal => "INTERNAL_SERVER_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// `ServiceUnavailable` is the only raised kind reporting as non-operational
    pub const fn is_operational(self) -> bool {
        match self {
            Self::Validation
            | Self::NotFound
            | Self::Unauthorized
            | Self::Forbidden
            | Self::Conflict
            | Self::RateLimit => true,
            Self::ServiceUnavailable | Self::Internal | Self::Unknown => false,
        }
    }
}

/// Typed failure raised by business logic
///
/// Status, code and operational flag all derive from [`ErrorKind`]; an
/// instance cannot change after construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    fields: Option<FieldErrors>,
}

impl ApiError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            fields: None,
        }
    }

    pub fn validation(message: impl Into<String>, fields: Option<FieldErrors>) -> Self {
        Self {
            fields,
            ..Self::new(ErrorKind::Validation, message)
        }
    }

    /// Formats the message as `"<resource> not found"`
    pub fn not_found(resource: impl std::fmt::Display) -> Self {
        Self::new(ErrorKind::NotFound, format!("{resource} not found"))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimit, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Per-field messages, only ever set on validation errors
    pub const fn fields(&self) -> Option<&FieldErrors> {
        self.fields.as_ref()
    }
}

impl HttpError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }

    fn error_code(&self) -> &'static str {
        self.kind.code()
    }

    fn client_message(&self) -> String {
        self.message.clone()
    }

    fn is_operational(&self) -> bool {
        self.kind.is_operational()
    }
}

/// Normalized view of any failure, ready to be written to the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status_code: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub is_operational: bool,
    pub fields: Option<FieldErrors>,
}

impl Classification {
    /// Fallback for thrown values that are not errors at all
    pub fn internal_default() -> Self {
        Self::from(&ApiError::internal(messages::INTERNAL))
    }

    /// Classify an error object
    ///
    /// Taxonomy errors (also when wrapped in context) keep their own row;
    /// any other error reports as [`ErrorKind::Unknown`] with its message.
    pub fn of_error(error: &anyhow::Error) -> Self {
        if let Some(api_error) = error.downcast_ref::<ApiError>() {
            return Self::from(api_error);
        }

        Self {
            status_code: ErrorKind::Unknown.status_code(),
            code: ErrorKind::Unknown.code(),
            message: error.to_string(),
            is_operational: ErrorKind::Unknown.is_operational(),
            fields: None,
        }
    }
}

impl From<&ApiError> for Classification {
    fn from(error: &ApiError) -> Self {
        Self {
            status_code: error.status_code(),
            code: error.error_code(),
            message: error.client_message(),
            is_operational: error.is_operational(),
            fields: error.fields.clone(),
        }
    }
}
