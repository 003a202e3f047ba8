use bulwark_core::{Classification, RequestMeta};

use crate::boundary::Thrown;

/// Everything a log record knows about a failed or missed request
#[derive(Debug, Clone, Copy)]
pub struct LogContext<'a> {
    /// Raw thrown value, absent for route misses
    pub error: Option<&'a Thrown>,
    /// How the value was classified, absent for route misses
    pub classification: Option<&'a Classification>,
    pub request: &'a RequestMeta,
}

/// Destination for error and warning records
///
/// Records arrive for every failure, operational or not; filtering noise is
/// the sink's job.
pub trait LogSink: Send + Sync {
    fn error(&self, context: &LogContext<'_>, message: &str);

    fn warn(&self, context: &LogContext<'_>, message: &str);
}

/// Sink that emits structured `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn error(&self, context: &LogContext<'_>, message: &str) {
        let request = context.request;
        let error = context.error.map(Thrown::describe);
        let classification = context.classification;

        tracing::error!(
            url = %request.url,
            method = %request.method,
            ip = request.ip.as_deref(),
            user_agent = request.user_agent.as_deref(),
            user_id = request.user_id.as_deref(),
            error = error.as_deref(),
            status = classification.map(|c| c.status_code.as_u16()),
            code = classification.map(|c| c.code),
            operational = classification.map(|c| c.is_operational),
            fields = classification.and_then(|c| c.fields.as_ref()).map(tracing::field::debug),
            "{message}"
        );
    }

    fn warn(&self, context: &LogContext<'_>, message: &str) {
        let request = context.request;

        tracing::warn!(
            url = %request.url,
            method = %request.method,
            ip = request.ip.as_deref(),
            user_agent = request.user_agent.as_deref(),
            user_id = request.user_id.as_deref(),
            "{message}"
        );
    }
}
