//! Async boundary between handlers and the error handler
//!
//! Handlers return `Result<_, Thrown>`. A returned [`Thrown`] is parked in
//! the response extensions, and [`error_boundary`] hands it to the
//! [`ErrorHandler`] together with any panic raised while the request ran.

use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{ConnectInfo, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use bulwark_core::{Classification, RequestMeta};
use futures_util::FutureExt;
use http::StatusCode;

use crate::error_handler::ErrorHandler;

/// Any failure that can reach the error handler
#[derive(Debug)]
pub enum Thrown {
    /// Error object: a taxonomy `ApiError` or any other fault
    Error(anyhow::Error),
    /// Value that is not an error, such as a panic payload
    Value(Box<dyn Any + Send>),
}

impl<E> From<E> for Thrown
where
    E: Into<anyhow::Error>,
{
    fn from(error: E) -> Self {
        Self::Error(error.into())
    }
}

impl Thrown {
    /// Throw a value that is not an error
    pub fn value<T: Any + Send>(value: T) -> Self {
        Self::Value(Box::new(value))
    }

    pub fn classify(&self) -> Classification {
        match self {
            Self::Error(error) => Classification::of_error(error),
            Self::Value(_) => Classification::internal_default(),
        }
    }

    /// Whether this is an error object rather than an arbitrary value
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Diagnostic trace: cause chain plus backtrace when one was captured
    pub fn trace(&self) -> Option<String> {
        match self {
            Self::Error(error) => Some(format!("{error:?}")),
            Self::Value(_) => None,
        }
    }

    /// Server-side rendering of the raw value for log records
    pub fn describe(&self) -> String {
        match self {
            Self::Error(error) => format!("{error:#}"),
            Self::Value(value) => value
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| value.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-error value".to_owned()),
        }
    }
}

/// One-shot slot carrying a [`Thrown`] from handler to boundary
#[derive(Clone)]
struct ThrownSlot(Arc<Mutex<Option<Thrown>>>);

impl ThrownSlot {
    fn new(thrown: Thrown) -> Self {
        Self(Arc::new(Mutex::new(Some(thrown))))
    }

    fn take(&self) -> Option<Thrown> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

impl IntoResponse for Thrown {
    /// Outside an [`error_boundary`] this is a bare 500 with no body
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(ThrownSlot::new(self));
        response
    }
}

/// Await a handler future, turning a panic into [`Thrown::Value`]
///
/// # Errors
///
/// Returns the future's own error, or the panic payload
pub async fn catch_async<F, T>(future: F) -> Result<T, Thrown>
where
    F: Future<Output = Result<T, Thrown>>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(Thrown::Value(payload)),
    }
}

/// Middleware forwarding every failure of the inner service to `handler`
///
/// Captures [`RequestMeta`] up front and exposes it to handlers as a
/// request extension.
pub async fn error_boundary(handler: Arc<ErrorHandler>, mut request: Request, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let meta = RequestMeta::from_request(&request, peer);
    request.extensions_mut().insert(meta.clone());

    let outcome = catch_async(async move { Ok(next.run(request).await) }).await;

    let thrown = match outcome {
        Ok(mut response) => match response.extensions_mut().remove::<ThrownSlot>() {
            Some(slot) => slot.take(),
            None => return response,
        },
        Err(thrown) => Some(thrown),
    };

    match thrown {
        Some(thrown) => handler.handle(thrown, &meta),
        None => handler.handle(Thrown::value("thrown value already consumed"), &meta),
    }
}
