use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use bulwark_core::{ValidationFailures, check_validation};

use crate::boundary::Thrown;

/// Middleware raising the failures an upstream validator attached
///
/// Requests without a [`ValidationFailures`] extension, or with an empty
/// one, are forwarded untouched.
pub async fn validation_middleware(request: Request, next: Next) -> Response {
    if let Some(ValidationFailures(failures)) = request.extensions().get::<ValidationFailures>()
        && let Err(error) = check_validation(failures)
    {
        return Thrown::from(error).into_response();
    }

    next.run(request).await
}
