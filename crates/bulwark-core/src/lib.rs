//! Error taxonomy and request metadata shared across Bulwark crates
//!
//! Domain code raises [`ApiError`] values; the server layer turns every
//! failure into a [`Classification`] at a single choke point.

#![allow(clippy::must_use_candidate)]

mod context;
mod error;
mod validation;

pub use context::{AuthenticatedUser, RequestMeta};
pub use error::{ApiError, Classification, ErrorKind, FieldErrors, HttpError, messages};
pub use validation::{FieldFailure, ValidationFailures, check_validation};
