//! Demo job-board routes mounted behind the pipeline

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use bulwark_core::{ApiError, FieldErrors, FieldFailure, check_validation};
use bulwark_sanitize::{is_valid_uuid, sanitize_email};
use bulwark_server::{SanitizedParams, Thrown};
use serde::{Deserialize, Serialize};

const DEMO_JOB_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

pub fn router() -> Router {
    Router::new()
        .route("/jobs/{id}", get(show_job))
        .route("/applications", post(create_application))
}

#[derive(Debug, Serialize)]
struct Job {
    id: &'static str,
    title: &'static str,
}

async fn show_job(params: SanitizedParams) -> Result<Json<Job>, Thrown> {
    let id = params.get("id").unwrap_or_default();

    if !is_valid_uuid(id) {
        let fields = FieldErrors::from([("id".to_owned(), "must be a UUID".to_owned())]);
        return Err(ApiError::validation("Invalid job id", Some(fields)).into());
    }

    if id.eq_ignore_ascii_case(DEMO_JOB_ID) {
        return Ok(Json(Job {
            id: DEMO_JOB_ID,
            title: "Rust engineer",
        }));
    }

    Err(ApiError::not_found("Job").into())
}

/// Fields arrive already escaped by the form body sanitizer
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApplicationForm {
    name: String,
    email: String,
    cover_letter: Option<String>,
}

#[derive(Debug, Serialize)]
struct Application {
    name: String,
    email: String,
    cover_letter: Option<String>,
}

async fn create_application(Form(form): Form<ApplicationForm>) -> Result<(StatusCode, Json<Application>), Thrown> {
    let application = Application {
        name: form.name,
        email: sanitize_email(&form.email),
        cover_letter: form.cover_letter.filter(|text| !text.is_empty()),
    };

    let mut failures = Vec::new();
    if application.name.is_empty() {
        failures.push(FieldFailure::new(["name"], "is required"));
    }
    if !is_plausible_email(&application.email) {
        failures.push(FieldFailure::new(["email"], "must be a valid email address"));
    }
    check_validation(&failures)?;

    tracing::info!(email = %application.email, "application received");

    Ok((StatusCode::CREATED, Json(application)))
}

fn is_plausible_email(email: &str) -> bool {
    email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'))
}
