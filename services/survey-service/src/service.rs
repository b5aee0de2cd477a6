use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::models::{ErrorDetail, ErrorResponse, FieldViolation, SubmitResponse};
use crate::privacy::pseudonymize;
use crate::record::{build_record, RequestContext};
use crate::state::AppState;
use crate::validation::validate_submission;

#[derive(Debug)]
pub struct ServiceError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ServiceError {
    fn new(status: StatusCode, error: &'static str, detail: ErrorDetail) -> Self {
        Self {
            status,
            body: ErrorResponse { error, detail },
        }
    }

    pub fn invalid_json() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "invalid_json",
            ErrorDetail::Message("Body must be application/json"),
        )
    }

    pub fn validation(violations: Vec<FieldViolation>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            ErrorDetail::Violations(violations),
        )
    }

    pub fn storage() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "storage_error",
            ErrorDetail::Message("failed to persist submission"),
        )
    }

    pub fn not_found() -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "not_found",
            ErrorDetail::Message("route not found"),
        )
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Validate, enrich, pseudonymize and append one submission. Nothing is
/// written unless validation passes.
pub async fn submit_survey(
    state: &AppState,
    payload: &Value,
    context: RequestContext,
) -> Result<SubmitResponse, ServiceError> {
    let submission = validate_submission(payload).map_err(|violations| {
        tracing::info!(violations = violations.len(), "survey rejected");
        ServiceError::validation(violations)
    })?;

    let record = build_record(submission, context);
    let fields = record.to_fields().map_err(|err| {
        tracing::error!(error = %err, "encode survey record failed");
        ServiceError::storage()
    })?;
    let fields = pseudonymize(fields);

    if let Err(err) = state.store.append(&fields).await {
        tracing::error!(
            submission_id = record.submission_id.as_str(),
            error = %err,
            "append survey record failed"
        );
        return Err(ServiceError::storage());
    }

    tracing::info!(
        submission_id = record.submission_id.as_str(),
        ip = record.ip.as_str(),
        "survey stored"
    );
    Ok(SubmitResponse { status: "ok" })
}
