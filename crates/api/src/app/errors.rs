use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use orderdesk_core::DomainError;
use orderdesk_infra::workflow::WorkflowError;

pub fn workflow_error_to_response(err: WorkflowError) -> axum::response::Response {
    match err {
        WorkflowError::Domain(e) => domain_error_to_response(e),
        WorkflowError::Store(e) => {
            tracing::error!(error = %e, "storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
        WorkflowError::Payment(e) => {
            tracing::warn!(error = %e, "payment failed");
            json_error(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let status = match &err {
        DomainError::Validation(_)
        | DomainError::InvalidId(_)
        | DomainError::DuplicateEmail(_)
        | DomainError::InsufficientStock(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::InvalidTransition(_) => StatusCode::CONFLICT,
    };
    json_error(status, err.to_string())
}

/// Router fallback for paths no route matches.
pub async fn route_not_found() -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "Not found")
}

/// Malformed or unreadable JSON bodies are client errors.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, rejection.body_text())
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "message": message.into(),
        })),
    )
        .into_response()
}
