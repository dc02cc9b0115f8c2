use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use hrm_sync::{BulkError, RepoError};
use serde_json::json;
use tracing::error;

pub mod attendance;
pub mod chat;
pub mod employee;
pub mod leave_request;
pub mod notification;
pub mod payroll;
pub mod shift;

/// Handler error: a repository failure, a partially applied bulk write or
/// an authorization refusal.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    Bulk(#[from] BulkError),

    #[error("{0}")]
    Forbidden(String),
}

fn repo_status(err: &RepoError) -> StatusCode {
    match err {
        RepoError::NotFound { .. } | RepoError::AssignmentNotFound { .. } => StatusCode::NOT_FOUND,
        RepoError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        RepoError::InvalidState(_) | RepoError::Validation(_) => StatusCode::BAD_REQUEST,
        RepoError::StaleState(_) | RepoError::AlreadyExists { .. } => StatusCode::CONFLICT,
        RepoError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        RepoError::BatchLimitExceeded { .. } | RepoError::Malformed { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Repo(err) => repo_status(err),
            ApiError::Bulk(err) => repo_status(&err.source),
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        }

        let body = match self {
            ApiError::Bulk(err) => json!({
                "message": err.source.to_string(),
                "committed": err.committed,
                "requested": err.requested,
                "batches": err.batches,
            }),
            // Internal detail stays in the log.
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => json!({
                "message": "Something went wrong, Contact with system admin"
            }),
            other => json!({ "message": other.to_string() }),
        };
        HttpResponse::build(status).json(body)
    }
}

pub type ApiResult = Result<HttpResponse, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_errors_map_to_statuses() {
        let cases = [
            (RepoError::not_found("Employee", "x"), 404),
            (RepoError::PermissionDenied("no".into()), 403),
            (RepoError::InvalidState("paid".into()), 400),
            (RepoError::Validation("bad".into()), 400),
            (RepoError::StaleState("raced".into()), 409),
            (RepoError::already_exists("Employee", "userId", "u1"), 409),
            (RepoError::StoreUnavailable("down".into()), 503),
            (RepoError::BatchLimitExceeded { ops: 501, limit: 500 }, 500),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code().as_u16(), status);
        }
    }

    #[test]
    fn bulk_errors_use_the_cause_status() {
        let err = ApiError::from(BulkError {
            committed: 500,
            requested: 1200,
            batches: 1,
            source: RepoError::StoreUnavailable("down".into()),
        });
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
