use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use yieldpilot_ranker::RankerError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    code: &'static str,
    error: String,
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Storage(_) => "storage_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Storage details stay in the log.
    fn public_message(&self) -> String {
        match self {
            ApiError::Storage(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let code = self.code();
        if status.is_server_error() {
            error!(code, status = %status, error = %self, "api_error");
        }

        let body = Json(ErrorResponse {
            code,
            error: self.public_message(),
        });
        (status, body).into_response()
    }
}

impl From<RankerError> for ApiError {
    fn from(value: RankerError) -> Self {
        match value {
            RankerError::ListingNotFound(id) => ApiError::NotFound(format!("listing {id}")),
            RankerError::Storage(e) => ApiError::Storage(e.to_string()),
        }
    }
}
