use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::error::ApiError;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub error: String,
    pub reason: String,
    pub message: String,
}

pub fn status_code(err: &ApiError) -> StatusCode {
    match err {
        ApiError::MalformedBody(_)
        | ApiError::MissingParameters(_)
        | ApiError::BadRequest(_)
        | ApiError::MustBeNumeric(_) => StatusCode::BAD_REQUEST,
        ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ApiError::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
        ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_code(&self);
        let message = match &self {
            ApiError::Internal(err) => {
                log::error!("Request failed: {:#}", err);
                format!("{:#}", err)
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            code: status.as_u16(),
            error: status.canonical_reason().unwrap_or_default().to_string(),
            reason: self.reason().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
