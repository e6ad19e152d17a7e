//! Maps engine/QL/aggregator failures onto the HTTP status codes the
//! boundary contract promises: 400 for bad requests or unsupported roles,
//! 401 for a missing `Authorization` header, 500 for everything else.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("missing Authorization header")]
    Unauthorized,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// A malformed QL query string is a 400; anything else (I/O, corrupt
/// segment, stats persistence) is a 500.
pub fn map_engine_error(e: anyhow::Error) -> ApiError {
    if e.downcast_ref::<ql::QlError>().is_some() {
        ApiError::BadRequest(e.to_string())
    } else {
        ApiError::Internal(e)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody { error: self.to_string() })
    }
}
