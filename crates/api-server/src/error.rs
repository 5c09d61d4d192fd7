use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use brief_core::BriefError;
use serde::Serialize;

/// HTTP-layer error
#[derive(Debug)]
pub enum AppError {
    /// 400 - caller sent something unusable
    BadRequest(String),
    /// 404
    NotFound(String),
    /// 500
    Internal(String),
}

/// Error body, `{"detail": "..."}`
#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}

impl From<BriefError> for AppError {
    fn from(err: BriefError) -> Self {
        match err {
            BriefError::InvalidSymbol(_) | BriefError::InvalidData(_) => {
                AppError::BadRequest(err.to_string())
            }
            BriefError::NotFound(_) => AppError::NotFound(err.to_string()),
            BriefError::Upstream(_) => AppError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brief_error_status_mapping() {
        let cases = [
            (BriefError::InvalidSymbol("x".into()), StatusCode::BAD_REQUEST),
            (BriefError::InvalidData("x".into()), StatusCode::BAD_REQUEST),
            (BriefError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (BriefError::Upstream("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }
}
