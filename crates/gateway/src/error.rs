use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("missing multipart field 'image'")]
    MissingImage,

    #[error("empty filename")]
    EmptyFilename,

    #[error("unsupported file type")]
    UnsupportedType,

    #[error("uploaded file too large")]
    PayloadTooLarge,

    #[error("invalid multipart body: {0}")]
    Multipart(String),

    #[error("invalid request id")]
    InvalidRequestId,

    #[error("analysis not found")]
    NotFound,

    #[error("{0}")]
    Detection(#[from] detection::DetectionFailure),

    #[error("report generation failed: {0}")]
    Report(#[from] crate::report::ReportError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingImage
            | ApiError::EmptyFilename
            | ApiError::Multipart(_)
            | ApiError::InvalidRequestId => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Detection(_) | ApiError::Report(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(json!({ "ok": false, "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::MissingImage.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::EmptyFilename.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::UnsupportedType.status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            ApiError::PayloadTooLarge.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal("disk".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ApiError::MissingImage.to_string(),
            "missing multipart field 'image'"
        );
        assert_eq!(ApiError::UnsupportedType.to_string(), "unsupported file type");
        assert_eq!(
            ApiError::PayloadTooLarge.to_string(),
            "uploaded file too large"
        );
    }
}
