//! HTTP mapping for catalog errors.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use stockroom_core::Error;

/// A catalog error on its way out as a JSON response.
#[derive(Debug)]
pub struct AppError(pub Error);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
            Error::RemoteApi { .. } | Error::Network(_) | Error::Timeout | Error::Parse(_) => StatusCode::BAD_GATEWAY,
            Error::Config(_) | Error::CacheRead { .. } | Error::CacheWrite { .. } | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self.0, "Request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::NotFound("123".into()), StatusCode::NOT_FOUND),
            (Error::InvalidInput("empty".into()), StatusCode::BAD_REQUEST),
            (Error::Unsupported("reviews".into()), StatusCode::NOT_IMPLEMENTED),
            (Error::RemoteApi { status: 403, body: "denied".into() }, StatusCode::BAD_GATEWAY),
            (Error::Timeout, StatusCode::BAD_GATEWAY),
            (Error::Parse("bad json".into()), StatusCode::BAD_GATEWAY),
            (Error::CacheWrite { path: "data/shop.json".into(), reason: "disk full".into() }, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError(err).status(), status);
        }
    }
}
