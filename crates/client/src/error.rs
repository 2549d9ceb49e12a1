//! Remote fetcher error types.

use std::sync::Arc;

use stockroom_core::{ConfigError, Error};

/// Errors from a storefront API call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required credential is not configured. Raised before any request.
    #[error("missing credential: {0}")]
    MissingCredential(#[from] ConfigError),

    /// The configured base URL or a request path does not form a valid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Non-2xx response, with the backend's error body.
    #[error("HTTP error: {status}: {body}")]
    Http { status: u16, body: String },

    /// A GraphQL response carrying a non-empty `errors` array.
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { ApiError::Timeout } else { ApiError::Network(Arc::new(err)) }
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::MissingCredential(e) => Error::Config(e),
            ApiError::InvalidUrl(reason) => {
                Error::Config(ConfigError::Invalid { field: "base_url".into(), reason })
            }
            ApiError::Http { status: 404, body } => Error::NotFound(body),
            ApiError::Http { status, body } => Error::RemoteApi { status, body },
            ApiError::GraphQl(message) => Error::RemoteApi { status: 200, body: message },
            ApiError::Timeout => Error::Timeout,
            ApiError::Network(e) => Error::Network(e.to_string()),
            ApiError::Parse(reason) => Error::Parse(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::Http { status: 403, body: "{\"error\":\"Invalid API key\"}".into() };
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[test]
    fn test_converts_into_core_taxonomy() {
        let missing = ConfigError::Missing { field: "etsy.api_key".into(), hint: "Set ETSY_API_KEY".into() };
        assert!(matches!(Error::from(ApiError::from(missing)), Error::Config(_)));
        assert!(matches!(Error::from(ApiError::Http { status: 404, body: String::new() }), Error::NotFound(_)));
        assert!(matches!(
            Error::from(ApiError::Http { status: 500, body: "boom".into() }),
            Error::RemoteApi { status: 500, .. }
        ));
        assert!(matches!(Error::from(ApiError::GraphQl("Throttled".into())), Error::RemoteApi { .. }));
        assert!(matches!(Error::from(ApiError::Timeout), Error::Timeout));
    }
}
