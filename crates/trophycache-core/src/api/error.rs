use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited by GitHub - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Unexpected status {0}: {1}")]
    UnexpectedStatus(u16, String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let cut: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
            format!("{}... (truncated, {} total bytes)", cut, body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, url: &str, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            // GitHub answers 403 with a rate-limit message once the anonymous quota is spent
            403 if body.contains("rate limit") => ApiError::RateLimited,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(url.to_string()),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            code => ApiError::UnexpectedStatus(code, truncated),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// True when the server answered with a non-success status, as opposed
    /// to a transport failure or an unparseable body.
    pub fn is_http_status(&self) -> bool {
        matches!(
            self,
            ApiError::AccessDenied(_)
                | ApiError::NotFound(_)
                | ApiError::RateLimited
                | ApiError::ServerError(_)
                | ApiError::UnexpectedStatus(..)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_not_found_keeps_url() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, "https://x/AppID/1/a.json", "nope");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Resource not found: https://x/AppID/1/a.json");
    }

    #[test]
    fn test_from_status_github_rate_limit() {
        let err = ApiError::from_status(
            StatusCode::FORBIDDEN,
            "https://api.github.com/repos/a/b",
            "{\"message\":\"API rate limit exceeded for 1.2.3.4.\"}",
        );
        assert!(matches!(err, ApiError::RateLimited));

        let err = ApiError::from_status(StatusCode::FORBIDDEN, "u", "private repo");
        assert!(matches!(err, ApiError::AccessDenied(_)));
    }

    #[test]
    fn test_from_status_truncates_large_bodies() {
        let body = "x".repeat(MAX_ERROR_BODY_LENGTH * 2);
        match ApiError::from_status(StatusCode::BAD_GATEWAY, "u", &body) {
            ApiError::ServerError(msg) => {
                assert!(msg.contains("truncated"));
                assert!(msg.len() < body.len());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_is_http_status() {
        for status in [
            StatusCode::NOT_FOUND,
            StatusCode::FORBIDDEN,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::GONE,
        ] {
            assert!(ApiError::from_status(status, "u", "").is_http_status(), "{status}");
        }
        assert!(matches!(
            ApiError::from_status(StatusCode::GONE, "u", "gone"),
            ApiError::UnexpectedStatus(410, _)
        ));
        assert!(!ApiError::InvalidResponse("not json".to_string()).is_http_status());
    }
}
