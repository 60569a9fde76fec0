//! Error Kind
//!
//! Classification of errors, each mapped to an HTTP status.

use std::fmt;

use serde::Serialize;

/// What went wrong, from the caller's point of view
///
/// Upstream failures (the statistics API slow, down, throttling or
/// rejecting us) get gateway kinds so they stay distinct from local faults.
///
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// assert_eq!(ErrorKind::GatewayTimeout.status_code(), 504);
/// assert!(ErrorKind::GatewayTimeout.is_retryable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    TooManyRequests,
    InternalServerError,
    /// Upstream rejected or garbled the call
    BadGateway,
    /// Upstream or a required local resource is unavailable
    ServiceUnavailable,
    /// Upstream did not answer in time
    GatewayTimeout,
}

impl ErrorKind {
    pub const fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::TooManyRequests => 429,
            ErrorKind::InternalServerError => 500,
            ErrorKind::BadGateway => 502,
            ErrorKind::ServiceUnavailable => 503,
            ErrorKind::GatewayTimeout => 504,
        }
    }

    /// Reason phrase
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::TooManyRequests => "Too Many Requests",
            ErrorKind::InternalServerError => "Internal Server Error",
            ErrorKind::BadGateway => "Bad Gateway",
            ErrorKind::ServiceUnavailable => "Service Unavailable",
            ErrorKind::GatewayTimeout => "Gateway Timeout",
        }
    }

    /// Repeating the same request later may succeed
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::TooManyRequests | ErrorKind::ServiceUnavailable | ErrorKind::GatewayTimeout
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let expected = [
            (ErrorKind::BadRequest, 400),
            (ErrorKind::NotFound, 404),
            (ErrorKind::TooManyRequests, 429),
            (ErrorKind::InternalServerError, 500),
            (ErrorKind::BadGateway, 502),
            (ErrorKind::ServiceUnavailable, 503),
            (ErrorKind::GatewayTimeout, 504),
        ];
        for (kind, code) in expected {
            assert_eq!(kind.status_code(), code, "{kind}");
        }
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::TooManyRequests.is_retryable());
        assert!(ErrorKind::GatewayTimeout.is_retryable());
        assert!(!ErrorKind::BadGateway.is_retryable());
        assert!(!ErrorKind::BadRequest.is_retryable());
        assert!(!ErrorKind::InternalServerError.is_retryable());
    }

    #[test]
    fn test_serialize_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorKind::GatewayTimeout).unwrap();
        assert_eq!(json, r#""GATEWAY_TIMEOUT""#);
    }
}
