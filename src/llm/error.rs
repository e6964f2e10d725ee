//! Typed errors from the model API
//!
//! The retry wrapper recovers these from `anyhow::Error` to tell transient
//! failures from permanent ones.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP 401; the key will not start working on a retry
    #[error("Model API rejected the API key (check OPENAI_API_KEY): {0}")]
    Unauthorized(String),

    /// HTTP 429
    #[error("Rate limited by the model API: {0}")]
    RateLimited(String),

    /// HTTP 400, usually an unknown model or oversized prompt
    #[error("Model API rejected the request: {0}")]
    BadRequest(String),

    /// HTTP 5xx
    #[error("Model API unavailable (HTTP {status}): {message}")]
    ServiceError { status: u16, message: String },

    /// Timeouts and connection failures
    #[error("Could not reach the model API: {0}")]
    Network(String),

    #[error("Model returned an unusable response: {0}")]
    MalformedResponse(String),

    /// Any other non-success status
    #[error("Model API returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
}

impl LlmError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited(_) | LlmError::ServiceError { .. } | LlmError::Network(_)
        )
    }

    /// Classify a non-success response
    pub fn from_http_status(status: StatusCode, body: String) -> Self {
        let code = status.as_u16();
        match code {
            400 => LlmError::BadRequest(body),
            401 => LlmError::Unauthorized(body),
            429 => LlmError::RateLimited(body),
            500..=599 => LlmError::ServiceError {
                status: code,
                message: body,
            },
            _ => LlmError::Status {
                status: code,
                message: body,
            },
        }
    }

    /// Classify a failure raised by the HTTP client itself
    pub fn from_network_error(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return Self::from_http_status(status, e.to_string());
        }
        if e.is_decode() {
            return LlmError::MalformedResponse(e.to_string());
        }
        let kind = if e.is_timeout() {
            "request timed out"
        } else if e.is_connect() {
            "connection failed"
        } else {
            "request failed"
        };
        LlmError::Network(format!("{}: {}", kind, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(LlmError::RateLimited("quota".into()).is_retryable());
        assert!(LlmError::Network("refused".into()).is_retryable());
        assert!(LlmError::ServiceError {
            status: 503,
            message: "overloaded".into()
        }
        .is_retryable());

        assert!(!LlmError::Unauthorized("bad key".into()).is_retryable());
        assert!(!LlmError::BadRequest("unknown model".into()).is_retryable());
        assert!(!LlmError::MalformedResponse("no choices".into()).is_retryable());
    }

    #[test]
    fn statuses_map_to_variants() {
        let cases = [
            (StatusCode::BAD_REQUEST, "BadRequest"),
            (StatusCode::UNAUTHORIZED, "Unauthorized"),
            (StatusCode::TOO_MANY_REQUESTS, "RateLimited"),
            (StatusCode::BAD_GATEWAY, "ServiceError"),
            (StatusCode::NOT_FOUND, "Status"),
        ];
        for (status, expected) in cases {
            let err = LlmError::from_http_status(status, "body".to_string());
            let debug = format!("{:?}", err);
            assert!(debug.starts_with(expected), "{} -> {}", status, debug);
        }
    }

    #[test]
    fn unauthorized_message_names_the_key() {
        let err = LlmError::from_http_status(StatusCode::UNAUTHORIZED, "invalid".to_string());
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn survives_anyhow_roundtrip() {
        let err: anyhow::Error = LlmError::RateLimited("slow down".to_string()).into();
        assert!(err
            .downcast_ref::<LlmError>()
            .is_some_and(LlmError::is_retryable));
    }
}
