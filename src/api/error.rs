//! API Error Types
//!
//! Every failed call is one of four kinds. Rejections from the server keep the
//! human-readable `message` of the `{"message": "..."}` error body when present,
//! so callers can show it verbatim.

use thiserror::Error;

const NO_MESSAGE: &str = "<no message>";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 401 from the server: the token is missing, invalid or expired
    #[error("Unauthorized: {}", .message.as_deref().unwrap_or(NO_MESSAGE))]
    Unauthorized { message: Option<String> },

    /// Any other non-success status
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or(NO_MESSAGE))]
    Status { status: u16, message: Option<String> },

    /// Transport failure: no response was received
    #[error("Network error: {0}")]
    Network(String),

    /// A response arrived but its body could not be decoded
    #[error("Parse error: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build from a status code and an optional structured message
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        if status == 401 {
            ApiError::Unauthorized { message }
        } else {
            ApiError::Status { status, message }
        }
    }

    /// Message from the structured error body, if the server sent one
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { message } | ApiError::Status { message, .. } => {
                message.as_deref().filter(|m| !m.is_empty())
            }
            ApiError::Network(_) | ApiError::Decode(_) => None,
        }
    }

    /// Server message, or `fallback` when there is none
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// HTTP status, when a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network(_) | ApiError::Decode(_) => None,
        }
    }

    /// Stable error code for logs
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized { .. } => "UNAUTHORIZED",
            ApiError::Status { .. } => "HTTP_STATUS",
            ApiError::Network(_) => "NETWORK",
            ApiError::Decode(_) => "DECODE",
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            ApiError::from_status(status.as_u16(), None)
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert!(ApiError::from_status(401, None).is_unauthorized());
        assert!(!ApiError::from_status(400, None).is_unauthorized());
        assert_eq!(ApiError::from_status(422, None).status(), Some(422));
        assert_eq!(ApiError::Network("down".into()).status(), None);
    }

    #[test]
    fn test_server_message() {
        let err = ApiError::from_status(400, Some("Insufficient funds".into()));
        assert_eq!(err.server_message(), Some("Insufficient funds"));
        assert_eq!(err.user_message("fallback"), "Insufficient funds");

        let err = ApiError::Network("Network Error".into());
        assert_eq!(err.server_message(), None);
        assert_eq!(err.user_message("fallback"), "fallback");

        // Empty message counts as absent
        let err = ApiError::from_status(500, Some(String::new()));
        assert_eq!(err.user_message("fallback"), "fallback");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ApiError::from_status(401, None).code(), "UNAUTHORIZED");
        assert_eq!(ApiError::from_status(500, None).code(), "HTTP_STATUS");
        assert_eq!(ApiError::Decode("x".into()).code(), "DECODE");
    }

    #[test]
    fn test_display() {
        let err = ApiError::from_status(400, Some("Transfer failed: bad".into()));
        assert_eq!(err.to_string(), "HTTP 400: Transfer failed: bad");
        let err = ApiError::from_status(401, None);
        assert_eq!(err.to_string(), "Unauthorized: <no message>");
    }
}
