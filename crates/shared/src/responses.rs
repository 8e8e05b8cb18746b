//! Error envelope returned by every failing REST call.

use serde::{Deserialize, Serialize};

// =============================================================================
// Error Codes
// =============================================================================

/// Error classification codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // === Client Errors (4xx) ===
    /// Request was malformed or invalid
    BadRequest,
    /// Authentication required or failed
    Unauthorized,
    /// User lacks permission for this operation
    Forbidden,
    /// Requested resource not found
    NotFound,
    /// Operation conflicts with current state
    Conflict,
    /// Request data failed validation
    ValidationError,
    /// Upload exceeds the configured size limit
    PayloadTooLarge,

    // === Server Errors (5xx) ===
    /// Internal server error
    InternalError,
    /// Required service is unavailable
    ServiceUnavailable,

    /// Unknown variant for forward compatibility
    #[serde(other)]
    Unknown,
}

// NOTE: HTTP status mapping lives in the engine's HTTP adapter.

/// JSON body of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_snake_case() {
        let body = ErrorBody::new(ErrorCode::ValidationError, "bad name");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "validation_error");
        assert_eq!(json["message"], "bad name");
    }

    #[test]
    fn unknown_code_is_tolerated() {
        let code: ErrorCode = serde_json::from_str("\"teapot\"").unwrap();
        assert_eq!(code, ErrorCode::Unknown);
    }
}
