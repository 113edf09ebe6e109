//! Typed error codes reported in `extensions.code`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed error codes for GraphQL errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    // Request errors
    BadRequest,
    ParseError,
    ValidationError,
    BadUserInput,

    // Execution errors
    ResolverError,
    ExecutionError,

    // Internal errors
    InternalError,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::ParseError => "PARSE_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadUserInput => "BAD_USER_INPUT",
            Self::ResolverError => "RESOLVER_ERROR",
            Self::ExecutionError => "EXECUTION_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the request was rejected before execution started.
    pub const fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::BadRequest | Self::ParseError | Self::ValidationError | Self::BadUserInput
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::ResolverError).unwrap();
        assert_eq!(json, "\"RESOLVER_ERROR\"");
        assert_eq!(ErrorCode::BadUserInput.to_string(), "BAD_USER_INPUT");
    }

    #[test]
    fn test_error_code_properties() {
        assert!(ErrorCode::ParseError.is_request_error());
        assert!(!ErrorCode::ResolverError.is_request_error());
    }
}
