//! Client-side error model.

use thiserror::Error;

/// Result type used across the facade.
pub type IamResult<T> = Result<T, IamError>;

/// Failure reported by any facade operation.
///
/// Verification failures (`InvalidToken`, `TokenExpired`), breaker/deadline
/// failures (`CircuitOpen`, `Timeout`) and remote application failures
/// (`RemoteActionFailed`) stay distinguishable so callers can pick a retry
/// policy per class.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IamError {
    /// Bad signature, unknown key id, or malformed claims.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Signature verified but `exp` has passed.
    #[error("token expired")]
    TokenExpired,

    /// The circuit breaker is open; no call was attempted.
    #[error("circuit open")]
    CircuitOpen,

    /// The call exceeded its deadline.
    #[error("timed out waiting for response")]
    Timeout,

    /// The remote service answered with a non-zero status.
    ///
    /// Status and message are passed through untouched.
    #[error("remote action failed with status {status}: {}", message.as_deref().unwrap_or("<no message>"))]
    RemoteActionFailed { status: i32, message: Option<String> },

    /// The channel failed to deliver the request or the response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote service could not be resolved.
    #[error("service discovery failed: {0}")]
    Discovery(String),

    /// A payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A response arrived for a different request.
    #[error("correlation mismatch: expected {expected}, got {actual}")]
    CorrelationMismatch { expected: String, actual: String },
}

impl IamError {
    pub fn invalid_token(reason: impl Into<String>) -> Self {
        Self::InvalidToken(reason.into())
    }

    pub fn remote(status: i32, message: Option<String>) -> Self {
        Self::RemoteActionFailed { status, message }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Worth retrying later: the remote side was unreachable or shedding load.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CircuitOpen | Self::Timeout | Self::Transport(_))
    }

    /// The presented token cannot establish an identity.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::InvalidToken(_) | Self::TokenExpired)
    }
}

impl From<serde_json::Error> for IamError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_failure_preserves_status_and_message() {
        let err = IamError::remote(404, Some("user not found".to_string()));
        assert_eq!(
            err.to_string(),
            "remote action failed with status 404: user not found"
        );

        let IamError::RemoteActionFailed { status, message } = err else {
            panic!("expected RemoteActionFailed");
        };
        assert_eq!(status, 404);
        assert_eq!(message.as_deref(), Some("user not found"));
    }

    #[test]
    fn retry_classes() {
        assert!(IamError::CircuitOpen.is_retryable());
        assert!(IamError::Timeout.is_retryable());
        assert!(IamError::transport("reset").is_retryable());
        assert!(!IamError::remote(400, None).is_retryable());
        assert!(!IamError::TokenExpired.is_retryable());

        assert!(IamError::TokenExpired.is_auth_failure());
        assert!(IamError::invalid_token("bad signature").is_auth_failure());
        assert!(!IamError::Timeout.is_auth_failure());
    }
}
