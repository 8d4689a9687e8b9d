//! Error types for the Glint core.
//!
//! Capability absence is deliberately not represented here: the prober
//! reports it as a status flag, never as an exception.

use std::sync::Arc;
use thiserror::Error;

/// Result type alias using the Glint error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the Glint core and dispatcher.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Caller-supplied text was rejected before any session work
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Session creation failed (not retried here; the executor retries)
    #[error("Failed to initialize {kind} session: {cause}")]
    SessionInit {
        kind: &'static str,
        cause: Arc<anyhow::Error>,
    },

    /// A single inference call against a live session failed
    #[error("{operation} request failed: {cause}")]
    Inference {
        operation: &'static str,
        cause: Arc<anyhow::Error>,
    },

    /// A bounded wait elapsed before the capability call resolved
    #[error("{what} timed out after {elapsed_secs}s")]
    Timeout { what: String, elapsed_secs: u64 },

    /// All attempts exhausted; carries the last underlying cause
    #[error("{operation} failed after {attempts} attempt(s): {cause}")]
    OperationFailed {
        operation: &'static str,
        attempts: u32,
        cause: Box<Error>,
    },
}

impl Error {
    /// Build an `InvalidInput` error from any displayable message.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Check if this is an input-validation error.
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Check if this error is plausibly transient and worth a retry.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SessionInit { .. } | Self::Inference { .. } | Self::Timeout { .. }
        )
    }

    /// Suggested remedy for user-facing surfaces, if one applies.
    pub fn remedy(&self) -> Option<&'static str> {
        match self {
            Self::InvalidInput(_) => Some("select a larger snippet and try again"),
            Self::Timeout { .. } => Some("try again with shorter input"),
            Self::OperationFailed { cause, .. } => cause.remedy(),
            _ => None,
        }
    }

    /// Human-readable message with the remedy appended when one exists.
    pub fn user_message(&self) -> String {
        match self.remedy() {
            Some(remedy) => format!("{self} ({remedy})"),
            None => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_failed_carries_cause_and_remedy() {
        let err = Error::OperationFailed {
            operation: "review",
            attempts: 2,
            cause: Box::new(Error::Timeout {
                what: "review".into(),
                elapsed_secs: 240,
            }),
        };
        let message = err.user_message();
        assert!(message.contains("review failed after 2 attempt(s)"));
        assert!(message.contains("timed out after 240s"));
        assert!(message.contains("shorter input"));
    }

    #[test]
    fn invalid_input_is_not_retryable() {
        let err = Error::invalid_input("code is too short");
        assert!(err.is_invalid_input());
        assert!(!err.is_retryable());
    }

    #[test]
    fn session_init_is_retryable() {
        let err = Error::SessionInit {
            kind: "prompt",
            cause: Arc::new(anyhow::anyhow!("model still downloading")),
        };
        assert!(err.is_retryable());
        assert!(err.to_string().contains("prompt session"));
    }
}
