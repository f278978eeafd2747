//! Client error types

use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// Remote store I/O failure
    #[error("Store error: {0}")]
    Store(String),

    /// Validation failure detected before any remote call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Order state machine violation
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: shared::order::OrderStatus,
        to: shared::order::OrderStatus,
    },

    /// Actor role does not permit the operation
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// No café is currently active
    #[error("No café selected")]
    NoCafeSelected,

    /// Local persistence failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Typed user-facing outcome for recoverable flows
///
/// Mutating actions with a recoverable failure mode (PIN change,
/// feedback submission, provisioning) return this instead of throwing;
/// the message is suitable for inline display.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    /// Machine-readable code, only set on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            code: None,
        }
    }

    pub fn fail(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            code: Some(code.into()),
        }
    }
}
