//! Error types for dispatch construction.
//!
//! Only recoverable conditions live here. Contract violations (re-acquiring a
//! held builtin, an unset translation direction) panic at the call site and
//! legitimately absent data is returned as an empty value.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Operation id or name the runtime does not know, or cannot service on this device.
    #[error("unsupported builtin operation: {0}")]
    UnsupportedOperation(String),

    /// Every storage missed every code kind for an operation that must be instantiated.
    #[error("no builtin code for `{operation}` on {device}")]
    MissingBuiltinCode { operation: String, device: String },

    /// Operation parameters lack an operand the operation reads.
    #[error("invalid parameters for {operation}: {reason}")]
    InvalidParams { operation: String, reason: String },

    #[error("unknown hardware family: {0}")]
    UnknownHardwareFamily(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type DispatchResult<T> = Result<T, DispatchError>;
