use thiserror::Error;

use meridian_store::{BlobKind, BlobPath, StoreError};

/// Errors raised while resolving or finalising argument bindings.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("Blob {path} is a {kind} blob; streamed writes require a block blob")]
    IncompatibleKind { path: BlobPath, kind: BlobKind },

    #[error("Trigger payload is not valid UTF-8 text")]
    NotText,

    #[error("Writer is closed")]
    WriterClosed,

    #[error("Binding already completed")]
    AlreadyCompleted,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors surfaced from user code or the argument surface it sees.
#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("Invocation cancelled")]
    Cancelled,

    #[error("Argument {index} is missing")]
    MissingArgument { index: usize },

    #[error("Argument {index} is not a {expected}")]
    ArgumentMismatch { index: usize, expected: &'static str },

    #[error("Binding error: {0}")]
    Binding(#[from] BindError),

    #[error("{0}")]
    Failed(String),
}

impl FunctionError {
    /// Wraps an arbitrary user-side failure.
    pub fn failed(message: impl std::fmt::Display) -> Self {
        Self::Failed(message.to_string())
    }
}

/// Errors raised while assembling the function registry. These surface at
/// configuration time; a function that fails registration is never
/// triggerable.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Function '{function}' parameter '{parameter}' has no applicable binding provider")]
    UnboundParameter { function: String, parameter: String },

    #[error("Function '{function}' is already registered")]
    DuplicateFunction { function: String },
}
