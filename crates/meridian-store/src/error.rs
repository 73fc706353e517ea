use thiserror::Error;

use crate::types::{BlobKind, BlobPath};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid blob path: {0}")]
    InvalidPath(String),

    #[error("Unresolved placeholder '{placeholder}' in '{pattern}'")]
    UnresolvedPlaceholder { pattern: String, placeholder: String },

    #[error("Blob {path} is a {kind} blob, expected block")]
    IncompatibleKind { path: BlobPath, kind: BlobKind },

    #[error("Backend error: {0}")]
    Backend(String),
}
