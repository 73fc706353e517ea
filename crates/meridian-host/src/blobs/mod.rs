//! Blob-backed write bindings.

mod watcher;
mod write_binding;

pub use watcher::{ProgressCounter, WatchedWriteStream, WriteProgress};
pub use write_binding::{BlobWriter, BlobWriterProvider};
