mod error;
mod traits;
mod types;

#[cfg(feature = "memory")]
mod memory;

pub use error::StoreError;
pub use traits::{BlobStore, BlobWriteStream, QueueStore};
pub use types::{BlobKind, BlobPath};

#[cfg(feature = "memory")]
pub use memory::{MemoryBlobStore, MemoryQueueStore};
