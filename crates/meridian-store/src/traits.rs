use async_trait::async_trait;

use meridian_proto::{MessageId, QueueMessage};

use crate::error::StoreError;
use crate::types::{BlobKind, BlobPath};

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Kind of the blob at `path`, or `None` when nothing exists there.
    async fn kind_of(&self, path: &BlobPath) -> Result<Option<BlobKind>, StoreError>;

    /// Opens a streaming write producing a block blob. Nothing becomes
    /// visible to readers until the returned stream is committed.
    async fn open_write(&self, path: &BlobPath) -> Result<Box<dyn BlobWriteStream>, StoreError>;

    async fn exists(&self, path: &BlobPath) -> Result<bool, StoreError>;

    async fn read(&self, path: &BlobPath) -> Result<Option<Vec<u8>>, StoreError>;
}

#[async_trait]
pub trait BlobWriteStream: Send {
    async fn write(&mut self, buf: &[u8]) -> Result<(), StoreError>;

    async fn flush(&mut self) -> Result<(), StoreError>;

    /// Publishes everything written so far as the blob's content, all at
    /// once. An uncommitted stream leaves no blob behind.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Releases the stream without publishing anything.
    fn abandon(self: Box<Self>);
}

#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Enqueues a message, assigning its transport id and insertion time.
    async fn enqueue(&self, queue: &str, message: QueueMessage) -> Result<MessageId, StoreError>;

    async fn dequeue(&self, queue: &str) -> Result<Option<QueueMessage>, StoreError>;
}
