use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use meridian_proto::{MessageId, QueueMessage};

use crate::error::StoreError;
use crate::traits::{BlobStore, BlobWriteStream, QueueStore};
use crate::types::{BlobKind, BlobPath};

#[derive(Debug, Clone)]
struct BlobEntry {
    kind: BlobKind,
    content: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<RwLock<HashMap<BlobPath, BlobEntry>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads a blob in one shot, overwriting whatever is there. This is
    /// how non-block kinds come to exist in a memory store.
    pub async fn put(
        &self,
        path: &BlobPath,
        content: impl Into<Vec<u8>> + Send,
        kind: BlobKind,
    ) -> Result<(), StoreError> {
        let mut blobs = self.blobs.write().await;
        blobs.insert(
            path.clone(),
            BlobEntry {
                kind,
                content: content.into(),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn kind_of(&self, path: &BlobPath) -> Result<Option<BlobKind>, StoreError> {
        let blobs = self.blobs.read().await;
        Ok(blobs.get(path).map(|entry| entry.kind))
    }

    async fn open_write(&self, path: &BlobPath) -> Result<Box<dyn BlobWriteStream>, StoreError> {
        let blobs = self.blobs.read().await;
        if let Some(entry) = blobs.get(path) {
            if entry.kind != BlobKind::Block {
                return Err(StoreError::IncompatibleKind {
                    path: path.clone(),
                    kind: entry.kind,
                });
            }
        }

        Ok(Box::new(MemoryWriteStream {
            path: path.clone(),
            buffer: Vec::new(),
            blobs: self.blobs.clone(),
        }))
    }

    async fn exists(&self, path: &BlobPath) -> Result<bool, StoreError> {
        let blobs = self.blobs.read().await;
        Ok(blobs.contains_key(path))
    }

    async fn read(&self, path: &BlobPath) -> Result<Option<Vec<u8>>, StoreError> {
        let blobs = self.blobs.read().await;
        Ok(blobs.get(path).map(|entry| entry.content.clone()))
    }
}

struct MemoryWriteStream {
    path: BlobPath,
    buffer: Vec<u8>,
    blobs: Arc<RwLock<HashMap<BlobPath, BlobEntry>>>,
}

#[async_trait]
impl BlobWriteStream for MemoryWriteStream {
    async fn write(&mut self, buf: &[u8]) -> Result<(), StoreError> {
        self.buffer.extend_from_slice(buf);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut blobs = self.blobs.write().await;
        blobs.insert(
            self.path.clone(),
            BlobEntry {
                kind: BlobKind::Block,
                content: self.buffer,
            },
        );
        Ok(())
    }

    fn abandon(self: Box<Self>) {}
}

#[derive(Debug, Clone, Default)]
pub struct MemoryQueueStore {
    queues: Arc<Mutex<HashMap<String, VecDeque<QueueMessage>>>>,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueStore for MemoryQueueStore {
    async fn enqueue(&self, queue: &str, mut message: QueueMessage) -> Result<MessageId, StoreError> {
        let mut queues = self.queues.lock().await;
        let id = MessageId::new(Uuid::new_v4().to_string());
        message.id = Some(id.clone());
        message.inserted_at = Some(SystemTime::now());
        queues.entry(queue.to_string()).or_default().push_back(message);
        Ok(id)
    }

    async fn dequeue(&self, queue: &str) -> Result<Option<QueueMessage>, StoreError> {
        let mut queues = self.queues.lock().await;
        let queue_data = match queues.get_mut(queue) {
            Some(q) => q,
            None => return Ok(None),
        };

        Ok(queue_data.pop_front().map(|mut message| {
            message.dequeue_count += 1;
            message
        }))
    }
}
