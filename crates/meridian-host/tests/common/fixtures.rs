//! Test fixtures for host integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use meridian_host::{
    Causality, FunctionExecutor, FunctionInstance, FunctionResult, ResourceNotifier,
    TriggeredFunctionExecutor, WriteProgress,
};
use meridian_proto::causality;
use meridian_store::{BlobKind, BlobPath, BlobStore, BlobWriteStream, StoreError};

/// Shared log of the instances an executor saw, in execution order.
#[derive(Clone, Default)]
pub struct InstanceLog {
    entries: Arc<Mutex<Vec<(Uuid, Causality)>>>,
}

impl InstanceLog {
    pub fn entries(&self) -> Vec<(Uuid, Causality)> {
        self.entries.lock().unwrap().clone()
    }

    /// Invocation id of the only recorded instance.
    pub fn single_id(&self) -> Uuid {
        let entries = self.entries();
        assert_eq!(entries.len(), 1, "expected exactly one invocation");
        entries[0].0
    }
}

/// Executor wrapper that records each instance's id and causality before
/// delegating to the standard executor.
pub struct RecordingExecutor {
    inner: FunctionExecutor,
    log: InstanceLog,
}

impl RecordingExecutor {
    pub fn new(log: InstanceLog) -> Self {
        Self {
            inner: FunctionExecutor::new(),
            log,
        }
    }
}

#[async_trait]
impl TriggeredFunctionExecutor for RecordingExecutor {
    async fn try_execute(
        &self,
        instance: FunctionInstance,
        cancel: &CancellationToken,
    ) -> FunctionResult {
        self.log
            .entries
            .lock()
            .unwrap()
            .push((instance.id(), instance.causality().clone()));
        self.inner.try_execute(instance, cancel).await
    }
}

/// Notifier that records every committed blob as `(path, bytes_written)`.
#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<(String, u64)>>,
}

impl RecordingNotifier {
    pub fn seen(&self) -> Vec<(String, u64)> {
        self.seen.lock().unwrap().clone()
    }
}

impl ResourceNotifier for RecordingNotifier {
    fn blob_written(&self, path: &BlobPath, progress: &WriteProgress) {
        self.seen
            .lock()
            .unwrap()
            .push((path.to_string(), progress.bytes_written));
    }
}

/// Blob store whose write streams accept every write but refuse to
/// commit, standing in for a transport that rejects finalisation.
pub struct FailingCommitBlobStore;

#[async_trait]
impl BlobStore for FailingCommitBlobStore {
    async fn kind_of(&self, _path: &BlobPath) -> Result<Option<BlobKind>, StoreError> {
        Ok(None)
    }

    async fn open_write(&self, _path: &BlobPath) -> Result<Box<dyn BlobWriteStream>, StoreError> {
        Ok(Box::new(RejectingStream))
    }

    async fn exists(&self, _path: &BlobPath) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn read(&self, _path: &BlobPath) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(None)
    }
}

struct RejectingStream;

#[async_trait]
impl BlobWriteStream for RejectingStream {
    async fn write(&mut self, _buf: &[u8]) -> Result<(), StoreError> {
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        Err(StoreError::Backend("finalise rejected".to_string()))
    }

    fn abandon(self: Box<Self>) {}
}

/// A JSON payload carrying a parent invocation id alongside user fields.
pub fn payload_with_parent(parent: Uuid) -> String {
    let mut payload = Map::new();
    payload.insert("orderId".to_string(), Value::from(4711));
    causality::set_owner(parent, &mut payload);
    Value::Object(payload).to_string()
}
