//! The blob write binding.
//!
//! Binding produces a [`BlobWriter`]: a buffered handle over a watched
//! write stream. The handle's lifecycle is Open → InUse (first write) →
//! Finalising (closed) → Closed (completed). Closing flushes and bars
//! further writes but never commits; publication happens only in the
//! binding's completion step, and only when the invocation succeeded and
//! at least one byte was written.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use meridian_proto::QueueMessage;
use meridian_store::{BlobKind, BlobPath, BlobStore};

use crate::bindings::{
    ArgumentBinding, Binder, BindingCompletion, BindingContext, BindingProvider, BoundValue,
    ResourceNotifier,
};
use crate::blobs::watcher::{ProgressCounter, WatchedWriteStream, WriteProgress};
use crate::descriptor::{ParameterShape, ParameterSpec};
use crate::error::BindError;

/// Binds [`ParameterShape::BlobWriter`] parameters to buffered write
/// handles backed by a blob store.
pub struct BlobWriterProvider {
    store: Arc<dyn BlobStore>,
    buffer_size: usize,
}

impl BlobWriterProvider {
    pub fn new(store: Arc<dyn BlobStore>, buffer_size: usize) -> Self {
        Self { store, buffer_size }
    }
}

impl BindingProvider for BlobWriterProvider {
    fn try_create(&self, param: &ParameterSpec) -> Option<Arc<dyn ArgumentBinding>> {
        match &param.shape {
            ParameterShape::BlobWriter { path } => Some(Arc::new(WriterBinding {
                store: self.store.clone(),
                pattern: path.clone(),
                buffer_size: self.buffer_size,
            })),
            _ => None,
        }
    }
}

struct WriterBinding {
    store: Arc<dyn BlobStore>,
    pattern: BlobPath,
    buffer_size: usize,
}

#[async_trait]
impl ArgumentBinding for WriterBinding {
    async fn bind(
        &self,
        _trigger: &QueueMessage,
        ctx: &BindingContext,
    ) -> Result<Binder, BindError> {
        let path = self.pattern.resolve(&ctx.trigger_details)?;

        // An existing blob of the wrong kind fails the bind before any
        // user code runs.
        if let Some(kind) = self.store.kind_of(&path).await? {
            if kind != BlobKind::Block {
                return Err(BindError::IncompatibleKind { path, kind });
            }
        }

        let stream = WatchedWriteStream::new(self.store.open_write(&path).await?);
        let counter = stream.counter();
        let writer = BlobWriter::new(path.clone(), stream, self.buffer_size);
        let completion = WriterCompletion {
            writer: writer.clone(),
            action: CommittedAction {
                path,
                notifier: ctx.notifier.clone(),
            },
        };

        Ok(Binder::new(BoundValue::Writer(writer))
            .with_progress(counter)
            .with_completion(Box::new(completion)))
    }
}

/// Runs once, strictly after a successful commit.
struct CommittedAction {
    path: BlobPath,
    notifier: Arc<dyn ResourceNotifier>,
}

impl CommittedAction {
    fn notify(self, progress: WriteProgress) {
        self.notifier.blob_written(&self.path, &progress);
    }
}

struct WriterCompletion {
    writer: BlobWriter,
    action: CommittedAction,
}

#[async_trait]
impl BindingCompletion for WriterCompletion {
    async fn complete(self: Box<Self>, commit: bool) -> Result<(), BindError> {
        if commit {
            self.writer.finalise(self.action).await
        } else {
            self.writer.release().await;
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Open,
    InUse,
    Finalising,
    Closed,
}

struct WriterInner {
    stream: Option<WatchedWriteStream>,
    buffer: Vec<u8>,
    buffer_size: usize,
    state: WriterState,
}

impl WriterInner {
    async fn write(&mut self, buf: &[u8]) -> Result<(), BindError> {
        match self.state {
            WriterState::Finalising | WriterState::Closed => {
                return Err(BindError::WriterClosed)
            }
            WriterState::Open => self.state = WriterState::InUse,
            WriterState::InUse => {}
        }

        self.buffer.extend_from_slice(buf);
        if self.buffer.len() >= self.buffer_size {
            self.flush_buffer().await?;
        }
        Ok(())
    }

    async fn flush_buffer(&mut self) -> Result<(), BindError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let stream = self.stream.as_mut().ok_or(BindError::AlreadyCompleted)?;
        stream.write(&self.buffer).await?;
        self.buffer.clear();
        Ok(())
    }
}

/// Buffered write handle for one blob destination. Clones share state;
/// the handle the invoker receives and the completion step held by the
/// executor point at the same writer.
#[derive(Clone)]
pub struct BlobWriter {
    path: BlobPath,
    counter: ProgressCounter,
    inner: Arc<Mutex<WriterInner>>,
}

impl BlobWriter {
    pub(crate) fn new(path: BlobPath, stream: WatchedWriteStream, buffer_size: usize) -> Self {
        let counter = stream.counter();
        Self {
            path,
            counter,
            inner: Arc::new(Mutex::new(WriterInner {
                stream: Some(stream),
                buffer: Vec::new(),
                buffer_size,
                state: WriterState::Open,
            })),
        }
    }

    /// The resolved destination path.
    pub fn path(&self) -> &BlobPath {
        &self.path
    }

    pub async fn write_all(&self, buf: &[u8]) -> Result<(), BindError> {
        let mut inner = self.inner.lock().await;
        inner.write(buf).await
    }

    pub async fn write_text(&self, text: &str) -> Result<(), BindError> {
        self.write_all(text.as_bytes()).await
    }

    /// Pushes buffered bytes through to the underlying stream. A no-op on
    /// a closed writer.
    pub async fn flush(&self) -> Result<(), BindError> {
        let mut inner = self.inner.lock().await;
        if matches!(inner.state, WriterState::Finalising | WriterState::Closed) {
            return Ok(());
        }
        inner.flush_buffer().await?;
        if let Some(stream) = inner.stream.as_mut() {
            stream.flush().await?;
        }
        Ok(())
    }

    /// Closes the handle: flushes the buffer and bars further writes.
    /// Idempotent. Never commits; that belongs to the completion step.
    pub async fn close(&self) -> Result<(), BindError> {
        let mut inner = self.inner.lock().await;
        if matches!(inner.state, WriterState::Finalising | WriterState::Closed) {
            return Ok(());
        }
        inner.flush_buffer().await?;
        inner.state = WriterState::Finalising;
        Ok(())
    }

    /// Progress as observed below the handle's buffer: bytes still
    /// buffered have not been counted yet.
    #[must_use]
    pub fn progress(&self) -> WriteProgress {
        self.counter.snapshot()
    }

    pub(crate) async fn finalise(&self, action: CommittedAction) -> Result<(), BindError> {
        let mut inner = self.inner.lock().await;
        if inner.state == WriterState::Closed {
            return Err(BindError::AlreadyCompleted);
        }
        inner.flush_buffer().await?;
        inner.state = WriterState::Closed;

        let stream = inner.stream.take().ok_or(BindError::AlreadyCompleted)?;
        let progress = stream.progress();
        if stream.has_written() {
            stream.commit().await?;
            debug!(
                path = %action.path,
                bytes = progress.bytes_written,
                "Committed blob write"
            );
            action.notify(progress);
        } else {
            stream.abandon();
            debug!(path = %action.path, "Abandoned blob write with no bytes");
        }
        Ok(())
    }

    pub(crate) async fn release(&self) {
        let mut inner = self.inner.lock().await;
        inner.state = WriterState::Closed;
        inner.buffer.clear();
        if let Some(stream) = inner.stream.take() {
            stream.abandon();
        }
    }
}

impl fmt::Debug for BlobWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobWriter")
            .field("path", &self.path)
            .field("progress", &self.counter.snapshot())
            .finish_non_exhaustive()
    }
}
