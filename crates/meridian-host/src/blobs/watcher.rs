//! Self-watching stream decoration.
//!
//! A [`WatchedWriteStream`] wraps a raw store stream and counts what flows
//! through it. The counters feed two consumers: live progress sampling
//! while user code is still writing, and the commit decision once it has
//! finished (a stream nothing flowed through is abandoned, not committed).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use meridian_store::{BlobWriteStream, StoreError};

/// Snapshot of write activity through a watched stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteProgress {
    pub bytes_written: u64,
    pub write_calls: u64,
}

/// Shared counter behind a watched stream. Cheap to clone; safe to sample
/// from outside the invocation while writes are in flight.
#[derive(Debug, Clone, Default)]
pub struct ProgressCounter {
    inner: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    bytes: AtomicU64,
    calls: AtomicU64,
}

impl ProgressCounter {
    fn record(&self, bytes: usize) {
        self.inner.bytes.fetch_add(bytes as u64, Ordering::Relaxed);
        self.inner.calls.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> WriteProgress {
        WriteProgress {
            bytes_written: self.inner.bytes.load(Ordering::Relaxed),
            write_calls: self.inner.calls.load(Ordering::Relaxed),
        }
    }
}

/// Decorator counting the bytes and calls that reach the underlying
/// stream. Commit and abandon consume the decorator, so each forwards to
/// the raw stream exactly once.
pub struct WatchedWriteStream {
    stream: Box<dyn BlobWriteStream>,
    progress: ProgressCounter,
}

impl WatchedWriteStream {
    pub fn new(stream: Box<dyn BlobWriteStream>) -> Self {
        Self {
            stream,
            progress: ProgressCounter::default(),
        }
    }

    /// Handle for sampling progress independently of the stream.
    pub fn counter(&self) -> ProgressCounter {
        self.progress.clone()
    }

    pub fn progress(&self) -> WriteProgress {
        self.progress.snapshot()
    }

    /// True when at least one byte went through. This is the commit
    /// decision for a write binding.
    #[must_use]
    pub fn has_written(&self) -> bool {
        self.progress.snapshot().bytes_written > 0
    }

    pub async fn write(&mut self, buf: &[u8]) -> Result<(), StoreError> {
        self.stream.write(buf).await?;
        self.progress.record(buf.len());
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), StoreError> {
        self.stream.flush().await
    }

    pub async fn commit(self) -> Result<(), StoreError> {
        self.stream.commit().await
    }

    pub fn abandon(self) {
        self.stream.abandon();
    }
}
