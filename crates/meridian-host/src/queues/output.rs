//! The outbound queue binding.
//!
//! Messages added during an invocation are collected, not sent. The
//! completion step enqueues them only when the invocation committed,
//! stamping each JSON-object payload with the producing invocation's id
//! and the trace context it inherited. A failed invocation sends nothing.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use meridian_proto::{causality, QueueMessage, TraceContext};
use meridian_store::QueueStore;

use crate::bindings::{
    ArgumentBinding, Binder, BindingCompletion, BindingContext, BindingProvider, BoundValue,
};
use crate::descriptor::{ParameterShape, ParameterSpec};
use crate::error::BindError;

/// Provider for [`ParameterShape::QueueWriter`] parameters.
pub struct QueueWriterProvider {
    store: Arc<dyn QueueStore>,
    stamp_outbound: bool,
}

impl QueueWriterProvider {
    pub fn new(store: Arc<dyn QueueStore>, stamp_outbound: bool) -> Self {
        Self {
            store,
            stamp_outbound,
        }
    }
}

impl BindingProvider for QueueWriterProvider {
    fn try_create(&self, param: &ParameterSpec) -> Option<Arc<dyn ArgumentBinding>> {
        match &param.shape {
            ParameterShape::QueueWriter { queue } => Some(Arc::new(QueueWriterBinding {
                store: self.store.clone(),
                queue: queue.clone(),
                stamp_outbound: self.stamp_outbound,
            })),
            _ => None,
        }
    }
}

struct QueueWriterBinding {
    store: Arc<dyn QueueStore>,
    queue: String,
    stamp_outbound: bool,
}

#[async_trait]
impl ArgumentBinding for QueueWriterBinding {
    async fn bind(
        &self,
        _trigger: &QueueMessage,
        ctx: &BindingContext,
    ) -> Result<Binder, BindError> {
        let outbound = OutboundQueue::new(&self.queue);
        let completion = QueueCompletion {
            outbound: outbound.clone(),
            store: self.store.clone(),
            owner: ctx.invocation_id,
            trace: ctx.trace.clone(),
            stamp_outbound: self.stamp_outbound,
        };

        Ok(Binder::new(BoundValue::Queue(outbound)).with_completion(Box::new(completion)))
    }
}

/// Collector handle for one destination queue. Clones share the same
/// pending list; nothing reaches the store until the invocation commits.
#[derive(Clone)]
pub struct OutboundQueue {
    queue: String,
    pending: Arc<Mutex<Vec<QueueMessage>>>,
}

impl OutboundQueue {
    fn new(queue: &str) -> Self {
        Self {
            queue: queue.to_string(),
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Destination queue name.
    #[must_use]
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Adds a message to the pending batch.
    pub async fn add(&self, message: QueueMessage) {
        self.pending.lock().await.push(message);
    }

    /// Adds a UTF-8 text message to the pending batch.
    pub async fn add_text(&self, text: impl Into<String>) {
        self.add(QueueMessage::from_text(text)).await;
    }

    /// Number of messages waiting on the commit decision.
    pub async fn pending(&self) -> usize {
        self.pending.lock().await.len()
    }
}

impl std::fmt::Debug for OutboundQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundQueue")
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

struct QueueCompletion {
    outbound: OutboundQueue,
    store: Arc<dyn QueueStore>,
    owner: Uuid,
    trace: TraceContext,
    stamp_outbound: bool,
}

#[async_trait]
impl BindingCompletion for QueueCompletion {
    async fn complete(self: Box<Self>, commit: bool) -> Result<(), BindError> {
        let messages: Vec<QueueMessage> = {
            let mut pending = self.outbound.pending.lock().await;
            pending.drain(..).collect()
        };

        if !commit {
            if !messages.is_empty() {
                debug!(
                    queue = %self.outbound.queue,
                    dropped = messages.len(),
                    "Released outbound messages without sending"
                );
            }
            return Ok(());
        }

        let sent = messages.len();
        for mut message in messages {
            if self.stamp_outbound {
                stamp_causality(&mut message, self.owner, &self.trace);
            }
            self.store.enqueue(&self.outbound.queue, message).await?;
        }

        if sent > 0 {
            debug!(
                queue = %self.outbound.queue,
                sent,
                "Committed outbound messages"
            );
        }
        Ok(())
    }
}

/// Stamping is best effort: only UTF-8 JSON-object bodies carry the
/// causality keys. Anything else is sent untouched rather than rejected.
fn stamp_causality(message: &mut QueueMessage, owner: Uuid, trace: &TraceContext) {
    let Some(text) = message.text() else {
        return;
    };
    let Ok(Value::Object(mut payload)) = serde_json::from_str(text) else {
        return;
    };

    causality::set_owner(owner, &mut payload);
    causality::set_trace_context(trace, &mut payload);
    message.body = Value::Object(payload).to_string().into_bytes();
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_store::MemoryQueueStore;

    fn writer_param(queue: &str) -> ParameterSpec {
        ParameterSpec {
            name: "out".to_string(),
            shape: ParameterShape::QueueWriter {
                queue: queue.to_string(),
            },
        }
    }

    async fn bind_outbound(
        store: &MemoryQueueStore,
        ctx: &BindingContext,
        stamp: bool,
    ) -> Binder {
        let provider = QueueWriterProvider::new(Arc::new(store.clone()), stamp);
        let binding = provider.try_create(&writer_param("work")).unwrap();
        binding
            .bind(&QueueMessage::from_text("{}"), ctx)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn commit_sends_stamped_messages() {
        let store = MemoryQueueStore::default();
        let invocation_id = Uuid::new_v4();
        let ctx = BindingContext::new(invocation_id)
            .with_trace(TraceContext::new("00-abc-def-01").with_state("vendor=1"));

        let binder = bind_outbound(&store, &ctx, true).await;
        let BoundValue::Queue(outbound) = binder.value() else {
            panic!("expected a queue value");
        };
        outbound.add_text(r#"{"work":"resize"}"#).await;

        binder.complete(true).await.unwrap();

        let delivered = store.dequeue("work").await.unwrap().unwrap();
        assert_eq!(causality::get_owner(&delivered), Some(invocation_id));

        let trace = causality::get_trace_context(&delivered);
        assert_eq!(trace.traceparent.as_deref(), Some("00-abc-def-01"));
        assert_eq!(trace.tracestate.as_deref(), Some("vendor=1"));

        let payload: Value = serde_json::from_str(delivered.text().unwrap()).unwrap();
        assert_eq!(payload["work"], "resize");
    }

    #[tokio::test]
    async fn release_drops_the_batch() {
        let store = MemoryQueueStore::default();
        let ctx = BindingContext::new(Uuid::new_v4());

        let binder = bind_outbound(&store, &ctx, true).await;
        let BoundValue::Queue(outbound) = binder.value() else {
            panic!("expected a queue value");
        };
        outbound.add_text(r#"{"work":"resize"}"#).await;
        assert_eq!(outbound.pending().await, 1);

        binder.complete(false).await.unwrap();

        assert!(store.dequeue("work").await.unwrap().is_none());
        assert_eq!(outbound.pending().await, 0);
    }

    #[tokio::test]
    async fn non_json_body_is_sent_untouched() {
        let store = MemoryQueueStore::default();
        let ctx = BindingContext::new(Uuid::new_v4());

        let binder = bind_outbound(&store, &ctx, true).await;
        let BoundValue::Queue(outbound) = binder.value() else {
            panic!("expected a queue value");
        };
        outbound.add_text("plain text, not json").await;
        outbound.add(QueueMessage::from_bytes(vec![0xff, 0xfe])).await;

        binder.complete(true).await.unwrap();

        let first = store.dequeue("work").await.unwrap().unwrap();
        assert_eq!(first.text(), Some("plain text, not json"));

        let second = store.dequeue("work").await.unwrap().unwrap();
        assert_eq!(second.body, vec![0xff, 0xfe]);
    }

    #[tokio::test]
    async fn stamping_can_be_disabled() {
        let store = MemoryQueueStore::default();
        let ctx = BindingContext::new(Uuid::new_v4())
            .with_trace(TraceContext::new("00-abc-def-01"));

        let binder = bind_outbound(&store, &ctx, false).await;
        let BoundValue::Queue(outbound) = binder.value() else {
            panic!("expected a queue value");
        };
        outbound.add_text(r#"{"work":"resize"}"#).await;

        binder.complete(true).await.unwrap();

        let delivered = store.dequeue("work").await.unwrap().unwrap();
        assert_eq!(delivered.text(), Some(r#"{"work":"resize"}"#));
        assert_eq!(causality::get_owner(&delivered), None);
    }

    #[tokio::test]
    async fn empty_trace_adds_no_keys() {
        let store = MemoryQueueStore::default();
        let invocation_id = Uuid::new_v4();
        let ctx = BindingContext::new(invocation_id);

        let binder = bind_outbound(&store, &ctx, true).await;
        let BoundValue::Queue(outbound) = binder.value() else {
            panic!("expected a queue value");
        };
        outbound.add_text(r#"{"work":"resize"}"#).await;

        binder.complete(true).await.unwrap();

        let delivered = store.dequeue("work").await.unwrap().unwrap();
        assert_eq!(causality::get_owner(&delivered), Some(invocation_id));
        assert!(causality::get_trace_context(&delivered).is_empty());
    }
}
