//! The seam between the host and user code.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use meridian_proto::QueueMessage;

use crate::bindings::BoundValue;
use crate::blobs::BlobWriter;
use crate::error::FunctionError;
use crate::queues::OutboundQueue;

/// User code behind a uniform async call. The host never inspects what the
/// invoker does; it only observes success or failure.
#[async_trait]
pub trait FunctionInvoker: Send + Sync {
    async fn invoke(&self, args: FunctionArgs) -> Result<(), FunctionError>;
}

/// Positional bound values handed to an invoker, in declaration order.
#[derive(Debug, Clone)]
pub struct FunctionArgs {
    values: Vec<BoundValue>,
}

impl FunctionArgs {
    pub(crate) fn new(values: Vec<BoundValue>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn message(&self, index: usize) -> Result<&QueueMessage, FunctionError> {
        match self.get(index)? {
            BoundValue::Message(message) => Ok(message),
            _ => Err(FunctionError::ArgumentMismatch {
                index,
                expected: "trigger message",
            }),
        }
    }

    pub fn text(&self, index: usize) -> Result<&str, FunctionError> {
        match self.get(index)? {
            BoundValue::Text(text) => Ok(text),
            _ => Err(FunctionError::ArgumentMismatch {
                index,
                expected: "trigger text",
            }),
        }
    }

    pub fn writer(&self, index: usize) -> Result<BlobWriter, FunctionError> {
        match self.get(index)? {
            BoundValue::Writer(writer) => Ok(writer.clone()),
            _ => Err(FunctionError::ArgumentMismatch {
                index,
                expected: "blob writer",
            }),
        }
    }

    pub fn queue(&self, index: usize) -> Result<OutboundQueue, FunctionError> {
        match self.get(index)? {
            BoundValue::Queue(queue) => Ok(queue.clone()),
            _ => Err(FunctionError::ArgumentMismatch {
                index,
                expected: "outbound queue",
            }),
        }
    }

    fn get(&self, index: usize) -> Result<&BoundValue, FunctionError> {
        self.values
            .get(index)
            .ok_or(FunctionError::MissingArgument { index })
    }
}

type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), FunctionError>> + Send>>;
type HandlerFn = dyn Fn(FunctionArgs) -> HandlerFuture + Send + Sync;

/// Adapts an async closure into a [`FunctionInvoker`].
pub struct HandlerInvoker {
    handler: Box<HandlerFn>,
}

impl HandlerInvoker {
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(FunctionArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), FunctionError>> + Send + 'static,
    {
        Self {
            handler: Box::new(move |args| Box::pin(handler(args))),
        }
    }
}

#[async_trait]
impl FunctionInvoker for HandlerInvoker {
    async fn invoke(&self, args: FunctionArgs) -> Result<(), FunctionError> {
        (self.handler)(args).await
    }
}
