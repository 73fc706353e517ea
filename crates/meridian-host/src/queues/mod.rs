//! Queue bindings and the queue trigger executor.

mod output;
mod trigger;

pub use output::{OutboundQueue, QueueWriterProvider};
pub use trigger::QueueTriggerExecutor;
