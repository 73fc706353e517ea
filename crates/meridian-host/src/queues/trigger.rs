//! The queue trigger executor.
//!
//! One per queue-triggered function. Each delivered message is turned
//! into an immutable [`FunctionInstance`]: causality recovered from the
//! payload, trigger details captured for path resolution, bindings taken
//! from the function's pre-resolved plan. The inner executor's verdict is
//! returned unmodified so the delivery loop owns the retry policy.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use meridian_proto::QueueMessage;

use crate::bindings::TriggerBindingSource;
use crate::executor::{FunctionResult, TriggeredFunctionExecutor};
use crate::instance::{Causality, ExecutionReason, FunctionInstance};
use crate::registry::RegisteredFunction;
use crate::scope::CorrelationScope;

pub struct QueueTriggerExecutor<E> {
    function: RegisteredFunction,
    inner: E,
}

impl<E: TriggeredFunctionExecutor> QueueTriggerExecutor<E> {
    pub fn new(function: RegisteredFunction, inner: E) -> Self {
        Self { function, inner }
    }

    /// Runs one delivered message through the function.
    pub async fn execute(
        &self,
        message: QueueMessage,
        cancel: &CancellationToken,
    ) -> FunctionResult {
        let causality = Causality::from_message(&message);
        let details = trigger_details(&message);

        debug!(
            function = %self.function.descriptor().name,
            message_id = details.get("message_id").map_or("-", String::as_str),
            parent_known = causality.parent_id.is_some(),
            "Queue trigger fired"
        );

        let source = Arc::new(TriggerBindingSource::new(
            self.function.plan().clone(),
            message,
        ));
        let instance = FunctionInstance::builder(
            self.function.descriptor().clone(),
            self.function.invoker().clone(),
            source,
        )
        .causality(causality)
        .reason(ExecutionReason::AutomaticTrigger)
        .trigger_details(details)
        .build();

        let scope = CorrelationScope::new(
            &self.function.descriptor().name,
            instance.id(),
            instance.causality(),
        );

        scope.run(self.inner.try_execute(instance, cancel)).await
    }
}

/// Transport metadata exposed to bindings, keyed for use in blob path
/// placeholders.
fn trigger_details(message: &QueueMessage) -> BTreeMap<String, String> {
    let mut details = BTreeMap::new();
    if let Some(id) = &message.id {
        details.insert("message_id".to_string(), id.to_string());
    }
    details.insert(
        "dequeue_count".to_string(),
        message.dequeue_count.to_string(),
    );
    details
}
