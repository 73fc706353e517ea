//! Correlation scope for function invocations.
//!
//! The scope is a tracing span carrying the invocation id and whatever
//! ancestry the trigger payload supplied. It is created by the trigger
//! executor and applied to the execution future explicitly; nothing here
//! reads or writes ambient context.

use std::future::Future;

use tracing::Instrument;
use uuid::Uuid;

use crate::instance::Causality;

/// Span wrapper linking one invocation to its causal parent.
#[derive(Debug, Clone)]
pub struct CorrelationScope {
    span: tracing::Span,
}

impl CorrelationScope {
    pub fn new(function: &str, invocation_id: Uuid, causality: &Causality) -> Self {
        let span = tracing::info_span!(
            "invocation",
            function = %function,
            invocation_id = %invocation_id,
            parent_id = tracing::field::Empty,
            traceparent = tracing::field::Empty,
        );

        if let Some(parent_id) = causality.parent_id {
            span.record("parent_id", tracing::field::display(parent_id));
        }
        if let Some(traceparent) = causality.trace.traceparent.as_deref() {
            span.record("traceparent", traceparent);
        }

        Self { span }
    }

    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    /// Runs a future inside this scope. Everything the future logs or
    /// spawns inherits the invocation span.
    pub async fn run<F: Future>(&self, future: F) -> F::Output {
        future.instrument(self.span.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_passes_output_through() {
        let scope = CorrelationScope::new("demo", Uuid::new_v4(), &Causality::default());
        let result = scope.run(async { 7 }).await;
        assert_eq!(result, 7);
    }
}
