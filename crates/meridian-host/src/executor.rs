//! Driving one function instance end to end.
//!
//! The executor owns the invocation protocol: resolve the instance's
//! bindings, hand the bound values to user code, then settle every
//! binding (commit on success, release on failure). Bind failures are
//! surfaced before user code runs; a cancelled invocation is treated as
//! a failure and releases without committing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::bindings::{Binder, BindingContext, NoopNotifier, ResourceNotifier};
use crate::error::{BindError, FunctionError};
use crate::instance::FunctionInstance;
use crate::invoker::FunctionArgs;

/// Executes assembled function instances.
#[async_trait]
pub trait TriggeredFunctionExecutor: Send + Sync {
    async fn try_execute(
        &self,
        instance: FunctionInstance,
        cancel: &CancellationToken,
    ) -> FunctionResult;
}

/// Verdict of one invocation.
#[derive(Debug)]
pub enum FunctionResult {
    /// User code completed and every binding committed.
    Success,
    /// A binding failed to resolve or to commit. When resolution fails,
    /// user code never ran.
    BindingFailed { error: BindError },
    /// User code returned an error, or the invocation was cancelled.
    UserCodeFailed { error: FunctionError },
}

impl FunctionResult {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self, FunctionResult::Success)
    }
}

/// The standard executor.
pub struct FunctionExecutor {
    notifier: Arc<dyn ResourceNotifier>,
}

impl FunctionExecutor {
    pub fn new() -> Self {
        Self {
            notifier: Arc::new(NoopNotifier),
        }
    }

    /// An executor that reports committed resources to `notifier`.
    pub fn with_notifier(notifier: Arc<dyn ResourceNotifier>) -> Self {
        Self { notifier }
    }
}

impl Default for FunctionExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TriggeredFunctionExecutor for FunctionExecutor {
    async fn try_execute(
        &self,
        instance: FunctionInstance,
        cancel: &CancellationToken,
    ) -> FunctionResult {
        let ctx = BindingContext::new(instance.id())
            .with_trigger_details(instance.trigger_details().clone())
            .with_trace(instance.causality().trace.clone())
            .with_notifier(self.notifier.clone());

        let binders = match instance.binding_source().resolve(&ctx).await {
            Ok(binders) => binders,
            Err(error) => {
                warn!(
                    function = %instance.descriptor().name,
                    invocation_id = %instance.id(),
                    error = %error,
                    "Binding resolution failed"
                );
                return FunctionResult::BindingFailed { error };
            }
        };

        let args = FunctionArgs::new(binders.iter().map(Binder::value).collect());

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(FunctionError::Cancelled),
            result = instance.invoker().invoke(args) => result,
        };

        match outcome {
            Ok(()) => commit_all(binders, &instance).await,
            Err(error) => {
                release_all(binders, &instance).await;
                warn!(
                    function = %instance.descriptor().name,
                    invocation_id = %instance.id(),
                    error = %error,
                    "Invocation failed"
                );
                FunctionResult::UserCodeFailed { error }
            }
        }
    }
}

/// Commits binders in declaration order. A commit failure stops the
/// sequence and releases the remainder; bindings already committed stay
/// committed.
async fn commit_all(binders: Vec<Binder>, instance: &FunctionInstance) -> FunctionResult {
    let mut remaining = binders.into_iter();
    while let Some(binder) = remaining.next() {
        if let Err(error) = binder.complete(true).await {
            warn!(
                function = %instance.descriptor().name,
                invocation_id = %instance.id(),
                error = %error,
                "Binding commit failed"
            );
            release_all(remaining, instance).await;
            return FunctionResult::BindingFailed { error };
        }
    }

    debug!(
        function = %instance.descriptor().name,
        invocation_id = %instance.id(),
        "Invocation completed"
    );
    FunctionResult::Success
}

async fn release_all<I>(binders: I, instance: &FunctionInstance)
where
    I: IntoIterator<Item = Binder>,
{
    for binder in binders {
        if let Err(error) = binder.complete(false).await {
            warn!(
                function = %instance.descriptor().name,
                invocation_id = %instance.id(),
                error = %error,
                "Binding release failed"
            );
        }
    }
}
