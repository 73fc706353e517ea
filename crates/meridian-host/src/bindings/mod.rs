//! Argument binding: declared parameter shapes become live values.
//!
//! Providers are consulted in registration order; the first provider that
//! recognises a parameter shape wins. Matching is a configuration-time
//! activity: a registry [`plan`](BindingRegistry::plan) resolves every
//! declared parameter eagerly, so an unbindable function is rejected
//! before it can ever be triggered.
//!
//! At invocation time each planned binding produces a [`Binder`]: the
//! bound value handed to user code, plus the completion step that commits
//! or releases whatever the value was backed by. Completion consumes the
//! binder, so it runs at most once.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use meridian_proto::{QueueMessage, TraceContext};
use meridian_store::{BlobPath, BlobStore, QueueStore};

use crate::blobs::{BlobWriter, BlobWriterProvider, ProgressCounter, WriteProgress};
use crate::config::HostConfig;
use crate::descriptor::{FunctionDescriptor, ParameterSpec};
use crate::error::{BindError, RegistryError};
use crate::queues::{OutboundQueue, QueueWriterProvider};

mod trigger;

pub use trigger::{TriggerMessageProvider, TriggerTextProvider};

/// Decides whether it can bind a declared parameter. Evaluation is
/// synchronous and infallible: the only outcomes are "here is a binding"
/// and "not mine".
pub trait BindingProvider: Send + Sync {
    fn try_create(&self, param: &ParameterSpec) -> Option<Arc<dyn ArgumentBinding>>;
}

/// A planned binding for one parameter, ready to resolve against triggers.
#[async_trait]
pub trait ArgumentBinding: Send + Sync {
    async fn bind(
        &self,
        trigger: &QueueMessage,
        ctx: &BindingContext,
    ) -> Result<Binder, BindError>;
}

/// Ambient metadata for one invocation's binding work.
#[derive(Clone)]
pub struct BindingContext {
    pub invocation_id: Uuid,
    pub trigger_details: BTreeMap<String, String>,
    pub trace: TraceContext,
    pub notifier: Arc<dyn ResourceNotifier>,
}

impl BindingContext {
    pub fn new(invocation_id: Uuid) -> Self {
        Self {
            invocation_id,
            trigger_details: BTreeMap::new(),
            trace: TraceContext::default(),
            notifier: Arc::new(NoopNotifier),
        }
    }

    #[must_use]
    pub fn with_trigger_details(mut self, details: BTreeMap<String, String>) -> Self {
        self.trigger_details = details;
        self
    }

    #[must_use]
    pub fn with_trace(mut self, trace: TraceContext) -> Self {
        self.trace = trace;
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn ResourceNotifier>) -> Self {
        self.notifier = notifier;
        self
    }
}

/// Observes resources produced by committed bindings.
pub trait ResourceNotifier: Send + Sync {
    fn blob_written(&self, path: &BlobPath, progress: &WriteProgress);
}

/// Notifier that observes nothing.
pub struct NoopNotifier;

impl ResourceNotifier for NoopNotifier {
    fn blob_written(&self, _path: &BlobPath, _progress: &WriteProgress) {}
}

/// The finalisation half of a binder. `commit` is true only when the
/// invocation succeeded; false releases resources without publishing.
#[async_trait]
pub trait BindingCompletion: Send {
    async fn complete(self: Box<Self>, commit: bool) -> Result<(), BindError>;
}

/// A live value. All variants are cheap to clone: resource-backed values
/// are handles over shared state.
#[derive(Debug, Clone)]
pub enum BoundValue {
    Message(QueueMessage),
    Text(String),
    Writer(BlobWriter),
    Queue(OutboundQueue),
}

/// A resolved binding: the value for user code plus its completion
/// protocol and, for write destinations, a live progress counter.
pub struct Binder {
    value: BoundValue,
    progress: Option<ProgressCounter>,
    completion: Option<Box<dyn BindingCompletion>>,
}

impl std::fmt::Debug for Binder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder").finish_non_exhaustive()
    }
}

impl Binder {
    pub fn new(value: BoundValue) -> Self {
        Self {
            value,
            progress: None,
            completion: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ProgressCounter) -> Self {
        self.progress = Some(progress);
        self
    }

    #[must_use]
    pub fn with_completion(mut self, completion: Box<dyn BindingCompletion>) -> Self {
        self.completion = Some(completion);
        self
    }

    pub fn value(&self) -> BoundValue {
        self.value.clone()
    }

    /// Live write progress, for binders backed by a watched stream.
    pub fn progress(&self) -> Option<WriteProgress> {
        self.progress.as_ref().map(ProgressCounter::snapshot)
    }

    /// Runs the completion step. Consumes the binder: finalisation happens
    /// at most once per binding.
    pub async fn complete(self, commit: bool) -> Result<(), BindError> {
        match self.completion {
            Some(completion) => completion.complete(commit).await,
            None => Ok(()),
        }
    }
}

/// Ordered, immutable provider chain. Built once at host assembly;
/// first-match-wins thereafter.
#[derive(Clone)]
pub struct BindingRegistry {
    providers: Vec<Arc<dyn BindingProvider>>,
}

impl BindingRegistry {
    pub fn new(providers: Vec<Arc<dyn BindingProvider>>) -> Self {
        Self { providers }
    }

    /// The standard provider chain: trigger shapes first, then resource
    /// writers, wired to the given stores.
    pub fn standard(
        blob_store: Arc<dyn BlobStore>,
        queue_store: Arc<dyn QueueStore>,
        config: &HostConfig,
    ) -> Self {
        Self::new(vec![
            Arc::new(TriggerMessageProvider),
            Arc::new(TriggerTextProvider),
            Arc::new(BlobWriterProvider::new(
                blob_store,
                config.writer.buffer_size,
            )),
            Arc::new(QueueWriterProvider::new(
                queue_store,
                config.causality.stamp_outbound,
            )),
        ])
    }

    /// First applicable binding for a parameter, in provider order.
    pub fn resolve(&self, param: &ParameterSpec) -> Option<Arc<dyn ArgumentBinding>> {
        self.providers
            .iter()
            .find_map(|provider| provider.try_create(param))
    }

    /// Resolves every declared parameter eagerly. Any parameter no
    /// provider recognises rejects the whole function.
    pub fn plan(&self, descriptor: &FunctionDescriptor) -> Result<BindingPlan, RegistryError> {
        let bindings = descriptor
            .parameters
            .iter()
            .map(|param| {
                self.resolve(param)
                    .ok_or_else(|| RegistryError::UnboundParameter {
                        function: descriptor.name.clone(),
                        parameter: param.name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BindingPlan { bindings })
    }
}

/// Bindings for a function's parameters, in declaration order.
#[derive(Clone)]
pub struct BindingPlan {
    bindings: Vec<Arc<dyn ArgumentBinding>>,
}

impl std::fmt::Debug for BindingPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingPlan").finish_non_exhaustive()
    }
}

impl BindingPlan {
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Resolves the whole plan against one trigger message.
    pub async fn bind_all(
        &self,
        trigger: &QueueMessage,
        ctx: &BindingContext,
    ) -> Result<Vec<Binder>, BindError> {
        let mut binders = Vec::with_capacity(self.bindings.len());
        for binding in &self.bindings {
            binders.push(binding.bind(trigger, ctx).await?);
        }
        Ok(binders)
    }
}

/// Supplies the binders for one instance's declared parameters.
#[async_trait]
pub trait BindingSource: Send + Sync {
    async fn resolve(&self, ctx: &BindingContext) -> Result<Vec<Binder>, BindError>;
}

/// The standard binding source: a planned function plus the trigger
/// message one instance was created for.
pub struct TriggerBindingSource {
    plan: BindingPlan,
    trigger: QueueMessage,
}

impl TriggerBindingSource {
    pub fn new(plan: BindingPlan, trigger: QueueMessage) -> Self {
        Self { plan, trigger }
    }
}

#[async_trait]
impl BindingSource for TriggerBindingSource {
    async fn resolve(&self, ctx: &BindingContext) -> Result<Vec<Binder>, BindError> {
        self.plan.bind_all(&self.trigger, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ParameterShape;

    struct TextAs(&'static str);

    #[async_trait]
    impl ArgumentBinding for TextAs {
        async fn bind(
            &self,
            _trigger: &QueueMessage,
            _ctx: &BindingContext,
        ) -> Result<Binder, BindError> {
            Ok(Binder::new(BoundValue::Text(self.0.to_string())))
        }
    }

    struct ClaimsText(&'static str);

    impl BindingProvider for ClaimsText {
        fn try_create(&self, param: &ParameterSpec) -> Option<Arc<dyn ArgumentBinding>> {
            match param.shape {
                ParameterShape::TriggerText => Some(Arc::new(TextAs(self.0))),
                _ => None,
            }
        }
    }

    fn text_param() -> ParameterSpec {
        ParameterSpec {
            name: "body".to_string(),
            shape: ParameterShape::TriggerText,
        }
    }

    #[tokio::test]
    async fn first_matching_provider_wins() {
        let registry = BindingRegistry::new(vec![
            Arc::new(ClaimsText("first")),
            Arc::new(ClaimsText("second")),
        ]);

        let binding = registry.resolve(&text_param()).unwrap();
        let binder = binding
            .bind(
                &QueueMessage::from_text("{}"),
                &BindingContext::new(Uuid::new_v4()),
            )
            .await
            .unwrap();

        assert!(matches!(binder.value(), BoundValue::Text(text) if text == "first"));
    }

    #[test]
    fn unmatched_shape_is_a_configuration_error() {
        let registry = BindingRegistry::new(vec![Arc::new(ClaimsText("only-text"))]);
        let descriptor = FunctionDescriptor::new("orphan").with_parameter(
            "message",
            ParameterShape::TriggerMessage,
        );

        let err = registry.plan(&descriptor).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::UnboundParameter { ref function, ref parameter }
                if function == "orphan" && parameter == "message"
        ));
    }

    #[test]
    fn plan_covers_every_parameter() {
        let registry = BindingRegistry::new(vec![Arc::new(ClaimsText("t"))]);
        let descriptor = FunctionDescriptor::new("pair")
            .with_parameter("first", ParameterShape::TriggerText)
            .with_parameter("second", ParameterShape::TriggerText);

        let plan = registry.plan(&descriptor).unwrap();
        assert_eq!(plan.len(), 2);
    }

    #[tokio::test]
    async fn binder_without_completion_completes_trivially() {
        let binder = Binder::new(BoundValue::Text("t".to_string()));
        binder.complete(true).await.unwrap();
    }
}
