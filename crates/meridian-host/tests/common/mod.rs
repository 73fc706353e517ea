//! Common test utilities for host integration tests.

pub mod fixtures;

use std::sync::Arc;

use meridian_host::{
    BindingRegistry, FunctionDescriptor, FunctionExecutor, FunctionInvoker, FunctionRegistry,
    HostConfig, QueueTriggerExecutor, TriggeredFunctionExecutor,
};
use meridian_store::{MemoryBlobStore, MemoryQueueStore};

/// Complete test host: in-memory stores, the standard binding chain, and a
/// registry populated through the builder.
pub struct TestHost {
    pub blob_store: MemoryBlobStore,
    pub queue_store: MemoryQueueStore,
    pub registry: FunctionRegistry,
}

impl TestHost {
    /// Builder with default configuration.
    pub fn builder() -> TestHostBuilder {
        Self::builder_with_config(HostConfig::default())
    }

    /// Builder with custom host configuration.
    pub fn builder_with_config(config: HostConfig) -> TestHostBuilder {
        TestHostBuilder {
            blob_store: MemoryBlobStore::default(),
            queue_store: MemoryQueueStore::default(),
            config,
            functions: Vec::new(),
        }
    }

    /// Trigger executor for a registered function, wired to the standard
    /// executor.
    pub fn trigger(&self, function: &str) -> QueueTriggerExecutor<FunctionExecutor> {
        self.trigger_with(function, FunctionExecutor::new())
    }

    /// Trigger executor for a registered function, wired to a custom inner
    /// executor.
    pub fn trigger_with<E: TriggeredFunctionExecutor>(
        &self,
        function: &str,
        executor: E,
    ) -> QueueTriggerExecutor<E> {
        let function = self
            .registry
            .get(function)
            .cloned()
            .expect("function registered");
        QueueTriggerExecutor::new(function, executor)
    }
}

pub struct TestHostBuilder {
    blob_store: MemoryBlobStore,
    queue_store: MemoryQueueStore,
    config: HostConfig,
    functions: Vec<(FunctionDescriptor, Arc<dyn FunctionInvoker>)>,
}

impl TestHostBuilder {
    /// Registers a function with the host under construction.
    pub fn with_function(
        mut self,
        descriptor: FunctionDescriptor,
        invoker: Arc<dyn FunctionInvoker>,
    ) -> Self {
        self.functions.push((descriptor, invoker));
        self
    }

    pub fn build(self) -> TestHost {
        let bindings = BindingRegistry::standard(
            Arc::new(self.blob_store.clone()),
            Arc::new(self.queue_store.clone()),
            &self.config,
        );

        let mut builder = FunctionRegistry::builder(bindings);
        for (descriptor, invoker) in self.functions {
            builder = builder.register(descriptor, invoker).expect("registration");
        }

        TestHost {
            blob_store: self.blob_store,
            queue_store: self.queue_store,
            registry: builder.build(),
        }
    }
}
