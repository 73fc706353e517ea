//! Trigger-driven function host.
//!
//! This crate turns declared functions into running invocations. A queue
//! message arrives, causal ancestry is recovered from its payload, the
//! function's declared parameters are bound to live values, user code runs,
//! and every resource-backed binding settles on the verdict: commit on
//! success, release on failure.
//!
//! The moving parts:
//!
//! - [`FunctionDescriptor`] declares a function's name and parameter shapes
//! - [`BindingRegistry`] resolves declared shapes through an ordered,
//!   first-match-wins provider chain
//! - [`FunctionRegistry`] holds registered functions, each with an eagerly
//!   resolved binding plan
//! - [`QueueTriggerExecutor`] assembles an immutable [`FunctionInstance`]
//!   per delivered message and runs it inside a [`CorrelationScope`]
//! - [`FunctionExecutor`] owns the bind / invoke / settle protocol
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//!
//! use meridian_host::{
//!     BindingRegistry, FunctionDescriptor, FunctionExecutor, FunctionRegistry,
//!     HandlerInvoker, HostConfig, ParameterShape, QueueTriggerExecutor,
//! };
//! use meridian_store::{BlobPath, MemoryBlobStore, MemoryQueueStore};
//!
//! let blob_store = Arc::new(MemoryBlobStore::default());
//! let queue_store = Arc::new(MemoryQueueStore::default());
//! let config = HostConfig::default();
//!
//! let bindings = BindingRegistry::standard(blob_store, queue_store, &config);
//! let registry = FunctionRegistry::builder(bindings)
//!     .register(
//!         FunctionDescriptor::new("archive")
//!             .with_parameter("body", ParameterShape::TriggerText)
//!             .with_parameter(
//!                 "report",
//!                 ParameterShape::BlobWriter {
//!                     path: BlobPath::parse("reports/{message_id}.txt")?,
//!                 },
//!             ),
//!         Arc::new(HandlerInvoker::new(|args| async move {
//!             let writer = args.writer(1)?;
//!             writer.write_text(args.text(0)?).await?;
//!             writer.close().await?;
//!             Ok(())
//!         })),
//!     )?
//!     .build();
//!
//! let function = registry
//!     .get("archive")
//!     .cloned()
//!     .ok_or("archive was not registered")?;
//! let trigger = QueueTriggerExecutor::new(function, FunctionExecutor::new());
//! # let _ = trigger;
//! # Ok(())
//! # }
//! ```

pub mod bindings;
pub mod blobs;
pub mod config;
pub mod queues;

mod descriptor;
mod error;
mod executor;
mod instance;
mod invoker;
mod registry;
mod scope;

pub use bindings::{BindingContext, BindingRegistry, BoundValue, NoopNotifier, ResourceNotifier};
pub use blobs::{BlobWriter, WriteProgress};
pub use config::{ConfigError, HostConfig};
pub use descriptor::{FunctionDescriptor, ParameterShape, ParameterSpec};
pub use error::{BindError, FunctionError, RegistryError};
pub use executor::{FunctionExecutor, FunctionResult, TriggeredFunctionExecutor};
pub use instance::{Causality, ExecutionReason, FunctionInstance};
pub use invoker::{FunctionArgs, FunctionInvoker, HandlerInvoker};
pub use queues::{OutboundQueue, QueueTriggerExecutor};
pub use registry::{FunctionRegistry, FunctionRegistryBuilder, RegisteredFunction};
pub use scope::CorrelationScope;
