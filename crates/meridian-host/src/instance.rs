//! Per-invocation function instances.
//!
//! A [`FunctionInstance`] is the immutable record of one invocation: a
//! fresh id, the causality recovered from the trigger payload, why the
//! function is running, and the collaborators needed to run it. Causality
//! is resolved before the instance is built; nothing mutates it afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use meridian_proto::{causality, QueueMessage, TraceContext};

use crate::bindings::BindingSource;
use crate::descriptor::FunctionDescriptor;
use crate::invoker::FunctionInvoker;

/// Causal ancestry of an invocation, as recovered from the trigger
/// payload. Both representations are carried side by side; neither takes
/// precedence over the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Causality {
    /// Invocation id of the producer, when the payload carried one.
    pub parent_id: Option<Uuid>,
    /// W3C trace context, when the payload carried one.
    pub trace: TraceContext,
}

impl Causality {
    /// Extracts causality from a trigger message. Any malformed or absent
    /// field degrades to unknown; extraction never fails.
    #[must_use]
    pub fn from_message(message: &QueueMessage) -> Self {
        Self {
            parent_id: causality::get_owner(message),
            trace: causality::get_trace_context(message),
        }
    }

    /// True when the payload carried no usable ancestry at all.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.parent_id.is_none() && self.trace.is_empty()
    }
}

/// Why a function instance is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionReason {
    /// A trigger fired on new input.
    AutomaticTrigger,
    /// The host was asked to run the function directly.
    HostCall,
    /// A schedule elapsed.
    Timer,
}

impl fmt::Display for ExecutionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionReason::AutomaticTrigger => write!(f, "automatic trigger"),
            ExecutionReason::HostCall => write!(f, "host call"),
            ExecutionReason::Timer => write!(f, "timer"),
        }
    }
}

/// One invocation of one function. Immutable once built.
pub struct FunctionInstance {
    id: Uuid,
    causality: Causality,
    trigger_details: BTreeMap<String, String>,
    reason: ExecutionReason,
    binding_source: Arc<dyn BindingSource>,
    invoker: Arc<dyn FunctionInvoker>,
    descriptor: Arc<FunctionDescriptor>,
}

impl FunctionInstance {
    pub fn builder(
        descriptor: Arc<FunctionDescriptor>,
        invoker: Arc<dyn FunctionInvoker>,
        binding_source: Arc<dyn BindingSource>,
    ) -> FunctionInstanceBuilder {
        FunctionInstanceBuilder {
            causality: Causality::default(),
            trigger_details: BTreeMap::new(),
            reason: ExecutionReason::HostCall,
            binding_source,
            invoker,
            descriptor,
        }
    }

    /// The invocation id. Fresh per instance, never reused.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn causality(&self) -> &Causality {
        &self.causality
    }

    pub fn trigger_details(&self) -> &BTreeMap<String, String> {
        &self.trigger_details
    }

    #[must_use]
    pub fn reason(&self) -> ExecutionReason {
        self.reason
    }

    pub fn binding_source(&self) -> &Arc<dyn BindingSource> {
        &self.binding_source
    }

    pub fn invoker(&self) -> &Arc<dyn FunctionInvoker> {
        &self.invoker
    }

    pub fn descriptor(&self) -> &Arc<FunctionDescriptor> {
        &self.descriptor
    }
}

impl fmt::Debug for FunctionInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionInstance")
            .field("id", &self.id)
            .field("function", &self.descriptor.name)
            .field("reason", &self.reason)
            .field("causality", &self.causality)
            .finish()
    }
}

/// Builder for [`FunctionInstance`]. The single place where a trigger
/// executor attaches causality and trigger details before execution.
pub struct FunctionInstanceBuilder {
    causality: Causality,
    trigger_details: BTreeMap<String, String>,
    reason: ExecutionReason,
    binding_source: Arc<dyn BindingSource>,
    invoker: Arc<dyn FunctionInvoker>,
    descriptor: Arc<FunctionDescriptor>,
}

impl FunctionInstanceBuilder {
    #[must_use]
    pub fn causality(mut self, causality: Causality) -> Self {
        self.causality = causality;
        self
    }

    #[must_use]
    pub fn reason(mut self, reason: ExecutionReason) -> Self {
        self.reason = reason;
        self
    }

    #[must_use]
    pub fn trigger_details(mut self, details: BTreeMap<String, String>) -> Self {
        self.trigger_details = details;
        self
    }

    #[must_use]
    pub fn build(self) -> FunctionInstance {
        FunctionInstance {
            id: Uuid::new_v4(),
            causality: self.causality,
            trigger_details: self.trigger_details,
            reason: self.reason,
            binding_source: self.binding_source,
            invoker: self.invoker,
            descriptor: self.descriptor,
        }
    }
}
