//! The function registry.
//!
//! Functions are registered once at host assembly. Registration resolves
//! the function's binding plan eagerly, so a declaration no provider can
//! satisfy fails fast instead of surfacing on the first trigger.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::bindings::{BindingPlan, BindingRegistry};
use crate::descriptor::FunctionDescriptor;
use crate::error::RegistryError;
use crate::invoker::FunctionInvoker;

/// A registered function: its declaration, the code behind it, and the
/// pre-resolved binding plan.
#[derive(Clone)]
pub struct RegisteredFunction {
    descriptor: Arc<FunctionDescriptor>,
    invoker: Arc<dyn FunctionInvoker>,
    plan: BindingPlan,
}

impl RegisteredFunction {
    pub fn descriptor(&self) -> &Arc<FunctionDescriptor> {
        &self.descriptor
    }

    pub fn invoker(&self) -> &Arc<dyn FunctionInvoker> {
        &self.invoker
    }

    pub fn plan(&self) -> &BindingPlan {
        &self.plan
    }
}

/// Immutable name-to-function map.
pub struct FunctionRegistry {
    functions: HashMap<String, RegisteredFunction>,
}

impl FunctionRegistry {
    pub fn builder(bindings: BindingRegistry) -> FunctionRegistryBuilder {
        FunctionRegistryBuilder {
            bindings,
            functions: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredFunction> {
        self.functions.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Registered function names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

pub struct FunctionRegistryBuilder {
    bindings: BindingRegistry,
    functions: HashMap<String, RegisteredFunction>,
}

impl std::fmt::Debug for FunctionRegistryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistryBuilder")
            .finish_non_exhaustive()
    }
}

impl FunctionRegistryBuilder {
    /// Registers a function. Fails when the name is already taken or when
    /// any declared parameter has no applicable binding provider.
    pub fn register(
        mut self,
        descriptor: FunctionDescriptor,
        invoker: Arc<dyn FunctionInvoker>,
    ) -> Result<Self, RegistryError> {
        if self.functions.contains_key(&descriptor.name) {
            return Err(RegistryError::DuplicateFunction {
                function: descriptor.name,
            });
        }

        let plan = self.bindings.plan(&descriptor)?;
        debug!(
            function = %descriptor.name,
            parameters = plan.len(),
            "Registered function"
        );

        let name = descriptor.name.clone();
        self.functions.insert(
            name,
            RegisteredFunction {
                descriptor: Arc::new(descriptor),
                invoker,
                plan,
            },
        );
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> FunctionRegistry {
        FunctionRegistry {
            functions: self.functions,
        }
    }
}
