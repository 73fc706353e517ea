//! Static descriptions of registered functions.

use std::fmt;

use meridian_store::BlobPath;

/// Immutable description of a function: its name and the parameters it
/// declares. Shared read-only across every instance of the function.
#[derive(Debug, Clone)]
pub struct FunctionDescriptor {
    /// The function name, unique within a registry.
    pub name: String,
    /// Declared parameters, in invocation order.
    pub parameters: Vec<ParameterSpec>,
}

impl FunctionDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, shape: ParameterShape) -> Self {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            shape,
        });
        self
    }
}

/// A single declared parameter.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub name: String,
    pub shape: ParameterShape,
}

/// The shape a declared parameter asks for. The set is closed: binding
/// providers match on these variants, and an unmatched shape is a
/// configuration error, not a runtime one.
#[derive(Debug, Clone)]
pub enum ParameterShape {
    /// The raw trigger message, metadata included.
    TriggerMessage,
    /// The trigger body as UTF-8 text.
    TriggerText,
    /// A streaming write destination for a blob. The path may carry
    /// `{placeholder}` patterns resolved against trigger metadata.
    BlobWriter { path: BlobPath },
    /// An outbound message collector for the named queue.
    QueueWriter { queue: String },
}

impl fmt::Display for ParameterShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterShape::TriggerMessage => write!(f, "trigger message"),
            ParameterShape::TriggerText => write!(f, "trigger text"),
            ParameterShape::BlobWriter { path } => write!(f, "blob writer ({path})"),
            ParameterShape::QueueWriter { queue } => write!(f, "queue writer ({queue})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_collects_parameters_in_order() {
        let descriptor = FunctionDescriptor::new("process_order")
            .with_parameter("message", ParameterShape::TriggerText)
            .with_parameter(
                "receipt",
                ParameterShape::BlobWriter {
                    path: BlobPath::new("receipts", "{message_id}.txt"),
                },
            );

        assert_eq!(descriptor.name, "process_order");
        assert_eq!(descriptor.parameters.len(), 2);
        assert_eq!(descriptor.parameters[0].name, "message");
        assert_eq!(descriptor.parameters[1].name, "receipt");
    }
}
