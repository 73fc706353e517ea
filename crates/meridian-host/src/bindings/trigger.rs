//! Bindings for the trigger payload itself.

use std::sync::Arc;

use async_trait::async_trait;

use meridian_proto::QueueMessage;

use crate::bindings::{
    ArgumentBinding, Binder, BindingContext, BindingProvider, BoundValue,
};
use crate::descriptor::{ParameterShape, ParameterSpec};
use crate::error::BindError;

/// Binds [`ParameterShape::TriggerMessage`] to the raw queue message.
pub struct TriggerMessageProvider;

impl BindingProvider for TriggerMessageProvider {
    fn try_create(&self, param: &ParameterSpec) -> Option<Arc<dyn ArgumentBinding>> {
        match param.shape {
            ParameterShape::TriggerMessage => Some(Arc::new(MessageBinding)),
            _ => None,
        }
    }
}

struct MessageBinding;

#[async_trait]
impl ArgumentBinding for MessageBinding {
    async fn bind(
        &self,
        trigger: &QueueMessage,
        _ctx: &BindingContext,
    ) -> Result<Binder, BindError> {
        Ok(Binder::new(BoundValue::Message(trigger.clone())))
    }
}

/// Binds [`ParameterShape::TriggerText`] to the trigger body as text.
/// A body that is not valid UTF-8 fails the bind before user code runs.
pub struct TriggerTextProvider;

impl BindingProvider for TriggerTextProvider {
    fn try_create(&self, param: &ParameterSpec) -> Option<Arc<dyn ArgumentBinding>> {
        match param.shape {
            ParameterShape::TriggerText => Some(Arc::new(TextBinding)),
            _ => None,
        }
    }
}

struct TextBinding;

#[async_trait]
impl ArgumentBinding for TextBinding {
    async fn bind(
        &self,
        trigger: &QueueMessage,
        _ctx: &BindingContext,
    ) -> Result<Binder, BindError> {
        let text = trigger.text().ok_or(BindError::NotText)?;
        Ok(Binder::new(BoundValue::Text(text.to_string())))
    }
}
