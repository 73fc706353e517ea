//! Causality propagation over queue payloads.
//!
//! This module reads and writes the reserved correlation fields that link a
//! message back to the function invocation that produced it, enabling
//! multi-hop causality chains across asynchronous boundaries.
//!
//! # Design
//!
//! Two independent representations are carried side by side:
//!
//! - [`PARENT_ID_KEY`]: the owning invocation id as a UUID string
//! - [`TRACEPARENT_KEY`] / [`TRACESTATE_KEY`]: W3C trace context
//!
//! Reads are permissive: a payload produced by a foreign system, a body
//! that is not text, malformed JSON, a non-object root, a missing key, a
//! non-string value or an unparseable UUID all degrade to "unknown"
//! (`None`). Extraction never fails an invocation.
//!
//! Writes are conservative: they require an already-parsed payload object,
//! never materialise one, and only add the reserved keys. A nil owner is
//! skipped, and tracestate is only written alongside a traceparent
//! (tracestate has no meaning on its own).

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::message::QueueMessage;

/// Reserved payload field carrying the owning invocation id.
pub const PARENT_ID_KEY: &str = "$MeridianParentId";

/// Reserved payload field carrying the W3C traceparent.
pub const TRACEPARENT_KEY: &str = "$MeridianTraceparent";

/// Reserved payload field carrying the W3C tracestate.
pub const TRACESTATE_KEY: &str = "$MeridianTracestate";

/// W3C trace context pair extracted from a payload.
///
/// `tracestate` is only ever populated together with `traceparent`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceContext {
    pub traceparent: Option<String>,
    pub tracestate: Option<String>,
}

impl TraceContext {
    pub fn new(traceparent: impl Into<String>) -> Self {
        Self {
            traceparent: Some(traceparent.into()),
            tracestate: None,
        }
    }

    pub fn with_state(mut self, tracestate: impl Into<String>) -> Self {
        self.tracestate = Some(tracestate.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.traceparent.is_none() && self.tracestate.is_none()
    }
}

/// Stamps `owner` onto the payload as the parent invocation id.
///
/// A nil owner means "no meaningful owner" and is skipped entirely; an
/// existing parent id is overwritten. Unrelated fields are never touched.
pub fn set_owner(owner: Uuid, payload: &mut Map<String, Value>) {
    if owner.is_nil() {
        return;
    }
    payload.insert(PARENT_ID_KEY.to_string(), Value::String(owner.to_string()));
}

/// Stamps the W3C trace context onto the payload.
///
/// The traceparent is written when present and non-empty; the tracestate is
/// written only when a traceparent was written and is itself non-empty.
pub fn set_trace_context(trace: &TraceContext, payload: &mut Map<String, Value>) {
    let traceparent = match trace.traceparent.as_deref() {
        Some(value) if !value.is_empty() => value,
        _ => return,
    };
    payload.insert(
        TRACEPARENT_KEY.to_string(),
        Value::String(traceparent.to_string()),
    );

    if let Some(tracestate) = trace.tracestate.as_deref() {
        if !tracestate.is_empty() {
            payload.insert(
                TRACESTATE_KEY.to_string(),
                Value::String(tracestate.to_string()),
            );
        }
    }
}

/// Extracts the owning invocation id from a message payload.
///
/// Returns `None` ("unknown owner") unless the body is UTF-8 text parsing
/// to a JSON object whose [`PARENT_ID_KEY`] field is a string holding a
/// well-formed UUID.
#[must_use]
pub fn get_owner(message: &QueueMessage) -> Option<Uuid> {
    let payload = parse_object(message)?;
    let value = payload.get(PARENT_ID_KEY)?.as_str()?;
    Uuid::parse_str(value).ok()
}

/// Extracts the W3C trace context from a message payload.
///
/// Degrades to [`TraceContext::default`] when the payload is not a JSON
/// object or carries no traceparent; a tracestate without a traceparent is
/// not returned.
#[must_use]
pub fn get_trace_context(message: &QueueMessage) -> TraceContext {
    let Some(payload) = parse_object(message) else {
        return TraceContext::default();
    };
    let Some(traceparent) = payload.get(TRACEPARENT_KEY).and_then(Value::as_str) else {
        return TraceContext::default();
    };

    TraceContext {
        traceparent: Some(traceparent.to_string()),
        tracestate: payload
            .get(TRACESTATE_KEY)
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

fn parse_object(message: &QueueMessage) -> Option<Map<String, Value>> {
    let text = message.text()?;
    match serde_json::from_str(text) {
        Ok(Value::Object(payload)) => Some(payload),
        _ => None,
    }
}
