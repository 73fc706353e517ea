//! Trigger payload types for Meridian queue messages.
//!
//! This crate defines the message shape that trigger executors consume and
//! the causality codec that threads correlation identity through payloads:
//!
//! - Queue message model (opaque body plus transport-assigned metadata)
//! - Reserved-field causality codec (parent id, W3C trace context)
//!
//! # Payload namespace
//!
//! Causality rides inside the payload itself, in reserved top-level JSON
//! fields, so that it survives any queue transport unchanged:
//!
//! ```text
//! {
//!   "orderId": 4711,
//!   "$MeridianParentId":    "0b9256b9-02e6-4c1a-9b1d-bcf4b41b2e6b",
//!   "$MeridianTraceparent": "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01",
//!   "$MeridianTracestate":  "vendor=value"
//! }
//! ```
//!
//! Producers that know nothing of these fields interoperate freely: reads
//! degrade to "unknown" on any malformed or absent field, and writes only
//! ever add the reserved keys to an already-parsed object.
//!
//! # Example
//!
//! ```
//! use meridian_proto::{causality, QueueMessage};
//! use uuid::Uuid;
//!
//! let mut payload = serde_json::Map::new();
//! causality::set_owner(Uuid::new_v4(), &mut payload);
//!
//! let message = QueueMessage::from_text(serde_json::Value::Object(payload).to_string());
//! assert!(causality::get_owner(&message).is_some());
//! ```

pub mod causality;
mod message;

pub use causality::TraceContext;
pub use message::{MessageId, QueueMessage};
