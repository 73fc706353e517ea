use std::fmt;
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A queue message as delivered to a trigger: an opaque body plus the
/// metadata the transport assigns. `id` and `inserted_at` are absent on
/// locally constructed messages and set by the store on enqueue.
#[derive(Debug, Clone)]
pub struct QueueMessage {
    pub id: Option<MessageId>,
    pub body: Vec<u8>,
    pub dequeue_count: u32,
    pub inserted_at: Option<SystemTime>,
}

impl QueueMessage {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::from_bytes(text.into().into_bytes())
    }

    pub fn from_bytes(body: Vec<u8>) -> Self {
        Self {
            id: None,
            body,
            dequeue_count: 0,
            inserted_at: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(MessageId::new(id));
        self
    }

    /// Body as UTF-8 text, or `None` when the body is not valid text.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trips_utf8() {
        let message = QueueMessage::from_text("hello");
        assert_eq!(message.text(), Some("hello"));
    }

    #[test]
    fn text_rejects_invalid_utf8() {
        let message = QueueMessage::from_bytes(vec![0xff, 0xfe, 0x00]);
        assert!(message.text().is_none());
    }

    #[test]
    fn with_id_sets_transport_id() {
        let message = QueueMessage::from_text("{}").with_id("msg-1");
        assert_eq!(message.id.as_ref().map(|id| id.as_str()), Some("msg-1"));
    }
}
