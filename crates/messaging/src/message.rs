use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::Result;

/// Unique identifier for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new random message ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Envelope carried by the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub destination: String,
    pub payload: serde_json::Value,
    pub published_at: DateTime<Utc>,
}

impl Message {
    /// Wraps a raw JSON payload.
    pub fn new(destination: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: MessageId::new(),
            destination: destination.into(),
            payload,
            published_at: Utc::now(),
        }
    }

    /// Serializes a typed payload into a new message.
    pub fn encode<T: Serialize>(destination: impl Into<String>, payload: &T) -> Result<Self> {
        Ok(Self::new(destination, serde_json::to_value(payload)?))
    }

    /// Deserializes the payload into a typed message.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(&self.payload)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_envelope_wire_format() {
        let message = Message::new("order-accepted", json!({ "orderId": 1 }));
        let json = serde_json::to_value(&message).unwrap();

        assert!(json["id"].is_string());
        assert_eq!(json["destination"], "order-accepted");
        assert_eq!(json["payload"]["orderId"], 1);
        assert!(json["publishedAt"].is_string());
    }

    #[test]
    fn test_each_message_gets_its_own_id() {
        let a = Message::new("d", json!(null));
        let b = Message::new("d", json!(null));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_decode_failure_is_serialization_error() {
        let message = Message::new("d", json!({ "unexpected": true }));
        let result = message.decode::<std::collections::HashMap<String, i64>>();
        assert!(matches!(
            result,
            Err(crate::MessagingError::Serialization(_))
        ));
    }
}
