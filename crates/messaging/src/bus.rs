use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use serde::Serialize;

use crate::{Message, Result};

/// Stream of messages from a subscription.
///
/// An `Err` item reports a delivery problem (such as a lagging subscriber);
/// the stream keeps going afterwards. The stream ends when the destination is
/// closed.
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<Message>> + Send>>;

/// Publish/subscribe transport with at-least-once semantics.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Sends a message to `message.destination`.
    async fn publish(&self, message: Message) -> Result<()>;

    /// Subscribes to a destination. Only messages published after the call
    /// are delivered.
    async fn subscribe(&self, destination: &str) -> Result<MessageStream>;
}

/// Extension trait providing convenience methods for message buses.
#[async_trait]
pub trait MessageBusExt: MessageBus {
    /// Serializes `payload` and publishes it to `destination`.
    async fn publish_json<T>(&self, destination: &str, payload: &T) -> Result<Message>
    where
        T: Serialize + Sync,
    {
        let message = Message::encode(destination, payload)?;
        self.publish(message.clone()).await?;
        Ok(message)
    }
}

// Blanket implementation for all MessageBus implementations
impl<T: MessageBus + ?Sized> MessageBusExt for T {}
