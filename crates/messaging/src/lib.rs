//! Messaging for the order service.
//!
//! Messages are JSON payloads wrapped in a [`Message`] envelope and sent to a
//! named destination. Delivery is at-least-once: consumers must tolerate
//! duplicates and reordering.

pub mod bus;
pub mod destinations;
pub mod error;
pub mod memory;
pub mod message;
pub mod messages;
pub mod publisher;

pub use bus::{MessageBus, MessageBusExt, MessageStream};
pub use destinations::Destinations;
pub use error::{MessagingError, Result};
pub use memory::InMemoryMessageBus;
pub use message::{Message, MessageId};
pub use messages::{OrderAcceptedMessage, OrderDispatchedMessage};
pub use publisher::AcceptedOrderPublisher;
