use std::sync::Arc;

use common::OrderId;

use crate::{Message, MessageBus, MessageBusExt, OrderAcceptedMessage, Result};

/// Announces accepted orders on the configured destination.
#[derive(Clone)]
pub struct AcceptedOrderPublisher {
    bus: Arc<dyn MessageBus>,
    destination: String,
}

impl AcceptedOrderPublisher {
    /// Creates a publisher writing to `destination`.
    pub fn new(bus: Arc<dyn MessageBus>, destination: impl Into<String>) -> Self {
        Self {
            bus,
            destination: destination.into(),
        }
    }

    /// Returns the destination name.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Publishes `{ "orderId": id }`. Attempted once; the caller decides what
    /// a failure means.
    #[tracing::instrument(skip(self), fields(destination = %self.destination))]
    pub async fn publish(&self, order_id: OrderId) -> Result<Message> {
        let result = self
            .bus
            .publish_json(&self.destination, &OrderAcceptedMessage { order_id })
            .await;

        match &result {
            Ok(message) => {
                metrics::counter!("order_events_published_total").increment(1);
                tracing::debug!(message_id = %message.id, "order accepted event published");
            }
            Err(_) => {
                metrics::counter!("order_events_publish_failures_total").increment(1);
            }
        }
        result
    }
}
