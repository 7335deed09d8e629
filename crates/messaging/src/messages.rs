//! Typed payloads exchanged with the fulfillment system.

use common::OrderId;
use serde::{Deserialize, Serialize};

/// Announces that an order was accepted and can be prepared for shipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAcceptedMessage {
    pub order_id: OrderId,
}

/// Confirms that an order left the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDispatchedMessage {
    pub order_id: OrderId,
}
