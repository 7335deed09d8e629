/// Default destination for "order accepted" events.
pub const ORDER_ACCEPTED: &str = "order-accepted";

/// Default destination for "order dispatched" confirmations.
pub const ORDER_DISPATCHED: &str = "order-dispatched";

/// Destination names used by the order service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destinations {
    /// Where accepted orders are announced.
    pub order_accepted: String,
    /// Where dispatch confirmations arrive from.
    pub order_dispatched: String,
}

impl Default for Destinations {
    fn default() -> Self {
        Self {
            order_accepted: ORDER_ACCEPTED.to_string(),
            order_dispatched: ORDER_DISPATCHED.to_string(),
        }
    }
}
