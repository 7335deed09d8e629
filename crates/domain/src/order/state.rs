//! Order status machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
///            ┌──► Accepted ──► Dispatched
/// (create) ──┤
///            └──► Rejected
/// ```
///
/// `Pending` is the conceptual starting point. Orders are resolved to
/// `Accepted` or `Rejected` before they are persisted, so it is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Not yet decided.
    #[default]
    Pending,

    /// The book exists in the catalog; awaiting dispatch.
    Accepted,

    /// The book could not be found (terminal state).
    Rejected,

    /// The order left the warehouse (terminal state).
    Dispatched,
}

impl OrderStatus {
    /// Returns true if a dispatch confirmation can be applied in this status.
    pub fn can_dispatch(&self) -> bool {
        matches!(self, OrderStatus::Accepted)
    }

    /// Returns true if the order carries a book name and price in this status.
    pub fn carries_book_snapshot(&self) -> bool {
        matches!(self, OrderStatus::Accepted | OrderStatus::Dispatched)
    }

    /// Returns the status name as stored and sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::Rejected => "REJECTED",
            OrderStatus::Dispatched => "DISPATCHED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "ACCEPTED" => Ok(OrderStatus::Accepted),
            "REJECTED" => Ok(OrderStatus::Rejected),
            "DISPATCHED" => Ok(OrderStatus::Dispatched),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}
