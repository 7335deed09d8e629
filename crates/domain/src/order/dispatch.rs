//! Transition applied when the warehouse confirms a dispatch.

use super::{Order, OrderStatus};

/// Why a dispatch confirmation did not change anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IgnoreReason {
    /// No order with the referenced id is visible.
    NotFound,
    /// The order was dispatched already (duplicate delivery).
    AlreadyDispatched,
    /// The order was rejected and can never ship.
    Rejected,
    /// The order has not been decided yet.
    Pending,
}

impl IgnoreReason {
    /// Short label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            IgnoreReason::NotFound => "not_found",
            IgnoreReason::AlreadyDispatched => "already_dispatched",
            IgnoreReason::Rejected => "rejected",
            IgnoreReason::Pending => "pending",
        }
    }
}

impl std::fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`dispatch_decision`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchDecision {
    /// Persist this order; it is the input moved to `DISPATCHED`.
    Dispatch(Order),
    /// Leave storage untouched.
    Ignore(IgnoreReason),
}

/// Decides what a dispatch confirmation does to the order it references.
pub fn dispatch_decision(order: Option<&Order>) -> DispatchDecision {
    let Some(order) = order else {
        return DispatchDecision::Ignore(IgnoreReason::NotFound);
    };

    match order.status {
        OrderStatus::Accepted => {
            DispatchDecision::Dispatch(order.with_status(OrderStatus::Dispatched))
        }
        OrderStatus::Dispatched => DispatchDecision::Ignore(IgnoreReason::AlreadyDispatched),
        OrderStatus::Rejected => DispatchDecision::Ignore(IgnoreReason::Rejected),
        OrderStatus::Pending => DispatchDecision::Ignore(IgnoreReason::Pending),
    }
}
