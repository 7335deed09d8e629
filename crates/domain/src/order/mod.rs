//! Order entity and related types.

mod commands;
mod dispatch;
mod entity;
mod state;
mod value_objects;

pub use commands::CreateOrder;
pub use dispatch::{DispatchDecision, IgnoreReason, dispatch_decision};
pub use entity::{AuditInfo, NewOrder, Order};
pub use state::{OrderStatus, UnknownStatus};
pub use value_objects::{InvalidMoney, Money, Version};

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The book ISBN is empty or blank.
    #[error("Book ISBN is required")]
    EmptyIsbn,

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i32 },

    /// Order is not in the expected status.
    #[error("Invalid state transition: cannot {action} from {current} status")]
    InvalidStateTransition {
        current: OrderStatus,
        action: &'static str,
    },
}
