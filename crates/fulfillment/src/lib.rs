//! Order fulfillment orchestration.
//!
//! The creation path validates a request, prices it against the catalog,
//! persists the decided order and announces accepted orders. The dispatch
//! path consumes warehouse confirmations and moves accepted orders to
//! `DISPATCHED` using a version-checked update.
//!
//! ```text
//! POST /orders ──► OrderService::create_order ──► catalog ──► insert ──► order-accepted
//!
//! order-dispatched ──► DispatchConsumer ──► OrderService::consume_dispatch_event ──► update
//! ```

pub mod consumer;
pub mod error;
pub mod service;

pub use consumer::{ConsumerStats, DispatchConsumer};
pub use error::{FulfillmentError, Result};
pub use service::{DispatchOutcome, OrderService};
