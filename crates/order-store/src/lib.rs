//! Persistence for book orders.
//!
//! [`OrderRepository`] is the storage contract used by the fulfillment
//! service. Two implementations are provided:
//! - [`InMemoryOrderRepository`] for tests and local runs
//! - [`PostgresOrderRepository`] backed by the `orders` table

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{RepositoryError, Result};
pub use memory::InMemoryOrderRepository;
pub use postgres::PostgresOrderRepository;
pub use store::OrderRepository;
