//! Identifiers shared across the order service crates.

mod types;

pub use types::{OrderId, UserId};
