//! Domain layer for the book order service.
//!
//! This crate provides the order model and its business rules:
//! - [`Book`], the read-only catalog projection an order is priced from
//! - [`NewOrder`] and [`Order`], the unpersisted and persisted order records
//! - [`OrderStatus`], the status machine (`ACCEPTED`, `REJECTED`, `DISPATCHED`)
//! - [`dispatch_decision`], the pure transition applied when a dispatch
//!   confirmation arrives

pub mod book;
pub mod order;

pub use book::Book;
pub use order::{
    AuditInfo, CreateOrder, DispatchDecision, IgnoreReason, Money, NewOrder, Order, OrderError,
    OrderStatus, Version, dispatch_decision,
};
