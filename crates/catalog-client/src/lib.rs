//! Client for the book catalog service.
//!
//! A lookup never fails from the caller's point of view: a missing book, a
//! slow catalog and an unreachable catalog all resolve to `None`. Transient
//! failures are retried with exponential backoff before giving up.
//!
//! - [`BookCatalog`] is the capability the order service depends on
//! - [`HttpBookCatalog`] talks to the catalog over HTTP
//! - [`InMemoryBookCatalog`] serves tests and local runs
//! - [`fetch_or_empty`] is the transport-independent retry, timeout and
//!   fallback combinator both implementations share

pub mod catalog;
pub mod error;
pub mod fallback;
pub mod http;
pub mod memory;
pub mod retry;

pub use catalog::BookCatalog;
pub use error::CatalogError;
pub use fallback::{FetchOutcome, fetch_or_empty, fetch_with_fallback};
pub use http::{CatalogConfig, HttpBookCatalog};
pub use memory::InMemoryBookCatalog;
pub use retry::{RetryPolicy, RetryPolicyBuilder};
