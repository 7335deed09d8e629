//! Fulfillment error types.

use domain::OrderError;
use messaging::MessagingError;
use order_store::RepositoryError;
use thiserror::Error;

/// Errors surfaced by the order service.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The request was rejected before any lookup or write.
    #[error("Validation error: {0}")]
    Validation(#[from] OrderError),

    /// The order could not be read or written.
    #[error("Persistence error: {0}")]
    Repository(#[from] RepositoryError),

    /// The dispatch consumer could not subscribe.
    #[error("Messaging error: {0}")]
    Messaging(#[from] MessagingError),
}

impl FulfillmentError {
    /// Returns true if the caller sent a bad request.
    pub fn is_validation(&self) -> bool {
        matches!(self, FulfillmentError::Validation(_))
    }
}

/// Convenience type alias for fulfillment results.
pub type Result<T> = std::result::Result<T, FulfillmentError>;
