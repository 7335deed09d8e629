use thiserror::Error;

/// Errors that can occur when publishing or consuming messages.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// The bus refused or failed to take the message.
    #[error("Publish failed for destination '{destination}': {reason}")]
    PublishFailed { destination: String, reason: String },

    /// A subscriber fell behind and messages were dropped.
    #[error("Subscriber on '{destination}' lagged, {skipped} messages skipped")]
    Lagged { destination: String, skipped: u64 },

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for messaging operations.
pub type Result<T> = std::result::Result<T, MessagingError>;
