use thiserror::Error;

/// Failures observed while talking to the catalog.
///
/// These never reach callers of [`crate::BookCatalog::lookup`]; they drive
/// the retry loop and end up in logs.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The request could not be sent or the connection failed.
    #[error("Catalog request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The catalog answered with a status other than 200 or 404.
    #[error("Catalog returned unexpected status {status}")]
    UnexpectedStatus { status: u16 },

    /// The response body was not a valid book.
    #[error("Malformed catalog response: {0}")]
    Decode(String),

    /// The configured base URL cannot be used.
    #[error("Invalid catalog base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The catalog is unavailable.
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}
