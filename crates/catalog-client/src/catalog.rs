use async_trait::async_trait;
use domain::Book;

/// Point lookup of book metadata by ISBN.
///
/// Implementations swallow every failure and report it as `None`.
#[async_trait]
pub trait BookCatalog: Send + Sync {
    /// Returns the book with the given ISBN, or `None` if it is unknown or
    /// the catalog could not be reached in time.
    async fn lookup(&self, isbn: &str) -> Option<Book>;
}
