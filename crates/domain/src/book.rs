//! Catalog projection of a book.

use serde::{Deserialize, Serialize};

use crate::order::Money;

/// A book as returned by the catalog service.
///
/// Read-only: the order service never stores a `Book`, it copies the
/// display name and price into the order at acceptance time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub price: Money,
    #[serde(default)]
    pub publisher: Option<String>,
}

impl Book {
    /// Creates a book without a publisher.
    pub fn new(
        isbn: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        price: Money,
    ) -> Self {
        Self {
            isbn: isbn.into(),
            title: title.into(),
            author: author.into(),
            price,
            publisher: None,
        }
    }

    /// Name snapshot stored on accepted orders: `"<title> - <author>"`.
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.title, self.author)
    }
}
