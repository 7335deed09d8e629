use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain::Book;
use tokio::sync::RwLock;

use crate::fallback::{fetch_with_fallback, record_lookup};
use crate::{BookCatalog, CatalogError, RetryPolicy};

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    books: HashMap<String, Book>,
    fail_next: u32,
    latency: Duration,
    calls: u32,
}

/// In-memory catalog for testing and local runs.
///
/// Lookups go through the same retry and timeout combinator as the HTTP
/// client, so injected failures and latency exercise the real fallback path.
#[derive(Debug, Clone)]
pub struct InMemoryBookCatalog {
    state: Arc<RwLock<InMemoryCatalogState>>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl Default for InMemoryBookCatalog {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(3),
        }
    }
}

impl InMemoryBookCatalog {
    /// Creates an empty catalog with the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the lookup ceiling.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds or replaces a book.
    pub async fn add_book(&self, book: Book) {
        self.state
            .write()
            .await
            .books
            .insert(book.isbn.clone(), book);
    }

    /// Makes the next `n` calls fail with a transient error.
    pub async fn fail_next(&self, n: u32) {
        self.state.write().await.fail_next = n;
    }

    /// Delays every call by `latency`.
    pub async fn set_latency(&self, latency: Duration) {
        self.state.write().await.latency = latency;
    }

    /// Returns the number of calls made so far, retries included.
    pub async fn calls(&self) -> u32 {
        self.state.read().await.calls
    }

    async fn fetch_once(&self, isbn: &str) -> Result<Option<Book>, CatalogError> {
        let latency = {
            let mut state = self.state.write().await;
            state.calls += 1;
            state.latency
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.write().await;
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(CatalogError::Unavailable("injected failure".to_string()));
        }
        Ok(state.books.get(isbn).cloned())
    }
}

#[async_trait]
impl BookCatalog for InMemoryBookCatalog {
    #[tracing::instrument(skip(self))]
    async fn lookup(&self, isbn: &str) -> Option<Book> {
        let outcome = fetch_with_fallback(&self.retry, self.timeout, || self.fetch_once(isbn)).await;
        record_lookup(&outcome);
        outcome.into_option()
    }
}
