use std::time::Duration;

use async_trait::async_trait;
use domain::Book;
use reqwest::{Client, StatusCode, Url};

use crate::fallback::{fetch_with_fallback, record_lookup};
use crate::{BookCatalog, CatalogError, RetryPolicy};

/// Connection settings for the HTTP catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    /// Base URI of the catalog service, e.g. `http://localhost:9001`.
    pub base_url: String,
    /// Ceiling for a whole lookup, retries included.
    pub timeout: Duration,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9001".to_string(),
            timeout: Duration::from_secs(3),
            retry: RetryPolicy::default(),
        }
    }
}

/// Catalog client over HTTP.
///
/// Issues `GET {base}/books/{isbn}`. A 404 means the book does not exist;
/// any other failure is retried per the configured policy.
#[derive(Debug, Clone)]
pub struct HttpBookCatalog {
    client: Client,
    base_url: Url,
    timeout: Duration,
    retry: RetryPolicy,
}

impl HttpBookCatalog {
    /// Creates a client from its configuration.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidBaseUrl` if the base URL does not parse
    /// or cannot carry a path, and `CatalogError::Request` if the HTTP client
    /// cannot be built.
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
        let base_url =
            Url::parse(&config.base_url).map_err(|e| CatalogError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason: e.to_string(),
            })?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogError::InvalidBaseUrl {
                url: config.base_url,
                reason: "not a hierarchical URL".to_string(),
            });
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url,
            timeout: config.timeout,
            retry: config.retry,
        })
    }

    fn book_url(&self, isbn: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("books").push(isbn);
        }
        url
    }

    /// A single attempt, without retry or timeout.
    async fn fetch_once(&self, isbn: &str) -> Result<Option<Book>, CatalogError> {
        let response = self.client.get(self.book_url(isbn)).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<Book>()
                .await
                .map(Some)
                .map_err(|e| CatalogError::Decode(e.to_string())),
            status => Err(CatalogError::UnexpectedStatus {
                status: status.as_u16(),
            }),
        }
    }
}

#[async_trait]
impl BookCatalog for HttpBookCatalog {
    #[tracing::instrument(skip(self))]
    async fn lookup(&self, isbn: &str) -> Option<Book> {
        let outcome = fetch_with_fallback(&self.retry, self.timeout, || self.fetch_once(isbn)).await;
        record_lookup(&outcome);
        tracing::debug!(outcome = outcome.label(), "catalog lookup finished");
        outcome.into_option()
    }
}
