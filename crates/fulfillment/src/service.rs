//! Order service: creation and dispatch paths.

use std::sync::Arc;

use catalog_client::BookCatalog;
use common::{OrderId, UserId};
use domain::{
    CreateOrder, DispatchDecision, IgnoreReason, NewOrder, Order, OrderStatus, dispatch_decision,
};
use messaging::AcceptedOrderPublisher;
use order_store::OrderRepository;

use crate::Result;

/// What a dispatch confirmation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The order moved to `DISPATCHED`; carries the stored record.
    Dispatched(Order),
    /// Nothing to do for this order.
    Ignored(IgnoreReason),
    /// A concurrent writer changed the order first.
    Conflict,
    /// Storage failed; the confirmation is dropped.
    Failed,
}

impl DispatchOutcome {
    /// Label used for logs and the `outcome` metric dimension.
    pub fn label(&self) -> &'static str {
        match self {
            DispatchOutcome::Dispatched(_) => "dispatched",
            DispatchOutcome::Ignored(reason) => reason.as_str(),
            DispatchOutcome::Conflict => "conflict",
            DispatchOutcome::Failed => "failed",
        }
    }
}

/// Service owning the order business rules.
///
/// The catalog and the publisher are shared collaborators; the repository is
/// a type parameter so tests can keep a handle on the concrete store.
pub struct OrderService<R: OrderRepository> {
    repository: R,
    catalog: Arc<dyn BookCatalog>,
    publisher: AcceptedOrderPublisher,
}

impl<R: OrderRepository> OrderService<R> {
    /// Creates a new order service.
    pub fn new(
        repository: R,
        catalog: Arc<dyn BookCatalog>,
        publisher: AcceptedOrderPublisher,
    ) -> Self {
        Self {
            repository,
            catalog,
            publisher,
        }
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Creates an order for one book.
    ///
    /// The order is `ACCEPTED` when the catalog knows the book and `REJECTED`
    /// otherwise; both are persisted and returned. Only accepted orders are
    /// announced, after the write, and a failed announcement does not undo
    /// the order.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank ISBN or non-positive quantity (no lookup and
    /// no write happen), `Repository` if the insert fails.
    #[tracing::instrument(skip(self, cmd), fields(isbn = %cmd.isbn, quantity = cmd.quantity))]
    pub async fn create_order(&self, cmd: CreateOrder, identity: Option<&UserId>) -> Result<Order> {
        cmd.validate()?;

        let new_order = match self.catalog.lookup(&cmd.isbn).await {
            Some(book) => NewOrder::accepted(cmd.isbn, cmd.quantity, &book),
            None => NewOrder::rejected(cmd.isbn, cmd.quantity),
        };

        let order = self.repository.insert(new_order, identity).await?;
        metrics::counter!("orders_created_total", "status" => order.status.as_str()).increment(1);
        tracing::info!(order_id = %order.id, status = %order.status, "order created");

        if order.status == OrderStatus::Accepted
            && let Err(e) = self.publisher.publish(order.id).await
        {
            tracing::error!(
                order_id = %order.id,
                destination = self.publisher.destination(),
                error = %e,
                "failed to publish order accepted event"
            );
        }

        Ok(order)
    }

    /// Loads an order by identifier.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.repository.find_by_id(id).await?)
    }

    /// Lists the orders a user created, ordered by identifier.
    #[tracing::instrument(skip(self))]
    pub async fn orders_created_by(&self, user: &UserId) -> Result<Vec<Order>> {
        Ok(self.repository.find_all_by_creator(user).await?)
    }

    /// Applies a dispatch confirmation.
    ///
    /// Never fails: unknown, rejected and already dispatched orders are
    /// ignored, a version conflict is logged and dropped, and storage errors
    /// are logged. Nothing is retried.
    #[tracing::instrument(skip(self))]
    pub async fn consume_dispatch_event(&self, order_id: OrderId) -> DispatchOutcome {
        let outcome = self.apply_dispatch(order_id).await;
        metrics::counter!("dispatch_events_total", "outcome" => outcome.label()).increment(1);
        outcome
    }

    async fn apply_dispatch(&self, order_id: OrderId) -> DispatchOutcome {
        let current = match self.repository.find_by_id(order_id).await {
            Ok(current) => current,
            Err(e) => {
                tracing::error!(%order_id, error = %e, "failed to load order for dispatch");
                return DispatchOutcome::Failed;
            }
        };

        let next = match dispatch_decision(current.as_ref()) {
            DispatchDecision::Dispatch(next) => next,
            DispatchDecision::Ignore(reason) => {
                tracing::debug!(%order_id, %reason, "dispatch confirmation ignored");
                return DispatchOutcome::Ignored(reason);
            }
        };

        match self.repository.update(&next, None).await {
            Ok(saved) => DispatchOutcome::Dispatched(saved),
            Err(e) if e.is_conflict() => {
                tracing::warn!(%order_id, error = %e, "order changed concurrently, dispatch dropped");
                DispatchOutcome::Conflict
            }
            Err(e) => {
                tracing::error!(%order_id, error = %e, "failed to persist dispatched order");
                DispatchOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use catalog_client::{InMemoryBookCatalog, RetryPolicy};
    use domain::{Book, Money};
    use messaging::InMemoryMessageBus;
    use order_store::InMemoryOrderRepository;

    use super::*;

    struct Fixture {
        service: OrderService<InMemoryOrderRepository>,
        repository: InMemoryOrderRepository,
        catalog: InMemoryBookCatalog,
        bus: InMemoryMessageBus,
    }

    async fn fixture() -> Fixture {
        let repository = InMemoryOrderRepository::new();
        let catalog = InMemoryBookCatalog::new().with_retry(
            RetryPolicy::builder()
                .initial_backoff(std::time::Duration::from_millis(1))
                .build(),
        );
        catalog
            .add_book(Book::new(
                "1234567891",
                "Title",
                "Author",
                Money::from_cents(999),
            ))
            .await;
        let bus = InMemoryMessageBus::new();
        let publisher = AcceptedOrderPublisher::new(Arc::new(bus.clone()), "order-accepted");

        Fixture {
            service: OrderService::new(repository.clone(), Arc::new(catalog.clone()), publisher),
            repository,
            catalog,
            bus,
        }
    }

    #[tokio::test]
    async fn test_validation_happens_before_lookup() {
        let f = fixture().await;

        let err = f
            .service
            .create_order(CreateOrder::new("1234567891", 0), None)
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(f.catalog.calls().await, 0);
        assert_eq!(f.repository.order_count().await, 0);
        assert_eq!(f.bus.published_count().await, 0);
    }

    #[tokio::test]
    async fn test_persistence_failure_surfaces() {
        let f = fixture().await;
        f.repository.set_fail_on_insert(true).await;

        let err = f
            .service
            .create_order(CreateOrder::new("1234567891", 1), None)
            .await
            .unwrap_err();

        assert!(matches!(err, crate::FulfillmentError::Repository(_)));
        assert_eq!(f.bus.published_count().await, 0);
    }

    #[tokio::test]
    async fn test_dispatch_storage_failure_is_swallowed() {
        let f = fixture().await;
        let order = f
            .service
            .create_order(CreateOrder::new("1234567891", 1), None)
            .await
            .unwrap();
        f.repository.set_fail_on_update(true).await;

        let outcome = f.service.consume_dispatch_event(order.id).await;

        assert_eq!(outcome, DispatchOutcome::Failed);
        assert_eq!(outcome.label(), "failed");
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(DispatchOutcome::Conflict.label(), "conflict");
        assert_eq!(
            DispatchOutcome::Ignored(IgnoreReason::NotFound).label(),
            "not_found"
        );
    }
}
