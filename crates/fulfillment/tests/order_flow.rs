//! Integration tests for order creation and dispatch handling.

use std::sync::Arc;
use std::time::Duration;

use catalog_client::{InMemoryBookCatalog, RetryPolicy};
use common::{OrderId, UserId};
use domain::{Book, CreateOrder, IgnoreReason, Money, OrderStatus, Version};
use fulfillment::{DispatchConsumer, DispatchOutcome, OrderService};
use messaging::{
    AcceptedOrderPublisher, Destinations, InMemoryMessageBus, Message, MessageBus, MessageBusExt,
    OrderAcceptedMessage, OrderDispatchedMessage,
};
use order_store::{InMemoryOrderRepository, OrderRepository};
use tokio::sync::watch;

struct TestHarness {
    service: Arc<OrderService<InMemoryOrderRepository>>,
    repository: InMemoryOrderRepository,
    catalog: InMemoryBookCatalog,
    bus: InMemoryMessageBus,
    destinations: Destinations,
}

impl TestHarness {
    async fn new() -> Self {
        let repository = InMemoryOrderRepository::new();
        let catalog = InMemoryBookCatalog::new().with_retry(
            RetryPolicy::builder()
                .max_attempts(3)
                .initial_backoff(Duration::from_millis(1))
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
        let destinations = Destinations::default();
        let publisher =
            AcceptedOrderPublisher::new(Arc::new(bus.clone()), &destinations.order_accepted);

        let service = Arc::new(OrderService::new(
            repository.clone(),
            Arc::new(catalog.clone()),
            publisher,
        ));

        Self {
            service,
            repository,
            catalog,
            bus,
            destinations,
        }
    }

    async fn accepted_events(&self) -> Vec<OrderAcceptedMessage> {
        self.bus
            .published(&self.destinations.order_accepted)
            .await
            .iter()
            .map(|m| m.decode().unwrap())
            .collect()
    }

    async fn create(&self, isbn: &str, quantity: i32, user: Option<&str>) -> domain::Order {
        let user = user.map(UserId::new);
        self.service
            .create_order(CreateOrder::new(isbn, quantity), user.as_ref())
            .await
            .unwrap()
    }

    fn consumer(&self) -> DispatchConsumer<InMemoryOrderRepository> {
        DispatchConsumer::new(
            self.service.clone(),
            Arc::new(self.bus.clone()),
            &self.destinations.order_dispatched,
        )
    }
}

mod creation {
    use super::*;

    #[tokio::test]
    async fn known_book_is_accepted_and_announced() {
        let h = TestHarness::new().await;

        let order = h.create("1234567891", 1, None).await;

        assert_eq!(order.status, OrderStatus::Accepted);
        assert_eq!(order.book_isbn, "1234567891");
        assert_eq!(order.book_name.as_deref(), Some("Title - Author"));
        assert_eq!(order.book_price, Some(Money::from_cents(999)));
        assert_eq!(order.quantity, 1);
        assert_eq!(order.version, Version::initial());
        assert_eq!(
            h.accepted_events().await,
            vec![OrderAcceptedMessage { order_id: order.id }]
        );
    }

    #[tokio::test]
    async fn unknown_book_is_rejected_silently() {
        let h = TestHarness::new().await;

        let order = h.create("1234567894", 3, None).await;

        assert_eq!(order.status, OrderStatus::Rejected);
        assert_eq!(order.quantity, 3);
        assert!(order.book_name.is_none());
        assert!(order.book_price.is_none());
        assert!(h.accepted_events().await.is_empty());
        assert_eq!(h.repository.order_count().await, 1);
    }

    #[tokio::test]
    async fn identity_is_recorded_as_creator() {
        let h = TestHarness::new().await;

        let with_user = h.create("1234567891", 1, Some("alice")).await;
        assert_eq!(with_user.created_by(), Some(&UserId::new("alice")));
        assert_eq!(with_user.last_modified_by(), Some(&UserId::new("alice")));

        let anonymous = h.create("1234567891", 1, None).await;
        assert!(anonymous.created_by().is_none());
        assert!(anonymous.last_modified_by().is_none());
    }

    #[tokio::test]
    async fn transient_catalog_failures_are_retried() {
        let h = TestHarness::new().await;
        h.catalog.fail_next(2).await;

        let order = h.create("1234567891", 1, None).await;

        assert_eq!(order.status, OrderStatus::Accepted);
        assert_eq!(h.catalog.calls().await, 3);
    }

    #[tokio::test]
    async fn unreachable_catalog_rejects_the_order() {
        let h = TestHarness::new().await;
        h.catalog.fail_next(u32::MAX).await;

        let order = h.create("1234567891", 1, None).await;

        assert_eq!(order.status, OrderStatus::Rejected);
        assert!(h.accepted_events().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_catalog_rejects_the_order() {
        let h = TestHarness::new().await;
        h.catalog.set_latency(Duration::from_secs(10)).await;

        let order = h.create("1234567891", 1, None).await;

        assert_eq!(order.status, OrderStatus::Rejected);
    }

    #[tokio::test]
    async fn publish_failure_keeps_the_order() {
        let h = TestHarness::new().await;
        h.bus.set_fail_on_publish(true).await;

        let order = h.create("1234567891", 1, None).await;

        assert_eq!(order.status, OrderStatus::Accepted);
        let stored = h.service.get_order(order.id).await.unwrap();
        assert_eq!(stored, Some(order));
    }

    #[tokio::test]
    async fn invalid_requests_leave_no_trace() {
        let h = TestHarness::new().await;

        for cmd in [CreateOrder::new("1234567891", 0), CreateOrder::new("  ", 1)] {
            let err = h.service.create_order(cmd, None).await.unwrap_err();
            assert!(err.is_validation());
        }

        assert_eq!(h.repository.order_count().await, 0);
        assert_eq!(h.catalog.calls().await, 0);
        assert!(h.accepted_events().await.is_empty());
    }

    #[tokio::test]
    async fn orders_are_listed_per_creator() {
        let h = TestHarness::new().await;
        let first = h.create("1234567891", 1, Some("alice")).await;
        h.create("1234567891", 1, Some("bob")).await;
        let second = h.create("1234567894", 2, Some("alice")).await;

        let orders = h
            .service
            .orders_created_by(&UserId::new("alice"))
            .await
            .unwrap();

        assert_eq!(orders, vec![first, second]);
    }
}

mod dispatch {
    use super::*;

    #[tokio::test]
    async fn accepted_order_is_dispatched_once() {
        let h = TestHarness::new().await;
        let order = h.create("1234567891", 1, Some("alice")).await;

        let first = h.service.consume_dispatch_event(order.id).await;
        let second = h.service.consume_dispatch_event(order.id).await;

        match first {
            DispatchOutcome::Dispatched(saved) => {
                assert_eq!(saved.status, OrderStatus::Dispatched);
                assert_eq!(saved.version, Version::new(1));
                assert_eq!(saved.created_by(), Some(&UserId::new("alice")));
                assert_eq!(saved.last_modified_by(), Some(&UserId::new("alice")));
            }
            other => panic!("expected dispatch, got {other:?}"),
        }
        assert_eq!(
            second,
            DispatchOutcome::Ignored(IgnoreReason::AlreadyDispatched)
        );

        let stored = h.repository.find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(stored.version, Version::new(1));
    }

    #[tokio::test]
    async fn unknown_and_rejected_orders_are_ignored() {
        let h = TestHarness::new().await;
        let rejected = h.create("1234567894", 1, None).await;

        assert_eq!(
            h.service.consume_dispatch_event(OrderId::new(404)).await,
            DispatchOutcome::Ignored(IgnoreReason::NotFound)
        );
        assert_eq!(
            h.service.consume_dispatch_event(rejected.id).await,
            DispatchOutcome::Ignored(IgnoreReason::Rejected)
        );

        let stored = h.repository.find_by_id(rejected.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Rejected);
        assert_eq!(stored.version, Version::initial());
    }

    #[tokio::test]
    async fn dispatch_emits_no_events() {
        let h = TestHarness::new().await;
        let order = h.create("1234567891", 1, None).await;
        let before = h.bus.published_count().await;

        h.service.consume_dispatch_event(order.id).await;

        assert_eq!(h.bus.published_count().await, before);
    }

    #[tokio::test]
    async fn lost_race_is_a_conflict_and_is_not_retried() {
        let h = TestHarness::new().await;
        let order = h.create("1234567891", 1, None).await;
        h.repository.interleave_writes(1).await;

        let outcome = h.service.consume_dispatch_event(order.id).await;

        assert_eq!(outcome, DispatchOutcome::Conflict);
        let stored = h.repository.find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Accepted);
        assert_eq!(stored.version, Version::new(1));

        // A later redelivery reads the fresh version and applies.
        match h.service.consume_dispatch_event(order.id).await {
            DispatchOutcome::Dispatched(saved) => assert_eq!(saved.version, Version::new(2)),
            other => panic!("expected dispatch, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicates_dispatch_exactly_once() {
        let h = TestHarness::new().await;
        let order = h.create("1234567891", 1, None).await;
        let order_id = order.id;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = h.service.clone();
                tokio::spawn(async move { service.consume_dispatch_event(order_id).await })
            })
            .collect();

        let mut dispatched = 0;
        for handle in handles {
            match handle.await.unwrap() {
                DispatchOutcome::Dispatched(_) => dispatched += 1,
                DispatchOutcome::Conflict | DispatchOutcome::Ignored(_) => {}
                DispatchOutcome::Failed => panic!("storage should not fail"),
            }
        }

        assert_eq!(dispatched, 1);
        let stored = h.repository.find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Dispatched);
        assert_eq!(stored.version, Version::new(1));
    }
}

mod consumer {
    use super::*;

    #[tokio::test]
    async fn consumes_until_stream_ends_and_skips_poison_messages() {
        let h = TestHarness::new().await;
        let accepted = h.create("1234567891", 1, None).await;
        let rejected = h.create("1234567894", 1, None).await;

        let destination = h.destinations.order_dispatched.clone();
        let stream = h.bus.subscribe(&destination).await.unwrap();

        h.bus
            .publish(Message::new(&destination, serde_json::json!({ "nope": 1 })))
            .await
            .unwrap();
        for id in [accepted.id, accepted.id, rejected.id, OrderId::new(99)] {
            h.bus
                .publish_json(&destination, &OrderDispatchedMessage { order_id: id })
                .await
                .unwrap();
        }
        h.bus.close(&destination).await;

        let (_tx, rx) = watch::channel(false);
        let stats = h.consumer().consume(stream, rx).await;

        assert_eq!(stats.received, 5);
        assert_eq!(stats.undecodable, 1);
        assert_eq!(stats.dispatched, 1);
        assert_eq!(stats.ignored, 3);

        let stored = h.repository.find_by_id(accepted.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Dispatched);
    }

    #[tokio::test]
    async fn conflicting_delivery_is_counted_and_dropped() {
        let h = TestHarness::new().await;
        let order = h.create("1234567891", 1, None).await;
        h.repository.interleave_writes(1).await;

        let destination = h.destinations.order_dispatched.clone();
        let stream = h.bus.subscribe(&destination).await.unwrap();
        h.bus
            .publish_json(&destination, &OrderDispatchedMessage { order_id: order.id })
            .await
            .unwrap();
        h.bus.close(&destination).await;

        let (_tx, rx) = watch::channel(false);
        let stats = h.consumer().consume(stream, rx).await;

        assert_eq!(stats.received, 1);
        assert_eq!(stats.conflicts, 1);
        assert_eq!(stats.dispatched, 0);
        assert_eq!(h.bus.published(&destination).await.len(), 1);
        let stored = h.repository.find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Accepted);
    }

    #[tokio::test]
    async fn spawned_consumer_stops_on_shutdown() {
        let h = TestHarness::new().await;
        let order = h.create("1234567891", 1, None).await;

        let (tx, rx) = watch::channel(false);
        let handle = h.consumer().spawn(rx);

        // Keep publishing until the background subscription picks it up.
        let destination = h.destinations.order_dispatched.clone();
        let mut dispatched = false;
        for _ in 0..100 {
            h.bus
                .publish_json(&destination, &OrderDispatchedMessage { order_id: order.id })
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;

            let stored = h.repository.find_by_id(order.id).await.unwrap().unwrap();
            if stored.status == OrderStatus::Dispatched {
                dispatched = true;
                break;
            }
        }
        assert!(dispatched);

        tx.send(true).unwrap();
        let stats = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(stats.dispatched, 1);
    }

    #[tokio::test]
    async fn already_signalled_shutdown_returns_immediately() {
        let h = TestHarness::new().await;
        let stream = h.bus.subscribe("order-dispatched").await.unwrap();

        let (_tx, rx) = watch::channel(true);
        let stats = h.consumer().consume(stream, rx).await;

        assert_eq!(stats, fulfillment::ConsumerStats::default());
    }
}
