//! Consumer feeding dispatch confirmations into the order service.

use std::sync::Arc;

use futures_util::StreamExt;
use messaging::{Message, MessageBus, MessageStream, OrderDispatchedMessage};
use order_store::OrderRepository;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::{DispatchOutcome, OrderService, Result};

/// Counters collected while consuming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub received: u64,
    pub dispatched: u64,
    pub ignored: u64,
    pub conflicts: u64,
    pub failed: u64,
    pub undecodable: u64,
    pub stream_errors: u64,
}

impl ConsumerStats {
    fn record(&mut self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Dispatched(_) => self.dispatched += 1,
            DispatchOutcome::Ignored(_) => self.ignored += 1,
            DispatchOutcome::Conflict => self.conflicts += 1,
            DispatchOutcome::Failed => self.failed += 1,
        }
    }
}

/// Subscribes to the dispatch destination and applies each confirmation.
///
/// Undecodable messages are logged and skipped. Delivery errors on the
/// stream are logged and consumption continues. The loop ends when the
/// stream ends or the shutdown flag turns `true`.
pub struct DispatchConsumer<R: OrderRepository> {
    service: Arc<OrderService<R>>,
    bus: Arc<dyn MessageBus>,
    destination: String,
}

impl<R: OrderRepository + 'static> DispatchConsumer<R> {
    /// Creates a consumer reading from `destination`.
    pub fn new(
        service: Arc<OrderService<R>>,
        bus: Arc<dyn MessageBus>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            service,
            bus,
            destination: destination.into(),
        }
    }

    /// Subscribes and consumes until shutdown.
    ///
    /// # Errors
    ///
    /// Returns `Messaging` if the subscription cannot be opened.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<ConsumerStats> {
        let stream = self.bus.subscribe(&self.destination).await?;
        Ok(self.consume(stream, shutdown).await)
    }

    /// Runs the consumer on a background task.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<Result<ConsumerStats>> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    /// Consumes an already opened subscription until it ends or shutdown.
    #[tracing::instrument(skip_all, fields(destination = %self.destination))]
    pub async fn consume(
        &self,
        mut stream: MessageStream,
        mut shutdown: watch::Receiver<bool>,
    ) -> ConsumerStats {
        let mut stats = ConsumerStats::default();
        tracing::info!("dispatch consumer started");

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        tracing::debug!("shutdown sender dropped");
                        break;
                    }
                }
                next = stream.next() => match next {
                    Some(Ok(message)) => self.handle(&message, &mut stats).await,
                    Some(Err(e)) => {
                        stats.stream_errors += 1;
                        tracing::warn!(error = %e, "dispatch stream error");
                    }
                    None => {
                        tracing::info!("dispatch stream ended");
                        break;
                    }
                },
            }
        }

        tracing::info!(?stats, "dispatch consumer stopped");
        stats
    }

    async fn handle(&self, message: &Message, stats: &mut ConsumerStats) {
        stats.received += 1;

        let dispatched = match message.decode::<OrderDispatchedMessage>() {
            Ok(dispatched) => dispatched,
            Err(e) => {
                stats.undecodable += 1;
                tracing::warn!(message_id = %message.id, error = %e, "skipping undecodable dispatch message");
                return;
            }
        };

        let outcome = self
            .service
            .consume_dispatch_event(dispatched.order_id)
            .await;
        if let DispatchOutcome::Dispatched(order) = &outcome {
            tracing::info!(order_id = %order.id, "order {} is dispatched", order.id);
        }
        stats.record(&outcome);
    }
}
