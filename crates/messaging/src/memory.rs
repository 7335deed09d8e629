use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};

use crate::{Message, MessageBus, MessageStream, MessagingError, Result};

const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct BusState {
    channels: HashMap<String, broadcast::Sender<Message>>,
    history: VecDeque<Message>,
    fail_on_publish: bool,
}

/// In-memory message bus for testing and single-process deployments.
///
/// Each destination is a broadcast channel: every subscriber sees every
/// message published after it subscribed. Subscribers that fall more than
/// `capacity` messages behind receive a `Lagged` error and resume from the
/// oldest retained message. The last `capacity` published messages, across
/// all destinations, are also kept in a history for inspection.
#[derive(Debug, Clone)]
pub struct InMemoryMessageBus {
    state: Arc<RwLock<BusState>>,
    capacity: usize,
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl InMemoryMessageBus {
    /// Creates a new bus with the default per-destination capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new bus retaining at most `capacity` undelivered messages
    /// per destination.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Arc::default(),
            capacity: capacity.max(1),
        }
    }

    /// Makes subsequent publishes fail.
    pub async fn set_fail_on_publish(&self, fail: bool) {
        self.state.write().await.fail_on_publish = fail;
    }

    /// Returns the retained messages published to `destination`, oldest first.
    pub async fn published(&self, destination: &str) -> Vec<Message> {
        self.state
            .read()
            .await
            .history
            .iter()
            .filter(|m| m.destination == destination)
            .cloned()
            .collect()
    }

    /// Returns the number of retained messages.
    pub async fn published_count(&self) -> usize {
        self.state.read().await.history.len()
    }

    /// Ends every subscription to `destination` once buffered messages are
    /// drained.
    pub async fn close(&self, destination: &str) {
        self.state.write().await.channels.remove(destination);
    }

    fn sender_for<'a>(
        state: &'a mut BusState,
        destination: &str,
        capacity: usize,
    ) -> &'a broadcast::Sender<Message> {
        state
            .channels
            .entry(destination.to_string())
            .or_insert_with(|| broadcast::channel(capacity).0)
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn publish(&self, message: Message) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail_on_publish {
            return Err(MessagingError::PublishFailed {
                destination: message.destination,
                reason: "injected failure".to_string(),
            });
        }

        if state.history.len() >= self.capacity {
            state.history.pop_front();
        }
        state.history.push_back(message.clone());
        let sender = Self::sender_for(&mut state, &message.destination, self.capacity);
        // No subscribers is not an error: the history still records it.
        let _ = sender.send(message);
        Ok(())
    }

    async fn subscribe(&self, destination: &str) -> Result<MessageStream> {
        let receiver = {
            let mut state = self.state.write().await;
            Self::sender_for(&mut state, destination, self.capacity).subscribe()
        };

        let destination = destination.to_string();
        let stream = futures_util::stream::unfold(receiver, move |mut receiver| {
            let destination = destination.clone();
            async move {
                match receiver.recv().await {
                    Ok(message) => Some((Ok(message), receiver)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => Some((
                        Err(MessagingError::Lagged {
                            destination,
                            skipped,
                        }),
                        receiver,
                    )),
                    Err(broadcast::error::RecvError::Closed) => None,
                }
            }
        });

        Ok(Box::pin(stream))
    }
}
