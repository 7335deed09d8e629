use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, UserId};
use domain::{AuditInfo, NewOrder, Order, Version};
use tokio::sync::RwLock;

use crate::{OrderRepository, RepositoryError, Result};

#[derive(Debug, Default)]
struct MemoryState {
    orders: BTreeMap<OrderId, Order>,
    last_id: i64,
    fail_on_insert: bool,
    fail_on_update: bool,
    concurrent_writes: u32,
}

/// In-memory order repository for testing and local runs.
///
/// Behaves like the PostgreSQL implementation: identifiers start at 1 and
/// updates are version-checked under a single write lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryOrderRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent inserts fail with a database error.
    pub async fn set_fail_on_insert(&self, fail: bool) {
        self.state.write().await.fail_on_insert = fail;
    }

    /// Makes subsequent updates fail with a database error.
    pub async fn set_fail_on_update(&self, fail: bool) {
        self.state.write().await.fail_on_update = fail;
    }

    /// Makes the next `n` updates lose a race: another writer advances the
    /// stored version between the caller's read and its write.
    pub async fn interleave_writes(&self, n: u32) {
        self.state.write().await.concurrent_writes = n;
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    fn injected_failure(operation: &str) -> RepositoryError {
        RepositoryError::Database(sqlx::Error::Protocol(format!(
            "injected {operation} failure"
        )))
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: NewOrder, identity: Option<&UserId>) -> Result<Order> {
        let mut state = self.state.write().await;
        if state.fail_on_insert {
            return Err(Self::injected_failure("insert"));
        }

        state.last_id += 1;
        let id = OrderId::new(state.last_id);
        let order = order.into_order(
            id,
            Version::initial(),
            AuditInfo::created(Utc::now(), identity.cloned()),
        );
        state.orders.insert(id, order.clone());

        Ok(order)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn find_all_by_creator(&self, user: &UserId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .filter(|o| o.created_by() == Some(user))
            .cloned()
            .collect())
    }

    async fn update(&self, order: &Order, identity: Option<&UserId>) -> Result<Order> {
        let mut state = self.state.write().await;
        if state.fail_on_update {
            return Err(Self::injected_failure("update"));
        }

        let interleave = state.concurrent_writes > 0;
        if interleave {
            state.concurrent_writes -= 1;
        }

        let stored = state
            .orders
            .get_mut(&order.id)
            .ok_or(RepositoryError::NotFound(order.id))?;

        if interleave {
            stored.version = stored.version.next();
        }

        if stored.version != order.version {
            return Err(RepositoryError::Conflict {
                order_id: order.id,
                expected: order.version,
                actual: stored.version,
            });
        }

        stored.status = order.status;
        stored.version = stored.version.next();
        stored.audit.touch(Utc::now(), identity.cloned());

        Ok(stored.clone())
    }
}
