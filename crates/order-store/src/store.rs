use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, UserId};
use domain::{NewOrder, Order};

use crate::Result;

/// Storage contract for orders.
///
/// Implementations must be thread-safe (Send + Sync). The repository owns
/// identifier assignment, versioning and audit metadata; callers only decide
/// the business fields.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists a new order.
    ///
    /// Assigns the identifier, version `0` and both audit dates. `created_by`
    /// and `last_modified_by` are set from `identity` when present.
    async fn insert(&self, order: NewOrder, identity: Option<&UserId>) -> Result<Order>;

    /// Loads an order by identifier.
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists the orders created by a user, ordered by identifier.
    async fn find_all_by_creator(&self, user: &UserId) -> Result<Vec<Order>>;

    /// Writes the status of an existing order.
    ///
    /// `order.version` must equal the stored version, otherwise the call fails
    /// with `Conflict` and nothing is written. On success the version is
    /// incremented by one and `last_modified_date` refreshed;
    /// `last_modified_by` only changes when `identity` is present. The ISBN,
    /// quantity and book snapshot are never written.
    async fn update(&self, order: &Order, identity: Option<&UserId>) -> Result<Order>;
}

#[async_trait]
impl<R> OrderRepository for Arc<R>
where
    R: OrderRepository + ?Sized,
{
    async fn insert(&self, order: NewOrder, identity: Option<&UserId>) -> Result<Order> {
        (**self).insert(order, identity).await
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        (**self).find_by_id(id).await
    }

    async fn find_all_by_creator(&self, user: &UserId) -> Result<Vec<Order>> {
        (**self).find_all_by_creator(user).await
    }

    async fn update(&self, order: &Order, identity: Option<&UserId>) -> Result<Order> {
        (**self).update(order, identity).await
    }
}
