//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::OrderId;
use domain::{CreateOrder, Order};
use fulfillment::OrderService;
use order_store::OrderRepository;

use crate::error::ApiError;
use crate::extractors::Identity;

/// Repository handle shared by the HTTP layer and the dispatch consumer.
pub type SharedRepository = Arc<dyn OrderRepository>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub order_service: Arc<OrderService<SharedRepository>>,
}

/// POST /orders: price and persist an order for one book.
///
/// Answers `200` for both accepted and rejected orders; the status field
/// tells them apart.
#[tracing::instrument(skip(state, identity, cmd), fields(isbn = %cmd.isbn))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(cmd): Json<CreateOrder>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .order_service
        .create_order(cmd, identity.user())
        .await?;
    Ok(Json(order))
}

/// GET /orders: orders created by the caller.
#[tracing::instrument(skip(state, identity))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<Order>>, ApiError> {
    let user = identity.require()?;
    let orders = state.order_service.orders_created_by(user).await?;
    Ok(Json(orders))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Order>, ApiError> {
    let id = OrderId::new(id);
    state
        .order_service
        .get_order(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))
}
