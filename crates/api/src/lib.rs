//! HTTP API server for the book order service.
//!
//! Exposes order creation and lookup over REST, health and Prometheus
//! endpoints, and wires the dispatch consumer that runs next to the server.

pub mod config;
pub mod error;
pub mod extractors;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use catalog_client::BookCatalog;
use fulfillment::{DispatchConsumer, OrderService};
use messaging::{AcceptedOrderPublisher, Destinations, MessageBus};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::{AppState, SharedRepository};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/orders",
            get(routes::orders::list).post(routes::orders::create),
        )
        .route("/orders/{id}", get(routes::orders::get))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Builds the shared state and the dispatch consumer over one service.
pub fn create_state(
    repository: SharedRepository,
    catalog: Arc<dyn BookCatalog>,
    bus: Arc<dyn MessageBus>,
    destinations: &Destinations,
) -> (Arc<AppState>, DispatchConsumer<SharedRepository>) {
    let publisher = AcceptedOrderPublisher::new(bus.clone(), &destinations.order_accepted);
    let order_service = Arc::new(OrderService::new(repository, catalog, publisher));
    let consumer = DispatchConsumer::new(
        order_service.clone(),
        bus,
        &destinations.order_dispatched,
    );

    (Arc::new(AppState { order_service }), consumer)
}
