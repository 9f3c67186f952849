//! PaperLane API Gateway
//!
//! The endpoint surface in front of the search backends.
//! Handles:
//! - Query validation and the missing-query short-circuit
//! - Paper search, web search and RAG endpoints
//! - Keyword routing of conversations
//! - Observability (logging, metrics, request ids)

pub mod handlers;
pub mod middleware;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use paperlane_common::{config::AppConfig, Backends, QueryRouter};
use std::sync::Arc;
use tower::{limit::ConcurrencyLimitLayer, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub backends: Backends,
    pub router: QueryRouter,
}

impl AppState {
    pub fn new(config: AppConfig, backends: Backends) -> Self {
        Self {
            config: Arc::new(config),
            router: QueryRouter::new(backends.clone()),
            backends,
        }
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        // Health endpoints
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health))
        // Backend endpoints
        .route("/search-papers", post(handlers::search::search_papers))
        .route("/search-web", post(handlers::search::search_web))
        .route("/rag-search", post(handlers::rag::rag_search))
        // Keyword routing
        .route("/route", post(handlers::route::route_query))
        // Route layer so the matched path is visible to the recorder
        .route_layer(axum_middleware::from_fn(middleware::metrics::track_metrics))
        .with_state(state);

    if config.rate_limit.enabled {
        let limit = middleware::rate_limit::RateLimit::new(&config.rate_limit);
        app = app.layer(axum_middleware::from_fn_with_state(
            limit,
            middleware::rate_limit::rate_limit,
        ));
    }

    app.layer(
        ServiceBuilder::new()
            // Request ID first so every later layer sees it
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(cors)
            .layer(axum_middleware::from_fn_with_state(
                config.request_timeout(),
                middleware::timeout::request_timeout,
            ))
            // Backpressure
            .layer(ConcurrencyLimitLayer::new(config.server.max_concurrent_requests)),
    )
}
