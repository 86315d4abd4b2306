use axum::{middleware, routing::get, Router};
use domain::services::{EntryStore, ScheduledConfigService};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{health, scheduled_configs};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ScheduledConfigService>,
    pub config: Arc<Config>,
}

/// Build the router over an entry store.
pub fn create_app(config: Config, store: Arc<dyn EntryStore>) -> Router {
    create_app_with_service(config, Arc::new(ScheduledConfigService::new(store)))
}

/// Build the router over an existing service, shared with background jobs.
pub fn create_app_with_service(config: Config, service: Arc<ScheduledConfigService>) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        service,
        config: config.clone(),
    };

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let config_routes = Router::new()
        .route(
            "/api/v1/configs",
            get(scheduled_configs::list_latest).post(scheduled_configs::create_config),
        )
        .route("/api/v1/configs/:key", get(scheduled_configs::get_config))
        .route(
            "/api/v1/configs/:key/history",
            get(scheduled_configs::get_history),
        )
        .route("/api/v1/outdated", get(scheduled_configs::list_outdated));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(config_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
