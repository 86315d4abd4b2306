//! Common test utilities for integration tests.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot` over an
//! in-memory entry store, so no database is needed.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use domain::services::{EntryStore, InMemoryEntryStore};
use scheduled_config_api::{
    app::create_app,
    config::{
        CleanupConfig, Config, DatabaseConfig, LoggingConfig, PaginationConfig, SecurityConfig,
        ServerConfig,
    },
};
use std::sync::Arc;
use tower::ServiceExt;

/// Test configuration; the database section is never used by the in-memory store.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: "postgres://unused@localhost/unused".to_string(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig::default(),
        pagination: PaginationConfig {
            default_page_size: 20,
            max_page_size: 50,
        },
        cleanup: CleanupConfig {
            enabled: false,
            interval_secs: 5,
        },
    }
}

/// App over a fresh in-memory store; the store is returned for inspection.
pub fn create_test_app() -> (Router, Arc<InMemoryEntryStore>) {
    let store = Arc::new(InMemoryEntryStore::new());
    let app = create_app(test_config(), store.clone() as Arc<dyn EntryStore>);
    (app, store)
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn parse_response_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}

/// POST an entry and return the created body; panics unless the API answers 201.
pub async fn create_entry(app: &Router, body: serde_json::Value) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/configs", body))
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    parse_response_body(response).await
}
