//! Fabplan API Library
//!
//! Logistics-planning backend for small-batch manufacturers: incoming supply
//! projection, order fulfillment forecasting, per-material timelines, and
//! production readiness, with a cached operations dashboard on top. The
//! engines are pure functions of a relational snapshot; nothing here writes
//! back to the store.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod cache;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod queries;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
    pub cache: Arc<dyn cache::CacheBackend>,
}

/// Assembles the full application router.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api/v1/planning", handlers::planning::planning_routes())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .with_state(state)
}
