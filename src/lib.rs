//! courier-api
//!
//! Order-delivery tracking service: records orders and city districts in a
//! relational store and exposes HTTP endpoints to create, list, update and
//! delete them, plus filtering queries over district and origin IP.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod logging;
pub mod migrator;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// App state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
}

/// All application routes, without middleware or state applied.
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::service_banner))
        .route("/health", get(handlers::health))
        .route("/get-ip", get(handlers::get_ip))
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route(
            "/orders/:id",
            get(handlers::orders::get_order).delete(handlers::orders::delete_order),
        )
        .route("/delivered-order", post(handlers::orders::mark_delivered))
        .route("/deliver-Order/:ip", get(handlers::orders::orders_by_ip))
        .route(
            "/delivery-Order/:district_id",
            get(handlers::orders::earliest_order_for_district),
        )
        .route(
            "/districts",
            get(handlers::districts::list_districts)
                .post(handlers::districts::create_district)
                .put(handlers::districts::update_district),
        )
        .route("/districts/:id", delete(handlers::districts::delete_district))
}

/// Assemble the full router: routes, HTTP tracing and CORS.
pub fn build_router(state: AppState) -> Router {
    app_routes()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
