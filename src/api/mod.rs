//! HTTP surface - axum router over the core operations.
//!
//! Every route authenticates the acting user through the [`crate::core::access::Actor`]
//! extractor and answers with a JSON [`response::Outcome`]. Listings are `GET`, every
//! mutation is `POST`.

pub mod attendance;
pub mod auth;
pub mod body;
pub mod employee;
pub mod notification;
pub mod payroll;
pub mod response;
pub mod site;
pub mod user;

use axum::{Json, Router, routing::get};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub database: DatabaseConnection,
}

impl AppState {
    /// Wraps a database connection.
    #[must_use]
    pub const fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Builds the full application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(attendance::router())
        .merge(payroll::router())
        .merge(employee::router())
        .merge(site::router())
        .merge(notification::router())
        .merge(user::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
