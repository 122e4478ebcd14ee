pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod rates;
pub mod services;

use axum::{extract::State, routing::get, Json, Router};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;

/// Shared application state, cloned into every handler.
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<events::EventSender>,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: Arc<events::EventSender>,
    ) -> Self {
        let services = handlers::AppServices::new(db.clone(), event_sender.clone());
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

/// Builds the versioned API router. Mounted under `/api/v1` by the binary.
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .nest("/cart", handlers::cart::cart_routes())
        .nest("/promo-codes", handlers::promo_codes::promo_code_routes())
        .nest("/shipping", handlers::shipping::shipping_routes())
}

async fn api_status() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "storefront-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    Json(json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
