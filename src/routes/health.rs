use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use super::RouteModule;
use crate::server::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /api/health`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HealthRoutes;

impl RouteModule for HealthRoutes {
    fn name(&self) -> &str {
        "health"
    }

    fn router(&self) -> Router<AppState> {
        Router::new().route("/api/health", get(health_check))
    }
}
