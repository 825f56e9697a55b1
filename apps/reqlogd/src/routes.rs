//! Demo routes

use axum::{
    extract::{Path, State},
    http::{Extensions, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use reqlog_core::{BusinessError, ContextHandle, LogOptions, PerformanceLogger};

#[derive(Clone)]
pub struct AppState {
    pub perf: PerformanceLogger,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateOrder {
    pub id: u64,
}

#[derive(Debug, Serialize)]
pub struct Order {
    pub id: u64,
    pub status: &'static str,
}

pub fn router(perf: PerformanceLogger) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/orders", post(create_order))
        .route("/orders/{id}", get(get_order))
        .with_state(AppState { perf })
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn create_order(Json(order): Json<CreateOrder>) -> Json<Value> {
    tracing::info!("Creating order {}", order.id);
    tokio::time::sleep(Duration::from_millis(120)).await;
    Json(json!({ "status": "ok" }))
}

async fn find_order(id: u64) -> Result<Order, BusinessError> {
    tokio::time::sleep(Duration::from_millis(80)).await;
    if id == 0 {
        return Err(BusinessError::new("ORDER_NOT_FOUND", format!("order {} does not exist", id)));
    }
    Ok(Order {
        id,
        status: "shipped",
    })
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    extensions: Extensions,
) -> Response {
    let context = extensions.get::<ContextHandle>().cloned();
    let options = LogOptions::for_module("orders").with_title("Order lookup");

    match state
        .perf
        .observe("find_order", &options, context, &id, find_order(id))
        .await
    {
        Ok(order) => Json(order).into_response(),
        Err(e) => (StatusCode::NOT_FOUND, Json(json!({ "error": e.to_string() }))).into_response(),
    }
}
