//! HTTP API handlers.
//!
//! # Endpoints
//!
//! - `ANY  /webhooks/coinify`          – Coinify event deliveries (HMAC signed)
//! - `POST /orders/{order_id}/checkout` – start checkout, admin only
//! - `POST /orders/{order_id}/refund`   – request a refund, admin only

use axum::{
    Router,
    routing::{any, post},
};

use crate::state::AppState;

pub mod extractors;
mod orders;
mod webhook;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/webhooks/coinify", any(webhook::coinify_webhook))
        .route("/orders/{order_id}/checkout", post(orders::begin_checkout))
        .route("/orders/{order_id}/refund", post(orders::refund))
}
