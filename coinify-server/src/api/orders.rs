//! Merchant-side order operations that talk to Coinify.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use coinify_core::orders::{OrderStatus, StoreError};
use coinify_core::processors::{CheckoutSession, RefundError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum CheckoutResponse {
    Success { redirect: String },
    Failure { message: String },
}

#[derive(Debug, Deserialize)]
pub struct RefundBody {
    pub amount: Decimal,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum RefundResponse {
    Success { response: serde_json::Value },
    Failure { message: String },
}

#[derive(Debug)]
pub enum OrdersApiError {
    Store(StoreError),
    NotFound,
    NotPayable(OrderStatus),
    MissingTransactionId,
    InvalidAmount,
}

impl IntoResponse for OrdersApiError {
    fn into_response(self) -> Response {
        match self {
            OrdersApiError::Store(e) => {
                tracing::error!(error = %e, "Orders API store error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            OrdersApiError::NotFound => (StatusCode::NOT_FOUND, "order not found").into_response(),
            OrdersApiError::NotPayable(status) => (
                StatusCode::CONFLICT,
                format!("order is {status} and cannot be paid"),
            )
                .into_response(),
            OrdersApiError::MissingTransactionId => (
                StatusCode::CONFLICT,
                "order has no Coinify transaction id",
            )
                .into_response(),
            OrdersApiError::InvalidAmount => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "refund amount must be positive",
            )
                .into_response(),
        }
    }
}

/// `POST /orders/{order_id}/checkout`: create a payment intent and return
/// the hosted payment page to redirect the buyer to.
pub async fn begin_checkout(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(order_id): Path<String>,
) -> Result<Response, OrdersApiError> {
    let order = state
        .store
        .find(&order_id)
        .await
        .map_err(OrdersApiError::Store)?
        .ok_or(OrdersApiError::NotFound)?;

    if order.status != OrderStatus::Pending {
        return Err(OrdersApiError::NotPayable(order.status));
    }

    let session = {
        let urls = state.config.checkout.read().await;
        CheckoutSession::from_order(
            &order,
            urls.success_url(&order.id),
            urls.failure_url(&order.id),
        )
    };
    let config = state.config.coinify().await;

    match state.gateway.begin_checkout(&config, &session).await {
        Ok(redirect) => Ok(Json(CheckoutResponse::Success {
            redirect: redirect.redirect,
        })
        .into_response()),
        Err(e) => Ok((
            StatusCode::BAD_GATEWAY,
            Json(CheckoutResponse::Failure {
                message: e.user_message(),
            }),
        )
            .into_response()),
    }
}

/// `POST /orders/{order_id}/refund`: ask Coinify to refund part or all of
/// a paid order. The order becomes `refunded` only once the refund webhook
/// arrives.
pub async fn refund(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(order_id): Path<String>,
    Json(body): Json<RefundBody>,
) -> Result<Response, OrdersApiError> {
    if body.amount <= Decimal::ZERO {
        return Err(OrdersApiError::InvalidAmount);
    }

    let config = state.config.coinify().await;
    match state
        .gateway
        .refund(&config, &order_id, body.amount, &body.reason)
        .await
    {
        Ok(accepted) => Ok(Json(RefundResponse::Success {
            response: accepted.body,
        })
        .into_response()),
        Err(RefundError::OrderNotFound(_)) => Err(OrdersApiError::NotFound),
        Err(RefundError::MissingTransactionId(_)) => Err(OrdersApiError::MissingTransactionId),
        Err(RefundError::Store(e)) => Err(OrdersApiError::Store(e)),
        Err(RefundError::Provider(e)) => Ok((
            StatusCode::BAD_GATEWAY,
            Json(RefundResponse::Failure {
                message: format!("Error processing refund via Coinify: {e}"),
            }),
        )
            .into_response()),
    }
}
