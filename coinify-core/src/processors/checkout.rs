//! Checkout and refund orchestration.
//!
//! Checkout creates a payment intent and hands back the hosted payment page
//! URL. A refund is two-phase: the provider accepts or rejects the request
//! right away, but the order only becomes `refunded` when the matching
//! webhook arrives.

use std::sync::Arc;

use coinify_sdk::client::{ClientError, PaymentIntentClient};
use coinify_sdk::config::ApiConfig;
use coinify_sdk::objects::{EmptyOrderId, PaymentIntentRequest, RefundAccepted, RefundRequest};
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::orders::{Order, OrderStore, StoreError};

/// Everything the checkout page knows about the purchase being paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub order_id: String,
    pub total: Decimal,
    pub currency: String,
    pub customer_id: String,
    pub customer_email: String,
    /// Where the buyer lands after paying.
    pub success_url: String,
    /// Where the buyer lands after failing or abandoning payment.
    pub failure_url: String,
}

impl CheckoutSession {
    pub fn from_order(
        order: &Order,
        success_url: impl Into<String>,
        failure_url: impl Into<String>,
    ) -> Self {
        Self {
            order_id: order.id.clone(),
            total: order.total,
            currency: order.currency.clone(),
            customer_id: order.customer_id.clone(),
            customer_email: order.customer_email.clone(),
            success_url: success_url.into(),
            failure_url: failure_url.into(),
        }
    }

    pub fn payment_intent_request(&self) -> Result<PaymentIntentRequest, EmptyOrderId> {
        PaymentIntentRequest::new(
            format_amount(self.total),
            self.currency.clone(),
            self.order_id.clone(),
            self.customer_id.clone(),
            self.customer_email.clone(),
            self.success_url.clone(),
            self.failure_url.clone(),
        )
    }
}

/// Render an amount as sent to Coinify: trailing zeros dropped, but never
/// fewer than two decimal places. Stored totals may carry a wider scale
/// than the shop shows (`NUMERIC(20, 8)` decodes 25.00 as `25.00000000`).
pub fn format_amount(amount: Decimal) -> String {
    let mut amount = amount.normalize();
    if amount.scale() < 2 {
        amount.rescale(2);
    }
    amount.to_string()
}

/// Where to send the buyer next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRedirect {
    pub redirect: String,
    /// Payment intent id, if the provider returned one.
    pub transaction_id: Option<String>,
}

/// Checkout could not start. The caller must abort the checkout.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("invalid checkout session: {0}")]
    InvalidSession(#[from] EmptyOrderId),

    #[error("payment intent creation failed: {0}")]
    Provider(#[from] ClientError),
}

impl CheckoutError {
    /// Message safe to show to the buyer.
    pub fn user_message(&self) -> String {
        match self {
            CheckoutError::Provider(e) if e.is_transport() => {
                format!("Error connecting to Coinify API: {e}")
            }
            _ => "Error creating payment via Coinify.".to_owned(),
        }
    }
}

/// Errors surfaced by a refund request.
#[derive(Debug, thiserror::Error)]
pub enum RefundError {
    #[error("order not found: {0}")]
    OrderNotFound(String),

    #[error("order {0} has no Coinify transaction id")]
    MissingTransactionId(String),

    #[error("refund request failed: {0}")]
    Provider(#[from] ClientError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Merchant-side Coinify operations that talk to the provider.
#[derive(Clone)]
pub struct PaymentGateway {
    client: PaymentIntentClient,
    store: Arc<dyn OrderStore>,
}

impl PaymentGateway {
    pub fn new(client: PaymentIntentClient, store: Arc<dyn OrderStore>) -> Self {
        Self { client, store }
    }

    /// Create a payment intent for `session` and return the redirect.
    ///
    /// Exactly one provider round trip. The intent id is stored as the
    /// order's transaction id; failing to store it is logged but does not
    /// abort checkout, since `payment_complete` carries it again.
    pub async fn begin_checkout(
        &self,
        config: &ApiConfig,
        session: &CheckoutSession,
    ) -> Result<CheckoutRedirect, CheckoutError> {
        let request = session.payment_intent_request()?;

        let intent = self
            .client
            .create_intent(config, &request)
            .await
            .map_err(|e| {
                warn!(
                    order_id = %session.order_id,
                    error = %e,
                    "Failed to create Coinify payment intent"
                );
                e
            })?;

        if let Some(id) = intent.id.as_deref() {
            if let Err(e) = self.store.set_transaction_id(&session.order_id, id).await {
                error!(
                    order_id = %session.order_id,
                    transaction_id = %id,
                    error = %e,
                    "Failed to store Coinify transaction id"
                );
            }
        }

        info!(
            order_id = %session.order_id,
            transaction_id = ?intent.id,
            "Coinify payment intent created"
        );

        Ok(CheckoutRedirect {
            redirect: intent.payment_window_url,
            transaction_id: intent.id,
        })
    }

    /// Ask Coinify to refund `amount` of the order's payment.
    ///
    /// On success an audit note is appended; the status is left alone until
    /// the refund-completed webhook arrives. Never retried.
    pub async fn refund(
        &self,
        config: &ApiConfig,
        order_id: &str,
        amount: Decimal,
        reason: &str,
    ) -> Result<RefundAccepted, RefundError> {
        let order = self
            .store
            .find(order_id)
            .await?
            .ok_or_else(|| RefundError::OrderNotFound(order_id.to_owned()))?;

        let transaction_id = order
            .transaction_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| RefundError::MissingTransactionId(order_id.to_owned()))?;

        let request = RefundRequest::new(
            transaction_id,
            format_amount(amount),
            order.currency.clone(),
            reason,
        );

        let accepted = match self.client.request_refund(config, &request).await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!(order_id = %order_id, error = %e, "Error processing refund via Coinify");
                return Err(e.into());
            }
        };

        self.store
            .append_note(order_id, "Refund processed successfully via Coinify.")
            .await?;
        info!(order_id = %order_id, amount = %amount, "Coinify refund requested");

        Ok(accepted)
    }
}
