//! WebhookDispatcher processor.
//!
//! The WebhookDispatcher is responsible for:
//! - Verifying the `X-Coinify-Webhook-Signature` of the raw body
//! - Decoding the event envelope (only after verification)
//! - Resolving the order by the `orderId` inside the payload
//! - Claiming the delivery in the idempotency ledger
//! - Running the order state machine
//!
//! Every delivery that passes signature verification is acknowledged with
//! 200, including malformed payloads, unknown orders and internal failures.
//! The provider would otherwise redeliver something retrying cannot fix.

use std::sync::Arc;

use coinify_sdk::config::ApiConfig;
use coinify_sdk::objects::{EnvelopeError, WebhookEnvelope};
use coinify_sdk::signature::{self, SignatureError};
use tracing::{debug, error, info, warn};

use super::state_machine::{self, Reconciliation};
use crate::orders::{DeliveryKey, DeliveryLedger, OrderStore, StoreError};

/// How a webhook delivery was handled.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Signature missing, malformed or wrong. Nothing else ran.
    Rejected(SignatureError),
    /// Signed, but the body is not a usable envelope.
    Malformed(EnvelopeError),
    /// No order with the payload's `orderId`.
    OrderNotFound { order_id: String },
    /// This event occurrence was processed before.
    Duplicate { key: DeliveryKey },
    Reconciled {
        order_id: String,
        result: Reconciliation,
    },
    /// The store failed; logged and acknowledged.
    Failed(StoreError),
}

impl DispatchOutcome {
    /// HTTP status to answer the provider with.
    pub fn http_status(&self) -> u16 {
        match self {
            DispatchOutcome::Rejected(_) => 400,
            _ => 200,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, DispatchOutcome::Rejected(_))
    }
}

/// Applies signed Coinify webhook deliveries to the order store.
#[derive(Clone)]
pub struct WebhookDispatcher {
    store: Arc<dyn OrderStore>,
    ledger: Arc<dyn DeliveryLedger>,
}

impl WebhookDispatcher {
    pub fn new(store: Arc<dyn OrderStore>, ledger: Arc<dyn DeliveryLedger>) -> Self {
        Self { store, ledger }
    }

    /// Handle one delivery.
    ///
    /// * `raw_body` – request body exactly as received.
    /// * `signature_header` – value of the signature header, if present.
    pub async fn handle(
        &self,
        config: &ApiConfig,
        raw_body: &[u8],
        signature_header: Option<&str>,
    ) -> DispatchOutcome {
        if let Err(e) =
            signature::verify_signature(raw_body, signature_header, config.webhook_secret())
        {
            warn!(error = %e, "Invalid Coinify webhook signature");
            return DispatchOutcome::Rejected(e);
        }

        let envelope = match WebhookEnvelope::from_slice(raw_body) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Malformed Coinify webhook payload, acknowledging");
                return DispatchOutcome::Malformed(e);
            }
        };
        debug!(
            event = %envelope.event,
            order_id = %envelope.data.order_id,
            "Received Coinify webhook"
        );

        match self.process(raw_body, &envelope).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    order_id = %envelope.data.order_id,
                    event = %envelope.event,
                    error = %e,
                    "Failed to apply Coinify webhook"
                );
                DispatchOutcome::Failed(e)
            }
        }
    }

    async fn process(
        &self,
        raw_body: &[u8],
        envelope: &WebhookEnvelope,
    ) -> Result<DispatchOutcome, StoreError> {
        let order_id = &envelope.data.order_id;

        let Some(order) = self.store.find(order_id).await? else {
            warn!(
                order_id = %order_id,
                event = %envelope.event,
                "Order not found for received webhook"
            );
            return Ok(DispatchOutcome::OrderNotFound {
                order_id: order_id.clone(),
            });
        };

        let key = DeliveryKey::for_delivery(raw_body, envelope);
        if !self.ledger.claim(&key, &envelope.event).await? {
            info!(delivery = %key, event = %envelope.event, "Duplicate webhook delivery ignored");
            return Ok(DispatchOutcome::Duplicate { key });
        }

        match state_machine::reconcile(self.store.as_ref(), &order, envelope).await {
            Ok(result) => Ok(DispatchOutcome::Reconciled {
                order_id: order.id,
                result,
            }),
            Err(e) => {
                // Forget the claim so an operator replay can apply it.
                if let Err(release_err) = self.ledger.release(&key).await {
                    error!(
                        delivery = %key,
                        error = %release_err,
                        "Failed to release webhook delivery claim"
                    );
                }
                Err(e)
            }
        }
    }
}
