//! Order model and the collaborator traits the reconciliation core talks to.
//!
//! The authoritative order store lives outside this crate. [`OrderStore`]
//! and [`DeliveryLedger`] are the only ways the core reads or mutates it;
//! [`MemoryOrderStore`] and [`PgOrderStore`] are the shipped implementations.

mod memory;
mod postgres;

pub use memory::MemoryOrderStore;
pub use postgres::PgOrderStore;

use async_trait::async_trait;
use coinify_sdk::objects::WebhookEnvelope;
use rust_decimal::Decimal;
use time::OffsetDateTime;

/// Order status as understood by the merchant platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    /// Paid, awaiting fulfilment.
    Processing,
    Completed,
    OnHold,
    Cancelled,
    Failed,
    Refunded,
    /// A platform-specific status this crate does not model.
    Custom(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::OnHold => "on-hold",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Failed => "failed",
            OrderStatus::Refunded => "refunded",
            OrderStatus::Custom(status) => status,
        }
    }
}

impl From<&str> for OrderStatus {
    fn from(value: &str) -> Self {
        match value {
            "pending" => OrderStatus::Pending,
            "processing" => OrderStatus::Processing,
            "completed" => OrderStatus::Completed,
            "on-hold" => OrderStatus::OnHold,
            "cancelled" => OrderStatus::Cancelled,
            "failed" => OrderStatus::Failed,
            "refunded" => OrderStatus::Refunded,
            other => OrderStatus::Custom(other.to_owned()),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merchant-side order, as far as payment reconciliation cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: String,
    pub status: OrderStatus,
    pub total: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    pub customer_id: String,
    pub customer_email: String,
    /// External payment intent id.
    pub transaction_id: Option<String>,
    pub paid_at: Option<OffsetDateTime>,
}

impl Order {
    /// A new pending order with no payment attached.
    pub fn pending(
        id: impl Into<String>,
        total: Decimal,
        currency: impl Into<String>,
        customer_id: impl Into<String>,
        customer_email: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            status: OrderStatus::Pending,
            total,
            currency: currency.into(),
            customer_id: customer_id.into(),
            customer_email: customer_email.into(),
            transaction_id: None,
            paid_at: None,
        }
    }
}

/// One entry of an order's append-only audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderNote {
    pub message: String,
    pub created_at: OffsetDateTime,
}

/// Errors raised by store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("order not found: {0}")]
    OrderNotFound(String),
}

/// Read and mutate orders in the external order store.
///
/// Implementations are expected to serialise updates per order id.
/// Status changes are compare-and-set so concurrent deliveries for the same
/// order cannot both apply a transition.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find(&self, order_id: &str) -> Result<Option<Order>, StoreError>;

    /// Set the status to `next` if it is still `expected`, appending `note`
    /// in the same atomic step.
    ///
    /// Returns `false` when the order is missing or its status moved on; no
    /// note is written then.
    async fn transition_status(
        &self,
        order_id: &str,
        expected: &OrderStatus,
        next: &OrderStatus,
        note: &str,
    ) -> Result<bool, StoreError>;

    /// Like [`transition_status`](Self::transition_status), additionally
    /// recording the payment time and, when given, the payment intent id.
    async fn mark_paid(
        &self,
        order_id: &str,
        expected: &OrderStatus,
        next: &OrderStatus,
        transaction_id: Option<&str>,
        note: &str,
    ) -> Result<bool, StoreError>;

    async fn append_note(&self, order_id: &str, message: &str) -> Result<(), StoreError>;

    /// Notes in insertion order.
    async fn notes(&self, order_id: &str) -> Result<Vec<OrderNote>, StoreError>;

    async fn set_transaction_id(
        &self,
        order_id: &str,
        transaction_id: &str,
    ) -> Result<(), StoreError>;
}

/// Identifies one webhook event occurrence for one order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeliveryKey {
    pub order_id: String,
    /// `event:{provider id}` or `sha256:{hex digest of the raw body}`.
    pub fingerprint: String,
}

impl DeliveryKey {
    /// Prefer the provider's event id; fall back to the body digest so
    /// byte-identical redeliveries still collapse.
    pub fn for_delivery(raw_body: &[u8], envelope: &WebhookEnvelope) -> Self {
        let fingerprint = match envelope.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => format!("event:{id}"),
            _ => {
                let digest = ring::digest::digest(&ring::digest::SHA256, raw_body);
                format!("sha256:{}", hex::encode(digest.as_ref()))
            }
        };
        Self {
            order_id: envelope.data.order_id.clone(),
            fingerprint,
        }
    }
}

impl std::fmt::Display for DeliveryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.order_id, self.fingerprint)
    }
}

/// Records which webhook deliveries were already processed.
#[async_trait]
pub trait DeliveryLedger: Send + Sync {
    /// Returns `true` if this call claimed the key, `false` if it was
    /// claimed before.
    async fn claim(&self, key: &DeliveryKey, event: &str) -> Result<bool, StoreError>;

    /// Forget a claim so the delivery can be processed again.
    async fn release(&self, key: &DeliveryKey) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_through_text() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Completed,
            OrderStatus::OnHold,
            OrderStatus::Cancelled,
            OrderStatus::Failed,
            OrderStatus::Refunded,
        ] {
            assert_eq!(OrderStatus::from(status.as_str()), status);
        }
        assert_eq!(
            OrderStatus::from("awaiting-shipment"),
            OrderStatus::Custom("awaiting-shipment".into())
        );
    }

    #[test]
    fn test_delivery_key_prefers_event_id() {
        let raw = br#"{"id":"evt_1","event":"payment_complete","data":{"orderId":"1001"}}"#;
        let envelope = WebhookEnvelope::from_slice(raw).unwrap();
        let key = DeliveryKey::for_delivery(raw, &envelope);
        assert_eq!(key.to_string(), "1001/event:evt_1");
    }

    #[test]
    fn test_delivery_key_falls_back_to_body_digest() {
        let raw = br#"{"event":"payment_complete","data":{"orderId":"1001"}}"#;
        let envelope = WebhookEnvelope::from_slice(raw).unwrap();
        let first = DeliveryKey::for_delivery(raw, &envelope);
        let again = DeliveryKey::for_delivery(raw, &envelope);
        assert_eq!(first, again);
        assert!(first.fingerprint.starts_with("sha256:"));
        assert_eq!(first.fingerprint.len(), "sha256:".len() + 64);

        let other = br#"{"event":"payment_failed","data":{"orderId":"1001"}}"#;
        let envelope = WebhookEnvelope::from_slice(other).unwrap();
        assert_ne!(DeliveryKey::for_delivery(other, &envelope), first);
    }
}
