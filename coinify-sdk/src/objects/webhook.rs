//! Webhook payload types.
//!
//! Envelopes are parsed from untrusted input. Only decode them after the
//! raw body has passed [`crate::signature::verify_signature`].

use serde::{Deserialize, Deserializer, Serialize};

/// Payment lifecycle event tags sent by Coinify.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventTag {
    PaymentComplete,
    PaymentCancelled,
    PaymentFailed,
    RefundCompleted,
    /// Any tag this crate does not know yet, kept verbatim.
    Unknown(String),
}

impl EventTag {
    pub const PAYMENT_COMPLETE: &'static str = "payment_complete";
    pub const PAYMENT_CANCELLED: &'static str = "payment_cancelled";
    pub const PAYMENT_FAILED: &'static str = "payment_failed";
    pub const REFUND_COMPLETED: &'static str = "payment-intent.refund.completed";

    pub fn parse(tag: &str) -> Self {
        match tag {
            Self::PAYMENT_COMPLETE => Self::PaymentComplete,
            Self::PAYMENT_CANCELLED => Self::PaymentCancelled,
            Self::PAYMENT_FAILED => Self::PaymentFailed,
            Self::REFUND_COMPLETED => Self::RefundCompleted,
            other => Self::Unknown(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::PaymentComplete => Self::PAYMENT_COMPLETE,
            Self::PaymentCancelled => Self::PAYMENT_CANCELLED,
            Self::PaymentFailed => Self::PAYMENT_FAILED,
            Self::RefundCompleted => Self::REFUND_COMPLETED,
            Self::Unknown(tag) => tag,
        }
    }
}

impl std::fmt::Display for EventTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level webhook body: `{"event": "...", "data": {"orderId": "...", ...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    /// Provider event id, unique per event occurrence when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub event: String,
    pub data: WebhookData,
}

/// Event data. Only `orderId` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookData {
    #[serde(rename = "orderId", deserialize_with = "string_or_integer")]
    pub order_id: String,
    /// Payment intent id the event refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Free-text reason, sent with cancellations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Reasons a webhook body could not be decoded into a usable envelope.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty event tag")]
    EmptyEvent,
    #[error("empty orderId")]
    EmptyOrderId,
}

impl WebhookEnvelope {
    /// Build an envelope for `event` on `order_id` with no extra data.
    pub fn new(event: impl Into<String>, order_id: impl Into<String>) -> Self {
        Self {
            id: None,
            event: event.into(),
            data: WebhookData {
                order_id: order_id.into(),
                id: None,
                reason: None,
                extra: serde_json::Map::new(),
            },
        }
    }

    /// Decode and validate a raw webhook body.
    pub fn from_slice(raw: &[u8]) -> Result<Self, EnvelopeError> {
        let envelope: Self = serde_json::from_slice(raw)?;
        if envelope.event.trim().is_empty() {
            return Err(EnvelopeError::EmptyEvent);
        }
        if envelope.data.order_id.trim().is_empty() {
            return Err(EnvelopeError::EmptyOrderId);
        }
        Ok(envelope)
    }

    pub fn tag(&self) -> EventTag {
        EventTag::parse(&self.event)
    }
}

fn string_or_integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Integer(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Integer(number) => number.to_string(),
    })
}
