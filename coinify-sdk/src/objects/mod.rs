pub mod payment_intent;
pub mod refund;
pub mod webhook;

pub use payment_intent::{
    EmptyOrderId, PLUGIN_IDENTIFIER, PaymentIntentRequest, PaymentIntentResponse,
    RawPaymentIntentResponse,
};
pub use refund::{RefundAccepted, RefundRequest};
pub use webhook::{EnvelopeError, EventTag, WebhookData, WebhookEnvelope};

/// Error body returned by the Coinify API on non-2xx responses.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderErrorBody {
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub message: Option<String>,
}

impl ProviderErrorBody {
    /// Best human-readable message, falling back to the raw body.
    pub fn describe(raw: &str) -> String {
        let parsed: Self = serde_json::from_str(raw).unwrap_or_default();
        match (parsed.error_code, parsed.error_message.or(parsed.message)) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (None, Some(message)) => message,
            (Some(code), None) => code,
            (None, None) => raw.trim().to_owned(),
        }
    }
}
