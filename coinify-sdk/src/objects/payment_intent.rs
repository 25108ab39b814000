use serde::{Deserialize, Serialize};

/// Identifies this integration to Coinify on every payment intent.
pub const PLUGIN_IDENTIFIER: &str = "WooCommerce-Coinify-Gateway";

/// Request payload for `POST /v1/payment-intents`.
///
/// Built once per checkout attempt. Use [`PaymentIntentRequest::new`] so the
/// non-empty order id invariant is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest {
    /// Decimal amount, e.g. `"25.00"`.
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency: String,
    pub order_id: String,
    pub customer_id: String,
    pub customer_email: String,
    pub success_url: String,
    pub failure_url: String,
    pub plugin_identifier: String,
}

/// Returned by [`PaymentIntentRequest::new`] for an empty order id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("payment intent requires a non-empty order id")]
pub struct EmptyOrderId;

impl PaymentIntentRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        amount: impl Into<String>,
        currency: impl Into<String>,
        order_id: impl Into<String>,
        customer_id: impl Into<String>,
        customer_email: impl Into<String>,
        success_url: impl Into<String>,
        failure_url: impl Into<String>,
    ) -> Result<Self, EmptyOrderId> {
        let order_id = order_id.into();
        if order_id.trim().is_empty() {
            return Err(EmptyOrderId);
        }
        Ok(Self {
            amount: amount.into(),
            currency: currency.into(),
            order_id,
            customer_id: customer_id.into(),
            customer_email: customer_email.into(),
            success_url: success_url.into(),
            failure_url: failure_url.into(),
            plugin_identifier: PLUGIN_IDENTIFIER.to_owned(),
        })
    }
}

/// Payment intent response exactly as the provider sent it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPaymentIntentResponse {
    pub id: Option<String>,
    pub payment_window_url: Option<String>,
    pub state: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A created payment intent carrying a usable hosted payment page URL.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntentResponse {
    /// Provider-side payment intent id, stored as the order's transaction id.
    pub id: Option<String>,
    pub payment_window_url: String,
    pub state: Option<String>,
    /// Provider-defined fields opaque to this crate.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TryFrom<RawPaymentIntentResponse> for PaymentIntentResponse {
    type Error = RawPaymentIntentResponse;

    /// Succeeds only when `paymentWindowUrl` is present and non-empty.
    fn try_from(raw: RawPaymentIntentResponse) -> Result<Self, Self::Error> {
        match raw.payment_window_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(Self {
                payment_window_url: url.to_owned(),
                id: raw.id,
                state: raw.state,
                extra: raw.extra,
            }),
            _ => Err(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(order_id: &str) -> Result<PaymentIntentRequest, EmptyOrderId> {
        PaymentIntentRequest::new(
            "25.00",
            "USD",
            order_id,
            "7",
            "buyer@example.com",
            "https://shop.example/checkout/order-received/1001",
            "https://shop.example/checkout",
        )
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_value(request("1001").unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "amount": "25.00",
                "currency": "USD",
                "orderId": "1001",
                "customerId": "7",
                "customerEmail": "buyer@example.com",
                "successUrl": "https://shop.example/checkout/order-received/1001",
                "failureUrl": "https://shop.example/checkout",
                "pluginIdentifier": "WooCommerce-Coinify-Gateway",
            })
        );
    }

    #[test]
    fn test_empty_order_id_rejected() {
        assert_eq!(request(""), Err(EmptyOrderId));
        assert_eq!(request("  "), Err(EmptyOrderId));
    }

    #[test]
    fn test_response_requires_payment_window_url() {
        let raw: RawPaymentIntentResponse = serde_json::from_str(
            r#"{"id":"pi_1","paymentWindowUrl":"https://pay.example/x","state":"pending","fees":[]}"#,
        )
        .unwrap();
        let intent = PaymentIntentResponse::try_from(raw).unwrap();
        assert_eq!(intent.payment_window_url, "https://pay.example/x");
        assert_eq!(intent.id.as_deref(), Some("pi_1"));
        assert!(intent.extra.contains_key("fees"));

        let raw: RawPaymentIntentResponse =
            serde_json::from_str(r#"{"id":"pi_1","paymentWindowUrl":""}"#).unwrap();
        assert!(PaymentIntentResponse::try_from(raw).is_err());

        let raw: RawPaymentIntentResponse = serde_json::from_str(r#"{"id":"pi_1"}"#).unwrap();
        assert!(PaymentIntentResponse::try_from(raw).is_err());
    }
}
