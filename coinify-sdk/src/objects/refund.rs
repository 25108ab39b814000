use serde::Serialize;

/// Request payload for `POST /v1/payment-intents/{transactionId}/refund`.
///
/// `transaction_id` addresses the refund sub-resource and is not part of
/// the JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundRequest {
    /// Decimal amount, e.g. `"10.00"`.
    pub amount: String,
    pub currency: String,
    pub reason: String,
    #[serde(skip)]
    pub transaction_id: String,
}

impl RefundRequest {
    pub fn new(
        transaction_id: impl Into<String>,
        amount: impl Into<String>,
        currency: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            amount: amount.into(),
            currency: currency.into(),
            reason: reason.into(),
            transaction_id: transaction_id.into(),
        }
    }
}

/// The provider accepted the refund request.
///
/// The refund is not final until the `payment-intent.refund.completed`
/// webhook arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct RefundAccepted {
    /// Response body, `Null` when the provider sent none.
    pub body: serde_json::Value,
}
