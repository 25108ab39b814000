//! Payment intent and refund requests (merchant backend → Coinify).
//!
//! Every request carries the `X-API-KEY` header and the timeout from the
//! [`ApiConfig`] it is called with.

use reqwest::{Client, RequestBuilder};
use url::Url;

use super::ClientError;
use crate::config::ApiConfig;
use crate::objects::{
    PaymentIntentRequest, PaymentIntentResponse, ProviderErrorBody, RawPaymentIntentResponse,
    RefundAccepted, RefundRequest,
};

/// Header carrying the merchant API key.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Typed HTTP client for the Coinify **Payment Intent API**.
///
/// The client holds no credentials; the [`ApiConfig`] is passed into each
/// call so a reloaded configuration takes effect on the next request.
#[derive(Debug, Clone, Default)]
pub struct PaymentIntentClient {
    http: Client,
}

impl PaymentIntentClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `POST /v1/payment-intents` – create a payment intent.
    ///
    /// Succeeds only when the provider answers 2xx with a non-empty
    /// `paymentWindowUrl`. A single round trip, never retried.
    pub async fn create_intent(
        &self,
        config: &ApiConfig,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntentResponse, ClientError> {
        let url = config.endpoint(&["v1", "payment-intents"])?;

        let resp = self.post(config, url).json(request).send().await?;
        let bytes = success_body(resp).await?;

        let raw: RawPaymentIntentResponse = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;

        PaymentIntentResponse::try_from(raw).map_err(|_| {
            ClientError::MalformedResponse("response has no paymentWindowUrl".to_owned())
        })
    }

    /// `POST /v1/payment-intents/{transactionId}/refund` – request a refund
    /// of a previously created intent. Never retried.
    pub async fn request_refund(
        &self,
        config: &ApiConfig,
        request: &RefundRequest,
    ) -> Result<RefundAccepted, ClientError> {
        let url = config.endpoint(&[
            "v1",
            "payment-intents",
            &request.transaction_id,
            "refund",
        ])?;

        let resp = self.post(config, url).json(request).send().await?;
        let bytes = success_body(resp).await?;

        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        Ok(RefundAccepted { body })
    }

    fn post(&self, config: &ApiConfig, url: Url) -> RequestBuilder {
        self.http
            .post(url)
            .header(API_KEY_HEADER, config.api_key())
            .timeout(config.timeout())
    }
}

/// Read the response body, turning non-2xx statuses into
/// [`ClientError::Provider`] with the provider's message.
async fn success_body(resp: reqwest::Response) -> Result<Vec<u8>, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Provider {
            status,
            message: ProviderErrorBody::describe(&body),
        });
    }
    Ok(resp.bytes().await?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> ApiConfig {
        ApiConfig::new(
            "test-key",
            Url::parse(&server.uri()).unwrap(),
            b"secret".to_vec(),
        )
    }

    fn intent_request() -> PaymentIntentRequest {
        PaymentIntentRequest::new(
            "25.00",
            "USD",
            "1001",
            "7",
            "buyer@example.com",
            "https://shop.example/checkout/order-received/1001",
            "https://shop.example/checkout",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_intent_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment-intents"))
            .and(header("X-API-KEY", "test-key"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "amount": "25.00",
                "currency": "USD",
                "orderId": "1001",
                "customerId": "7",
                "customerEmail": "buyer@example.com",
                "successUrl": "https://shop.example/checkout/order-received/1001",
                "failureUrl": "https://shop.example/checkout",
                "pluginIdentifier": "WooCommerce-Coinify-Gateway",
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "pi_1",
                "paymentWindowUrl": "https://pay.example/x",
                "state": "pending",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let intent = PaymentIntentClient::new()
            .create_intent(&config(&server), &intent_request())
            .await
            .unwrap();
        assert_eq!(intent.payment_window_url, "https://pay.example/x");
        assert_eq!(intent.id.as_deref(), Some("pi_1"));
    }

    #[tokio::test]
    async fn test_create_intent_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment-intents"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "errorCode": "internal_error",
                "errorMessage": "try again later",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = PaymentIntentClient::new()
            .create_intent(&config(&server), &intent_request())
            .await
            .unwrap_err();
        match err {
            ClientError::Provider { status, message } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(message, "internal_error: try again later");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_intent_without_payment_window_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "pi_1"})))
            .mount(&server)
            .await;

        let err = PaymentIntentClient::new()
            .create_intent(&config(&server), &intent_request())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_create_intent_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let err = PaymentIntentClient::new()
            .create_intent(&config(&server), &intent_request())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_create_intent_connection_refused() {
        let config = ApiConfig::new(
            "test-key",
            Url::parse("http://127.0.0.1:1").unwrap(),
            b"secret".to_vec(),
        );
        let err = PaymentIntentClient::new()
            .create_intent(&config, &intent_request())
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_create_intent_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"paymentWindowUrl": "https://pay.example/x"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let config = config(&server).with_timeout(Duration::from_millis(50));
        let err = PaymentIntentClient::new()
            .create_intent(&config, &intent_request())
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_request_refund() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment-intents/pi_42/refund"))
            .and(header("X-API-KEY", "test-key"))
            .and(body_json(json!({
                "amount": "10.00",
                "currency": "EUR",
                "reason": "damaged item",
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let accepted = PaymentIntentClient::new()
            .request_refund(
                &config(&server),
                &RefundRequest::new("pi_42", "10.00", "EUR", "damaged item"),
            )
            .await
            .unwrap();
        assert_eq!(accepted.body, serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_request_refund_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment-intents/pi_42/refund"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(json!({"errorMessage": "refund exceeds captured amount"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = PaymentIntentClient::new()
            .request_refund(
                &config(&server),
                &RefundRequest::new("pi_42", "999.00", "EUR", "oops"),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Provider { status, ref message }
                if status == StatusCode::UNPROCESSABLE_ENTITY
                    && message == "refund exceeds captured amount"
        ));
    }
}
