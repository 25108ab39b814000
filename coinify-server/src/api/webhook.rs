use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use coinify_sdk::signature::SIGNATURE_HEADER;

use crate::state::AppState;

/// `ANY /webhooks/coinify`: receive a Coinify event.
///
/// The body is handed to the dispatcher byte for byte, since the signature
/// covers the exact bytes sent. Only a failed signature check yields 400;
/// everything else is acknowledged so Coinify stops retrying.
pub async fn coinify_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let config = state.config.coinify().await;
    let outcome = state.dispatcher.handle(&config, &body, signature).await;

    StatusCode::from_u16(outcome.http_status()).unwrap_or(StatusCode::OK)
}
