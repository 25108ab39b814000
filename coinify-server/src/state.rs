//! Application state shared across all request handlers.

use crate::config::runtime::SharedConfig;
use coinify_core::orders::{DeliveryLedger, OrderStore};
use coinify_core::processors::{PaymentGateway, WebhookDispatcher};
use coinify_sdk::client::PaymentIntentClient;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Runtime configuration (can be reloaded via SIGHUP).
    pub config: SharedConfig,
    pub store: Arc<dyn OrderStore>,
    pub dispatcher: WebhookDispatcher,
    pub gateway: PaymentGateway,
}

impl AppState {
    pub fn new(
        config: SharedConfig,
        store: Arc<dyn OrderStore>,
        ledger: Arc<dyn DeliveryLedger>,
    ) -> Self {
        Self::with_client(config, store, ledger, PaymentIntentClient::new())
    }

    pub fn with_client(
        config: SharedConfig,
        store: Arc<dyn OrderStore>,
        ledger: Arc<dyn DeliveryLedger>,
        client: PaymentIntentClient,
    ) -> Self {
        Self {
            dispatcher: WebhookDispatcher::new(store.clone(), ledger),
            gateway: PaymentGateway::new(client, store.clone()),
            config,
            store,
        }
    }
}
