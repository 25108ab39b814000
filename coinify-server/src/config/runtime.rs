//! Runtime configuration, as held by the running server.
//!
//! Each section sits behind its own lock so a SIGHUP reload can swap one
//! without blocking readers of the others.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use coinify_sdk::config::ApiConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

const ORDER_ID_PLACEHOLDER: &str = "{order_id}";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

/// Admin configuration with hashed secret.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// The argon2 hashed admin secret.
    secret_hash: String,
}

impl AdminConfig {
    pub fn new(secret_hash: String) -> Self {
        Self { secret_hash }
    }

    /// Verify a plaintext secret against the stored hash.
    pub fn verify_secret(&self, plaintext: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.secret_hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Buyer return URL templates.
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    success_url: String,
    failure_url: String,
}

impl CheckoutUrls {
    pub fn new(success_url: impl Into<String>, failure_url: impl Into<String>) -> Self {
        Self {
            success_url: success_url.into(),
            failure_url: failure_url.into(),
        }
    }

    pub fn success_url(&self, order_id: &str) -> String {
        self.success_url.replace(ORDER_ID_PLACEHOLDER, order_id)
    }

    pub fn failure_url(&self, order_id: &str) -> String {
        self.failure_url.replace(ORDER_ID_PLACEHOLDER, order_id)
    }
}

/// Configuration shared by all handlers.
#[derive(Clone)]
pub struct SharedConfig {
    pub server: Arc<RwLock<ServerConfig>>,
    pub admin: Arc<RwLock<AdminConfig>>,
    pub coinify: Arc<RwLock<Arc<ApiConfig>>>,
    pub checkout: Arc<RwLock<CheckoutUrls>>,
}

impl SharedConfig {
    pub fn new(
        server: ServerConfig,
        admin: AdminConfig,
        coinify: ApiConfig,
        checkout: CheckoutUrls,
    ) -> Self {
        Self {
            server: Arc::new(RwLock::new(server)),
            admin: Arc::new(RwLock::new(admin)),
            coinify: Arc::new(RwLock::new(Arc::new(coinify))),
            checkout: Arc::new(RwLock::new(checkout)),
        }
    }

    /// Snapshot of the Coinify account settings.
    ///
    /// The lock is released before returning, so a reload never waits on an
    /// in-flight provider call.
    pub async fn coinify(&self) -> Arc<ApiConfig> {
        self.coinify.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{
        PasswordHasher,
        password_hash::{SaltString, rand_core::OsRng},
    };

    #[test]
    fn test_verify_secret() {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(b"test-password", &salt)
            .unwrap()
            .to_string();

        let admin = AdminConfig::new(hash);
        assert!(admin.verify_secret("test-password"));
        assert!(!admin.verify_secret("wrong-password"));
        assert!(!AdminConfig::new("plaintext".into()).verify_secret("plaintext"));
    }

    #[test]
    fn test_checkout_url_templates() {
        let urls = CheckoutUrls::new(
            "https://shop.example/checkout/order-received/{order_id}",
            "https://shop.example/checkout",
        );
        assert_eq!(
            urls.success_url("1001"),
            "https://shop.example/checkout/order-received/1001"
        );
        assert_eq!(urls.failure_url("1001"), "https://shop.example/checkout");
    }
}
