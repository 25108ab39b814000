//! TOML file configuration structures.
//!
//! These structs directly map to the `coinify-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub coinify: CoinifyConfig,
    pub checkout: CheckoutConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Admin configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// The admin secret. If this is plaintext (doesn't start with `$argon2`),
    /// it will be hashed and the config file will be rewritten.
    pub secret: String,
}

/// Coinify account section.
///
/// `api_key` and `webhook_secret` may be left empty here and supplied via
/// `COINIFY_API_KEY` / `COINIFY_WEBHOOK_SECRET` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinifyConfig {
    #[serde(default)]
    pub api_key: String,
    /// Defaults to the sandbox environment when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<Url>,
    #[serde(default)]
    pub webhook_secret: String,
    /// Timeout for every outbound Coinify request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    coinify_sdk::config::DEFAULT_TIMEOUT.as_secs()
}

/// Buyer return URLs. `{order_id}` is replaced with the order id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    pub success_url: String,
    pub failure_url: String,
}

impl FileConfig {
    /// Check if the admin secret is already hashed (argon2 format).
    pub fn is_admin_secret_hashed(&self) -> bool {
        self.admin.secret.starts_with("$argon2")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[admin]
secret = "test-secret"

[coinify]
api_key = "sandbox-key"
webhook_secret = "whsec"

[checkout]
success_url = "https://shop.example/checkout/order-received/{order_id}"
failure_url = "https://shop.example/checkout"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.coinify.api_key, "sandbox-key");
        assert!(config.coinify.api_base.is_none());
        assert_eq!(config.coinify.timeout_secs, 20);
        assert!(!config.is_admin_secret_hashed());
    }

    #[test]
    fn test_credentials_may_come_from_env() {
        let toml_str = r#"
[server]

[admin]
secret = "$argon2id$v=19$m=19456,t=2,p=1$abc123"

[coinify]
api_base = "https://api.payment.coinify.com"
timeout_secs = 10

[checkout]
success_url = "https://shop.example/ok"
failure_url = "https://shop.example/fail"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen, default_listen_addr());
        assert_eq!(
            config.coinify.api_base.as_ref().unwrap().as_str(),
            "https://api.payment.coinify.com/"
        );
        assert!(config.coinify.api_key.is_empty());
        assert!(config.coinify.webhook_secret.is_empty());
        assert_eq!(config.coinify.timeout_secs, 10);
        assert!(config.is_admin_secret_hashed());
    }
}
