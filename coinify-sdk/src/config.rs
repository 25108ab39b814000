//! Coinify API configuration.
//!
//! The configuration is an immutable value built once by the hosting
//! application and passed explicitly into every client and dispatcher call.

use std::time::Duration;
use url::Url;

/// Base URL of the Coinify sandbox environment.
pub const SANDBOX_API_BASE: &str = "https://api.payment.sandbox.coinify.com";

/// Base URL of the Coinify production environment.
pub const PRODUCTION_API_BASE: &str = "https://api.payment.coinify.com";

/// Timeout applied to every outbound request unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Credentials and endpoints for one Coinify merchant account.
#[derive(Clone)]
pub struct ApiConfig {
    api_key: String,
    api_base: Url,
    webhook_secret: Box<[u8]>,
    timeout: Duration,
}

impl ApiConfig {
    /// Create a new configuration with the [`DEFAULT_TIMEOUT`].
    pub fn new(
        api_key: impl Into<String>,
        api_base: Url,
        webhook_secret: impl Into<Box<[u8]>>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_base,
            webhook_secret: webhook_secret.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the outbound request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Value sent in the `X-API-KEY` header.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Shared secret used to verify webhook signatures.
    pub fn webhook_secret(&self) -> &[u8] {
        &self.webhook_secret
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build an endpoint URL by appending percent-encoded path segments to
    /// the API base, keeping any path prefix the base already has.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, url::ParseError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base.as_str())
            .field("webhook_secret", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}
