//! HTTP client for the Coinify Payment Intent API.
//!
//! Gated behind the `client` cargo feature so crates that only need the
//! wire types and signature verification do not pull in `reqwest`.

mod payment_intents;

pub use payment_intents::PaymentIntentClient;

use reqwest::StatusCode;

/// Errors produced by the API client.
///
/// No variant is ever retried by this crate: a retried intent creation
/// or refund could be applied twice by the provider.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection reset, timeout, …).
    #[error("http error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("api error: status {status}, message: {message}")]
    Provider { status: StatusCode, message: String },

    /// A 2xx response whose body was not the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The API base URL could not be extended with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// Whether the request ran into the configured timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Transport(e) if e.is_timeout())
    }

    /// Transport and timeout failures, as opposed to provider rejections.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}
