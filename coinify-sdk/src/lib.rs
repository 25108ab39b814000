//! Client-side building blocks for the Coinify Payment Intent API.
//!
//! * [`objects`]: request, response and webhook payload types.
//! * [`signature`]: HMAC-SHA256 webhook signature verification.
//! * [`config`]: immutable API configuration passed into every call.
//! * `client`: typed HTTP client (behind the `client` cargo feature).

#![forbid(unsafe_code)]

#[cfg(feature = "client")]
pub mod client;
pub mod config;
pub mod objects;
pub mod signature;
