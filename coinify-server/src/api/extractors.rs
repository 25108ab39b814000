//! Request authentication for the merchant-side order routes.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};

use crate::state::AppState;

pub const ADMIN_AUTH_HEADER: &str = "Coinify-Admin-Authorization";

/// Proof that the request carried the admin secret.
///
/// ```text
/// Coinify-Admin-Authorization: {plaintext_admin_secret}
/// ```
pub struct AdminAuth;

#[derive(Debug, thiserror::Error)]
pub enum AdminAuthError {
    #[error("missing Coinify-Admin-Authorization header")]
    MissingHeader,
    #[error("invalid admin secret")]
    InvalidSecret,
}

impl IntoResponse for AdminAuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
    }
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AdminAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let secret = parts
            .headers
            .get(ADMIN_AUTH_HEADER)
            .ok_or(AdminAuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AdminAuthError::InvalidSecret)?
            .to_owned();

        let admin = state.config.admin.read().await.clone();

        // argon2 verification is CPU bound.
        let verified = tokio::task::spawn_blocking(move || admin.verify_secret(&secret))
            .await
            .unwrap_or(false);

        if verified {
            Ok(AdminAuth)
        } else {
            tracing::warn!("Rejected request with invalid admin secret");
            Err(AdminAuthError::InvalidSecret)
        }
    }
}
