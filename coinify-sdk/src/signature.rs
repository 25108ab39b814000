//! Webhook signature algorithm and verification.
//!
//! Coinify signs every webhook delivery with HMAC-SHA256 over the raw
//! request body, keyed by the shared webhook secret, and sends the digest
//! hex-encoded in a header:
//!
//! ```text
//! X-Coinify-Webhook-Signature: {hex(HMAC-SHA256(raw_body, secret))}
//! ```
//!
//! Locally computed digests are always lowercase hex. The received header
//! may use either casing; it is decoded to bytes and compared in constant
//! time by [`ring::hmac::verify`].

/// Header name carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "X-Coinify-Webhook-Signature";

/// Length of a hex-encoded SHA-256 digest.
const DIGEST_HEX_LEN: usize = 64;

/// Errors produced by signature verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("missing signature header")]
    Missing,
    #[error("malformed signature header")]
    Malformed,
    #[error("invalid signature")]
    Mismatch,
}

impl From<ring::error::Unspecified> for SignatureError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::Mismatch
    }
}

impl From<hex::FromHexError> for SignatureError {
    fn from(_: hex::FromHexError) -> Self {
        Self::Malformed
    }
}

fn hmac_key(secret: &[u8]) -> ring::hmac::Key {
    ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret)
}

/// Compute the lowercase hex signature of `body` under `secret`.
pub fn sign(body: &[u8], secret: &[u8]) -> String {
    let tag = ring::hmac::sign(&hmac_key(secret), body);
    hex::encode(tag.as_ref())
}

/// Verify a webhook signature, reporting why verification failed.
///
/// `header` is the raw value of [`SIGNATURE_HEADER`], or `None` if the
/// request did not carry it. Surrounding whitespace is ignored.
pub fn verify_signature(
    body: &[u8],
    header: Option<&str>,
    secret: &[u8],
) -> Result<(), SignatureError> {
    let header = header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(SignatureError::Missing)?;
    if header.len() != DIGEST_HEX_LEN {
        return Err(SignatureError::Malformed);
    }
    let received = hex::decode(header)?;
    ring::hmac::verify(&hmac_key(secret), body, &received)?;
    Ok(())
}

/// Boolean form of [`verify_signature`]. Never panics.
pub fn verify(body: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    verify_signature(body, Some(signature_header), secret).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"c0ffee-shared-secret";
    const BODY: &[u8] = br#"{"event":"payment_failed","data":{"orderId":"1001"}}"#;

    #[test]
    fn test_known_vector() {
        // RFC 4231, test case 2
        let sig = sign(b"what do ya want for nothing?", b"Jefe");
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_sign_then_verify() {
        let sig = sign(BODY, SECRET);
        assert_eq!(sig.len(), DIGEST_HEX_LEN);
        assert_eq!(sig, sig.to_lowercase());
        assert!(verify(BODY, &sig, SECRET));
        assert!(verify(b"", &sign(b"", SECRET), SECRET));
    }

    #[test]
    fn test_header_casing_and_whitespace_ignored() {
        let sig = sign(BODY, SECRET);
        assert!(verify(BODY, &sig.to_uppercase(), SECRET));
        assert!(verify(BODY, &format!("  {sig}\n"), SECRET));
    }

    #[test]
    fn test_every_body_byte_mutation_fails() {
        let sig = sign(BODY, SECRET);
        for i in 0..BODY.len() {
            let mut mutated = BODY.to_vec();
            mutated[i] ^= 0x01;
            assert!(!verify(&mutated, &sig, SECRET), "body byte {i}");
        }
    }

    #[test]
    fn test_every_signature_char_mutation_fails() {
        let sig = sign(BODY, SECRET);
        for i in 0..sig.len() {
            let mut chars: Vec<char> = sig.chars().collect();
            chars[i] = if chars[i] == '0' { '1' } else { '0' };
            let mutated: String = chars.into_iter().collect();
            assert!(!verify(BODY, &mutated, SECRET), "signature char {i}");
        }
    }

    #[test]
    fn test_wrong_secret_fails() {
        let sig = sign(BODY, b"another-secret");
        assert_eq!(
            verify_signature(BODY, Some(&sig), SECRET),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_missing_and_malformed_headers() {
        assert_eq!(
            verify_signature(BODY, None, SECRET),
            Err(SignatureError::Missing)
        );
        assert_eq!(
            verify_signature(BODY, Some("   "), SECRET),
            Err(SignatureError::Missing)
        );
        assert_eq!(
            verify_signature(BODY, Some("abc123"), SECRET),
            Err(SignatureError::Malformed)
        );
        let not_hex = "z".repeat(DIGEST_HEX_LEN);
        assert_eq!(
            verify_signature(BODY, Some(&not_hex), SECRET),
            Err(SignatureError::Malformed)
        );
        let sig = sign(BODY, SECRET);
        assert!(!verify(BODY, &format!("{sig}00"), SECRET));
        assert!(!verify(BODY, &sig[..62], SECRET));
    }
}
