//! Bearer credential codec.
//!
//! Tokens have the familiar `header.payload.signature` form: two base64url
//! JSON segments and a keyed SHA-256 over the signing input. [`TokenCodec`]
//! both issues and verifies them against a shared secret. Verification is
//! deliberately total: any malformed or tampered token decodes to `None`,
//! and the caller decides what that means (for `ParseToken` it means
//! "continue without a principal").

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::capability::TokenDecoder;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// The decoded auth principal, attached to the request context by
/// `ParseToken` and read by `PrivateRoute`, `Authorship` and handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Subject id, compared against resource owner ids.
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Issues and verifies bearer tokens with a shared secret.
pub struct TokenCodec {
    secret: String,
}

impl TokenCodec {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    /// Mints a signed token for `payload`.
    pub fn issue(&self, payload: &TokenPayload) -> String {
        let header = URL_SAFE_NO_PAD.encode(HEADER);
        let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap_or_default());
        let signature = self.sign(&header, &body);
        format!("{header}.{body}.{signature}")
    }

    /// Verifies the signature and decodes the payload. Returns `None` for
    /// anything that is not a token this codec issued.
    pub fn verify(&self, token: &str) -> Option<TokenPayload> {
        let mut parts = token.split('.');
        let header = parts.next()?;
        let body = parts.next()?;
        let signature = parts.next()?;
        if parts.next().is_some() {
            return None;
        }

        if self.sign(header, body) != signature {
            debug!("token signature mismatch");
            return None;
        }

        let bytes = URL_SAFE_NO_PAD.decode(body).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    fn sign(&self, header: &str, body: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b".");
        hasher.update(header.as_bytes());
        hasher.update(b".");
        hasher.update(body.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

#[async_trait::async_trait]
impl TokenDecoder for TokenCodec {
    async fn decode(&self, token: &str) -> Option<TokenPayload> {
        self.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> TokenPayload {
        TokenPayload { id: "u1".into(), email: "keks@six.cities".into(), name: "Keks".into() }
    }

    #[test]
    fn issue_then_verify_round_trips() {
        let codec = TokenCodec::new("secret");
        let token = codec.issue(&payload());
        assert_eq!(codec.verify(&token), Some(payload()));
    }

    #[test]
    fn wrong_secret_rejects() {
        let token = TokenCodec::new("secret").issue(&payload());
        assert_eq!(TokenCodec::new("other").verify(&token), None);
    }

    #[test]
    fn tampered_payload_rejects() {
        let codec = TokenCodec::new("secret");
        let token = codec.issue(&payload());
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(r#"{"id":"u2","email":"e","name":"n"}"#);
        parts[1] = &forged;
        assert_eq!(codec.verify(&parts.join(".")), None);
    }

    #[test]
    fn garbage_rejects() {
        let codec = TokenCodec::new("secret");
        assert_eq!(codec.verify(""), None);
        assert_eq!(codec.verify("not-a-token"), None);
        assert_eq!(codec.verify("a.b"), None);
        assert_eq!(codec.verify("a.b.c.d"), None);
    }
}
