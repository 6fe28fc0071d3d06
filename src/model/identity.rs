use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Caller identity taken from the `Authorization` and `X-AUTH-RIOOS-EMAIL` headers.
///
/// The bearer token itself is never kept; only a short fingerprint that is
/// safe to put in log lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub token_fingerprint: String,
}

impl Identity {
    pub fn new(email: &str, token: &str) -> Self {
        Self {
            email: email.to_string(),
            token_fingerprint: fingerprint(token),
        }
    }
}

/// First 12 hex digits of the token's SHA-256.
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..6])
}
