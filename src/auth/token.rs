use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::entities::tokens;

/// Scope for one-shot account activation tokens.
pub const SCOPE_ACTIVATION: &str = "activation";
/// Scope for bearer tokens accepted by the authentication middleware.
pub const SCOPE_AUTHENTICATION: &str = "authentication";

/// Plaintext length in characters (16 random bytes, hex-encoded).
pub const PLAINTEXT_LEN: usize = 32;

/// A freshly minted token. The plaintext leaves the server exactly once,
/// in the response that created it; only the digest is stored.
#[derive(Debug, Clone)]
pub struct Token {
    pub plaintext: String,
    pub hash: String,
    pub user_id: i64,
    /// Unix epoch seconds.
    pub expiry: i64,
    pub scope: String,
}

impl Token {
    /// Generate a new token for a user with the given time-to-live.
    #[must_use]
    pub fn generate(user_id: i64, ttl_secs: i64, scope: &str) -> Self {
        use rand::Rng;

        let mut rng = rand::rng();
        let bytes: [u8; 16] = rng.random();
        let plaintext = hex::encode(bytes);
        let hash = hash_plaintext(&plaintext);

        Self {
            plaintext,
            hash,
            user_id,
            expiry: Utc::now().timestamp() + ttl_secs,
            scope: scope.to_string(),
        }
    }

    #[must_use]
    pub fn into_model(self) -> tokens::Model {
        tokens::Model {
            hash: self.hash,
            user_id: self.user_id,
            expiry: self.expiry,
            scope: self.scope,
        }
    }
}

/// SHA-256 digest of the plaintext, hex-encoded. A single fast pass is
/// enough here: the input is 128 bits of CSPRNG output, not a password,
/// and lookups are by equality on the stored digest.
#[must_use]
pub fn hash_plaintext(plaintext: &str) -> String {
    let digest = Sha256::digest(plaintext.as_bytes());
    hex::encode(digest)
}

/// Check the shape of a client-supplied plaintext before touching the
/// database: exactly 32 lowercase hex characters.
#[must_use]
pub fn valid_plaintext(plaintext: &str) -> bool {
    plaintext.len() == PLAINTEXT_LEN
        && plaintext
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
