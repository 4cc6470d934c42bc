//! Opaque invitation token generation and hashing.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Generate a cryptographically random opaque invitation token
/// (32 bytes, base64url-encoded, no padding).
///
/// Uniqueness under concurrent issuance comes from the entropy of the
/// source; the unique index on the stored hash is a backstop, not the
/// mechanism.
pub fn generate_invite_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rand::Rng::random(&mut rng);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hash of a raw invitation token, hex-encoded.
///
/// This is the value stored in the database as
/// `invitation.token_hash`; the raw token is returned to the issuer
/// once and never persisted.
pub fn hash_invite_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}
