//! Salted client IP hashing.

use sha2::{Digest, Sha256};

/// Returns `hex(sha256(salt || ip))`, the only form of the client address that
/// is stored durably.
pub fn hash_ip(salt: &str, ip: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(ip.as_bytes());
    hex::encode(hasher.finalize())
}
