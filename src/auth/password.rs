//! Password hashing: HMAC-SHA256 over (salt || password) keyed by the
//! server JWT secret, with a random per-user salt. Verification uses the
//! MAC's constant-time comparison.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn hash(secret: &str, salt: &str, password: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(salt.as_bytes());
    mac.update(password.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

pub fn verify(secret: &str, salt: &str, password: &str, stored_hash: &str) -> bool {
    let Ok(expected) = hex::decode(stored_hash) else {
        return false;
    };
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(salt.as_bytes());
    mac.update(password.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_roundtrip() {
        let salt = generate_salt();
        let h = hash("server-secret", &salt, "hunter2");
        assert!(verify("server-secret", &salt, "hunter2", &h));
        assert!(!verify("server-secret", &salt, "hunter3", &h));
    }

    #[test]
    fn salt_changes_hash() {
        let a = hash("server-secret", &generate_salt(), "hunter2");
        let b = hash("server-secret", &generate_salt(), "hunter2");
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_stored_hash_fails_verification() {
        assert!(!verify("server-secret", "00", "pw", "zzzz-not-hex"));
    }
}
